//! Shared domain model for the Switchboard provider router.
//!
//! This crate holds everything the router and its callers agree on: the
//! normalized chat request/response shapes, provider configuration, the
//! public error taxonomy, provider-list loading and logging setup. It has
//! no networking of its own.

pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod request;

pub use config::{load_providers, parse_providers, ProviderEntry, ProvidersFile};
pub use error::{Attempt, AttemptOutcome, RouterError, RouterResult};
pub use logging::init_logging;
pub use provider::{Credential, ProviderConfig, RateLimit, WireFormat};
pub use request::{ChatMessage, ChatOptions, ChatRequest, ChatResponse, MessageRole};
