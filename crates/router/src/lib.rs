//! Switchboard provider router.
//!
//! Takes a normalized chat request and decides which external language-model
//! vendor serves it, under per-vendor sliding-window rate limits,
//! heterogeneous wire formats and partial outages. One call in
//! ([`Router::route`]), one uniform response or a well-defined failure out.
//!
//! ```no_run
//! use std::sync::Arc;
//! use switchboard_core::{ChatMessage, ChatRequest, Credential, ProviderConfig, WireFormat};
//! use switchboard_router::Router;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let providers = vec![ProviderConfig::new(
//!     "openai-main",
//!     "https://api.openai.com/v1/chat/completions",
//!     "gpt-4o-mini",
//!     WireFormat::OpenAiChat,
//! )
//! .with_credential(Credential::new(std::env::var("OPENAI_API_KEY")?))];
//!
//! let router = Router::with_static_providers(providers)?;
//! let routed = router
//!     .route(ChatRequest::new(vec![ChatMessage::user("hello")]))
//!     .await?;
//! println!("{} said: {}", routed.response.provider_id, routed.response.text);
//! # Ok(())
//! # }
//! ```

pub mod executor;
pub mod policy;
pub mod pool;
pub mod router;
pub mod usage;
pub mod wire;

pub use executor::{ExecutorConfig, FallbackExecutor};
pub use policy::{PriorityFallback, RoundRobin, SelectionPolicy};
pub use pool::{ProviderPool, ProviderSource, SharedProviderSource, StaticProviderSource};
pub use router::{ProviderStatus, RoutedResponse, Router, RouterBuilder};
pub use usage::{UsageSnapshot, UsageTracker};
