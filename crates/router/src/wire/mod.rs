//! Wire-format adapters: normalized request/response on one side, a
//! vendor-specific JSON shape on the other. Stateless; dispatch is a
//! closed match on `WireFormat`, so a third vendor format is a new
//! variant plus one module, not a branch in the executor.

pub mod gemini;
pub mod openai;

use reqwest::RequestBuilder;
use serde::Serialize;
use switchboard_core::{ChatRequest, ChatResponse, ProviderConfig, RouterError, WireFormat};
use tracing::debug;

/// A fully built vendor payload, ready for `RequestBuilder::json`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WireRequest {
    OpenAi(openai::ChatCompletionRequest),
    Gemini(gemini::GenerateContentRequest),
}

/// Translate the normalized request into the provider's wire payload.
pub fn to_wire_request(provider: &ProviderConfig, request: &ChatRequest) -> WireRequest {
    match provider.wire_format {
        WireFormat::OpenAiChat => WireRequest::OpenAi(openai::build_request(provider, request)),
        WireFormat::GeminiNative => WireRequest::Gemini(gemini::build_request(request)),
    }
}

/// Translate a provider's 2xx body back into the normalized response.
/// Missing required fields are a `MalformedResponse`.
pub fn from_wire_response(
    provider: &ProviderConfig,
    body: &str,
) -> Result<ChatResponse, RouterError> {
    match provider.wire_format {
        WireFormat::OpenAiChat => openai::parse_response(provider, body),
        WireFormat::GeminiNative => gemini::parse_response(provider, body),
    }
}

/// Attach the authorization mechanism the wire format expects: a bearer
/// header for OpenAI-compatible endpoints, a `key` query parameter for
/// Gemini. The credential value itself is never inspected or logged.
pub fn apply_auth(builder: RequestBuilder, provider: &ProviderConfig) -> RequestBuilder {
    let Some(credential) = provider.credential.as_ref() else {
        // The pool filters uncredentialed providers; if one slips through
        // the vendor's 401 classifies it.
        debug!(provider = %provider.id, "building request without credential");
        return builder;
    };
    match provider.wire_format {
        WireFormat::OpenAiChat => {
            builder.header("Authorization", format!("Bearer {}", credential.expose()))
        }
        WireFormat::GeminiNative => builder.query(&[("key", credential.expose())]),
    }
}
