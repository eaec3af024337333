//! OpenAI-compatible chat completions format. Messages map 1:1 to the
//! wire `messages` array.

use serde::{Deserialize, Serialize};
use switchboard_core::{ChatRequest, ChatResponse, MessageRole, ProviderConfig, RouterError};

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

#[derive(Debug, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

fn wire_role(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

pub fn build_request(provider: &ProviderConfig, request: &ChatRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: provider.model.clone(),
        messages: request
            .messages
            .iter()
            .map(|m| WireMessage {
                role: wire_role(m.role).to_string(),
                content: m.content.clone(),
            })
            .collect(),
        temperature: request.options.temperature,
        max_tokens: request.options.max_output_tokens,
        top_p: 1.0,
    }
}

pub fn parse_response(
    provider: &ProviderConfig,
    body: &str,
) -> Result<ChatResponse, RouterError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| RouterError::MalformedResponse {
            provider_id: provider.id.clone(),
            reason: e.to_string(),
        })?;

    let choice = parsed
        .choices
        .first()
        .ok_or_else(|| RouterError::MalformedResponse {
            provider_id: provider.id.clone(),
            reason: "response contains no choices".to_string(),
        })?;

    Ok(ChatResponse {
        text: choice.message.content.clone(),
        tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
        provider_id: provider.id.clone(),
        model: provider.model.clone(),
        finish_reason: choice.finish_reason.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::{ChatMessage, WireFormat};

    fn provider() -> ProviderConfig {
        ProviderConfig::new(
            "openai",
            "https://api.openai.com/v1/chat/completions",
            "gpt-4o-mini",
            WireFormat::OpenAiChat,
        )
    }

    #[test]
    fn messages_map_one_to_one() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("be terse"),
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi"),
            ChatMessage::user("how are you"),
        ]);
        let wire = build_request(&provider(), &request);

        assert_eq!(wire.model, "gpt-4o-mini");
        let roles: Vec<_> = wire.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(wire.messages[1].content, "hello");
    }

    #[test]
    fn parses_content_and_usage() {
        let body = r#"{
            "choices": [{"message": {"content": "pong"}, "finish_reason": "stop"}],
            "usage": {"total_tokens": 42}
        }"#;
        let response = parse_response(&provider(), body).expect("valid body");
        assert_eq!(response.text, "pong");
        assert_eq!(response.tokens_used, 42);
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.provider_id, "openai");
    }

    #[test]
    fn missing_usage_reads_as_zero() {
        let body = r#"{"choices": [{"message": {"content": "pong"}, "finish_reason": null}]}"#;
        let response = parse_response(&provider(), body).expect("valid body");
        assert_eq!(response.tokens_used, 0);
    }

    #[test]
    fn empty_choices_is_malformed() {
        let err = parse_response(&provider(), r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, RouterError::MalformedResponse { .. }));
    }
}
