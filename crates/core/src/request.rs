use serde::{Deserialize, Serialize};

/// Role of a single conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One turn of a normalized conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: MessageRole::System,
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: MessageRole::User,
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.to_string(),
        }
    }
}

/// Generation options common to every wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Accepted for contract compatibility; the executor is non-streaming.
    pub stream: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1024,
            stream: false,
        }
    }
}

/// Provider-agnostic request shape used by all code outside the wire
/// adapters. Message order is conversational order and must be preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// The single meaningful system message: a leading `system` turn.
    pub fn leading_system(&self) -> Option<&str> {
        match self.messages.first() {
            Some(m) if m.role == MessageRole::System => Some(&m.content),
            _ => None,
        }
    }
}

/// Uniform result of one successful provider attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    /// 0 when the vendor did not report usage.
    pub tokens_used: u32,
    pub provider_id: String,
    pub model: String,
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_system_is_only_detected_at_the_front() {
        let req = ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
        ]);
        assert_eq!(req.leading_system(), Some("be brief"));

        let req = ChatRequest::new(vec![
            ChatMessage::user("hi"),
            ChatMessage::system("be brief"),
        ]);
        assert_eq!(req.leading_system(), None);
    }

    #[test]
    fn default_options() {
        let opts = ChatOptions::default();
        assert!(!opts.stream);
        assert_eq!(opts.max_output_tokens, 1024);
    }
}
