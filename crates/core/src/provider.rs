//! Provider trait — the abstraction over the completion endpoint.
//!
//! A `CompletionProvider` sends a conversation to an LLM and returns the raw
//! choice list. The orchestrator inspects each choice's finish indicator to
//! decide between returning text and resolving a tool call, so the response
//! shape deliberately preserves the wire contract (including the degenerate
//! zero-choice case) instead of collapsing to a single message.

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::ToolSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A completion request.
///
/// `functions` is omitted from the wire entirely when `None` — sending an
/// empty list is not the same as sending nothing to most providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to target (e.g. "gpt-4o")
    pub model: String,

    /// The conversation messages, oldest first
    pub messages: Vec<Message>,

    /// Callable tool specs offered to the model, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<ToolSpec>>,
}

/// The provider's signal of whether a response is final text or a request
/// to invoke a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    /// The model wants a tool invoked. Older OpenAI-style endpoints send
    /// `"function_call"` for the same condition.
    #[serde(alias = "function_call")]
    ToolCall,
    Length,
    ContentFilter,
    #[serde(other)]
    Other,
}

/// A tool invocation requested by the model.
///
/// `arguments` arrives as a serialized JSON object; parsing it is the
/// orchestrator's job (and its failure mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// The message half of a choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

/// One completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub finish_reason: FinishReason,

    #[serde(default)]
    pub message: ChoiceMessage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete response from a provider.
///
/// Zero choices is a valid (degenerate) response — the orchestrator must
/// tolerate it, not error on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// The first choice, if the provider returned any.
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.first()
    }
}

/// The core provider trait.
///
/// The orchestrator calls `complete()` without knowing which backend is in
/// use. `embed()` exists for tools that need embeddings; backends without
/// embedding support keep the erroring default.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider (e.g. "openai").
    fn name(&self) -> &str;

    /// Send a request and get the raw choice list back.
    async fn complete(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<ChatResponse, ProviderError>;

    /// Generate embedding vectors for the given texts.
    async fn embed(
        &self,
        _model: &str,
        _inputs: &[String],
    ) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
        Err(ProviderError::Network(format!(
            "Provider '{}' does not support embeddings",
            self.name()
        )))
    }
}
