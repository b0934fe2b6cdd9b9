//! The completion orchestration loop.
//!
//! Interleaves provider calls with tool execution until the provider
//! returns final text. The loop is an explicit bounded iteration — never
//! recursion — so a misbehaving model or tool cannot ping-pong forever:
//! once the bound is hit the last response's literal content is returned
//! instead of raising, and the user still gets some reply.

use samovar_core::error::{Error, ToolError};
use samovar_core::message::Message;
use samovar_core::provider::{ChatRequest, CompletionProvider, FinishReason, FunctionCall};
use samovar_core::tool::{ToolContext, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Orchestrates one completion exchange, resolving tool calls as they come.
pub struct CompletionOrchestrator {
    provider: Arc<dyn CompletionProvider>,
    tools: Arc<ToolRegistry>,
    model: String,
    max_iterations: u32,
}

impl CompletionOrchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
        max_iterations: u32,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            max_iterations,
        }
    }

    /// Run the loop over a caller-supplied message list.
    ///
    /// Only the final text comes back; the caller persists the assistant
    /// message. Tool specs are attached only when `offer_tools` is set and
    /// the registry is non-empty — an empty registry means no `functions`
    /// field at all, not an empty list.
    pub async fn complete(
        &self,
        mut messages: Vec<Message>,
        offer_tools: bool,
        ctx: &ToolContext,
    ) -> Result<String, Error> {
        let functions = if offer_tools && !self.tools.is_empty() {
            Some(self.tools.specs())
        } else {
            None
        };

        let mut iterations = 0u32;

        loop {
            let request = ChatRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                functions: functions.clone(),
            };

            debug!(
                iteration = iterations,
                messages = request.messages.len(),
                "Calling completion provider"
            );
            let response = self.provider.complete(request).await?;

            let Some(choice) = response.first_choice() else {
                error!("Provider returned zero choices, treating as empty answer");
                return Ok(String::new());
            };

            if choice.finish_reason != FinishReason::ToolCall {
                return Ok(choice.message.content.clone().unwrap_or_default());
            }

            if iterations >= self.max_iterations {
                warn!(
                    iterations,
                    "Tool-call iteration bound reached, returning last response as-is"
                );
                return Ok(choice.message.content.clone().unwrap_or_default());
            }

            let call = choice.message.function_call.clone().ok_or_else(|| {
                ToolError::MalformedArguments {
                    tool_name: "<unnamed>".into(),
                    reason: "finish indicated a tool call but no function_call was present".into(),
                }
            })?;

            let result = self.resolve_tool_call(&call, ctx).await?;
            messages.push(Message::tool(&call.name, result));
            iterations += 1;
        }
    }

    /// Parse one tool-call request and dispatch it through the registry.
    async fn resolve_tool_call(
        &self,
        call: &FunctionCall,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let parsed: serde_json::Value =
            serde_json::from_str(&call.arguments).map_err(|e| ToolError::MalformedArguments {
                tool_name: call.name.clone(),
                reason: e.to_string(),
            })?;

        let arguments = parsed
            .as_object()
            .cloned()
            .ok_or_else(|| ToolError::MalformedArguments {
                tool_name: call.name.clone(),
                reason: "arguments are not a JSON object".into(),
            })?;

        debug!(tool = %call.name, "Resolving tool call");
        self.tools.invoke(&call.name, arguments, ctx).await
    }
}
