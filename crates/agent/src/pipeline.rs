//! The per-message pipeline: store → reducer → orchestrator → store.
//!
//! One instance serves the whole process; each inbound message runs the
//! sequence once. The caller supplies the conversation key, the cleaned
//! message text, and the optional system prompt (user profile) injected
//! *after* reduction — the reducer only ever sees prior user/assistant/tool
//! turns.

use crate::orchestrator::CompletionOrchestrator;
use crate::reducer::ContextReducer;
use samovar_core::error::Error;
use samovar_core::intent::Intent;
use samovar_core::message::{ConversationId, Message};
use samovar_core::tool::ToolContext;
use samovar_memory::ConversationStore;
use std::sync::Arc;
use tracing::{info, warn};

pub struct MessagePipeline {
    store: Arc<ConversationStore>,
    reducer: ContextReducer,
    orchestrator: CompletionOrchestrator,
}

impl MessagePipeline {
    pub fn new(
        store: Arc<ConversationStore>,
        reducer: ContextReducer,
        orchestrator: CompletionOrchestrator,
    ) -> Self {
        Self {
            store,
            reducer,
            orchestrator,
        }
    }

    /// Process one inbound message and return the reply text.
    ///
    /// Store, provider, and tool failures abort the request and propagate;
    /// no content is fabricated. A classifier outage is the one soft spot:
    /// the request proceeds with the unreduced history.
    pub async fn handle(
        &self,
        conversation: &ConversationId,
        text: &str,
        system_prompt: Option<String>,
        ctx: &ToolContext,
    ) -> Result<String, Error> {
        self.store
            .write(conversation, Message::user(text))
            .await?;
        let history = self.store.read(conversation).await?;

        info!(
            conversation = %conversation,
            history = history.len(),
            "Processing message"
        );

        let (mut history, intent) = match self.reducer.reduce(history.clone()).await {
            Ok(reduced) => reduced,
            Err(e) => {
                warn!(error = %e, "Intent classifier unavailable, proceeding unreduced");
                (history, None)
            }
        };

        if let Some(prompt) = system_prompt {
            history.insert(0, Message::system(prompt));
        }

        // Small talk doesn't get tools — a cost call, not a correctness one.
        let offer_tools = !matches!(intent, Some(Intent::Casual));

        let reply = self.orchestrator.complete(history, offer_tools, ctx).await?;

        self.store
            .write(conversation, Message::assistant(reply.clone()))
            .await?;

        Ok(reply)
    }
}
