//! The bridge handler: one Slack message event in, one threaded reply out.
//!
//! Responsibilities at this boundary (everything the core doesn't do):
//! deriving the conversation key from channel + thread, stripping the bot
//! mention, fetching and caching the sender's profile, formatting the
//! profile system prompt, and replying inside the originating thread. A
//! pipeline failure is logged and produces no reply — the bridge never
//! fabricates content.

use crate::api::SlackApiClient;
use crate::socket::{MessageEvent, SocketModeListener};
use regex::Regex;
use samovar_agent::MessagePipeline;
use samovar_core::message::ConversationId;
use samovar_core::profile::UserProfile;
use samovar_core::tool::ToolContext;
use samovar_memory::ConversationStore;
use std::sync::{Arc, LazyLock};
use tracing::{debug, error, info};

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<@.*?> ").expect("mention pattern compiles"));

/// Strip bot-mention tokens (`<@U...> `) from a message.
pub fn strip_mention(text: &str) -> String {
    MENTION.replace_all(text, "").into_owned()
}

/// Derive the conversation key and reply thread from an event.
///
/// Messages outside a thread start one rooted at their own `ts`.
pub fn conversation_key(event: &MessageEvent) -> (ConversationId, String) {
    let thread = event
        .thread_ts
        .clone()
        .unwrap_or_else(|| event.ts.clone());
    (
        ConversationId(format!("{}_{}", event.channel_id, thread)),
        thread,
    )
}

pub struct SlackBridge {
    api: Arc<SlackApiClient>,
    listener: SocketModeListener,
    store: Arc<ConversationStore>,
    pipeline: Arc<MessagePipeline>,
}

impl SlackBridge {
    pub fn new(
        api: SlackApiClient,
        listener: SocketModeListener,
        store: Arc<ConversationStore>,
        pipeline: Arc<MessagePipeline>,
    ) -> Self {
        Self {
            api: Arc::new(api),
            listener,
            store,
            pipeline,
        }
    }

    /// Listen for events until the process stops. Each event is handled on
    /// its own task; the pipeline itself is strictly sequential per event.
    pub async fn run(self) {
        let mut events = self.listener.start();
        info!("Slack bridge running");

        while let Some(event) = events.recv().await {
            let api = self.api.clone();
            let store = self.store.clone();
            let pipeline = self.pipeline.clone();
            tokio::spawn(async move {
                Self::handle_event(api, store, pipeline, event).await;
            });
        }
    }

    /// Fetch-and-cache the sender's profile (original behavior: one fetch,
    /// cached until explicitly cleared).
    async fn ensure_profile(
        api: &SlackApiClient,
        store: &ConversationStore,
        user_id: &str,
    ) -> Option<UserProfile> {
        match store.get_profile(user_id).await {
            Ok(Some(profile)) => return Some(profile),
            Ok(None) => {}
            Err(e) => {
                error!(user_id, error = %e, "Profile lookup failed");
                return None;
            }
        }

        let mut profile = match api.fetch_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(user_id, error = %e, "Profile fetch failed");
                return None;
            }
        };
        match api.team_info().await {
            Ok(team) => profile.team = Some(team),
            Err(e) => {
                error!(error = %e, "Team info fetch failed");
            }
        }

        if let Err(e) = store.set_profile(user_id, &profile).await {
            error!(user_id, error = %e, "Profile cache write failed");
        }
        debug!(user_id, "User profile initialized");
        Some(profile)
    }

    async fn handle_event(
        api: Arc<SlackApiClient>,
        store: Arc<ConversationStore>,
        pipeline: Arc<MessagePipeline>,
        event: MessageEvent,
    ) {
        let (conversation, thread) = conversation_key(&event);
        let text = strip_mention(&event.text);

        debug!(
            conversation = %conversation,
            user = %event.user_id,
            "Processing Slack message"
        );

        let system_prompt = Self::ensure_profile(&api, &store, &event.user_id)
            .await
            .map(|p| p.system_prompt());

        let ctx = ToolContext::for_user(&event.user_id);
        let reply = match pipeline
            .handle(&conversation, &text, system_prompt, &ctx)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!(conversation = %conversation, error = %e, "Pipeline failed, not replying");
                return;
            }
        };

        if let Err(e) = api
            .post_message(&event.channel_id, &reply, Some(&thread))
            .await
        {
            error!(conversation = %conversation, error = %e, "Reply delivery failed");
        }
    }
}
