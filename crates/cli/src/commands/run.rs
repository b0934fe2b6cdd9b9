//! `samovar run` — wire everything together and serve Slack messages.

use anyhow::{bail, Context};
use samovar_agent::{CompletionOrchestrator, ContextReducer, MessagePipeline};
use samovar_config::AppConfig;
use samovar_core::provider::CompletionProvider;
use samovar_memory::{ConversationStore, SqliteBackend};
use samovar_providers::{OpenAiCompatProvider, ZeroShotClassifier};
use samovar_slack::{SlackApiClient, SlackBridge, SocketModeListener};
use samovar_tools::registry_from_config;
use std::sync::Arc;
use tracing::info;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    if !config.slack_ready() {
        bail!("Slack tokens missing: set SLACK_BOT_TOKEN and SLACK_APP_TOKEN");
    }

    let backend = SqliteBackend::new(&config.database_url)
        .await
        .context("Failed to open persistence backend")?;
    let store = Arc::new(ConversationStore::new(
        Arc::new(backend),
        config.max_history_tokens,
    ));

    let provider: Arc<dyn CompletionProvider> = Arc::new(OpenAiCompatProvider::new(
        &config.api_base,
        config.api_key.clone().unwrap_or_default(),
    ));

    let registry = Arc::new(registry_from_config(&config, provider.clone()));
    info!(tools = ?registry.names(), "Tool registry built");

    let reducer = match &config.classifier_api_key {
        Some(key) if !key.is_empty() => {
            info!("Classifier credential found, context reduction enabled");
            ContextReducer::new(Arc::new(ZeroShotClassifier::new(key)))
        }
        _ => ContextReducer::disabled(),
    };

    let orchestrator = CompletionOrchestrator::new(
        provider,
        registry,
        config.model.clone(),
        config.max_tool_iterations,
    );
    let pipeline = Arc::new(MessagePipeline::new(store.clone(), reducer, orchestrator));

    let api = SlackApiClient::new(config.slack_bot_token.clone().unwrap_or_default());
    let listener = SocketModeListener::new(config.slack_app_token.clone().unwrap_or_default());

    info!(model = %config.model, "Starting Samovar");
    SlackBridge::new(api, listener, store, pipeline).run().await;

    Ok(())
}
