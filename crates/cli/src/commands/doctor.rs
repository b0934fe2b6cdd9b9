//! `samovar doctor` — check configuration and report what's enabled.

use anyhow::Context;
use samovar_config::AppConfig;
use samovar_memory::SqliteBackend;

fn status(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    println!("Samovar configuration");
    println!("  Model:              {}", config.model);
    println!("  API base:           {}", config.api_base);
    println!("  History budget:     {} tokens", config.max_history_tokens);
    println!("  Tool iterations:    {}", config.max_tool_iterations);
    println!(
        "  Search tool:        {}",
        status(config.search_api_key.is_some())
    );
    println!(
        "  Context reduction:  {}",
        status(config.classifier_api_key.is_some())
    );
    println!(
        "  Notes tools:        {}",
        status(config.embeddings_model.is_some())
    );
    println!(
        "  Slack:              {}",
        if config.slack_ready() {
            "ready"
        } else {
            "missing tokens"
        }
    );

    print!("  Persistence:        ");
    match SqliteBackend::new(&config.database_url).await {
        Ok(_) => println!("ok ({})", config.database_url),
        Err(e) => println!("UNREACHABLE — {e}"),
    }

    Ok(())
}
