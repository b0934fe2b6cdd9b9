//! Web search tool backed by the Bing Web Search v7 API.
//!
//! Returns "{title}: {snippet}" per result page, joined by blank lines —
//! a plain-text digest the model can quote from directly.

use async_trait::async_trait;
use samovar_core::error::ToolError;
use samovar_core::tool::{Tool, ToolContext};
use serde::Deserialize;
use tracing::debug;

const BING_SEARCH_URL: &str = "https://api.bing.microsoft.com/v7.0/search";

pub struct BingSearchTool {
    api_key: String,
    client: reqwest::Client,
}

impl BingSearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn execution_error(reason: impl std::fmt::Display) -> ToolError {
        ToolError::Execution {
            tool_name: "search".into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages", default)]
    web_pages: Option<BingWebPages>,
}

#[derive(Debug, Default, Deserialize)]
struct BingWebPages {
    #[serde(default)]
    value: Vec<BingPage>,
}

#[derive(Debug, Deserialize)]
struct BingPage {
    name: String,
    snippet: String,
}

fn format_results(pages: &[BingPage]) -> String {
    if pages.is_empty() {
        return "No results found".to_string();
    }
    pages
        .iter()
        .map(|p| format!("{}: {}", p.name, p.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for BingSearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search using search engine, useful when requires recent knowledge"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Query to search"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
        _ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Self::execution_error("missing 'query' argument"))?;

        debug!(query, "Running web search");

        let response = self
            .client
            .get(BING_SEARCH_URL)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(Self::execution_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::execution_error(format!("HTTP {status}: {body}")));
        }

        let parsed: BingResponse = response
            .json()
            .await
            .map_err(|e| Self::execution_error(format!("invalid response: {e}")))?;

        Ok(format_results(
            &parsed.web_pages.unwrap_or_default().value,
        ))
    }
}
