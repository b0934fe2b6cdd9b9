//! Zero-shot intent classifier client.
//!
//! Classifies the latest user message against a fixed label set via the
//! Hugging Face inference API (`facebook/bart-large-mnli`). Only the top
//! label matters to the caller; `"casual"` triggers context reduction and
//! tool suppression.

use async_trait::async_trait;
use samovar_core::error::ClassifierError;
use samovar_core::intent::{Intent, IntentClassifier};
use serde::Deserialize;
use tracing::debug;

const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-mnli";

/// The label set offered to the zero-shot model. The reducer only branches
/// on "casual"; the rest exist to give the model a real choice.
const CANDIDATE_LABELS: [&str; 3] = ["casual", "question", "request"];

/// An intent classifier backed by a hosted zero-shot NLI model.
pub struct ZeroShotClassifier {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl ZeroShotClassifier {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client,
        }
    }
}

#[derive(Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
}

#[async_trait]
impl IntentClassifier for ZeroShotClassifier {
    async fn classify(&self, text: &str) -> Result<Intent, ClassifierError> {
        let body = serde_json::json!({
            "inputs": text,
            "parameters": { "candidate_labels": CANDIDATE_LABELS },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Unavailable(format!(
                "HTTP {status}: {body}"
            )));
        }

        let parsed: ZeroShotResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Unavailable(format!("Invalid response: {e}")))?;

        // Labels come back sorted by score, highest first.
        let top = parsed
            .labels
            .first()
            .ok_or_else(|| ClassifierError::Unavailable("Empty label list".into()))?;

        debug!(label = %top, "Classified message intent");
        Ok(Intent::from_label(top))
    }
}
