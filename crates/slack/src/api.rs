//! Slack Web API client.
//!
//! Covers the three calls the bridge needs: posting a (threaded) reply,
//! fetching a user's profile, and fetching workspace info. Slack reports
//! failures in-band with `{"ok": false, "error": "..."}` on HTTP 200, so
//! every response is checked for the `ok` flag, not just the status code.

use crate::SlackError;
use samovar_core::profile::{Team, UserProfile};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const CHAT_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";
const USERS_PROFILE_GET_URL: &str = "https://slack.com/api/users.profile.get";
const TEAM_INFO_URL: &str = "https://slack.com/api/team.info";

pub struct SlackApiClient {
    bot_token: String,
    base_url: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    profile: Option<UserProfile>,
    #[serde(default)]
    team: Option<Team>,
}

impl SlackApiClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            base_url: None,
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different API host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    fn url(&self, default: &str) -> String {
        match &self.base_url {
            Some(base) => {
                let method = default.rsplit('/').next().unwrap_or(default);
                format!("{base}/{method}")
            }
            None => default.to_string(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<ApiEnvelope, SlackError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("HTTP {status}: {body}")));
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| SlackError::Api(format!("invalid response: {e}")))?;

        if !envelope.ok {
            return Err(SlackError::Api(
                envelope.error.unwrap_or_else(|| "unknown_error".into()),
            ));
        }
        Ok(envelope)
    }

    /// Post a message, threaded when `thread_ts` is given.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), SlackError> {
        let mut payload = json!({
            "channel": channel,
            "text": text,
        });
        if let Some(ts) = thread_ts {
            payload["thread_ts"] = json!(ts);
        }

        debug!(channel, thread_ts = ?thread_ts, "Posting Slack reply");

        let response = self
            .client
            .post(self.url(CHAT_POST_MESSAGE_URL))
            .bearer_auth(&self.bot_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SlackError::Api(e.to_string()))?;

        Self::check(response).await.map(|_| ())
    }

    /// Fetch a user's profile fields.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, SlackError> {
        let response = self
            .client
            .get(self.url(USERS_PROFILE_GET_URL))
            .bearer_auth(&self.bot_token)
            .query(&[("user", user_id)])
            .send()
            .await
            .map_err(|e| SlackError::Api(e.to_string()))?;

        Self::check(response)
            .await?
            .profile
            .ok_or_else(|| SlackError::Api("users.profile.get returned no profile".into()))
    }

    /// Fetch workspace info.
    pub async fn team_info(&self) -> Result<Team, SlackError> {
        let response = self
            .client
            .get(self.url(TEAM_INFO_URL))
            .bearer_auth(&self.bot_token)
            .send()
            .await
            .map_err(|e| SlackError::Api(e.to_string()))?;

        Self::check(response)
            .await?
            .team
            .ok_or_else(|| SlackError::Api("team.info returned no team".into()))
    }
}
