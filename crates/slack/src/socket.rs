//! Inbound events via Slack Socket Mode.
//!
//! Flow: `apps.connections.open` yields a WebSocket URL; every received
//! envelope carrying an `envelope_id` is acked immediately; `events_api`
//! envelopes holding plain user `message` events are surfaced to the bridge.
//! Bot echoes and subtyped events (edits, joins, ...) are dropped here so
//! the bridge only ever sees real user messages.

use crate::SlackError;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

const SOCKET_OPEN_URL: &str = "https://slack.com/api/apps.connections.open";
const RECONNECT_DELAY_SECS: u64 = 2;

/// A user message event as the bridge consumes it.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub user_id: String,
    pub channel_id: String,
    pub text: String,
    pub ts: String,
    pub thread_ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SocketOpenResponse {
    ok: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SocketEnvelope {
    #[serde(default)]
    envelope_id: Option<String>,
    #[serde(rename = "type")]
    envelope_type: String,
    #[serde(default)]
    payload: Option<SocketPayload>,
}

#[derive(Debug, Deserialize)]
struct SocketPayload {
    #[serde(default)]
    event: Option<SlackEvent>,
}

#[derive(Debug, Deserialize)]
struct SlackEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    thread_ts: Option<String>,
}

struct ParsedSocketMessage {
    ack: Option<String>,
    event: Option<MessageEvent>,
}

/// Socket Mode connection manager. `start` spawns the read loop and hands
/// back a receiver of user message events.
pub struct SocketModeListener {
    app_token: String,
    client: reqwest::Client,
}

impl SocketModeListener {
    pub fn new(app_token: impl Into<String>) -> Self {
        Self {
            app_token: app_token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Start listening. The returned receiver yields one `MessageEvent`
    /// per inbound user message until the task is dropped.
    pub fn start(&self) -> mpsc::Receiver<MessageEvent> {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(Self::run_loop(
            self.client.clone(),
            self.app_token.clone(),
            tx,
        ));
        rx
    }

    async fn open_socket_url(
        client: &reqwest::Client,
        app_token: &str,
    ) -> Result<String, SlackError> {
        let response = client
            .post(SOCKET_OPEN_URL)
            .bearer_auth(app_token)
            .send()
            .await
            .map_err(|e| SlackError::Socket(format!("apps.connections.open failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SlackError::Socket(format!("failed to read open response: {e}")))?;

        if !status.is_success() {
            return Err(SlackError::Socket(format!("HTTP {status}: {body}")));
        }

        let parsed: SocketOpenResponse = serde_json::from_str(&body)
            .map_err(|e| SlackError::Socket(format!("invalid open response: {e}")))?;

        if !parsed.ok {
            return Err(SlackError::Socket(format!(
                "apps.connections.open failed: {}",
                parsed.error.unwrap_or_else(|| "unknown_error".into())
            )));
        }

        parsed
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| SlackError::Socket("open response missing URL".into()))
    }

    fn parse_socket_message(raw: &str) -> Result<ParsedSocketMessage, SlackError> {
        let envelope: SocketEnvelope = serde_json::from_str(raw)
            .map_err(|e| SlackError::Socket(format!("invalid socket payload: {e}")))?;

        let ack = envelope
            .envelope_id
            .as_deref()
            .map(|id| json!({ "envelope_id": id }).to_string());
        let event = Self::extract_message_event(&envelope);

        Ok(ParsedSocketMessage { ack, event })
    }

    fn extract_message_event(envelope: &SocketEnvelope) -> Option<MessageEvent> {
        if envelope.envelope_type != "events_api" {
            return None;
        }

        let event = envelope.payload.as_ref()?.event.as_ref()?;
        if event.event_type != "message" {
            return None;
        }
        // Edits, joins, and our own replies come with a subtype or bot_id.
        if event.subtype.is_some() || event.bot_id.is_some() {
            return None;
        }

        let user_id = event.user.as_deref()?.trim().to_string();
        let channel_id = event.channel.as_deref()?.trim().to_string();
        let text = event.text.as_deref()?.to_string();
        let ts = event.ts.as_deref()?.trim().to_string();
        if user_id.is_empty() || channel_id.is_empty() || ts.is_empty() {
            return None;
        }

        Some(MessageEvent {
            user_id,
            channel_id,
            text,
            ts,
            thread_ts: event
                .thread_ts
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from),
        })
    }

    async fn run_loop(
        client: reqwest::Client,
        app_token: String,
        tx: mpsc::Sender<MessageEvent>,
    ) {
        loop {
            let socket_url = match Self::open_socket_url(&client, &app_token).await {
                Ok(url) => url,
                Err(e) => {
                    warn!("Socket Mode open failed: {e}");
                    tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)).await;
                    continue;
                }
            };

            let ws_stream = match connect_async(&socket_url).await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!("Socket Mode websocket connect failed: {e}");
                    tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)).await;
                    continue;
                }
            };

            info!("Slack Socket Mode connected");
            let (mut ws_writer, mut ws_reader) = ws_stream.split();

            while let Some(next) = ws_reader.next().await {
                match next {
                    Ok(WsMessage::Text(raw)) => match Self::parse_socket_message(&raw) {
                        Ok(parsed) => {
                            if let Some(ack) = parsed.ack {
                                if let Err(e) = ws_writer.send(WsMessage::Text(ack.into())).await {
                                    warn!("Socket Mode ack send failed: {e}");
                                    break;
                                }
                            }
                            if let Some(event) = parsed.event {
                                if tx.send(event).await.is_err() {
                                    info!("Event receiver dropped, stopping Socket Mode");
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            debug!("Ignoring Slack socket payload: {e}");
                        }
                    },
                    Ok(WsMessage::Ping(payload)) => {
                        if let Err(e) = ws_writer.send(WsMessage::Pong(payload)).await {
                            warn!("Socket Mode pong send failed: {e}");
                            break;
                        }
                    }
                    Ok(WsMessage::Close(frame)) => {
                        info!("Socket Mode closed by server: {frame:?}");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Socket Mode stream error: {e}");
                        break;
                    }
                }
            }

            tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)).await;
            info!("Reconnecting Slack Socket Mode");
        }
    }
}
