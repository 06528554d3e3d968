// Claude Messages API streaming client using reqwest-eventsource.
//
// Requests are sent with `stream: true`; the Server-Sent Events are parsed
// into `LlmEvent`s and forwarded over an mpsc channel. `complete` drains that
// channel into a single `Completion` for callers that want the whole text.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::protocol::{Completion, LlmEvent, Prompt};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Prior turns sent with a request; older ones are dropped.
pub const MAX_HISTORY_TURNS: usize = 10;

const EVENT_BUFFER: usize = 64;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// What the client needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub connect_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// ClaudeClient
// ---------------------------------------------------------------------------

pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: String, connect_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    /// Send `prompt` and stream the response as `LlmEvent`s over `tx`.
    ///
    /// Failures are reported as an `LlmEvent::Error` on the channel, not as
    /// an `Err`. Returns when the stream completes, fails, or the receiver
    /// is dropped.
    pub async fn stream_message(
        &self,
        prompt: &Prompt,
        tx: mpsc::Sender<LlmEvent>,
    ) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: "API key not configured".to_string(),
                })
                .await;
            return Ok(());
        }

        let request = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body(&self.model, prompt));

        let mut es = match request.eventsource() {
            Ok(es) => es,
            Err(e) => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: format!("Failed to create event source: {e}"),
                    })
                    .await;
                return Ok(());
            }
        };

        let mut full_text = String::new();
        let mut input_tokens: u32 = 0;
        let mut output_tokens: u32 = 0;

        while let Some(event) = es.next().await {
            let msg = match event {
                Ok(Event::Open) => {
                    debug!("SSE connection opened");
                    continue;
                }
                Ok(Event::Message(msg)) => msg,
                Err(err) => {
                    warn!(?err, "SSE stream error");
                    let _ = tx
                        .send(LlmEvent::Error {
                            message: extract_error_message(&err),
                        })
                        .await;
                    es.close();
                    return Ok(());
                }
            };

            match msg.event.as_str() {
                "message_start" => {
                    if let Some(n) = parse_input_tokens(&msg.data) {
                        input_tokens = n;
                    }
                }
                "content_block_delta" => {
                    let Some(text) = parse_delta_text(&msg.data) else {
                        continue;
                    };
                    full_text.push_str(&text);
                    if tx.send(LlmEvent::Token { text }).await.is_err() {
                        es.close();
                        return Ok(());
                    }
                }
                "message_delta" => {
                    if let Some(n) = parse_output_tokens(&msg.data) {
                        output_tokens = n;
                    }
                }
                "message_stop" => {
                    info!(input_tokens, output_tokens, "completion finished");
                    let _ = tx
                        .send(LlmEvent::Complete {
                            full_text,
                            input_tokens,
                            output_tokens,
                        })
                        .await;
                    es.close();
                    return Ok(());
                }
                "error" => {
                    let message = parse_api_error(&msg.data)
                        .unwrap_or_else(|| "API reported an error".to_string());
                    warn!(%message, "error event in stream");
                    let _ = tx.send(LlmEvent::Error { message }).await;
                    es.close();
                    return Ok(());
                }
                other => debug!(event_type = other, "ignoring SSE event"),
            }
        }

        // Stream ended without message_stop.
        let event = if full_text.is_empty() {
            LlmEvent::Error {
                message: "Stream ended unexpectedly without any content".to_string(),
            }
        } else {
            LlmEvent::Complete {
                full_text,
                input_tokens,
                output_tokens,
            }
        };
        let _ = tx.send(event).await;
        Ok(())
    }
}

/// JSON body for a streaming Messages API request. Only the most recent
/// `MAX_HISTORY_TURNS` history entries are included.
pub(crate) fn request_body(model: &str, prompt: &Prompt) -> Value {
    let skip = prompt.history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut messages: Vec<Value> = prompt.history[skip..]
        .iter()
        .map(|m| serde_json::json!({ "role": m.role, "content": m.content }))
        .collect();
    messages.push(serde_json::json!({ "role": "user", "content": prompt.user }));
    serde_json::json!({
        "model": model,
        "max_tokens": prompt.max_tokens,
        "stream": true,
        "system": prompt.system,
        "messages": messages,
    })
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// Either a configured Claude client or a stand-in that reports the LLM as
/// not configured.
pub enum LlmClient {
    Active(ClaudeClient),
    Disabled,
}

impl LlmClient {
    /// `Active` when an API key is present, otherwise `Disabled`.
    pub fn from_settings(settings: &LlmSettings) -> anyhow::Result<Self> {
        match settings.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                let client = ClaudeClient::new(
                    key.to_string(),
                    settings.model.clone(),
                    Duration::from_secs(settings.connect_timeout_secs),
                )?;
                Ok(LlmClient::Active(client))
            }
            _ => {
                info!("no anthropic_api_key configured, LLM commentary disabled");
                Ok(LlmClient::Disabled)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }

    pub async fn stream_message(
        &self,
        prompt: &Prompt,
        tx: mpsc::Sender<LlmEvent>,
    ) -> anyhow::Result<()> {
        match self {
            LlmClient::Active(client) => client.stream_message(prompt, tx).await,
            LlmClient::Disabled => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: "LLM not configured".to_string(),
                    })
                    .await;
                Ok(())
            }
        }
    }

    /// Stream `prompt`, calling `on_token` for every delta, and return the
    /// finished text. An error event becomes an `Err`.
    pub async fn complete<F>(&self, prompt: &Prompt, mut on_token: F) -> anyhow::Result<Completion>
    where
        F: FnMut(&str) + Send,
    {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let producer = self.stream_message(prompt, tx);
        let consumer = async {
            let mut outcome = None;
            while let Some(event) = rx.recv().await {
                match event {
                    LlmEvent::Token { text } => on_token(&text),
                    LlmEvent::Complete {
                        full_text,
                        input_tokens,
                        output_tokens,
                    } => {
                        outcome = Some(Ok(Completion {
                            text: full_text,
                            input_tokens,
                            output_tokens,
                        }))
                    }
                    LlmEvent::Error { message } => outcome = Some(Err(anyhow!(message))),
                }
            }
            outcome
        };
        let (sent, outcome) = tokio::join!(producer, consumer);
        sent?;
        outcome.unwrap_or_else(|| Err(anyhow!("LLM stream closed without a result")))
    }
}

// ---------------------------------------------------------------------------
// Commentator seam
// ---------------------------------------------------------------------------

/// Anything that turns a prompt into narrative text. The app talks to this
/// trait so tests can substitute canned responses.
#[async_trait]
pub trait Commentator: Send + Sync {
    fn is_available(&self) -> bool;

    async fn narrate(&self, prompt: &Prompt) -> anyhow::Result<Completion>;
}

#[async_trait]
impl Commentator for LlmClient {
    fn is_available(&self) -> bool {
        self.is_enabled()
    }

    async fn narrate(&self, prompt: &Prompt) -> anyhow::Result<Completion> {
        self.complete(prompt, |_| {}).await
    }
}

// ---------------------------------------------------------------------------
// SSE JSON parsing helpers
// ---------------------------------------------------------------------------

/// `message.usage.input_tokens` from a `message_start` event.
pub(crate) fn parse_input_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.pointer("/message/usage/input_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// `delta.text` from a `content_block_delta` event.
pub(crate) fn parse_delta_text(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.pointer("/delta/text")?.as_str().map(str::to_string)
}

/// `usage.output_tokens` from a `message_delta` event.
pub(crate) fn parse_output_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.pointer("/usage/output_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// `error.message` from an `error` event.
pub(crate) fn parse_api_error(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.pointer("/error/message")?.as_str().map(str::to_string)
}

fn status_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "authentication failed, check anthropic_api_key".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "rate limited, wait a moment and retry".to_string(),
        other => format!("API returned status {other}"),
    }
}

fn extract_error_message(err: &reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _response) => status_message(*status),
        reqwest_eventsource::Error::Transport(e) if e.is_timeout() => {
            "Network timeout talking to the API".to_string()
        }
        reqwest_eventsource::Error::Transport(e) => format!("Network error: {e}"),
        other => format!("Stream error: {other}"),
    }
}
