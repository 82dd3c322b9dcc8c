//! Streaming chat completions from an OpenAI-compatible endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::watch;

use ziwei_config::LlmSettings;

use crate::error::{ServiceError, LLM_SERVICE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

/// Receives each content delta as it arrives. Returning
/// `ControlFlow::Break(())` stops the stream.
pub type DeltaSink<'a> = dyn FnMut(&str) -> ControlFlow<()> + Send + 'a;

/// Requests a running stream to stop. Cloned signals observe the same flag.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

/// Observed by a stream between network reads, so a stop takes effect even
/// while the server sends nothing.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Re-arms the handle before the next stream.
    pub fn reset(&self) {
        self.tx.send_replace(false);
    }
}

impl StopSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop is requested. Pends forever if the handle is
    /// dropped without stopping.
    pub async fn stopped(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|stopped| *stopped).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
pub trait LlmService: Send + Sync {
    /// Streams a completion into `sink` and returns the accumulated text,
    /// which is partial when `stop` fired or the sink interrupted the stream.
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        stop: &StopSignal,
        sink: &mut DeltaSink<'_>,
    ) -> Result<String, ServiceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Delta(String),
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = Self::parse_line(line.trim_end_matches(['\r', '\n'])) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        Self::parse_line(line.trim_end_matches('\r'))
    }

    fn parse_line(line: &str) -> Option<SseEvent> {
        let payload = line.strip_prefix("data:")?.trim();
        if payload.is_empty() {
            return None;
        }
        if payload == "[DONE]" {
            return Some(SseEvent::Done);
        }
        match serde_json::from_str::<StreamChunk>(payload) {
            Ok(chunk) => chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content)
                .filter(|c| !c.is_empty())
                .map(SseEvent::Delta),
            Err(e) => {
                log::warn!("skipping undecodable stream event: {e}");
                None
            }
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f32,
}

/// Client for `POST {base_url}/chat/completions` with `stream: true`.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
    temperature: f32,
    connect_timeout: Duration,
    chunk_timeout: Duration,
}

impl OpenAiCompatClient {
    pub fn new(settings: &LlmSettings, api_key: Option<String>) -> Result<Self, ServiceError> {
        // No total timeout: a long answer may stream for minutes. Silence
        // between chunks is bounded instead.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| ServiceError::Request {
                service: LLM_SERVICE,
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            api_key_env: settings.api_key_env.clone(),
            temperature: settings.temperature,
            connect_timeout: settings.connect_timeout,
            chunk_timeout: settings.chunk_timeout,
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, ServiceError> {
        Self::new(settings, settings.api_key())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn map_err(&self, e: reqwest::Error, secs: u64) -> ServiceError {
        ServiceError::from_reqwest(LLM_SERVICE, &self.base_url, secs, e)
    }

    async fn next_chunk(
        &self,
        response: &mut reqwest::Response,
    ) -> Result<Option<Vec<u8>>, ServiceError> {
        let secs = self.chunk_timeout.as_secs();
        match tokio::time::timeout(self.chunk_timeout, response.chunk()).await {
            Ok(result) => result
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
                .map_err(|e| self.map_err(e, secs)),
            Err(_) => Err(ServiceError::Timeout {
                service: LLM_SERVICE,
                secs,
            }),
        }
    }
}

#[async_trait]
impl LlmService for OpenAiCompatClient {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        stop: &StopSignal,
        sink: &mut DeltaSink<'_>,
    ) -> Result<String, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| ServiceError::MissingApiKey {
            env: self.api_key_env.clone(),
        })?;

        let body = CompletionRequest {
            model,
            messages,
            stream: true,
            temperature: self.temperature,
        };
        log::info!("streaming {} messages to {model}", messages.len());

        let request = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send();
        let mut response = tokio::select! {
            biased;
            _ = stop.stopped() => return Ok(String::new()),
            sent = request => sent.map_err(|e| self.map_err(e, self.connect_timeout.as_secs()))?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::HttpStatus {
                service: LLM_SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let mut decoder = SseDecoder::new();
        let mut text = String::new();
        loop {
            let read = tokio::select! {
                biased;
                _ = stop.stopped() => None,
                chunk = self.next_chunk(&mut response) => Some(chunk?),
            };
            let Some(read) = read else {
                log::info!("stream stopped after {} chars", text.chars().count());
                return Ok(text);
            };
            // End of body.
            let Some(bytes) = read else {
                break;
            };
            for event in decoder.push(&bytes) {
                match event {
                    SseEvent::Delta(_) if stop.is_stopped() => return Ok(text),
                    SseEvent::Delta(delta) => {
                        text.push_str(&delta);
                        if sink(&delta).is_break() {
                            log::info!("stream interrupted after {} chars", text.chars().count());
                            return Ok(text);
                        }
                    }
                    SseEvent::Done => return Ok(text),
                }
            }
        }
        // Body ended without [DONE]; flush a trailing unterminated line.
        if let Some(SseEvent::Delta(delta)) = decoder.finish() {
            text.push_str(&delta);
            let _ = sink(&delta);
        }
        Ok(text)
    }
}
