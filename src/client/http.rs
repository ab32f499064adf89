//! HTTP client for the daemon's message contract

use std::{collections::VecDeque, time::Duration};
use reqwest::{Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use super::sse::SseParser;
use crate::{
    protocol::{Ack, Command, PushEvent, Reply},
    state::{CompletionAlert, TimerSnapshot},
};

/// Client-side errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Cannot reach the daemon at {url} (is `pomodoro-keeper serve` running?): {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Daemon returned {status} for {path}")]
    Status { status: StatusCode, path: String },

    #[error("Unexpected reply from daemon: {0}")]
    Protocol(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Thin wrapper over the daemon's HTTP endpoints
#[derive(Debug, Clone)]
pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn checked(&self, path: &str, result: reqwest::Result<Response>) -> Result<Response, ClientError> {
        let response = result.map_err(|source| {
            if source.is_connect() {
                ClientError::Unreachable {
                    url: self.base_url.clone(),
                    source,
                }
            } else {
                ClientError::Http(source)
            }
        })?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status(),
                path: path.to_string(),
            });
        }
        Ok(response)
    }

    /// Send one tagged command
    pub async fn send(&self, command: &Command) -> Result<Reply, ClientError> {
        debug!("Sending {}", command.name());
        let result = self.http.post(self.url("/message")).json(command).send().await;
        let response = self.checked("/message", result)?;
        Ok(response.json::<Reply>().await?)
    }

    /// Send a state-changing command and return its acknowledgment
    pub async fn command(&self, command: &Command) -> Result<Ack, ClientError> {
        match self.send(command).await? {
            Reply::Ack(ack) => Ok(ack),
            Reply::State(_) => Err(ClientError::Protocol(format!(
                "{} answered with a timer state",
                command.name()
            ))),
        }
    }

    /// Fetch the current snapshot
    pub async fn timer_state(&self) -> Result<TimerSnapshot, ClientError> {
        match self.send(&Command::GetTimerState).await? {
            Reply::State(snapshot) => Ok(snapshot),
            Reply::Ack(_) => Err(ClientError::Protocol(
                "getTimerState answered with an acknowledgment".to_string(),
            )),
        }
    }

    /// Alert currently on display
    pub async fn alert(&self) -> Result<Option<CompletionAlert>, ClientError> {
        let result = self.http.get(self.url("/alert")).send().await;
        let response = self.checked("/alert", result)?;
        Ok(response.json().await?)
    }

    pub async fn dismiss_alert(&self, id: u64) -> Result<Ack, ClientError> {
        self.alert_action(id, "dismiss").await
    }

    pub async fn start_another(&self, id: u64) -> Result<Ack, ClientError> {
        self.alert_action(id, "start-another").await
    }

    async fn alert_action(&self, id: u64, action: &str) -> Result<Ack, ClientError> {
        let path = format!("/alert/{}/{}", id, action);
        let result = self.http.post(self.url(&path)).send().await;
        let response = self.checked(&path, result)?;
        Ok(response.json().await?)
    }

    /// Open the push stream
    pub async fn events(&self) -> Result<EventStream, ClientError> {
        let result = self
            .http
            .get(self.url("/events"))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await;
        let response = self.checked("/events", result)?;
        Ok(EventStream::new(response))
    }
}

/// Decoded push events read from an open `/events` response
pub struct EventStream {
    response: Response,
    /// Bytes after the last complete line
    partial: Vec<u8>,
    parser: SseParser,
    ready: VecDeque<PushEvent>,
}

impl EventStream {
    fn new(response: Response) -> Self {
        Self {
            response,
            partial: Vec::new(),
            parser: SseParser::new(),
            ready: VecDeque::new(),
        }
    }

    /// Next event, or `None` once the daemon closes the stream
    pub async fn next(&mut self) -> Result<Option<PushEvent>, ClientError> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Ok(Some(event));
            }

            let Some(chunk) = self.response.chunk().await? else {
                return Ok(None);
            };
            self.partial.extend_from_slice(&chunk);

            // Only decode whole lines; a multi-byte character may straddle chunks
            let Some(end) = self.partial.iter().rposition(|b| *b == b'\n') else {
                continue;
            };
            let lines: Vec<u8> = self.partial.drain(..=end).collect();
            let text = String::from_utf8_lossy(&lines);

            for frame in self.parser.feed(&text) {
                match PushEvent::from_parts(&frame.event, &frame.data) {
                    Ok(event) => self.ready.push_back(event),
                    Err(e) => warn!("Skipping unreadable {} event: {}", frame.event, e),
                }
            }
        }
    }
}
