//! Message contract between clients and the daemon
//!
//! Commands use the tagged form `{"action": "startTimer", "minutes": 25}`.
//! Push events travel over the SSE stream as `event: <name>` plus a JSON
//! `data:` line, and are modelled here as an adjacently tagged enum so the
//! same type serves both ends.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::state::{alert::CompletionAlert, machine::DEFAULT_MINUTES, TimerSnapshot};

/// Commands a client may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    GetTimerState,
    StartTimer {
        #[serde(
            default,
            deserialize_with = "lenient_minutes",
            skip_serializing_if = "Option::is_none"
        )]
        minutes: Option<u64>,
    },
    PauseTimer,
    ResetTimer {
        #[serde(
            default,
            deserialize_with = "lenient_minutes",
            skip_serializing_if = "Option::is_none"
        )]
        minutes: Option<u64>,
    },
    UpdateMinutes {
        #[serde(default, deserialize_with = "lenient_minutes")]
        minutes: Option<u64>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetTimerState => "getTimerState",
            Command::StartTimer { .. } => "startTimer",
            Command::PauseTimer => "pauseTimer",
            Command::ResetTimer { .. } => "resetTimer",
            Command::UpdateMinutes { .. } => "updateMinutes",
        }
    }
}

/// Body accepted by the REST-style command endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinutesPayload {
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub minutes: Option<u64>,
}

/// Acknowledgment for state-changing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn failed() -> Self {
        Self { success: false }
    }
}

/// Reply to any command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    State(TimerSnapshot),
    Ack(Ack),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionComplete {
    pub configured_minutes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCleared {
    pub id: u64,
}

/// Events pushed from the daemon to every connected client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum PushEvent {
    TimerUpdate(TimerSnapshot),
    /// A session just finished; clients that can make sound play the cue
    SessionComplete(SessionComplete),
    Alert(CompletionAlert),
    AlertCleared(AlertCleared),
}

impl PushEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::TimerUpdate(_) => "timerUpdate",
            PushEvent::SessionComplete(_) => "sessionComplete",
            PushEvent::Alert(_) => "alert",
            PushEvent::AlertCleared(_) => "alertCleared",
        }
    }

    /// SSE data payload
    pub fn data(&self) -> serde_json::Result<String> {
        match self {
            PushEvent::TimerUpdate(snapshot) => serde_json::to_string(snapshot),
            PushEvent::SessionComplete(done) => serde_json::to_string(done),
            PushEvent::Alert(alert) => serde_json::to_string(alert),
            PushEvent::AlertCleared(cleared) => serde_json::to_string(cleared),
        }
    }

    /// Rebuild an event from its SSE name and data
    pub fn from_parts(name: &str, data: &str) -> serde_json::Result<Self> {
        let data: Value = serde_json::from_str(data)?;
        serde_json::from_value(serde_json::json!({ "event": name, "data": data }))
    }
}

/// Interpret a client-supplied minutes value.
///
/// Absent or `null` means "not given". Positive integers, and strings or
/// numbers with a leading positive integer, are taken as whole minutes.
/// Anything else falls back to the default session length.
pub fn parse_minutes(value: &Value) -> Option<u64> {
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 1.0).map(|f| f as u64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    };

    Some(parsed.filter(|m| *m > 0).unwrap_or(DEFAULT_MINUTES))
}

fn leading_integer(s: &str) -> Option<u64> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_minutes(&value))
}
