//! Wire envelopes.
//!
//! Every unit exchanged with a peer is a flat JSON object carrying the
//! sender's `host:port`. Four shapes are in use:
//!
//! - greeting: `{"host": ".."}`
//! - application message: `{"host": "..", "message": ".."}`
//! - heartbeat ping: `{"host": "..", "type": "heartbeat", "ping": ".."}`
//! - heartbeat pong: `{"host": "..", "type": "heartbeat", "ping-response": ".."}`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{P2pError, P2pResult};

/// Value of the `type` field on heartbeat envelopes.
pub const TYPE_HEARTBEAT: &str = "heartbeat";

/// A single envelope as it travels over the wire.
///
/// Unknown fields are ignored on decode so peers may attach extra data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Sender identity as `host:port`.
    #[serde(default)]
    pub host: String,

    /// Envelope type. Only `heartbeat` is meaningful.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Application message text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Heartbeat ping, carrying the pinger's `host:port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping: Option<String>,

    /// Heartbeat pong, carrying the responder's `host:port`.
    #[serde(
        rename = "ping-response",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ping_response: Option<String>,
}

/// Heartbeat payload of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heartbeat<'a> {
    /// Liveness probe; the receiver must answer with a pong.
    Ping(&'a str),
    /// Answer to a ping.
    Pong(&'a str),
}

impl Envelope {
    /// Greeting sent to a freshly accepted peer.
    pub fn greeting(host: &str) -> Self {
        Self {
            host: host.to_string(),
            ..Default::default()
        }
    }

    /// Application message.
    pub fn message(host: &str, text: impl Into<String>) -> Self {
        Self {
            host: host.to_string(),
            message: Some(text.into()),
            ..Default::default()
        }
    }

    /// Heartbeat ping.
    pub fn ping(host: &str) -> Self {
        Self {
            host: host.to_string(),
            kind: Some(TYPE_HEARTBEAT.to_string()),
            ping: Some(host.to_string()),
            ..Default::default()
        }
    }

    /// Heartbeat pong.
    pub fn pong(host: &str) -> Self {
        Self {
            host: host.to_string(),
            kind: Some(TYPE_HEARTBEAT.to_string()),
            ping_response: Some(host.to_string()),
            ..Default::default()
        }
    }

    /// Parse an envelope from one line of JSON.
    pub fn from_json(raw: &str) -> P2pResult<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(P2pError::InvalidEnvelope(format!(
                "expected a JSON object, got `{}`",
                raw.trim()
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to a single line of JSON (no trailing newline).
    pub fn to_json(&self) -> P2pResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether the envelope belongs to the heartbeat protocol.
    pub fn is_heartbeat(&self) -> bool {
        self.kind.as_deref() == Some(TYPE_HEARTBEAT)
    }

    /// Heartbeat view of the envelope. A ping wins if both fields are set.
    pub fn heartbeat(&self) -> Option<Heartbeat<'_>> {
        if !self.is_heartbeat() {
            return None;
        }
        if let Some(ping) = self.ping.as_deref() {
            return Some(Heartbeat::Ping(ping));
        }
        self.ping_response.as_deref().map(Heartbeat::Pong)
    }

    /// Whether this is a heartbeat ping that expects a pong.
    pub fn is_ping(&self) -> bool {
        matches!(self.heartbeat(), Some(Heartbeat::Ping(_)))
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.heartbeat() {
            Some(Heartbeat::Ping(_)) => write!(f, "ping from {}", self.host),
            Some(Heartbeat::Pong(_)) => write!(f, "pong from {}", self.host),
            None => match &self.message {
                Some(text) => write!(f, "message from {}: {}", self.host, text),
                None => write!(f, "greeting from {}", self.host),
            },
        }
    }
}
