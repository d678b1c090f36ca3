//! Drainable record of inbound, outbound and system events.
//!
//! The log is the single observation point for whatever displays node
//! activity. Entries are drained destructively in insertion order.

use std::collections::VecDeque;
use std::fmt;
use std::net::SocketAddr;

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Free-form event text (outbound envelopes, errors, lifecycle).
    Text(String),
    /// A payload tied to a remote address (inbound envelopes, admissions).
    Payload {
        /// Raw payload or event label.
        payload: String,
        /// Remote address the payload relates to.
        peer: SocketAddr,
    },
}

impl LogEntry {
    /// Remote address, if the entry has one.
    pub fn peer(&self) -> Option<SocketAddr> {
        match self {
            LogEntry::Text(_) => None,
            LogEntry::Payload { peer, .. } => Some(*peer),
        }
    }

    /// Text or payload of the entry.
    pub fn text(&self) -> &str {
        match self {
            LogEntry::Text(text) => text,
            LogEntry::Payload { payload, .. } => payload,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Text(text) => write!(f, "{}", text),
            LogEntry::Payload { payload, peer } => write!(f, "[{}] {}", peer, payload),
        }
    }
}

/// Unbounded, insertion-ordered message log.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
    }

    /// Append free-form text.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.push(LogEntry::Text(text.into()));
    }

    /// Append a payload tied to a remote address.
    pub fn push_payload(&mut self, payload: impl Into<String>, peer: SocketAddr) {
        self.push(LogEntry::Payload {
            payload: payload.into(),
            peer,
        });
    }

    /// Remove and return every entry, oldest first.
    pub fn drain(&mut self) -> Vec<LogEntry> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
