//! Decoding framed lines into typed stream events
//!
//! A line is a protocol frame only when it carries the `data:` prefix;
//! anything else on the channel (comments, keep-alive noise, log lines) is
//! ignored. The payload is either the transport end sentinel or a JSON
//! object with a `type` discriminator. A payload that fails to decode is
//! skipped rather than surfaced as an error, so a noisy frame cannot abort
//! an otherwise healthy turn.

use serde::{Deserialize, Serialize};

/// Prefix marking a data frame.
const DATA_PREFIX: &str = "data:";

/// Transport-level terminator. May arrive with or without a preceding
/// `done` event; either way the turn is over.
const END_SENTINEL: &str = "[DONE]";

/// A source citation delivered with a `done` event. Indices are 1-based and
/// stable for the turn they arrived with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub index: u32,
    pub source: String,
}

/// A decoded streaming event for an in-flight turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental assistant text, in arrival order.
    Token { text: String },
    /// Terminal for the turn; carries a human-readable message.
    Error { message: String },
    /// Terminal for the turn; carries zero or more citations.
    Done { citations: Vec<Citation> },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Error { .. } | StreamEvent::Done { .. })
    }
}

/// Outcome of decoding a single framed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(StreamEvent),
    /// The transport end sentinel, distinct from a `done` event.
    EndOfStream,
    /// Non-data line, unknown event kind, or malformed payload.
    Ignored,
}

/// Decode one complete line from the turn stream.
pub fn decode_line(line: &str) -> Decoded {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Decoded::Ignored;
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload).trim_end();

    if payload == END_SENTINEL {
        return Decoded::EndOfStream;
    }

    match serde_json::from_str::<WireEvent>(payload) {
        Ok(WireEvent::Token { text }) => Decoded::Event(StreamEvent::Token { text }),
        Ok(WireEvent::Error { message }) => Decoded::Event(StreamEvent::Error { message }),
        Ok(WireEvent::Done { citations }) => Decoded::Event(StreamEvent::Done { citations }),
        Err(err) => {
            tracing::debug!(error = %err, "skipping malformed data frame");
            Decoded::Ignored
        }
    }
}

// Wire format

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Token {
        text: String,
    },
    Error {
        // Some backend builds emit `content` instead of `message`.
        #[serde(alias = "content")]
        message: String,
    },
    Done {
        #[serde(default)]
        citations: Vec<Citation>,
    },
}
