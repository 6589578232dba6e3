//! Property-based tests for the stream framing and decoding layers
//!
//! These verify the contracts the session pipeline leans on:
//! - framing is invariant under re-chunking of the byte stream
//! - no line is lost, duplicated, or reordered
//! - malformed data frames are skipped without disturbing valid events

use super::decoder::{decode_line, Decoded, StreamEvent};
use super::framer::LineFramer;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// A line body: printable ASCII, no terminators.
fn arb_line() -> impl Strategy<Value = String> {
    "[ -~]{0,40}"
}

/// Token text as it would appear inside a JSON payload.
fn arb_token_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?'\\-]{0,24}"
}

/// Noise that may legitimately share the channel with data frames.
fn arb_junk_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(": keep-alive".to_string()),
        Just("data: {not json at all".to_string()),
        Just(r#"data: {"type":"mystery","x":1}"#.to_string()),
        Just(r#"data: {"type":"token"}"#.to_string()),
        Just("event: message".to_string()),
        Just(String::new()),
    ]
}

/// Split `raw` at arbitrary points and feed the pieces through a framer.
fn frame_chunked(raw: &[u8], sizes: &[usize]) -> Vec<String> {
    let mut framer = LineFramer::new();
    let mut lines = Vec::new();
    let mut cursor = sizes.iter().cycle();
    let mut pos = 0;
    while pos < raw.len() {
        let take = cursor.next().copied().unwrap_or(1).min(raw.len() - pos);
        lines.extend(framer.push(&raw[pos..pos + take]));
        pos += take;
    }
    framer.finish();
    lines
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Framing yields the same line sequence regardless of how the byte
    /// stream is partitioned into chunks.
    #[test]
    fn prop_rechunking_invariance(
        lines in proptest::collection::vec(arb_line(), 0..12),
        sizes in proptest::collection::vec(1usize..8, 1..48),
    ) {
        let mut raw = Vec::new();
        for line in &lines {
            raw.extend_from_slice(line.as_bytes());
            raw.push(b'\n');
        }

        let mut whole = LineFramer::new();
        let unsplit = whole.push(&raw);
        whole.finish();

        let chunked = frame_chunked(&raw, &sizes);

        prop_assert_eq!(&unsplit, &lines);
        prop_assert_eq!(chunked, unsplit);
    }

    /// A trailing fragment with no terminator is never surfaced as a line,
    /// no matter the chunking.
    #[test]
    fn prop_truncated_tail_discarded(
        lines in proptest::collection::vec(arb_line(), 0..8),
        tail in "[ -~]{1,20}",
        sizes in proptest::collection::vec(1usize..8, 1..32),
    ) {
        let mut raw = Vec::new();
        for line in &lines {
            raw.extend_from_slice(line.as_bytes());
            raw.push(b'\n');
        }
        raw.extend_from_slice(tail.as_bytes());

        let framed = frame_chunked(&raw, &sizes);
        prop_assert_eq!(framed, lines);
    }

    /// Token events survive chunking and interleaved noise: the decoded
    /// token texts concatenate to exactly the original sequence, and the
    /// terminal `done` frame is seen exactly once.
    #[test]
    fn prop_tokens_survive_chunking_and_noise(
        texts in proptest::collection::vec(arb_token_text(), 0..10),
        junk in proptest::collection::vec(arb_junk_line(), 0..6),
        sizes in proptest::collection::vec(1usize..10, 1..48),
    ) {
        let mut raw = Vec::new();
        let mut junk_iter = junk.iter();
        for text in &texts {
            let payload = serde_json::json!({ "type": "token", "text": text });
            raw.extend_from_slice(format!("data: {payload}\n").as_bytes());
            if let Some(noise) = junk_iter.next() {
                raw.extend_from_slice(noise.as_bytes());
                raw.push(b'\n');
            }
        }
        raw.extend_from_slice(b"data: {\"type\":\"done\",\"citations\":[]}\n");

        let mut assembled = String::new();
        let mut done_count = 0;
        for line in frame_chunked(&raw, &sizes) {
            match decode_line(&line) {
                Decoded::Event(StreamEvent::Token { text }) => assembled.push_str(&text),
                Decoded::Event(StreamEvent::Done { .. }) => done_count += 1,
                Decoded::Event(StreamEvent::Error { .. }) => {
                    prop_assert!(false, "noise decoded as error event");
                }
                Decoded::EndOfStream | Decoded::Ignored => {}
            }
        }

        prop_assert_eq!(assembled, texts.concat());
        prop_assert_eq!(done_count, 1);
    }
}
