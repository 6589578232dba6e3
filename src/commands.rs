//! In-band artifact commands
//!
//! A user message may open with a slash directive asking that the upcoming
//! assistant answer be materialized as a study artifact. The directive is
//! advisory: the message is still sent to the backend unchanged, and the
//! artifact is only created after the turn finalizes successfully, from the
//! full finalized assistant response.

use crate::session::ArtifactKind;
use regex::Regex;
use std::sync::LazyLock;

/// A recognized artifact directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCommand {
    pub kind: ArtifactKind,
    /// Proposed title: the remainder of the message after the command
    /// token, trimmed. May be empty.
    pub title: String,
}

static COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*/(note|save|card|flashcard|map|diagram)\b(.*)$")
        .expect("command pattern is valid")
});

/// Scan raw user input for an artifact directive.
///
/// Matching is case-insensitive and anchored at the start of the message.
/// At most one intent can match; the keyword sets are disjoint.
pub fn extract_command(input: &str) -> Option<ArtifactCommand> {
    let caps = COMMAND.captures(input)?;
    let keyword = caps.get(1)?.as_str().to_ascii_lowercase();
    let kind = match keyword.as_str() {
        "note" | "save" => ArtifactKind::Note,
        "card" | "flashcard" => ArtifactKind::Card,
        "map" | "diagram" => ArtifactKind::Map,
        _ => return None,
    };
    let title = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
    Some(ArtifactCommand { kind, title })
}
