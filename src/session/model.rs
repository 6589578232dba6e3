//! Session data model
//!
//! The backend is the system of record; everything here is the client's
//! cache for the duration the UI is attached to the session.

use crate::chain::{ChainBlock, ChainProgress};
use crate::stream::Citation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pedagogical mode a session runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Free-form tutoring on whatever the learner brings up.
    #[default]
    Core,
    /// The tutor leads, one concept at a time.
    Guided,
    /// Revisit previously covered material.
    Review,
    /// Rapid question-and-answer drills.
    Quiz,
}

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended,
}

/// The kind of durable study object derived from a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Note,
    Card,
    Map,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Note => "note",
            ArtifactKind::Card => "card",
            ArtifactKind::Map => "map",
        }
    }
}

/// One entry of the visible transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Attached atomically when the turn finalizes, never incrementally.
    #[serde(default)]
    pub citations: Vec<Citation>,
    /// True while the message is still being appended to. At most one
    /// message per session is streaming; it is always the last one and
    /// always has the assistant role.
    #[serde(default)]
    pub streaming: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            content: text.into(),
            citations: vec![],
            streaming: false,
        }
    }

    /// Placeholder for an assistant turn that has not produced text yet.
    pub fn streaming_assistant() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: String::new(),
            citations: vec![],
            streaming: true,
        }
    }
}

/// A durable study object materialized from a turn's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub title: String,
    /// Snapshot of the assistant response the artifact was derived from.
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Backend-assigned identifier, e.g. a flashcard id.
    #[serde(default)]
    pub external_id: Option<String>,
}

/// Client-side cache of one tutoring session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub mode: Mode,
    pub topic: Option<String>,
    pub course_id: Option<String>,
    /// Fixed at session-start time; changing the plan requires a new
    /// session.
    pub blocks: Vec<ChainBlock>,
    pub progress: ChainProgress,
    pub turn_count: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    pub status: SessionStatus,
}

impl Session {
    /// The in-progress assistant message, if a turn is streaming.
    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.last().filter(|m| m.streaming)
    }

    pub fn current_block(&self) -> Option<&ChainBlock> {
        self.progress
            .current_index()
            .and_then(|index| self.blocks.get(index))
    }

    pub fn is_ended(&self) -> bool {
        self.status == SessionStatus::Ended
    }
}
