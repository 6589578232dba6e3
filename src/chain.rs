//! Chain block progression
//!
//! A session may step through a predefined ordered study plan. The backend,
//! not the client, computes the next position: the only transition is
//! applying an advance response, and the returned index and completion flag
//! are adopted verbatim. Locally predicting `index + 1` would diverge from
//! the server under retried requests or resumed sessions.

use serde::{Deserialize, Serialize};

/// One step of a predefined ordered study plan. Immutable once fetched;
/// changing the plan requires a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBlock {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Expected time to spend on this block, in minutes.
    pub expected_minutes: u32,
}

/// Progression through a session's chain blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChainProgress {
    /// The session was started without a chain and stays here for its
    /// whole lifetime.
    NoChain,
    /// Currently at block `index` (0-based).
    At { index: usize },
    /// Every block has been stepped through.
    Complete,
}

impl ChainProgress {
    /// Initial progression for a freshly started or resumed session.
    pub fn new(block_count: usize, index: usize, complete: bool) -> Self {
        if block_count == 0 {
            ChainProgress::NoChain
        } else if complete || index >= block_count {
            ChainProgress::Complete
        } else {
            ChainProgress::At { index }
        }
    }

    /// Adopt the result of a successful advance. The backend's values are
    /// authoritative; the local index plays no part.
    pub fn apply_advance(&mut self, index: usize, complete: bool) {
        if matches!(self, ChainProgress::NoChain) {
            return;
        }
        *self = if complete {
            ChainProgress::Complete
        } else {
            ChainProgress::At { index }
        };
    }

    pub fn current_index(&self) -> Option<usize> {
        match self {
            ChainProgress::At { index } => Some(*index),
            ChainProgress::NoChain | ChainProgress::Complete => None,
        }
    }

    pub fn has_chain(&self) -> bool {
        !matches!(self, ChainProgress::NoChain)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ChainProgress::Complete)
    }
}
