//! Tutoring session engine
//!
//! A session is one learner/tutor exchange context: an ordered transcript,
//! optional chain block progression, and artifacts materialized from turns.
//! `SessionEngine` owns the lifecycle and drives the stream pipeline.

mod accumulator;
mod controller;
mod model;

pub use accumulator::{TurnAccumulator, TurnOutcome};
pub use controller::SessionEngine;
pub use model::{Artifact, ArtifactKind, Message, Mode, Role, Session, SessionStatus};

use thiserror::Error;

/// Errors surfaced by session operations.
///
/// Malformed individual stream frames never show up here; they are skipped
/// inside the decode layer so a noisy channel cannot kill a healthy turn.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to create session: {0}")]
    SessionCreate(String),

    #[error("a turn is already streaming for this session")]
    ConcurrentTurn,

    #[error("turn failed: {0}")]
    Turn(String),

    #[error("cannot advance block: {0}")]
    Advance(String),

    #[error("failed to create artifact: {0}")]
    Artifact(String),

    #[error("failed to end session: {0}")]
    End(String),

    #[error("session has ended")]
    SessionEnded,
}
