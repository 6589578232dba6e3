//! Tutor backend abstraction
//!
//! The engine is agnostic to the concrete transport; this trait is the
//! seam. Production uses `HttpTutorBackend`; tests drive the engine
//! through a scripted implementation.

mod error;
mod http;

#[cfg(test)]
pub mod testing;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpTutorBackend;

use crate::chain::ChainBlock;
use crate::config::SessionConfig;
use crate::session::{Artifact, ArtifactKind, Mode, SessionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// Live byte stream of one turn's answer. Chunk boundaries are arbitrary;
/// the stream layer reassembles frames from them.
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, BackendError>> + Send>>;

/// Session state as the backend reports it.
#[derive(Debug, Clone)]
pub struct SessionDescriptor {
    pub id: String,
    pub mode: Mode,
    pub topic: Option<String>,
    pub course_id: Option<String>,
    pub blocks: Vec<ChainBlock>,
    pub current_block_index: usize,
    pub chain_complete: bool,
    pub turn_count: u32,
    pub started_at: DateTime<Utc>,
    pub artifacts: Vec<Artifact>,
    pub status: SessionStatus,
}

/// Result of a block advance. Both fields are authoritative; the client
/// adopts them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub index: usize,
    pub complete: bool,
}

/// Artifact to materialize from a finalized turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDraft {
    pub kind: ArtifactKind,
    pub title: String,
    pub content: String,
}

/// Request/response exchange with the tutor backend.
#[async_trait]
pub trait TutorBackend: Send + Sync {
    /// Create a session from the given configuration.
    async fn create_session(
        &self,
        config: &SessionConfig,
    ) -> Result<SessionDescriptor, BackendError>;

    /// Fetch session metadata, chain blocks, and artifacts.
    async fn fetch_session(&self, session_id: &str) -> Result<SessionDescriptor, BackendError>;

    /// End the session. Terminal.
    async fn end_session(&self, session_id: &str) -> Result<(), BackendError>;

    /// Open one turn. The stream carries newline-delimited `data:` frames.
    async fn open_turn(&self, session_id: &str, text: &str) -> Result<TurnStream, BackendError>;

    /// Advance to the next chain block; the backend computes the index.
    async fn advance_block(&self, session_id: &str) -> Result<AdvanceOutcome, BackendError>;

    /// Materialize an artifact from turn content.
    async fn create_artifact(
        &self,
        session_id: &str,
        draft: &ArtifactDraft,
    ) -> Result<Artifact, BackendError>;
}

#[async_trait]
impl<T: TutorBackend + ?Sized> TutorBackend for Arc<T> {
    async fn create_session(
        &self,
        config: &SessionConfig,
    ) -> Result<SessionDescriptor, BackendError> {
        (**self).create_session(config).await
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionDescriptor, BackendError> {
        (**self).fetch_session(session_id).await
    }

    async fn end_session(&self, session_id: &str) -> Result<(), BackendError> {
        (**self).end_session(session_id).await
    }

    async fn open_turn(&self, session_id: &str, text: &str) -> Result<TurnStream, BackendError> {
        (**self).open_turn(session_id, text).await
    }

    async fn advance_block(&self, session_id: &str) -> Result<AdvanceOutcome, BackendError> {
        (**self).advance_block(session_id).await
    }

    async fn create_artifact(
        &self,
        session_id: &str,
        draft: &ArtifactDraft,
    ) -> Result<Artifact, BackendError> {
        (**self).create_artifact(session_id, draft).await
    }
}

/// Logging wrapper for backends
pub struct LoggingBackend {
    inner: Arc<dyn TutorBackend>,
}

impl LoggingBackend {
    pub fn new(inner: Arc<dyn TutorBackend>) -> Self {
        Self { inner }
    }

    fn log<T>(operation: &str, started: std::time::Instant, result: &Result<T, BackendError>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    "backend request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "backend request failed"
                );
            }
        }
    }
}

#[async_trait]
impl TutorBackend for LoggingBackend {
    async fn create_session(
        &self,
        config: &SessionConfig,
    ) -> Result<SessionDescriptor, BackendError> {
        let started = std::time::Instant::now();
        let result = self.inner.create_session(config).await;
        Self::log("create_session", started, &result);
        result
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionDescriptor, BackendError> {
        let started = std::time::Instant::now();
        let result = self.inner.fetch_session(session_id).await;
        Self::log("fetch_session", started, &result);
        result
    }

    async fn end_session(&self, session_id: &str) -> Result<(), BackendError> {
        let started = std::time::Instant::now();
        let result = self.inner.end_session(session_id).await;
        Self::log("end_session", started, &result);
        result
    }

    async fn open_turn(&self, session_id: &str, text: &str) -> Result<TurnStream, BackendError> {
        let started = std::time::Instant::now();
        let result = self.inner.open_turn(session_id, text).await;
        Self::log("open_turn", started, &result);
        result
    }

    async fn advance_block(&self, session_id: &str) -> Result<AdvanceOutcome, BackendError> {
        let started = std::time::Instant::now();
        let result = self.inner.advance_block(session_id).await;
        Self::log("advance_block", started, &result);
        result
    }

    async fn create_artifact(
        &self,
        session_id: &str,
        draft: &ArtifactDraft,
    ) -> Result<Artifact, BackendError> {
        let started = std::time::Instant::now();
        let result = self.inner.create_artifact(session_id, draft).await;
        Self::log("create_artifact", started, &result);
        result
    }
}
