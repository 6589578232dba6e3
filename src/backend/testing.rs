//! Scripted backend for tests
//!
//! Queue results per operation, feed turn streams as arbitrary chunk
//! sequences, and inspect recorded calls afterwards. No real I/O.

use super::{
    AdvanceOutcome, ArtifactDraft, BackendError, SessionDescriptor, TurnStream, TutorBackend,
};
use crate::chain::ChainBlock;
use crate::config::SessionConfig;
use crate::session::{Artifact, Mode, SessionStatus};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Script for one `open_turn` call.
pub enum TurnScript {
    /// The request itself fails.
    Fail(BackendError),
    /// A sequence of chunk results, optionally spaced out in time, then a
    /// clean close.
    Stream {
        items: Vec<Result<Vec<u8>, BackendError>>,
        delay: Option<Duration>,
    },
}

impl TurnScript {
    /// Stream the given chunks, then close.
    pub fn chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self::Stream {
            items: chunks.into_iter().map(|c| Ok(c.into())).collect(),
            delay: None,
        }
    }

    /// Like [`chunks`](Self::chunks), with each chunk delivered after
    /// `delay`. Useful for holding a turn open while the test does
    /// something else.
    pub fn chunks_with_delay<I, C>(chunks: I, delay: Duration) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self::Stream {
            items: chunks.into_iter().map(|c| Ok(c.into())).collect(),
            delay: Some(delay),
        }
    }

    /// Stream some chunks, then fail mid-stream.
    pub fn chunks_then_error<I, C>(chunks: I, error: BackendError) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        let mut items: Vec<Result<Vec<u8>, BackendError>> =
            chunks.into_iter().map(|c| Ok(c.into())).collect();
        items.push(Err(error));
        Self::Stream { items, delay: None }
    }

    pub fn fail(error: BackendError) -> Self {
        Self::Fail(error)
    }
}

/// Backend double with queued responses and recorded calls.
#[derive(Default)]
pub struct ScriptedBackend {
    sessions: Mutex<VecDeque<Result<SessionDescriptor, BackendError>>>,
    turns: Mutex<VecDeque<TurnScript>>,
    advances: Mutex<VecDeque<Result<AdvanceOutcome, BackendError>>>,
    artifacts: Mutex<VecDeque<Result<Artifact, BackendError>>>,
    end_results: Mutex<VecDeque<Result<(), BackendError>>>,

    /// Configurations passed to `create_session`.
    pub created: Mutex<Vec<SessionConfig>>,
    /// Session ids passed to `fetch_session`.
    pub fetched: Mutex<Vec<String>>,
    /// `(session_id, text)` pairs passed to `open_turn`.
    pub turn_requests: Mutex<Vec<(String, String)>>,
    /// Session ids passed to `advance_block`.
    pub advance_calls: Mutex<Vec<String>>,
    /// `(session_id, draft)` pairs passed to `create_artifact`.
    pub artifact_requests: Mutex<Vec<(String, ArtifactDraft)>>,
    /// Session ids passed to `end_session`.
    pub ended: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_session(&self, result: Result<SessionDescriptor, BackendError>) {
        self.sessions.lock().unwrap().push_back(result);
    }

    pub fn queue_turn(&self, script: TurnScript) {
        self.turns.lock().unwrap().push_back(script);
    }

    pub fn queue_advance(&self, result: Result<AdvanceOutcome, BackendError>) {
        self.advances.lock().unwrap().push_back(result);
    }

    pub fn queue_artifact(&self, result: Result<Artifact, BackendError>) {
        self.artifacts.lock().unwrap().push_back(result);
    }

    pub fn queue_end(&self, result: Result<(), BackendError>) {
        self.end_results.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl TutorBackend for ScriptedBackend {
    async fn create_session(
        &self,
        config: &SessionConfig,
    ) -> Result<SessionDescriptor, BackendError> {
        self.created.lock().unwrap().push(config.clone());
        self.sessions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::unknown("no scripted session")))
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionDescriptor, BackendError> {
        self.fetched.lock().unwrap().push(session_id.to_string());
        self.sessions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::unknown("no scripted session")))
    }

    async fn end_session(&self, session_id: &str) -> Result<(), BackendError> {
        self.ended.lock().unwrap().push(session_id.to_string());
        self.end_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn open_turn(&self, session_id: &str, text: &str) -> Result<TurnStream, BackendError> {
        self.turn_requests
            .lock()
            .unwrap()
            .push((session_id.to_string(), text.to_string()));

        let script = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BackendError::unknown("no scripted turn"))?;

        match script {
            TurnScript::Fail(error) => Err(error),
            TurnScript::Stream { items, delay } => {
                let stream = futures::stream::iter(items).then(move |item| async move {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    item
                });
                Ok(Box::pin(stream) as TurnStream)
            }
        }
    }

    async fn advance_block(&self, session_id: &str) -> Result<AdvanceOutcome, BackendError> {
        self.advance_calls
            .lock()
            .unwrap()
            .push(session_id.to_string());
        self.advances
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::unknown("no scripted advance")))
    }

    async fn create_artifact(
        &self,
        session_id: &str,
        draft: &ArtifactDraft,
    ) -> Result<Artifact, BackendError> {
        self.artifact_requests
            .lock()
            .unwrap()
            .push((session_id.to_string(), draft.clone()));

        // When nothing is queued, echo the draft back the way the real
        // backend acknowledges a materialization.
        self.artifacts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(Artifact {
                    kind: draft.kind,
                    title: draft.title.clone(),
                    content: draft.content.clone(),
                    created_at: Utc::now(),
                    external_id: None,
                })
            })
    }
}

/// A plain active session descriptor for tests.
pub fn descriptor(id: &str) -> SessionDescriptor {
    SessionDescriptor {
        id: id.to_string(),
        mode: Mode::Core,
        topic: None,
        course_id: None,
        blocks: vec![],
        current_block_index: 0,
        chain_complete: false,
        turn_count: 0,
        started_at: Utc::now(),
        artifacts: vec![],
        status: SessionStatus::Active,
    }
}

/// A chain block with filler attributes.
pub fn block(id: i64, name: &str) -> ChainBlock {
    ChainBlock {
        id,
        name: name.to_string(),
        category: "practice".to_string(),
        expected_minutes: 10,
    }
}
