//! Session controller
//!
//! Owns session identity and lifecycle, serializes one logical turn at a
//! time, and drives the framer/decoder/accumulator pipeline over the
//! backend's turn stream. Events within a turn are processed strictly in
//! arrival order; there is no reordering buffer.

use super::accumulator::{TurnAccumulator, TurnOutcome};
use super::model::{Artifact, Message, Session, SessionStatus};
use super::SessionError;
use crate::backend::{AdvanceOutcome, ArtifactDraft, BackendError, TutorBackend};
use crate::chain::ChainProgress;
use crate::commands::{extract_command, ArtifactCommand};
use crate::config::SessionConfig;
use crate::stream::{decode_line, Decoded, LineFramer};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Client-side engine for one tutoring session.
///
/// Engines for different sessions share no mutable state and operate
/// independently. Within a session, the message list and block progression
/// are mutated only here, driven by backend responses.
pub struct SessionEngine {
    backend: Arc<dyn TutorBackend>,
    session: Mutex<Session>,
    /// Held for the duration of a streaming turn; `try_lock` failure is how
    /// overlapping turns are refused.
    turn_gate: AsyncMutex<()>,
    /// Serializes advance requests so a repeated click waits for the
    /// outstanding one instead of racing it.
    advance_gate: AsyncMutex<()>,
}

impl SessionEngine {
    /// Start a new session against the backend.
    pub async fn start(
        backend: Arc<dyn TutorBackend>,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        let descriptor = backend
            .create_session(config)
            .await
            .map_err(|e| SessionError::SessionCreate(e.to_string()))?;

        tracing::info!(
            session_id = %descriptor.id,
            mode = ?descriptor.mode,
            blocks = descriptor.blocks.len(),
            "session started"
        );

        Ok(Self::from_descriptor(backend, descriptor))
    }

    /// Resume a previously started session.
    ///
    /// Restores mode, topic, course, chain blocks and progression,
    /// artifacts, turn count, and start time. The session-fetch API does
    /// not return previously exchanged messages, so the transcript starts
    /// empty after a resume.
    pub async fn resume(
        backend: Arc<dyn TutorBackend>,
        session_id: &str,
    ) -> Result<Self, SessionError> {
        let descriptor = backend
            .fetch_session(session_id)
            .await
            .map_err(|e| SessionError::SessionCreate(e.to_string()))?;

        tracing::info!(
            session_id = %descriptor.id,
            turn_count = descriptor.turn_count,
            "session resumed"
        );

        Ok(Self::from_descriptor(backend, descriptor))
    }

    fn from_descriptor(
        backend: Arc<dyn TutorBackend>,
        descriptor: crate::backend::SessionDescriptor,
    ) -> Self {
        let progress = ChainProgress::new(
            descriptor.blocks.len(),
            descriptor.current_block_index,
            descriptor.chain_complete,
        );
        let session = Session {
            id: descriptor.id,
            mode: descriptor.mode,
            topic: descriptor.topic,
            course_id: descriptor.course_id,
            blocks: descriptor.blocks,
            progress,
            turn_count: descriptor.turn_count,
            started_at: descriptor.started_at,
            messages: Vec::new(),
            artifacts: descriptor.artifacts,
            status: descriptor.status,
        };
        Self {
            backend,
            session: Mutex::new(session),
            turn_gate: AsyncMutex::new(()),
            advance_gate: AsyncMutex::new(()),
        }
    }

    /// Snapshot of the session as currently cached. The backend remains the
    /// system of record.
    pub fn snapshot(&self) -> Session {
        self.session.lock().unwrap().clone()
    }

    pub fn id(&self) -> String {
        self.session.lock().unwrap().id.clone()
    }

    /// Submit one user turn and stream the assistant's answer into the
    /// transcript.
    ///
    /// Refused with [`SessionError::ConcurrentTurn`] while another turn is
    /// still streaming, and with [`SessionError::SessionEnded`] after
    /// [`end`](Self::end). A network failure or an in-band `error` event
    /// fails the turn; the error text is left as the final assistant
    /// message.
    pub async fn submit_turn(&self, text: &str) -> Result<(), SessionError> {
        let Ok(_turn) = self.turn_gate.try_lock() else {
            return Err(SessionError::ConcurrentTurn);
        };

        let command = extract_command(text);
        let session_id = {
            let mut session = self.session.lock().unwrap();
            if session.status == SessionStatus::Ended {
                return Err(SessionError::SessionEnded);
            }
            // The command is also ordinary conversation content: the raw
            // text goes to the backend unchanged.
            session.messages.push(Message::user(text));
            session.id.clone()
        };

        let mut accumulator = {
            let mut session = self.session.lock().unwrap();
            TurnAccumulator::begin(&mut session.messages)
        };

        tracing::debug!(session_id = %session_id, "turn opened");

        let outcome = match self.drive_turn(&session_id, text, &mut accumulator).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let message = error.to_string();
                let mut session = self.session.lock().unwrap();
                accumulator.fail(&mut session.messages, message.clone());
                TurnOutcome::Failed { message }
            }
        };

        match outcome {
            TurnOutcome::Failed { message } => {
                tracing::warn!(session_id = %session_id, error = %message, "turn failed");
                Err(SessionError::Turn(message))
            }
            TurnOutcome::Completed | TurnOutcome::ShortRead => {
                let (turn_count, content) = {
                    let mut session = self.session.lock().unwrap();
                    session.turn_count += 1;
                    let content = session
                        .messages
                        .last()
                        .map(|m| m.content.clone())
                        .unwrap_or_default();
                    (session.turn_count, content)
                };
                tracing::debug!(session_id = %session_id, turn_count, "turn finalized");

                if let Some(command) = command {
                    self.materialize(&session_id, command, content).await?;
                }
                Ok(())
            }
        }
    }

    /// Pump the turn stream through the framer and decoder, applying each
    /// event to the in-progress message in arrival order.
    async fn drive_turn(
        &self,
        session_id: &str,
        text: &str,
        accumulator: &mut TurnAccumulator,
    ) -> Result<TurnOutcome, BackendError> {
        let mut stream = self.backend.open_turn(session_id, text).await?;

        let mut framer = LineFramer::new();
        'receive: while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for line in framer.push(&chunk) {
                match decode_line(&line) {
                    Decoded::Event(event) => {
                        let terminal = event.is_terminal();
                        let mut session = self.session.lock().unwrap();
                        accumulator.apply(&mut session.messages, event);
                        // Dropping the stream here closes the exchange;
                        // frames after a terminal event are never read.
                        if terminal {
                            break 'receive;
                        }
                    }
                    Decoded::EndOfStream => break 'receive,
                    Decoded::Ignored => {}
                }
            }
        }
        framer.finish();

        let mut session = self.session.lock().unwrap();
        Ok(accumulator.finish(&mut session.messages))
    }

    /// Create the artifact an in-band command asked for, using the full
    /// finalized assistant response as content.
    async fn materialize(
        &self,
        session_id: &str,
        command: ArtifactCommand,
        content: String,
    ) -> Result<(), SessionError> {
        let draft = ArtifactDraft {
            kind: command.kind,
            title: command.title,
            content,
        };
        let artifact = self
            .backend
            .create_artifact(session_id, &draft)
            .await
            .map_err(|e| SessionError::Artifact(e.to_string()))?;

        tracing::info!(
            session_id = %session_id,
            kind = artifact.kind.as_str(),
            title = %artifact.title,
            "artifact created"
        );
        self.session.lock().unwrap().artifacts.push(artifact);
        Ok(())
    }

    /// Create an artifact directly, outside the command flow. No automatic
    /// retry on failure.
    pub async fn create_artifact(&self, draft: &ArtifactDraft) -> Result<Artifact, SessionError> {
        let session_id = self.id();
        let artifact = self
            .backend
            .create_artifact(&session_id, draft)
            .await
            .map_err(|e| SessionError::Artifact(e.to_string()))?;
        self.session.lock().unwrap().artifacts.push(artifact.clone());
        Ok(artifact)
    }

    /// Advance to the next chain block.
    ///
    /// The backend computes the next position; the returned index and
    /// completion flag are adopted verbatim, never predicted locally.
    pub async fn advance_block(&self) -> Result<AdvanceOutcome, SessionError> {
        let _advance = self.advance_gate.lock().await;

        let session_id = {
            let session = self.session.lock().unwrap();
            if !session.progress.has_chain() {
                return Err(SessionError::Advance(
                    "session has no chain configured".to_string(),
                ));
            }
            if session.progress.is_complete() {
                return Err(SessionError::Advance(
                    "chain is already complete".to_string(),
                ));
            }
            session.id.clone()
        };

        let outcome = self
            .backend
            .advance_block(&session_id)
            .await
            .map_err(|e| SessionError::Advance(e.to_string()))?;

        let mut session = self.session.lock().unwrap();
        session
            .progress
            .apply_advance(outcome.index, outcome.complete);
        tracing::debug!(
            session_id = %session_id,
            index = outcome.index,
            complete = outcome.complete,
            "block advanced"
        );
        Ok(outcome)
    }

    /// End the session. Terminal: subsequent turns are refused.
    pub async fn end(&self) -> Result<(), SessionError> {
        let session_id = self.id();
        self.backend
            .end_session(&session_id)
            .await
            .map_err(|e| SessionError::End(e.to_string()))?;

        self.session.lock().unwrap().status = SessionStatus::Ended;
        tracing::info!(session_id = %session_id, "session ended");
        Ok(())
    }
}
