//! studyhall - interactive tutoring session engine
//!
//! Client-side engine for the study dashboard's tutoring sessions. It opens
//! one exchange per turn against the tutor backend, reconstructs typed
//! events from an arbitrarily chunked byte stream, builds the visible
//! transcript, tracks ordered chain-block progression from authoritative
//! server responses, and materializes study artifacts requested by in-band
//! commands.

pub mod backend;
pub mod chain;
pub mod commands;
pub mod config;
pub mod session;
pub mod stream;

pub use backend::{
    AdvanceOutcome, ArtifactDraft, BackendError, BackendErrorKind, HttpTutorBackend,
    LoggingBackend, SessionDescriptor, TurnStream, TutorBackend,
};
pub use chain::{ChainBlock, ChainProgress};
pub use commands::{extract_command, ArtifactCommand};
pub use config::{ContentFilter, EngineConfig, SessionConfig};
pub use session::{
    Artifact, ArtifactKind, Message, Mode, Role, Session, SessionEngine, SessionError,
    SessionStatus, TurnOutcome,
};
pub use stream::{Citation, StreamEvent};
