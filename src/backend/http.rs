//! HTTP implementation of the tutor backend
//!
//! Session lifecycle, turn, advance, and artifact endpoints over the
//! dashboard's REST API. The turn endpoint answers with a live stream of
//! newline-delimited `data:`-prefixed JSON frames.

use super::{
    AdvanceOutcome, ArtifactDraft, BackendError, SessionDescriptor, TurnStream, TutorBackend,
};
use crate::chain::ChainBlock;
use crate::config::{EngineConfig, SessionConfig};
use crate::session::{Artifact, ArtifactKind, Mode, SessionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Tutor backend over HTTP.
pub struct HttpTutorBackend {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpTutorBackend {
    pub fn new(config: &EngineConfig) -> Self {
        // No client-wide timeout: a turn stream legitimately stays open for
        // as long as the tutor keeps talking. Any bound comes from the
        // transport or proxy in front of the backend.
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::network(format!("Request timeout: {}", e))
            } else if e.is_connect() {
                BackendError::network(format!("Connection failed: {}", e))
            } else {
                BackendError::unknown(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("(no body)"));
        Err(Self::classify_error(status, &body))
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> BackendError {
        match status.as_u16() {
            401 | 403 => BackendError::auth(format!("Authentication failed: {}", body)),
            429 => BackendError::rate_limit(format!("Rate limited: {}", body)),
            400 | 422 => BackendError::invalid_request(format!("Invalid request: {}", body)),
            500..=599 => BackendError::server_error(format!("Server error: {}", body)),
            _ => BackendError::unknown(format!("HTTP {}: {}", status, body)),
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::network(format!("Failed to read response: {}", e)))?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::unknown(format!("Failed to parse response: {} - body: {}", e, body)))
    }
}

#[async_trait]
impl TutorBackend for HttpTutorBackend {
    async fn create_session(
        &self,
        config: &SessionConfig,
    ) -> Result<SessionDescriptor, BackendError> {
        let request = CreateSessionRequest {
            mode: config.mode,
            course_id: config.course_id.as_deref(),
            topic: config.topic.as_deref(),
            material_ids: &config.filter.material_ids,
            model: config.filter.model.as_deref(),
            web_search: config.filter.web_search,
            chain_template_id: config.chain_template_id,
        };

        let response =
            Self::send(self.request(reqwest::Method::POST, "/sessions").json(&request)).await?;
        let wire: SessionWire = Self::read_json(response).await?;
        Ok(wire.into_descriptor())
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionDescriptor, BackendError> {
        let response = Self::send(
            self.request(reqwest::Method::GET, &format!("/sessions/{session_id}")),
        )
        .await?;
        let wire: SessionWire = Self::read_json(response).await?;
        Ok(wire.into_descriptor())
    }

    async fn end_session(&self, session_id: &str) -> Result<(), BackendError> {
        Self::send(self.request(
            reqwest::Method::POST,
            &format!("/sessions/{session_id}/end"),
        ))
        .await?;
        Ok(())
    }

    async fn open_turn(&self, session_id: &str, text: &str) -> Result<TurnStream, BackendError> {
        let response = Self::send(
            self.request(
                reqwest::Method::POST,
                &format!("/sessions/{session_id}/turns"),
            )
            .json(&TurnRequest { text }),
        )
        .await?;

        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| BackendError::network(format!("Stream read failed: {}", e)))
        });
        Ok(Box::pin(stream))
    }

    async fn advance_block(&self, session_id: &str) -> Result<AdvanceOutcome, BackendError> {
        let response = Self::send(self.request(
            reqwest::Method::POST,
            &format!("/sessions/{session_id}/advance"),
        ))
        .await?;
        let wire: AdvanceWire = Self::read_json(response).await?;
        Ok(AdvanceOutcome {
            index: wire.index,
            complete: wire.complete,
        })
    }

    async fn create_artifact(
        &self,
        session_id: &str,
        draft: &ArtifactDraft,
    ) -> Result<Artifact, BackendError> {
        let request = ArtifactRequest {
            kind: draft.kind,
            title: &draft.title,
            content: &draft.content,
        };

        let response = Self::send(
            self.request(
                reqwest::Method::POST,
                &format!("/sessions/{session_id}/artifacts"),
            )
            .json(&request),
        )
        .await?;
        let wire: ArtifactWire = Self::read_json(response).await?;
        Ok(wire.into_artifact())
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    course_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
    material_ids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    web_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    chain_template_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct TurnRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ArtifactRequest<'a> {
    #[serde(rename = "type")]
    kind: ArtifactKind,
    title: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionWire {
    id: String,
    mode: Mode,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    course_id: Option<String>,
    #[serde(default)]
    blocks: Vec<ChainBlock>,
    #[serde(default)]
    current_block_index: usize,
    #[serde(default)]
    chain_complete: bool,
    #[serde(default)]
    turn_count: u32,
    started_at: DateTime<Utc>,
    #[serde(default)]
    artifacts: Vec<ArtifactWire>,
    status: SessionStatus,
}

impl SessionWire {
    fn into_descriptor(self) -> SessionDescriptor {
        SessionDescriptor {
            id: self.id,
            mode: self.mode,
            topic: self.topic,
            course_id: self.course_id,
            blocks: self.blocks,
            current_block_index: self.current_block_index,
            chain_complete: self.chain_complete,
            turn_count: self.turn_count,
            started_at: self.started_at,
            artifacts: self
                .artifacts
                .into_iter()
                .map(ArtifactWire::into_artifact)
                .collect(),
            status: self.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AdvanceWire {
    index: usize,
    complete: bool,
}

#[derive(Debug, Deserialize)]
struct ArtifactWire {
    #[serde(rename = "type")]
    kind: ArtifactKind,
    title: String,
    content: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    external_id: Option<String>,
}

impl ArtifactWire {
    fn into_artifact(self) -> Artifact {
        Artifact {
            kind: self.kind,
            title: self.title,
            content: self.content,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            external_id: self.external_id,
        }
    }
}
