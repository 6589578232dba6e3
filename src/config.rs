//! Engine and session configuration

use crate::session::Mode;
use serde::{Deserialize, Serialize};

/// Client-level configuration for reaching the tutor backend.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl EngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("STUDYHALL_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            auth_token: std::env::var("STUDYHALL_API_TOKEN").ok(),
        }
    }
}

/// Content scoping for a session's tutor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFilter {
    /// Library materials the tutor may draw on.
    #[serde(default)]
    pub material_ids: Vec<String>,
    /// Model identifier override, when the caller wants a specific one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Whether the tutor may search the web.
    #[serde(default)]
    pub web_search: bool,
}

/// Configuration accepted at session-create time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub filter: ContentFilter,
    /// Predefined study plan to step through, when the session follows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_template_id: Option<i64>,
}

impl SessionConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    pub fn with_filter(mut self, filter: ContentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_chain_template(mut self, template_id: i64) -> Self {
        self.chain_template_id = Some(template_id);
        self
    }
}
