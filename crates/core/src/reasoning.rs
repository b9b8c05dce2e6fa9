//! Reasoning ("thinking") control injected into outbound chat-completion bodies.
//!
//! Hybrid models behind OpenRouter-style APIs default to non-reasoning mode and
//! only think when the request carries a top-level `reasoning` object. A profile
//! with reasoning enabled always sends that object, replacing whatever the
//! client put there.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Top-level body field carrying the reasoning control object.
pub const REASONING_FIELD: &str = "reasoning";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    #[default]
    Medium,
    High,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub enabled: bool,
    pub effort: Option<Effort>,
    /// Hide reasoning content from the response.
    pub exclude: Option<bool>,
}

impl ReasoningConfig {
    /// The control object sent upstream, or `None` when the profile has no opinion.
    pub fn control(&self) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        Some(json!({
            "effort": self.effort.unwrap_or_default().as_str(),
            "exclude": self.exclude.unwrap_or(false),
        }))
    }
}

/// Apply the profile's reasoning policy to a JSON object body.
///
/// Additive only: with no config (or `enabled: false`) the body is untouched,
/// including any `reasoning` field the client sent. Returns `true` when the
/// body was modified.
pub fn apply(config: Option<&ReasoningConfig>, body: &mut serde_json::Map<String, Value>) -> bool {
    match config.and_then(ReasoningConfig::control) {
        Some(control) => {
            body.insert(REASONING_FIELD.to_string(), control);
            true
        }
        None => false,
    }
}
