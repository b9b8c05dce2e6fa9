//! Structured per-request forwarding record handed to the logger.

use serde::Serialize;
use serde_json::Value;

/// How the outbound model name was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRewrite {
    /// `force_model` replaced the client's choice.
    Forced,
    /// `model_map` translated the client's choice.
    Mapped,
    Passthrough,
}

impl ModelRewrite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forced => "forced",
            Self::Mapped => "mapped",
            Self::Passthrough => "passthrough",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForwardTrace {
    pub profile: String,
    pub method: String,
    pub url: String,
    pub stream: bool,
    pub requested_model: Option<String>,
    pub model: Option<String>,
    pub rewrite: ModelRewrite,
    pub reasoning_injected: bool,
    /// Outbound JSON body; only emitted in verbose mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ForwardTrace {
    /// Emit this record through `tracing`. The payload is logged only when
    /// `verbose` is set, at info so the default filter lets it through.
    pub fn emit(&self, request_id: &str, verbose: bool) {
        let requested = self.requested_model.as_deref().unwrap_or("-");
        let model = self.model.as_deref().unwrap_or("-");

        if self.rewrite == ModelRewrite::Forced && self.requested_model != self.model {
            tracing::info!(
                request_id = %request_id,
                profile = %self.profile,
                requested_model = %requested,
                model = %model,
                "Model overridden by profile"
            );
        }

        tracing::info!(
            request_id = %request_id,
            profile = %self.profile,
            method = %self.method,
            url = %self.url,
            stream = self.stream,
            requested_model = %requested,
            model = %model,
            rewrite = self.rewrite.as_str(),
            reasoning = self.reasoning_injected,
            "Forwarding request"
        );

        if verbose && let Some(ref payload) = self.payload {
            tracing::info!(
                request_id = %request_id,
                profile = %self.profile,
                payload = %payload,
                "Outbound payload"
            );
        }
    }
}
