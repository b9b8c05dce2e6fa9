use crate::AppState;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use relay_core::profile::Profile;

/// GET /: configured profiles and their local routes.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let default = state.registry.default_profile().map(|p| p.name.as_str());

    let profiles: Vec<serde_json::Value> = state
        .registry
        .list()
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name,
                "display_name": p.display_name,
                "route": format!("/{}", p.name),
                "default": Some(p.name.as_str()) == default,
                "api_key_configured": p.has_credential(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "service": "chub-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "default_profile": default,
        "profiles": profiles,
    }))
}

/// Answer for a browser hitting a profile root (`GET /openrouter`).
pub(crate) fn profile_status(profile: &Profile) -> serde_json::Value {
    serde_json::json!({
        "message": format!("Profile '{}' is active", profile.name),
        "base_url": profile.base_url,
        "status": "ready",
        "api_key_configured": profile.has_credential(),
        "hint": "Append /models to list available models",
    })
}
