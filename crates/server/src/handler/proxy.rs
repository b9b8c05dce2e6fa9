use crate::AppState;
use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use relay_core::context::RequestContext;
use relay_core::error::ProxyError;
use relay_core::transform::{self, InboundRequest};

/// Every path below a profile segment: resolve the profile, transform the
/// request, forward it, relay the answer.
pub async fn proxy(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ProxyError> {
    let (segment, sub_path) = super::split_profile_path(uri.path());
    let profile = state.registry.resolve(segment)?;
    // Oversized or unreadable bodies get the same JSON error shape as everything else.
    let body = body?;

    if method == Method::GET && sub_path.trim_matches('/').is_empty() && uri.query().is_none() {
        return Ok(Json(super::index::profile_status(profile)).into_response());
    }

    let inbound = InboundRequest {
        method,
        sub_path: sub_path.to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    };

    let outbound = transform::build(profile, inbound)?;
    outbound.trace.emit(&ctx.request_id, state.config.verbose);

    let upstream = state.forwarder.send(outbound).await?;
    tracing::debug!(
        request_id = %ctx.request_id,
        profile = %profile.name,
        status = upstream.status.as_u16(),
        "Upstream responded"
    );

    Ok(crate::relay::into_response(upstream))
}
