//! Inbound → outbound request transformation.
//!
//! Given a resolved [`Profile`] and the client's request, produce the request
//! sent upstream: target URL, merged headers, and a rewritten JSON body.

use crate::error::ProxyError;
use crate::profile::Profile;
use crate::reasoning;
use crate::trace::{ForwardTrace, ModelRewrite};
use axum::http::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use axum::http::Method;
use bytes::Bytes;
use serde_json::Value;

/// Connection-scoped headers that never cross the relay in either direction.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Inbound headers dropped before forwarding, in addition to hop-by-hop ones.
/// Client credentials are replaced by the profile's key.
const STRIPPED_REQUEST_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "accept-encoding",
    "authorization",
    "x-api-key",
    "api-key",
];

const ENDPOINT_SUFFIXES: &[&str] = &["/chat/completions", "/messages"];
const CHAT_COMPLETIONS: &str = "chat/completions";

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// The client's request, already split from its profile segment.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path below the profile segment, without a leading slash.
    pub sub_path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Fully-formed request for the upstream.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Client asked for a streamed response (`"stream": true`).
    pub stream: bool,
    pub trace: ForwardTrace,
}

/// Build the outbound request for `inbound` under `profile`.
///
/// Fails with [`ProxyError::Config`] when the profile has no usable API key;
/// nothing unauthenticated is ever sent.
pub fn build(profile: &Profile, inbound: InboundRequest) -> Result<OutboundRequest, ProxyError> {
    let api_key = profile.credential()?;
    let url = target_url(&profile.base_url, &inbound.sub_path, inbound.query.as_deref());
    let headers = merge_headers(&inbound.headers, profile, api_key)?;
    let body = rewrite_body(profile, inbound.body)?;

    let trace = ForwardTrace {
        profile: profile.name.clone(),
        method: inbound.method.to_string(),
        url: url.clone(),
        stream: body.stream,
        requested_model: body.requested_model,
        model: body.model,
        rewrite: body.rewrite,
        reasoning_injected: body.reasoning_injected,
        payload: body.payload,
    };

    Ok(OutboundRequest {
        method: inbound.method,
        url,
        headers,
        body: body.bytes,
        stream: body.stream,
        trace,
    })
}

/// Join the profile base URL with the client's sub-path and query string.
///
/// A base URL that already names an endpoint (e.g. `.../chat/completions`)
/// does not get `chat/completions` appended a second time.
pub fn target_url(base_url: &str, sub_path: &str, query: Option<&str>) -> String {
    let base = base_url.trim_end_matches('/');
    let mut sub = sub_path.trim_matches('/');

    if ENDPOINT_SUFFIXES.iter().any(|s| base.ends_with(s)) {
        sub = sub
            .strip_prefix(CHAT_COMPLETIONS)
            .unwrap_or(sub)
            .trim_start_matches('/');
    }

    let mut url = if sub.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{sub}")
    };
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(q);
    }
    url
}

/// Inbound headers (minus hop-by-hop and credentials), overlaid with the
/// profile's static headers, then the profile's `Authorization`.
pub fn merge_headers(
    inbound: &HeaderMap,
    profile: &Profile,
    api_key: &str,
) -> Result<HeaderMap, ProxyError> {
    let mut headers = HeaderMap::with_capacity(inbound.len() + profile.headers.len() + 1);

    for (name, value) in inbound {
        if is_hop_by_hop(name) || STRIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    for (name, value) in &profile.headers {
        headers.insert(name.clone(), value.clone());
    }

    let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
        ProxyError::Config {
            profile: profile.name.clone(),
            field: "api_key",
        }
    })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(headers)
}

/// Outcome of the model rewrite rules for one request.
pub fn resolve_model(profile: &Profile, requested: Option<&str>) -> (Option<String>, ModelRewrite) {
    if let Some(ref forced) = profile.force_model {
        return (Some(forced.clone()), ModelRewrite::Forced);
    }
    if let Some(mapped) = requested.and_then(|m| profile.model_map.get(m)) {
        return (Some(mapped.clone()), ModelRewrite::Mapped);
    }
    (requested.map(str::to_string), ModelRewrite::Passthrough)
}

struct RewrittenBody {
    bytes: Bytes,
    stream: bool,
    requested_model: Option<String>,
    model: Option<String>,
    rewrite: ModelRewrite,
    reasoning_injected: bool,
    payload: Option<Value>,
}

impl RewrittenBody {
    fn untouched(bytes: Bytes) -> Self {
        Self {
            bytes,
            stream: false,
            requested_model: None,
            model: None,
            rewrite: ModelRewrite::Passthrough,
            reasoning_injected: false,
            payload: None,
        }
    }
}

/// Rewrite a JSON object body. Anything else (empty, non-JSON, JSON that is
/// not an object) is forwarded byte-for-byte.
fn rewrite_body(profile: &Profile, body: Bytes) -> Result<RewrittenBody, ProxyError> {
    if body.is_empty() {
        return Ok(RewrittenBody::untouched(body));
    }
    let mut map = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => return Ok(RewrittenBody::untouched(body)),
    };

    let stream = map.get("stream").and_then(Value::as_bool).unwrap_or(false);
    let requested_model = map.get("model").and_then(Value::as_str).map(str::to_string);
    let (model, rewrite) = resolve_model(profile, requested_model.as_deref());

    let mut changed = false;
    if rewrite != ModelRewrite::Passthrough
        && let Some(ref m) = model
    {
        map.insert("model".to_string(), Value::String(m.clone()));
        changed = true;
    }

    // Upstreams behind the relay only understand `max_tokens`.
    if !map.contains_key("max_tokens")
        && let Some(limit) = map.remove("max_completion_tokens")
    {
        map.insert("max_tokens".to_string(), limit);
        changed = true;
    }

    let reasoning_injected = reasoning::apply(profile.reasoning.as_ref(), &mut map);
    changed |= reasoning_injected;

    let payload = Value::Object(map);
    let bytes = if changed {
        Bytes::from(
            serde_json::to_vec(&payload)
                .map_err(|e| ProxyError::Internal(format!("failed to encode body: {e}")))?,
        )
    } else {
        body
    };

    Ok(RewrittenBody {
        bytes,
        stream,
        requested_model,
        model,
        rewrite,
        reasoning_injected,
        payload: Some(payload),
    })
}
