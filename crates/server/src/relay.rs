//! Conversion of upstream responses into client responses.

use axum::body::Body;
use axum::response::Response;
use relay_provider::{UpstreamBody, UpstreamResponse};

/// Relay status, headers and body unchanged. Streamed bodies are forwarded
/// chunk by chunk; when the client goes away the body (and with it the
/// upstream connection) is dropped.
pub fn into_response(upstream: UpstreamResponse) -> Response {
    let body = match upstream.body {
        UpstreamBody::Buffered(bytes) => Body::from(bytes),
        UpstreamBody::Streaming(stream) => Body::from_stream(stream),
    };

    let mut response = Response::new(body);
    *response.status_mut() = upstream.status;
    *response.headers_mut() = upstream.headers;
    response
}
