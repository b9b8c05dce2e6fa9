use axum::{extract::Request, middleware::Next, response::Response};
use relay_core::context::RequestContext;

/// Middleware that logs each request and its outcome with the request id.
/// For streamed responses "completed" marks the start of the relay.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let ctx = request.extensions().get::<RequestContext>().cloned();
    let request_id = ctx
        .as_ref()
        .map(|c| c.request_id.clone())
        .unwrap_or_default();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Request received"
    );

    let response = next.run(request).await;

    let elapsed = ctx.as_ref().map(|c| c.elapsed_ms()).unwrap_or(0);
    let status = response.status().as_u16();

    if status >= 400 {
        tracing::warn!(
            request_id = %request_id,
            status = status,
            elapsed_ms = elapsed,
            "Request failed"
        );
    } else {
        tracing::info!(
            request_id = %request_id,
            status = status,
            elapsed_ms = elapsed,
            "Request completed"
        );
    }

    response
}
