use relay_core::context::RequestContext;
use axum::{extract::Request, middleware::Next, response::Response};

/// Middleware that injects a `RequestContext` as an axum Extension.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(RequestContext::new());
    next.run(request).await
}
