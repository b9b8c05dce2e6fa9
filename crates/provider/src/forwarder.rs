use crate::{Forward, UpstreamBody, UpstreamResponse, relay_headers};
use async_trait::async_trait;
use futures::StreamExt;
use relay_core::config::Config;
use relay_core::error::ProxyError;
use relay_core::transform::OutboundRequest;

/// Longest upstream error body echoed into the log.
const ERROR_LOG_LIMIT: usize = 2048;

/// Forwards requests over HTTP with a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let client = relay_core::proxy::build_http_client(
            config.proxy_url.as_deref(),
            config.connect_timeout,
            config.request_timeout,
        )?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Forward for HttpForwarder {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
            stream,
            trace,
        } = request;

        let mut req = self.client.request(method, &url).headers(headers);
        if !body.is_empty() {
            req = req.body(body);
        }

        let resp = req.send().await.inspect_err(|e| {
            tracing::warn!(profile = %trace.profile, url = %url, "upstream request failed: {e}");
        })?;

        let status = resp.status();
        let headers = relay_headers(resp.headers());

        if stream && status.is_success() {
            let profile = trace.profile;
            let chunks = resp.bytes_stream().map(move |chunk| {
                chunk.map_err(|e| {
                    tracing::warn!(profile = %profile, "upstream stream aborted: {e}");
                    ProxyError::from(e)
                })
            });
            return Ok(UpstreamResponse {
                status,
                headers,
                body: UpstreamBody::Streaming(Box::pin(chunks)),
            });
        }

        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let shown = &bytes[..bytes.len().min(ERROR_LOG_LIMIT)];
            tracing::warn!(
                profile = %trace.profile,
                status = status.as_u16(),
                body = %String::from_utf8_lossy(shown),
                "upstream returned error status"
            );
        } else {
            let markers = crate::inspect::reasoning_markers(&bytes);
            if markers.any() {
                tracing::debug!(
                    profile = %trace.profile,
                    reasoning_field = markers.reasoning_field,
                    think_tags = markers.think_tags,
                    "reasoning detected in response"
                );
            }
        }

        Ok(UpstreamResponse {
            status,
            headers,
            body: UpstreamBody::Buffered(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use bytes::Bytes;
    use relay_core::trace::{ForwardTrace, ModelRewrite};
    use serde_json::{Value, json};
    use std::time::Duration;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn outbound(method: Method, url: String, body: Value, stream: bool) -> OutboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("authorization", HeaderValue::from_static("Bearer sk-test"));
        OutboundRequest {
            method: method.clone(),
            url: url.clone(),
            headers,
            body: Bytes::from(body.to_string()),
            stream,
            trace: ForwardTrace {
                profile: "test".into(),
                method: method.to_string(),
                url,
                stream,
                requested_model: None,
                model: None,
                rewrite: ModelRewrite::Passthrough,
                reasoning_injected: false,
                payload: None,
            },
        }
    }

    fn forwarder(read_timeout_secs: u64) -> HttpForwarder {
        HttpForwarder::new(
            relay_core::proxy::build_http_client(None, 5, read_timeout_secs).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_buffered_roundtrip_relays_body_and_headers() {
        let upstream = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                (
                    [("x-upstream", "yes"), ("connection", "close")],
                    Json(json!({
                        "auth": headers["authorization"].to_str().unwrap(),
                        "echo": body,
                    })),
                )
            }),
        );
        let base = spawn_upstream(upstream).await;

        let resp = forwarder(30)
            .send(outbound(
                Method::POST,
                format!("{base}/v1/chat/completions"),
                json!({"model": "m"}),
                false,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.headers["x-upstream"], "yes");
        assert!(resp.headers.get("connection").is_none());
        let UpstreamBody::Buffered(bytes) = resp.body else {
            panic!("expected buffered body");
        };
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["auth"], "Bearer sk-test");
        assert_eq!(v["echo"]["model"], "m");
    }

    #[tokio::test]
    async fn test_error_status_passed_through_verbatim() {
        let upstream = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    r#"{"error":{"message":"slow down","code":429}}"#,
                )
            }),
        );
        let base = spawn_upstream(upstream).await;

        let resp = forwarder(30)
            .send(outbound(
                Method::POST,
                format!("{base}/v1/chat/completions"),
                json!({"stream": true}),
                true,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
        let UpstreamBody::Buffered(bytes) = resp.body else {
            panic!("error responses are buffered");
        };
        assert_eq!(&bytes[..], br#"{"error":{"message":"slow down","code":429}}"#);
    }

    #[tokio::test]
    async fn test_streaming_preserves_chunks() {
        let upstream = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                let chunks = futures::stream::iter(vec![
                    "data: {\"n\":1}\n\n",
                    "data: {\"n\":2}\n\n",
                    "data: [DONE]\n\n",
                ])
                .then(|c| async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok::<_, std::convert::Infallible>(Bytes::from_static(c.as_bytes()))
                });
                (
                    [("content-type", "text/event-stream")],
                    Body::from_stream(chunks),
                )
            }),
        );
        let base = spawn_upstream(upstream).await;

        let resp = forwarder(30)
            .send(outbound(
                Method::POST,
                format!("{base}/v1/chat/completions"),
                json!({"stream": true}),
                true,
            ))
            .await
            .unwrap();

        assert_eq!(resp.headers["content-type"], "text/event-stream");
        let UpstreamBody::Streaming(stream) = resp.body else {
            panic!("expected streaming body");
        };
        let collected: Vec<Bytes> = stream.map(|c| c.unwrap()).collect().await;
        let joined: Vec<u8> = collected.concat();
        assert_eq!(
            std::str::from_utf8(&joined).unwrap(),
            "data: {\"n\":1}\n\ndata: {\"n\":2}\n\ndata: [DONE]\n\n"
        );
    }

    #[tokio::test]
    async fn test_get_without_body() {
        let upstream = Router::new().route(
            "/v1/models",
            get(|headers: HeaderMap| async move {
                let has_length = headers.get("content-length").is_some();
                Json(json!({"object": "list", "data": [], "content_length": has_length}))
            }),
        );
        let base = spawn_upstream(upstream).await;

        let mut req = outbound(Method::GET, format!("{base}/v1/models"), json!({}), false);
        req.body = Bytes::new();
        let resp = forwarder(30).send(req).await.unwrap();
        let UpstreamBody::Buffered(bytes) = resp.body else {
            panic!("expected buffered body");
        };
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["object"], "list");
        assert_eq!(v["content_length"], false);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = forwarder(30)
            .send(outbound(
                Method::POST,
                format!("http://{addr}/v1/chat/completions"),
                json!({}),
                false,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Network(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_slow_upstream_is_timeout() {
        let upstream = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        );
        let base = spawn_upstream(upstream).await;

        let err = forwarder(1)
            .send(outbound(
                Method::POST,
                format!("{base}/v1/chat/completions"),
                json!({}),
                false,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Timeout(_)));
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
