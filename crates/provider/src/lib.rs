pub mod forwarder;
pub mod inspect;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode, header};
use bytes::Bytes;
use futures::Stream;
use relay_core::error::ProxyError;
use relay_core::transform::{OutboundRequest, is_hop_by_hop};
use std::pin::Pin;

pub use forwarder::HttpForwarder;

/// Lazily produced, finite, non-restartable sequence of upstream body chunks.
/// Dropping it releases the upstream connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ProxyError>> + Send>>;

pub enum UpstreamBody {
    Buffered(Bytes),
    Streaming(ByteStream),
}

impl std::fmt::Debug for UpstreamBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Streaming(_) => f.write_str("Streaming"),
        }
    }
}

/// Upstream status, relayable headers, and body.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

/// Sends a transformed request upstream. No retries, no interpretation of
/// upstream error bodies.
#[async_trait]
pub trait Forward: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, ProxyError>;
}

/// Copy upstream response headers that may be relayed to the client:
/// hop-by-hop headers and `content-length` are dropped (the relay frames the
/// body itself).
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_hop_by_hop(name) || name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
