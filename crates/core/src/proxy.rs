use reqwest::{Client, Proxy, redirect};
use std::time::Duration;

/// Build the upstream HTTP client.
///
/// `request_timeout_secs` bounds the gap between reads rather than the whole
/// exchange, so long token streams are not cut off while they keep producing.
/// Redirects are never followed; a 3xx from upstream is relayed as-is.
pub fn build_http_client(
    proxy_url: Option<&str>,
    connect_timeout_secs: u64,
    request_timeout_secs: u64,
) -> Result<Client, anyhow::Error> {
    let mut builder = Client::builder()
        .user_agent(concat!("chub-relay/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .read_timeout(Duration::from_secs(request_timeout_secs))
        .redirect(redirect::Policy::none());

    match proxy_url.filter(|url| !url.is_empty()) {
        Some(url) => builder = builder.proxy(Proxy::all(url)?),
        None => builder = builder.no_proxy(),
    }

    Ok(builder.build()?)
}

/// Validate that a proxy URL is well-formed.
pub fn validate_proxy_url(url: &str) -> Result<(), anyhow::Error> {
    if url.is_empty() {
        return Ok(());
    }
    let parsed =
        url::Url::parse(url).map_err(|e| anyhow::anyhow!("invalid proxy URL '{url}': {e}"))?;
    match parsed.scheme() {
        "http" | "https" | "socks5" => Ok(()),
        scheme => Err(anyhow::anyhow!(
            "unsupported proxy scheme '{scheme}' in URL '{url}', expected http/https/socks5"
        )),
    }
}
