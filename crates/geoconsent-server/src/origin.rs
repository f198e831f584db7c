//! Origin fetch — forwards a request to the upstream web server.

use axum::body::{Body, HttpBody};
use axum::http::{Request, Response};
use futures::future::BoxFuture;
use geoconsent_core::{Error, Result};
use reqwest::Client;
use tracing::debug;

/// Something that can answer a request on behalf of the origin server.
pub trait Origin: Send + Sync {
    fn fetch(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>>>;
}

/// Forwards requests over HTTP with reqwest. Redirects are passed back, not followed.
pub struct HttpOrigin {
    client: Client,
    base_url: String,
}

impl HttpOrigin {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", self.base_url, path_and_query);

        // Bodiless requests must not go out chunked.
        let empty_body = body.size_hint().exact() == Some(0);

        let mut upstream = self.client.request(parts.method.clone(), &url);
        for (name, value) in parts.headers.iter() {
            if !is_hop_by_hop_header(name.as_str()) {
                upstream = upstream.header(name, value);
            }
        }
        if !empty_body {
            upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        debug!("Forwarding {} {}", parts.method, url);
        let upstream = upstream
            .send()
            .await
            .map_err(|e| Error::Origin(format!("{} {}: {}", parts.method, url, e)))?;

        let mut response = Response::builder().status(upstream.status());
        if let Some(headers) = response.headers_mut() {
            for (name, value) in upstream.headers() {
                if !is_hop_by_hop_header(name.as_str()) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }
        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| Error::Http(e.to_string()))
    }
}

impl Origin for HttpOrigin {
    fn fetch(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>>> {
        Box::pin(self.forward(request))
    }
}

/// Check if a header is a hop-by-hop header that shouldn't be forwarded.
fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_by_hop() {
        assert!(is_hop_by_hop_header("Connection"));
        assert!(is_hop_by_hop_header("transfer-encoding"));
        assert!(!is_hop_by_hop_header("cookie"));
        assert!(!is_hop_by_hop_header("host"));
        assert!(!is_hop_by_hop_header("content-type"));
    }

    #[test]
    fn test_base_url_trimmed() {
        let origin = HttpOrigin::new("http://127.0.0.1:8080/").unwrap();
        assert_eq!(origin.base_url(), "http://127.0.0.1:8080");
    }
}
