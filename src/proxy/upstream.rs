//! Upstream forwarding: the stage downstream of the rewriter.

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use reqwest::Client;
use tokio::time::sleep;

use crate::proxy::error::ProxyError;
use crate::proxy::timeout::{RetryConfig, TimeoutConfig};

pub struct UpstreamClient {
    client: Client,
    base_url: String,
    timeout_config: TimeoutConfig,
    retry_config: RetryConfig,
}

impl UpstreamClient {
    pub fn new(
        base_url: String,
        timeout_config: TimeoutConfig,
        retry_config: RetryConfig,
    ) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .connect_timeout(timeout_config.connect)
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to build upstream client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_config,
            retry_config,
        })
    }

    /// Forward a request to the upstream, propagating its outcome verbatim.
    ///
    /// Streaming (SSE) responses are passed through chunk by chunk; other
    /// responses are buffered.
    pub async fn forward(&self, req: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let (parts, body) = req.into_parts();
        let method = parts.method;
        let headers = parts.headers;
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let upstream_uri = format!("{}{}", self.base_url, path_and_query);
        let body_bytes = body
            .collect()
            .await
            .map_err(|e| ProxyError::InvalidRequest(format!("Failed to read request body: {}", e)))?
            .to_bytes();
        let mut attempt = 0u32;

        let upstream_resp = loop {
            let mut builder = self.client.request(method.clone(), &upstream_uri);

            for (name, value) in headers.iter() {
                if name != HOST {
                    builder = builder.header(name, value);
                }
            }

            let send_result = builder
                .timeout(self.timeout_config.request)
                .body(body_bytes.clone())
                .send()
                .await;

            match send_result {
                Ok(response) => break response,
                Err(err) => {
                    let should_retry = err.is_connect() || err.is_timeout();
                    if should_retry && attempt < self.retry_config.max_retries {
                        let backoff = self
                            .retry_config
                            .backoff_base
                            .saturating_mul(1u32 << attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_retries = self.retry_config.max_retries,
                            backoff_ms = backoff.as_millis(),
                            error = %err,
                            "Upstream request failed, retrying"
                        );
                        sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }

                    if err.is_timeout() {
                        return Err(ProxyError::RequestTimeout {
                            duration: self.timeout_config.request.as_secs(),
                        });
                    }

                    return Err(ProxyError::ConnectionError { source: err });
                }
            }
        };

        let content_type = upstream_resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        let is_streaming = content_type.is_some_and(|ct| ct.contains("text/event-stream"));

        let status = upstream_resp.status();
        let mut response_builder = Response::builder().status(status);

        for (name, value) in upstream_resp.headers() {
            response_builder = response_builder.header(name, value);
        }

        if is_streaming {
            let stream = upstream_resp.bytes_stream();
            Ok(response_builder.body(Body::from_stream(stream))?)
        } else {
            let body_bytes = upstream_resp
                .bytes()
                .await
                .map_err(|e| ProxyError::Internal(format!("Failed to read response body: {}", e)))?;
            Ok(response_builder.body(Body::from(body_bytes))?)
        }
    }
}
