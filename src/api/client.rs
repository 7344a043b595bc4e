// src/api/client.rs
//! HTTP client for content-addressed gateways.
//!
//! `GET {base}/{cid}[?pinataGatewayToken=...]`, throttled per gateway and
//! retried according to [`RetryPolicy`]. Only a repeated 404 ever comes
//! back as an error.

use super::rate_limit::{LimiterRegistry, RateLimiter};
use super::DocumentSource;
use crate::config::{Endpoint, GatewayConfig};
use crate::constants::{ERROR_BODY_PREVIEW_LENGTH, GATEWAY_TOKEN_QUERY_PARAM};
use crate::error::{error_chain_text, AppError, FetchError, NetworkFailureKind};
use crate::error_recovery::{retry_with_policy, AttemptFailure, RetryPolicy};
use crate::schema::SchemaRegistry;
use crate::types::{Cid, DocumentType};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Per-request ceiling; a request that hits it is retried like any other
/// transport failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway-backed [`DocumentSource`].
#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
    limiters: Arc<LimiterRegistry>,
    schemas: Arc<SchemaRegistry>,
    policy: RetryPolicy,
}

impl GatewayClient {
    /// Creates a client with its own limiter registry.
    pub fn new(config: GatewayConfig) -> Result<Self, AppError> {
        let limiters = Arc::new(LimiterRegistry::from_config(&config));
        Self::with_limiters(config, limiters)
    }

    /// Creates a client drawing from an existing limiter registry.
    pub fn with_limiters(
        config: GatewayConfig,
        limiters: Arc<LimiterRegistry>,
    ) -> Result<Self, AppError> {
        if !limiters.covers(&config) {
            return Err(AppError::MissingConfiguration(
                "rate limiter registry does not cover every configured gateway".to_string(),
            ));
        }
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            config,
            limiters,
            schemas: Arc::new(SchemaRegistry::new()),
            policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_schemas(mut self, schemas: Arc<SchemaRegistry>) -> Self {
        self.schemas = schemas;
        self
    }

    /// Builds the request URL for a CID on an endpoint.
    pub fn request_url(endpoint: &Endpoint, cid: &Cid) -> Result<Url, FetchError> {
        let mut url = endpoint.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidRequestUrl {
                base: endpoint.base_url.to_string(),
                cid: cid.clone(),
                reason: "base URL cannot have path segments".to_string(),
            })?
            .pop_if_empty()
            .push(cid.as_str());
        if let Some(token) = &endpoint.token {
            url.query_pairs_mut()
                .append_pair(GATEWAY_TOKEN_QUERY_PARAM, token);
        }
        Ok(url)
    }

    /// One throttled GET, classified into success or a retryable failure.
    async fn attempt(
        &self,
        request: &Request<'_>,
        attempt: u32,
    ) -> Result<Value, AttemptFailure> {
        request.limiter.acquire().await;
        let started = Instant::now();
        let doc_type = request.doc_type;
        let cid = request.cid;
        let gateway = request.endpoint.base_url.as_str();

        let response = match self.http.get(request.url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                let kind = NetworkFailureKind::classify(&err);
                log::warn!(
                    "{} fetch failed with runtime error, will retry: cid={} gateway={} attempt={} duration_ms={} cause={} error={}",
                    doc_type,
                    cid,
                    gateway,
                    attempt,
                    started.elapsed().as_millis(),
                    kind,
                    error_chain_text(&err)
                );
                return Err(AttemptFailure::Transport(kind));
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            log::warn!(
                "{} fetch returned 404: cid={} gateway={} attempt={} duration_ms={}",
                doc_type,
                cid,
                gateway,
                attempt,
                started.elapsed().as_millis()
            );
            return Err(AttemptFailure::NotFound);
        }
        if !status.is_success() {
            log::warn!(
                "{} fetch failed with HTTP status, will retry: cid={} gateway={} status={} attempt={} duration_ms={}",
                doc_type,
                cid,
                gateway,
                status.as_u16(),
                attempt,
                started.elapsed().as_millis()
            );
            return Err(AttemptFailure::HttpStatus(status.as_u16()));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                let kind = NetworkFailureKind::classify(&err);
                log::warn!(
                    "{} body read failed, will retry: cid={} gateway={} attempt={} duration_ms={} cause={}",
                    doc_type,
                    cid,
                    gateway,
                    attempt,
                    started.elapsed().as_millis(),
                    kind
                );
                return Err(AttemptFailure::Transport(kind));
            }
        };

        let checked = serde_json::from_slice::<Value>(&body)
            .map_err(|e| format!("body is not JSON ({}): {}", e, preview(&body)))
            .and_then(|value| {
                self.schemas
                    .validate(doc_type, &value)
                    .map(|_| value)
                    .map_err(|e| e.to_string())
            });

        match checked {
            Ok(value) => {
                if attempt > 1 {
                    log::info!(
                        "{} fetch succeeded after {} attempts: cid={} gateway={} duration_ms={}",
                        doc_type,
                        attempt,
                        cid,
                        gateway,
                        started.elapsed().as_millis()
                    );
                } else {
                    log::debug!(
                        "{} fetched: cid={} gateway={} duration_ms={}",
                        doc_type,
                        cid,
                        gateway,
                        started.elapsed().as_millis()
                    );
                }
                Ok(value)
            }
            Err(reason) => {
                log::warn!(
                    "{} validation failed, will retry: cid={} gateway={} attempt={} duration_ms={} reason={}",
                    doc_type,
                    cid,
                    gateway,
                    attempt,
                    started.elapsed().as_millis(),
                    reason
                );
                Err(AttemptFailure::InvalidPayload(reason))
            }
        }
    }
}

/// Everything one fetch needs across its attempts.
struct Request<'a> {
    doc_type: DocumentType,
    cid: &'a Cid,
    endpoint: &'a Endpoint,
    limiter: Arc<RateLimiter>,
    url: Url,
}

fn preview(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(ERROR_BODY_PREVIEW_LENGTH)
        .collect()
}

#[async_trait::async_trait]
impl DocumentSource for GatewayClient {
    async fn fetch(&self, doc_type: DocumentType, cid: &Cid) -> Result<Value, FetchError> {
        let endpoint = self
            .config
            .endpoint_for(doc_type)
            .ok_or(FetchError::EndpointNotConfigured { doc_type })?;
        let limiter = self
            .limiters
            .limiter_for(endpoint)
            .ok_or(FetchError::EndpointNotConfigured { doc_type })?;
        let request = Request {
            doc_type,
            cid,
            endpoint,
            limiter,
            url: Self::request_url(endpoint, cid)?,
        };

        retry_with_policy(&self.policy, |attempt| self.attempt(&request, attempt))
            .await
            .map_err(|exhausted| {
                log::error!(
                    "{} fetch returned 404 after {} attempts, stopping: cid={} gateway={}",
                    doc_type,
                    exhausted.attempts,
                    cid,
                    endpoint.base_url
                );
                FetchError::NotFoundAfterRetries {
                    doc_type,
                    cid: cid.clone(),
                    attempts: exhausted.attempts,
                }
            })
    }
}
