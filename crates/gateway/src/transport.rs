//! Delivery of qbXML documents to a request processor.
//!
//! `HttpTransport` POSTs each document to an HTTP endpoint that fronts the
//! QuickBooks request processor and returns the response document. Retry,
//! backoff and status classification live here so the gateway only ever
//! sees a response body or a typed error.

use std::thread;
use std::time::Duration;

use crate::error::GatewayError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const USER_AGENT: &str = concat!("billsync/", env!("CARGO_PKG_VERSION"));

/// Sends one qbXML request document and returns the response document.
pub trait QbxmlTransport {
    fn process(&self, request: &str) -> Result<String, GatewayError>;
}

impl<T: QbxmlTransport + ?Sized> QbxmlTransport for &T {
    fn process(&self, request: &str) -> Result<String, GatewayError> {
        (**self).process(request)
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub app_name: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl HttpTransportConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            app_name: "billsync".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

pub struct HttpTransport {
    http: reqwest::blocking::Client,
    config: HttpTransportConfig,
    initial_backoff: Duration,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, GatewayError> {
        if config.endpoint.trim().is_empty() {
            return Err(GatewayError::Config("gateway endpoint is empty".to_string()));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GatewayError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            initial_backoff: Duration::from_secs(1),
        })
    }

    /// First retry delay; doubles on each further attempt.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    fn build_request(&self, body: &str) -> reqwest::blocking::RequestBuilder {
        let mut req = self
            .http
            .post(&self.config.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("X-Qbxml-App", &self.config.app_name)
            .body(body.to_string());
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        req
    }
}

impl QbxmlTransport for HttpTransport {
    fn process(&self, request: &str) -> Result<String, GatewayError> {
        let max_retries = self.config.max_retries;
        let mut backoff = self.initial_backoff;

        log::debug!("POST {} ({} bytes)", self.config.endpoint, request.len());

        for attempt in 0..=max_retries {
            match self.build_request(request).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    // Auth errors: fail immediately
                    if status == 401 || status == 403 {
                        return Err(GatewayError::Auth {
                            status,
                            message: body_excerpt(resp),
                        });
                    }

                    // Other 4xx (not 429): fail immediately
                    if (400..500).contains(&status) && status != 429 {
                        return Err(GatewayError::Rejected {
                            status,
                            message: body_excerpt(resp),
                        });
                    }

                    // Retryable: 429, 5xx
                    if status == 429 || status >= 500 {
                        if attempt == max_retries {
                            return Err(GatewayError::Upstream(format!(
                                "{} after {} attempts (HTTP {})",
                                if status == 429 { "rate limited" } else { "server error" },
                                attempt + 1,
                                status,
                            )));
                        }

                        let wait = if status == 429 {
                            resp.headers()
                                .get(reqwest::header::RETRY_AFTER)
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.trim().parse::<u64>().ok())
                                .map(Duration::from_secs)
                                .unwrap_or(backoff)
                        } else {
                            backoff
                        };

                        log::warn!(
                            "retry {}/{} in {:?} (HTTP {})",
                            attempt + 1,
                            max_retries,
                            wait,
                            status,
                        );
                        thread::sleep(wait);
                        backoff *= 2;
                        continue;
                    }

                    let text = resp.text().map_err(|e| {
                        GatewayError::Upstream(format!("failed to read response body: {}", e))
                    })?;
                    log::debug!("response {} bytes (HTTP {})", text.len(), status);
                    return Ok(text);
                }
                Err(e) => {
                    // Network/timeout errors: retry
                    if attempt == max_retries {
                        return Err(GatewayError::Upstream(format!(
                            "{} unreachable after {} attempts: {}",
                            self.config.endpoint,
                            attempt + 1,
                            e,
                        )));
                    }

                    log::warn!("retry {}/{} in {:?} ({})", attempt + 1, max_retries, backoff, e);
                    thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }

        Err(GatewayError::Upstream("retry loop exhausted".to_string()))
    }
}

fn body_excerpt(resp: reqwest::blocking::Response) -> String {
    let text = resp.text().unwrap_or_default();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(empty body)".to_string();
    }
    trimmed.chars().take(200).collect()
}
