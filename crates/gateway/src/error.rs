use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// 401/403 from the request processor.
    #[error("ledger auth failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Non-retryable 4xx.
    #[error("ledger rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Network failure or 429/5xx after exhausting retries.
    #[error("ledger upstream error: {0}")]
    Upstream(String),

    /// Response body is not a usable qbXML document.
    #[error("qbXML protocol error: {0}")]
    Protocol(String),

    /// A qbXML response carried an error status.
    #[error("qbXML request {request_id} failed (status {code}): {message}")]
    Status {
        request_id: String,
        code: i64,
        message: String,
    },

    #[error("invalid gateway configuration: {0}")]
    Config(String),
}
