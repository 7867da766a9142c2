//! Error type shared by every client operation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OutscraperError>;

#[derive(Debug, Error)]
pub enum OutscraperError {
    /// The API answered with a non-2xx status.
    #[error("response status code: {status} ({path})")]
    Status { status: u16, path: String },

    /// The API answered 2xx but flagged the payload with `error: true`.
    #[error("error: {message}")]
    Api { message: String },

    /// A queued request was still pending after the whole poll budget.
    #[error("timeout exceeded waiting for request {request_id} after {attempts} polls")]
    Timeout { request_id: String, attempts: u64 },

    /// Every mirror failed on every pass.
    #[error("failed to perform request against all API URLs after {attempts} passes: {last_error}")]
    AllUrlsFailed { attempts: u32, last_error: String },

    #[error("network error calling {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response body from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("async response from {path} carried no request id")]
    MissingJobId { path: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl OutscraperError {
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    pub fn decode(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Network failures, 5xx answers and exhausted mirror lists may succeed
    /// when tried again; everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::AllUrlsFailed { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let server = OutscraperError::Status {
            status: 503,
            path: "/requests/x".into(),
        };
        let client = OutscraperError::Status {
            status: 404,
            path: "/requests/x".into(),
        };
        let exhausted = OutscraperError::AllUrlsFailed {
            attempts: 3,
            last_error: "connection refused".into(),
        };

        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(exhausted.is_transient());
        assert!(!OutscraperError::Api { message: "bad key".into() }.is_transient());
        assert!(!OutscraperError::InvalidArgument("limit".into()).is_transient());
    }

    #[test]
    fn test_api_error_message() {
        let err = OutscraperError::Api {
            message: "Not enough credits".into(),
        };
        assert_eq!(err.to_string(), "error: Not enough credits");
    }
}
