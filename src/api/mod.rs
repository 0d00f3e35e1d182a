//! HTTP client for the listening-statistics backend.
//!
//! The backend owns all aggregation and both prediction models; this side
//! only fetches JSON and posts prediction payloads. See [`client`] for the
//! endpoint list and [`types`] for the wire records.

pub mod client;
pub mod types;

use thiserror::Error;

pub use client::BackendClient;

/// Failure of a single backend request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// Connection refused, DNS failure, timeout, ...
    #[error("could not reach the server: {0}")]
    Transport(String),
    /// Non-2xx status. `message` is the backend's `error` field when present.
    #[error("server error ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// 2xx with a body that is missing fields or out of range.
    #[error("unexpected response: {0}")]
    DataShape(String),
}

impl RequestError {
    /// Short machine-readable tag for JSON responses and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Rejected { .. } => "rejected",
            Self::DataShape(_) => "data_shape",
        }
    }
}

impl From<ureq::Error> for RequestError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, resp) => {
                let status_text = resp.status_text().to_string();
                let message = resp
                    .into_json::<types::ErrorBody>()
                    .map(|body| body.message())
                    .unwrap_or(status_text);
                Self::Rejected { status, message }
            }
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}
