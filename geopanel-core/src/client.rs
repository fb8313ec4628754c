//! HTTP boundary: one thin client per third-party API, each splitting the
//! network call from a pure `parse_*(status, body)` function so response
//! handling is testable without a socket.

use std::time::Duration;

use thiserror::Error;

pub mod nominatim;
pub mod openweather;
pub mod wikipedia;

pub(crate) const USER_AGENT: &str = concat!("geopanel/", env!("CARGO_PKG_VERSION"));

/// Failure of a single boundary fetch. Recoverable by design: the
/// corresponding panel field degrades to absent/failed, nothing else moves.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {service} failed")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to parse {service} response")]
    Parse {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} returned an unusable payload: {reason}")]
    Schema {
        service: &'static str,
        reason: String,
    },
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Keeps error bodies short enough for log lines and error messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    let mut out: String = body.chars().take(MAX).collect();
    if body.chars().count() > MAX {
        out.push_str("...");
    }
    out
}
