use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::client::{FetchError, http_client, truncate_body};

const SUMMARY_BASE: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const SERVICE: &str = "wikipedia";

/// Wikipedia REST page-summary lookup for a place name.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    http: Client,
}

impl WikipediaClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self { http: http_client(timeout)? })
    }

    /// Fetches the summary extract for `title`, or `None` when the page is
    /// missing or carries no extract.
    pub async fn summary(&self, title: &str) -> Result<Option<String>, FetchError> {
        let url = summary_url(title)?;

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport { service: SERVICE, source })?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Transport { service: SERVICE, source })?;

        parse_summary(status, &body)
    }
}

/// Appends `title` as a path segment so it is percent-encoded; titles like
/// "São Paulo" or "Washington, D.C." must survive intact.
fn summary_url(title: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(SUMMARY_BASE).map_err(|err| FetchError::Schema {
        service: SERVICE,
        reason: format!("invalid summary endpoint: {err}"),
    })?;

    url.path_segments_mut()
        .map_err(|()| FetchError::Schema {
            service: SERVICE,
            reason: "summary endpoint cannot carry path segments".to_string(),
        })?
        .push(title);

    Ok(url)
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    extract: Option<String>,
}

pub fn parse_summary(status: u16, body: &str) -> Result<Option<String>, FetchError> {
    // Missing pages are a normal outcome, not a failure.
    if status == 404 {
        return Ok(None);
    }
    if !(200..300).contains(&status) {
        return Err(FetchError::Status {
            service: SERVICE,
            status,
            body: truncate_body(body),
        });
    }

    let parsed: SummaryResponse =
        serde_json::from_str(body).map_err(|source| FetchError::Parse { service: SERVICE, source })?;

    Ok(parsed.extract.filter(|extract| !extract.trim().is_empty()))
}
