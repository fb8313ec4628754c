//! Nominatim (OpenStreetMap) geocoding: free-text search and
//! coordinate-to-place reverse lookup. Sends an identifying User-Agent per
//! the Nominatim usage policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::client::{FetchError, http_client, truncate_body};
use crate::model::Coordinate;
use crate::resolver::ForwardGeocoder;

const SEARCH_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const REVERSE_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";
const SERVICE: &str = "nominatim";

#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: Client,
}

/// One ranked geocoder match for a free-text query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub coordinate: Coordinate,
    pub display_name: String,
}

impl NominatimClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self { http: http_client(timeout)? })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<GeocodeMatch>, FetchError> {
        let res = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
            .map_err(|source| FetchError::Transport { service: SERVICE, source })?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Transport { service: SERVICE, source })?;

        parse_search(status, &body)
    }

    /// Resolves a coordinate to a place name, or `None` when the address
    /// carries none of the fields we can name a place by.
    pub async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, FetchError> {
        let res = self
            .http
            .get(REVERSE_ENDPOINT)
            .query(&[
                ("lat", coordinate.latitude().to_string()),
                ("lon", coordinate.longitude().to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Transport { service: SERVICE, source })?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Transport { service: SERVICE, source })?;

        parse_reverse(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    lat: String,
    lon: String,
    display_name: String,
}

pub fn parse_search(status: u16, body: &str) -> Result<Vec<GeocodeMatch>, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Status {
            service: SERVICE,
            status,
            body: truncate_body(body),
        });
    }

    let entries: Vec<SearchEntry> =
        serde_json::from_str(body).map_err(|source| FetchError::Parse { service: SERVICE, source })?;

    // Only the first usable match is ever selected, so an unusable entry
    // elsewhere in the ranked list must not sink the whole search.
    let mut matches = Vec::with_capacity(entries.len());
    for entry in entries {
        match match_from_entry(entry) {
            Ok(m) => matches.push(m),
            Err(err) => tracing::warn!(error = %err, "skipping unusable geocoder match"),
        }
    }

    Ok(matches)
}

fn match_from_entry(entry: SearchEntry) -> Result<GeocodeMatch, FetchError> {
    // Nominatim serializes coordinates as strings.
    let latitude: f64 = entry.lat.parse().map_err(|_| FetchError::Schema {
        service: SERVICE,
        reason: format!("latitude {:?} is not a number", entry.lat),
    })?;
    let longitude: f64 = entry.lon.parse().map_err(|_| FetchError::Schema {
        service: SERVICE,
        reason: format!("longitude {:?} is not a number", entry.lon),
    })?;

    let coordinate = Coordinate::new(latitude, longitude).map_err(|err| FetchError::Schema {
        service: SERVICE,
        reason: err.to_string(),
    })?;

    Ok(GeocodeMatch { coordinate, display_name: entry.display_name })
}

#[async_trait]
impl ForwardGeocoder for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeMatch>, FetchError> {
        NominatimClient::search(self, query).await
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<AddressBlock>,
}

#[derive(Debug, Deserialize, Default)]
struct AddressBlock {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
}

pub fn parse_reverse(status: u16, body: &str) -> Result<Option<String>, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Status {
            service: SERVICE,
            status,
            body: truncate_body(body),
        });
    }

    let parsed: ReverseResponse =
        serde_json::from_str(body).map_err(|source| FetchError::Parse { service: SERVICE, source })?;

    Ok(parsed.address.and_then(|address| place_name(&address)))
}

/// City, then town, then village, then state; first non-empty wins.
fn place_name(address: &AddressBlock) -> Option<String> {
    [&address.city, &address.town, &address.village, &address.state]
        .into_iter()
        .flatten()
        .map(|name| name.trim())
        .find(|name| !name.is_empty())
        .map(ToOwned::to_owned)
}
