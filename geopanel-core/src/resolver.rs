//! Turns user intents (geolocate, free-text search, map click) into a
//! coordinate plus a display label. All three operations funnel into
//! [`PositionStore::select`](crate::store::PositionStore::select).

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::client::FetchError;
use crate::client::nominatim::GeocodeMatch;
use crate::model::Coordinate;

/// How long we wait for the device position before giving up.
pub const DEVICE_TIMEOUT: Duration = Duration::from_secs(10);

pub const MY_LOCATION_LABEL: &str = "My location";
pub const MAP_CLICK_LABEL: &str = "Map click";

/// A resolved user intent: where to go and what to call it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub coordinate: Coordinate,
    pub label: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("device position request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("location service unavailable")]
    Unavailable,
}

/// The platform's current-position capability. Implementations should
/// respond with a high-accuracy fix where available.
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, DeviceError>;
}

/// Text-to-coordinate geocoding, a ranked list of matches for a query.
/// Implemented by [`NominatimClient`](crate::client::nominatim::NominatimClient).
#[async_trait]
pub trait ForwardGeocoder: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeMatch>, FetchError>;
}

/// Outcome of a free-text resolution that did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum TextResolution {
    Resolved(Resolved),
    /// Geocoder answered with zero matches; state stays unchanged.
    NoMatch,
    /// Empty or whitespace-only query; no network call was made.
    EmptyQuery,
}

/// Asks the device for its position, bounded by [`DEVICE_TIMEOUT`].
/// Failure leaves no trace: no coordinate change, no stale state.
pub async fn resolve_from_device(locator: &dyn DeviceLocator) -> Result<Resolved, DeviceError> {
    let coordinate = tokio::time::timeout(DEVICE_TIMEOUT, locator.current_position())
        .await
        .map_err(|_| DeviceError::TimedOut(DEVICE_TIMEOUT))??;

    tracing::info!(%coordinate, "resolved device position");
    Ok(Resolved { coordinate, label: MY_LOCATION_LABEL.to_string() })
}

/// Geocodes `query` and takes the first match; its label is the first
/// comma-delimited segment of the display name.
pub async fn resolve_from_text(
    geocoder: &dyn ForwardGeocoder,
    query: &str,
) -> Result<TextResolution, FetchError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(TextResolution::EmptyQuery);
    }

    let matches = geocoder.search(query).await?;
    let Some(first) = matches.into_iter().next() else {
        tracing::info!(query, "geocoder returned no matches");
        return Ok(TextResolution::NoMatch);
    };

    let label = label_from_display_name(&first.display_name);
    tracing::info!(coordinate = %first.coordinate, label = %label, "resolved text query");

    Ok(TextResolution::Resolved(Resolved { coordinate: first.coordinate, label }))
}

/// The map widget's click event supplies the coordinate directly.
pub fn resolve_from_click(coordinate: Coordinate) -> Resolved {
    Resolved { coordinate, label: MAP_CLICK_LABEL.to_string() }
}

fn label_from_display_name(display_name: &str) -> String {
    display_name
        .split(',')
        .next()
        .unwrap_or(display_name)
        .trim()
        .to_string()
}
