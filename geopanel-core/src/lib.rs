//! Core library for the `geopanel` location/weather panel.
//!
//! This crate defines:
//! - The position store (current coordinate + bounded selection history)
//! - Intent resolution (device position, free-text geocoding, map click)
//! - Enrichment fetching (current weather, encyclopedic place description)
//!   with stale-result protection across overlapping requests
//! - The camera-follower seam toward the map widget
//! - Configuration & credentials handling
//!
//! It is used by `geopanel-cli`, but can also be reused by other front ends.

pub mod camera;
pub mod client;
pub mod config;
pub mod enrich;
pub mod model;
pub mod panel;
pub mod resolver;
pub mod store;

pub use camera::{CameraFollower, FlyTo, NullCamera};
pub use client::FetchError;
pub use config::{API_KEY_ENV, Config, FeatureToggles};
pub use enrich::{Enricher, Enrichment, EnrichmentFetcher, FetchState};
pub use model::{
    Coordinate, CoordinateError, HistoryEntry, PlaceDescription, WeatherSnapshot,
};
pub use panel::{LocationWeatherPanel, SearchOutcome, TileSource};
pub use resolver::{DeviceError, DeviceLocator, ForwardGeocoder};
pub use store::{PositionStore, Selection};
