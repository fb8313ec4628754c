//! The panel itself: composition of store, resolver operations, enrichment
//! fetcher and camera follower. Data flows one direction only:
//! intent → resolver → select → (camera fly-to, enrichment refresh) → render.

use anyhow::{Context, Result};

use crate::camera::{CameraFollower, FlyTo};
use crate::client::FetchError;
use crate::client::nominatim::NominatimClient;
use crate::client::openweather::OpenWeatherClient;
use crate::client::wikipedia::WikipediaClient;
use crate::config::{Config, FeatureToggles};
use crate::enrich::{Enricher, Enrichment, EnrichmentFetcher, FetchState};
use crate::model::{Coordinate, HistoryEntry, PlaceDescription, WeatherSnapshot};
use crate::resolver::{self, DeviceError, DeviceLocator, ForwardGeocoder, Resolved, TextResolution};
use crate::store::{PositionStore, Selection};

/// Which tile layer the map renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSource {
    Street,
    Satellite,
}

impl TileSource {
    pub fn tile_url(&self) -> &'static str {
        match self {
            TileSource::Street => "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            TileSource::Satellite => {
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
            }
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TileSource::Street => TileSource::Satellite,
            TileSource::Satellite => TileSource::Street,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TileSource::Street => "street",
            TileSource::Satellite => "satellite",
        }
    }
}

impl std::fmt::Display for TileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a free-text search driven through the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Selected(Selection),
    NoMatch,
    EmptyQuery,
}

/// An interactive location/weather panel session. State is local to one
/// session; nothing is shared across users.
pub struct LocationWeatherPanel {
    store: PositionStore,
    enrichment: Enrichment,
    fetcher: Box<dyn Enricher>,
    geocoder: Box<dyn ForwardGeocoder>,
    camera: Box<dyn CameraFollower>,
    tiles: TileSource,
    features: FeatureToggles,
}

impl LocationWeatherPanel {
    /// Builds the panel and its boundary clients. Fails fast when the
    /// weather API key is missing so no malformed request is ever sent.
    pub fn new(config: &Config, camera: Box<dyn CameraFollower>) -> Result<Self> {
        let api_key = config.weather_api_key()?;
        let timeout = config.fetch_timeout();

        let weather = OpenWeatherClient::new(api_key, timeout)
            .context("Failed to build the weather client")?;
        let geocoder =
            NominatimClient::new(timeout).context("Failed to build the geocoding client")?;
        let summaries =
            WikipediaClient::new(timeout).context("Failed to build the summary client")?;

        Ok(Self {
            store: PositionStore::new(),
            enrichment: Enrichment::new(),
            fetcher: Box::new(EnrichmentFetcher::new(weather, geocoder.clone(), summaries)),
            geocoder: Box::new(geocoder),
            camera,
            tiles: if config.satellite { TileSource::Satellite } else { TileSource::Street },
            features: config.features.clone(),
        })
    }

    /// Selects the device's current position ("My location").
    pub async fn locate(&mut self, locator: &dyn DeviceLocator) -> Result<Selection, DeviceError> {
        let resolved = resolver::resolve_from_device(locator).await?;
        Ok(self.apply(resolved).await)
    }

    /// Geocodes `query` and selects the first match. Empty queries and
    /// zero-match responses leave all state untouched.
    pub async fn search(&mut self, query: &str) -> Result<SearchOutcome, FetchError> {
        match resolver::resolve_from_text(self.geocoder.as_ref(), query).await? {
            TextResolution::Resolved(resolved) => {
                let selection = self.apply(resolved).await;
                Ok(SearchOutcome::Selected(selection))
            }
            TextResolution::NoMatch => Ok(SearchOutcome::NoMatch),
            TextResolution::EmptyQuery => Ok(SearchOutcome::EmptyQuery),
        }
    }

    /// Selects a coordinate supplied by the map's click event. Returns
    /// `None` when click-to-select is disabled by configuration.
    pub async fn click(&mut self, coordinate: Coordinate) -> Option<Selection> {
        if !self.features.map_click {
            tracing::debug!("map click ignored: feature disabled");
            return None;
        }
        Some(self.apply(resolver::resolve_from_click(coordinate)).await)
    }

    /// Re-selects a history entry by id without recording a new entry.
    pub async fn revisit(&mut self, entry_id: u64) -> Option<Selection> {
        let coordinate = self
            .store
            .history()
            .iter()
            .find(|entry| entry.id == entry_id)
            .map(|entry| entry.coordinate)?;

        let selection = self.store.revisit(coordinate);
        self.follow_and_refresh(selection).await;
        Some(selection)
    }

    /// Flips between street and satellite imagery. Returns `None` when the
    /// toggle is disabled by configuration.
    pub fn toggle_imagery(&mut self) -> Option<TileSource> {
        if !self.features.imagery_toggle {
            tracing::debug!("imagery toggle ignored: feature disabled");
            return None;
        }
        self.tiles = self.tiles.toggled();
        Some(self.tiles)
    }

    async fn apply(&mut self, resolved: Resolved) -> Selection {
        let selection = self.store.select(resolved.coordinate, resolved.label);
        self.follow_and_refresh(selection).await;
        selection
    }

    async fn follow_and_refresh(&mut self, selection: Selection) {
        self.camera.fly_to(FlyTo::to(selection.coordinate));
        self.fetcher.refresh(&selection, &mut self.enrichment).await;
    }

    pub fn current(&self) -> Option<Coordinate> {
        self.store.current()
    }

    /// Recent selections, newest first; empty when the history feature is
    /// disabled.
    pub fn history(&self) -> &[HistoryEntry] {
        if !self.features.history {
            return &[];
        }
        self.store.history()
    }

    pub fn weather(&self) -> &FetchState<WeatherSnapshot> {
        self.enrichment.weather()
    }

    pub fn description(&self) -> &FetchState<PlaceDescription> {
        self.enrichment.description()
    }

    pub fn tiles(&self) -> TileSource {
        self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::nominatim::GeocodeMatch;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingCamera {
        flights: Arc<Mutex<Vec<FlyTo>>>,
    }

    impl CameraFollower for RecordingCamera {
        fn fly_to(&mut self, command: FlyTo) {
            self.flights.lock().expect("camera mutex").push(command);
        }
    }

    fn test_config() -> Config {
        let mut cfg = Config::default();
        cfg.set_weather_api_key("TEST_KEY".to_string());
        cfg
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("test coordinate")
    }

    struct FixedGeocoder(Vec<GeocodeMatch>);

    #[async_trait]
    impl ForwardGeocoder for FixedGeocoder {
        async fn search(&self, _query: &str) -> Result<Vec<GeocodeMatch>, FetchError> {
            Ok(self.0.clone())
        }
    }

    /// Settles both pipelines immediately: fixed weather, absent description.
    struct SettledEnricher;

    #[async_trait]
    impl Enricher for SettledEnricher {
        async fn refresh(&self, selection: &Selection, enrichment: &mut Enrichment) {
            enrichment.begin(selection);
            enrichment.apply_weather(
                selection,
                FetchState::Ready(WeatherSnapshot {
                    temperature_c: 21.3,
                    feels_like_c: 20.1,
                    temp_min_c: 18.0,
                    temp_max_c: 23.4,
                    humidity_pct: 62,
                    condition: "scattered clouds".to_string(),
                }),
            );
            enrichment.apply_description(selection, FetchState::Absent);
        }
    }

    #[test]
    fn panel_construction_fails_without_api_key() {
        let cfg = Config { weather_api_key: None, ..Config::default() };
        // Keep the env override out of this test's way.
        if std::env::var(crate::config::API_KEY_ENV).is_ok() {
            return;
        }
        let err = LocationWeatherPanel::new(&cfg, Box::new(RecordingCamera::default()))
            .err()
            .expect("must fail fast");
        assert!(err.to_string().contains("No OpenWeather API key"));
    }

    #[test]
    fn panel_starts_on_satellite_by_default() {
        let panel = LocationWeatherPanel::new(&test_config(), Box::new(RecordingCamera::default()))
            .expect("panel builds");
        assert_eq!(panel.tiles(), TileSource::Satellite);
    }

    #[test]
    fn imagery_toggle_flips_and_respects_config() {
        let mut panel =
            LocationWeatherPanel::new(&test_config(), Box::new(RecordingCamera::default()))
                .expect("panel builds");
        assert_eq!(panel.toggle_imagery(), Some(TileSource::Street));
        assert_eq!(panel.toggle_imagery(), Some(TileSource::Satellite));

        let mut cfg = test_config();
        cfg.features.imagery_toggle = false;
        let mut fixed = LocationWeatherPanel::new(&cfg, Box::new(RecordingCamera::default()))
            .expect("panel builds");
        assert_eq!(fixed.toggle_imagery(), None);
        assert_eq!(fixed.tiles(), TileSource::Satellite);
    }

    #[tokio::test]
    async fn disabled_map_click_changes_nothing() {
        let camera = RecordingCamera::default();
        let mut cfg = test_config();
        cfg.features.map_click = false;

        let mut panel = LocationWeatherPanel::new(&cfg, Box::new(camera.clone()))
            .expect("panel builds");

        assert!(panel.click(coord(51.5, -0.12)).await.is_none());
        assert_eq!(panel.current(), None);
        assert!(panel.history().is_empty());
        assert!(camera.flights.lock().expect("camera mutex").is_empty());
    }

    #[test]
    fn disabled_history_renders_empty() {
        let mut cfg = test_config();
        cfg.features.history = false;

        let mut panel = LocationWeatherPanel::new(&cfg, Box::new(RecordingCamera::default()))
            .expect("panel builds");

        // Seed the store directly; selection still happens, only the
        // rendered list is suppressed.
        panel.store.select(coord(1.0, 1.0), "a");
        assert!(panel.history().is_empty());
        assert_eq!(panel.current(), Some(coord(1.0, 1.0)));
    }

    #[tokio::test]
    async fn zero_match_search_leaves_state_untouched() {
        let camera = RecordingCamera::default();
        let mut panel = LocationWeatherPanel::new(&test_config(), Box::new(camera.clone()))
            .expect("panel builds");
        panel.geocoder = Box::new(FixedGeocoder(Vec::new()));

        let outcome = panel.search("atlantis").await.expect("search succeeded");

        assert_eq!(outcome, SearchOutcome::NoMatch);
        assert_eq!(panel.current(), None);
        assert!(panel.history().is_empty());
        assert!(camera.flights.lock().expect("camera mutex").is_empty());
    }

    #[tokio::test]
    async fn paris_search_selects_first_match_through_the_whole_panel() {
        let camera = RecordingCamera::default();
        let mut panel = LocationWeatherPanel::new(&test_config(), Box::new(camera.clone()))
            .expect("panel builds");
        panel.geocoder = Box::new(FixedGeocoder(vec![GeocodeMatch {
            coordinate: coord(48.8566, 2.3522),
            display_name: "Paris, Île-de-France, France".to_string(),
        }]));
        panel.fetcher = Box::new(SettledEnricher);

        let outcome = panel.search("Paris").await.expect("search succeeded");

        let SearchOutcome::Selected(selection) = outcome else {
            panic!("expected a selection, got {outcome:?}");
        };
        assert_eq!(selection.coordinate, coord(48.8566, 2.3522));
        assert_eq!(panel.current(), Some(coord(48.8566, 2.3522)));
        assert_eq!(panel.history()[0].label, "Paris");

        let flights = camera.flights.lock().expect("camera mutex");
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].target, coord(48.8566, 2.3522));

        let weather = panel.weather().value().expect("enrichment applied");
        assert_eq!(weather.temperature_c, 21.3);
        assert!(matches!(panel.description(), FetchState::Absent));
    }

    #[test]
    fn tile_urls_match_the_observed_layers() {
        assert!(TileSource::Street.tile_url().contains("openstreetmap.org"));
        assert!(TileSource::Satellite.tile_url().contains("World_Imagery"));
    }
}
