//! Coordinate-triggered enrichment: the weather pipeline and the
//! description pipeline run concurrently, and their completions are only
//! applied while the triggering selection is still the latest one. A late
//! result for a superseded coordinate is dropped, never rendered.

use async_trait::async_trait;

use crate::client::FetchError;
use crate::client::nominatim::NominatimClient;
use crate::client::openweather::OpenWeatherClient;
use crate::client::wikipedia::WikipediaClient;
use crate::model::{Coordinate, PlaceDescription, WeatherSnapshot};
use crate::store::Selection;

/// Lifecycle of one enrichment field. `Absent` means the lookup completed
/// but had nothing to show (zero-result), distinct from `Failed`.
#[derive(Debug)]
pub enum FetchState<T> {
    Pending,
    Ready(T),
    Absent,
    Failed(FetchError),
}

impl<T> FetchState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchState::Pending)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// The latest successfully applied enrichment values, tagged with the
/// generation they belong to.
#[derive(Debug)]
pub struct Enrichment {
    generation: u64,
    weather: FetchState<WeatherSnapshot>,
    description: FetchState<PlaceDescription>,
}

impl Default for Enrichment {
    fn default() -> Self {
        Self::new()
    }
}

impl Enrichment {
    pub fn new() -> Self {
        Self {
            generation: 0,
            weather: FetchState::Pending,
            description: FetchState::Pending,
        }
    }

    /// Marks a new coordinate change: both fields reset to pending and any
    /// completion carrying an older selection becomes stale.
    pub fn begin(&mut self, selection: &Selection) {
        self.generation = selection.generation;
        self.weather = FetchState::Pending;
        self.description = FetchState::Pending;
    }

    pub fn apply_weather(&mut self, selection: &Selection, state: FetchState<WeatherSnapshot>) {
        if self.is_stale(selection, "weather") {
            return;
        }
        self.weather = state;
    }

    pub fn apply_description(
        &mut self,
        selection: &Selection,
        state: FetchState<PlaceDescription>,
    ) {
        if self.is_stale(selection, "description") {
            return;
        }
        self.description = state;
    }

    fn is_stale(&self, selection: &Selection, pipeline: &'static str) -> bool {
        if selection.generation == self.generation {
            return false;
        }
        tracing::debug!(
            pipeline,
            stale_generation = selection.generation,
            current_generation = self.generation,
            "dropping stale enrichment result"
        );
        true
    }

    pub fn weather(&self) -> &FetchState<WeatherSnapshot> {
        &self.weather
    }

    pub fn description(&self) -> &FetchState<PlaceDescription> {
        &self.description
    }
}

/// Drives both enrichment pipelines for a selection. The panel talks to
/// this seam so front ends and tests can substitute their own.
#[async_trait]
pub trait Enricher: Send {
    /// Runs the weather and description pipelines and applies whichever
    /// results are still current when they land.
    async fn refresh(&self, selection: &Selection, enrichment: &mut Enrichment);
}

/// Owns the boundary clients and runs the two pipelines concurrently.
#[derive(Debug, Clone)]
pub struct EnrichmentFetcher {
    weather: OpenWeatherClient,
    geocoder: NominatimClient,
    summaries: WikipediaClient,
}

#[async_trait]
impl Enricher for EnrichmentFetcher {
    async fn refresh(&self, selection: &Selection, enrichment: &mut Enrichment) {
        enrichment.begin(selection);

        let (weather, description) = tokio::join!(
            self.fetch_weather(selection.coordinate),
            self.fetch_description(selection.coordinate),
        );

        enrichment.apply_weather(selection, weather);
        enrichment.apply_description(selection, description);
    }
}

impl EnrichmentFetcher {
    pub fn new(
        weather: OpenWeatherClient,
        geocoder: NominatimClient,
        summaries: WikipediaClient,
    ) -> Self {
        Self { weather, geocoder, summaries }
    }

    async fn fetch_weather(&self, coordinate: Coordinate) -> FetchState<WeatherSnapshot> {
        match self.weather.current(coordinate).await {
            Ok(snapshot) => FetchState::Ready(snapshot),
            Err(err) => {
                tracing::warn!(%coordinate, error = %err, "weather fetch failed");
                FetchState::Failed(err)
            }
        }
    }

    /// Two-stage chain: reverse-geocode to a place name, then fetch its
    /// summary. No resolvable name means no second call.
    async fn fetch_description(&self, coordinate: Coordinate) -> FetchState<PlaceDescription> {
        let place = match self.geocoder.reverse(coordinate).await {
            Ok(Some(place)) => place,
            Ok(None) => return FetchState::Absent,
            Err(err) => {
                tracing::warn!(%coordinate, error = %err, "reverse geocode failed");
                return FetchState::Failed(err);
            }
        };

        match self.summaries.summary(&place).await {
            Ok(Some(extract)) => FetchState::Ready(PlaceDescription::from_extract(&extract)),
            Ok(None) => FetchState::Absent,
            Err(err) => {
                tracing::warn!(place = %place, error = %err, "summary fetch failed");
                FetchState::Failed(err)
            }
        }
    }
}
