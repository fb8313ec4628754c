use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};

use chrono::Local;
use geopanel_core::{
    CameraFollower, Config, Coordinate, DeviceError, DeviceLocator, FetchState, FlyTo,
    HistoryEntry, LocationWeatherPanel, SearchOutcome, TileSource,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geopanel", version, about = "Interactive location & weather panel")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional home coordinate.
    Configure,

    /// Search for a place by name and show its weather.
    Search {
        /// City, place, landmark...
        query: String,
    },

    /// Select a coordinate directly, the map-click analogue.
    #[command(allow_negative_numbers = true)]
    At { latitude: f64, longitude: f64 },

    /// Use the configured home coordinate as the device position.
    Here,

    /// Flip between street and satellite imagery and remember the choice.
    Imagery,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { query } => {
                let mut panel = build_panel()?;
                match panel.search(&query).await? {
                    SearchOutcome::Selected(_) => render(&panel),
                    SearchOutcome::NoMatch => println!("No matches for {query:?}."),
                    SearchOutcome::EmptyQuery => println!("Nothing to search for."),
                }
                Ok(())
            }
            Command::At { latitude, longitude } => {
                let coordinate = Coordinate::new(latitude, longitude)?;
                let mut panel = build_panel()?;
                match panel.click(coordinate).await {
                    Some(_) => render(&panel),
                    None => println!("Map-click selection is disabled in the config."),
                }
                Ok(())
            }
            Command::Here => {
                let config = Config::load()?;
                let locator = ConfiguredLocator { home: config.home_coordinate()? };
                let mut panel = panel_from(&config)?;
                panel.locate(&locator).await.context(
                    "Could not resolve the device position.\n\
                     Hint: set `home = \"<lat>, <lon>\"` via `geopanel configure`.",
                )?;
                render(&panel);
                Ok(())
            }
            Command::Imagery => toggle_imagery(),
        }
    }
}

fn build_panel() -> Result<LocationWeatherPanel> {
    let config = Config::load()?;
    panel_from(&config)
}

fn panel_from(config: &Config) -> Result<LocationWeatherPanel> {
    LocationWeatherPanel::new(config, Box::new(TerminalCamera))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_weather_api_key(api_key.trim().to_string());
    }

    let home = inquire::Text::new("Home coordinate (\"lat, lon\", blank to skip):").prompt()?;
    if home.trim().is_empty() {
        config.home = None;
    } else {
        // Validate before persisting so `here` never trips over it later.
        home.trim().parse::<Coordinate>()?;
        config.home = Some(home.trim().to_string());
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn toggle_imagery() -> Result<()> {
    let mut config = Config::load()?;
    if !config.features.imagery_toggle {
        bail!("Imagery switching is disabled in the config.");
    }

    config.satellite = !config.satellite;
    config.save()?;

    let tiles = if config.satellite { TileSource::Satellite } else { TileSource::Street };
    println!("Imagery set to {tiles} ({})", tiles.tile_url());
    Ok(())
}

/// Renders the panel sections: selection, weather overview, place
/// description, recent locations.
fn render(panel: &LocationWeatherPanel) {
    if let Some(coordinate) = panel.current() {
        println!("Selected: {coordinate}");
    }

    println!();
    match panel.weather() {
        FetchState::Ready(weather) => {
            println!("Weather");
            println!("  {:.1} °C, {}", weather.temperature_c, weather.condition);
            println!("  Feels like: {:.1} °C", weather.feels_like_c);
            println!("  Min/Max: {:.1} °C / {:.1} °C", weather.temp_min_c, weather.temp_max_c);
            println!("  Humidity: {}%", weather.humidity_pct);
        }
        FetchState::Absent => println!("Weather: no data"),
        FetchState::Failed(err) => println!("Weather: unavailable ({err})"),
        FetchState::Pending => println!("Weather: not loaded yet"),
    }

    println!();
    match panel.description() {
        FetchState::Ready(description) => {
            println!("About this place");
            println!("  {description}");
        }
        FetchState::Absent => println!("About this place: no data"),
        FetchState::Failed(err) => println!("About this place: unavailable ({err})"),
        FetchState::Pending => println!("About this place: not loaded yet"),
    }

    let history = panel.history();
    if !history.is_empty() {
        println!();
        println!("Recent locations");
        for entry in history {
            println!("  {} — {} ({})", entry.label, entry.coordinate, entry_time(entry));
        }
    }
}

/// Selection times render in the viewer's local time, hour and minute.
fn entry_time(entry: &HistoryEntry) -> String {
    entry.selected_at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Map camera for a terminal session: narrates the fly-to.
struct TerminalCamera;

impl CameraFollower for TerminalCamera {
    fn fly_to(&mut self, command: FlyTo) {
        println!(
            "Map: flying to {} (zoom {}, {:.0?})",
            command.target, command.zoom, command.duration
        );
    }
}

/// Device locator backed by the configured home coordinate, so `here`
/// works without platform location services.
struct ConfiguredLocator {
    home: Option<Coordinate>,
}

#[async_trait]
impl DeviceLocator for ConfiguredLocator {
    async fn current_position(&self) -> Result<Coordinate, DeviceError> {
        self.home.ok_or(DeviceError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_subcommand() {
        let cli = Cli::try_parse_from(["geopanel", "search", "Paris"]).expect("parses");
        match cli.command {
            Command::Search { query } => assert_eq!(query, "Paris"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_at_subcommand_with_signed_longitude() {
        let cli = Cli::try_parse_from(["geopanel", "at", "51.5", "-0.12"]).expect("parses");
        match cli.command {
            Command::At { latitude, longitude } => {
                assert_eq!(latitude, 51.5);
                assert_eq!(longitude, -0.12);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_subcommands() {
        assert!(Cli::try_parse_from(["geopanel", "teleport"]).is_err());
    }

    #[test]
    fn entry_time_renders_local_hour_and_minute() {
        let entry = HistoryEntry {
            id: 1,
            coordinate: Coordinate::new(48.8566, 2.3522).expect("valid"),
            label: "Paris".to_string(),
            selected_at: chrono::Utc::now(),
        };

        let rendered = entry_time(&entry);
        assert_eq!(rendered.len(), 5);
        assert_eq!(rendered.as_bytes()[2], b':');
        assert!(rendered.chars().filter(|c| c.is_ascii_digit()).count() == 4);
    }

    #[tokio::test]
    async fn configured_locator_without_home_is_unavailable() {
        let locator = ConfiguredLocator { home: None };
        assert_eq!(
            locator.current_position().await.unwrap_err(),
            DeviceError::Unavailable
        );
    }
}
