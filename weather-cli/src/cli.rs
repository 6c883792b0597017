use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use serde::Serialize;
use tracing::info;

use weatherview_core::{
    Config, Coordinates, FileStore, HistoryManager, KeyValueStore, MemoryStore, ViewModel,
    WeatherSnapshot, WeatherView, geolocation::geolocator_from_config,
    provider::provider_from_config,
};

use crate::{render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weatherview",
    version,
    about = "Current weather with a recent-search history"
)]
pub struct Cli {
    /// Keep search history in memory for this run only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and the default city.
    Configure {
        /// API key; prompted for when absent.
        #[arg(long)]
        api_key: Option<String>,

        /// City shown when the location cannot be determined.
        #[arg(long)]
        default_city: Option<String>,
    },

    /// Show weather for a city, or for the current location when none is given.
    Show {
        /// City name, e.g. "Tbilisi".
        city: Option<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true, conflicts_with = "city")]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true, conflicts_with = "city")]
        lon: Option<f64>,

        /// Skip IP geolocation and go straight to the default city.
        #[arg(long)]
        no_geolocate: bool,

        /// Use the dark theme.
        #[arg(long)]
        dark: bool,

        /// Print the view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive session: search, reselect recent cities, toggle dark mode.
    Watch {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        #[arg(long)]
        no_geolocate: bool,

        #[arg(long)]
        dark: bool,
    },

    /// List recent searches.
    History {
        /// Forget all recent searches.
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    rendered_at: DateTime<Local>,
    snapshot: Option<&'a WeatherSnapshot>,
    view: ViewModel,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure {
                api_key,
                default_city,
            } => configure(api_key, default_city),

            Command::Show {
                city,
                lat,
                lon,
                no_geolocate,
                dark,
                json,
            } => {
                let config = load_config(no_geolocate)?;
                let mut view = build_view(&config, None, self.ephemeral)?;
                if dark {
                    view.toggle_dark_mode();
                }

                match (city, coordinates(lat, lon)) {
                    (Some(city), _) => {
                        view.load_history();
                        view.load_by_name(&city);
                    }
                    (None, Some(coords)) => {
                        view.load_history();
                        view.load_by_coordinates(coords);
                    }
                    (None, None) => {
                        view.initialize();
                    }
                }
                view.settle().await;

                if json {
                    let output = ShowOutput {
                        rendered_at: Local::now(),
                        snapshot: view.state().query.snapshot(),
                        view: view.view_model(),
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    println!("{}", render::render(&view.view_model()));
                }
                Ok(())
            }

            Command::Watch {
                lat,
                lon,
                no_geolocate,
                dark,
            } => {
                let config = load_config(no_geolocate)?;
                let view = build_view(&config, coordinates(lat, lon), self.ephemeral)?;
                session::run(view, dark).await
            }

            Command::History { clear } => {
                let config = Config::load()?;
                let mut history = HistoryManager::new(open_store(&config, self.ephemeral)?);

                if clear {
                    history.clear().context("Failed to clear search history")?;
                    println!("Search history cleared.");
                    return Ok(());
                }

                let entries = history.load().entries().to_vec();
                print!("{}", render::render_history(&entries));
                Ok(())
            }
        }
    }
}

fn coordinates(lat: Option<f64>, lon: Option<f64>) -> Option<Coordinates> {
    lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon))
}

fn load_config(no_geolocate: bool) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    if no_geolocate {
        config.geolocate = false;
    }
    Ok(config)
}

fn open_store(config: &Config, ephemeral: bool) -> anyhow::Result<Box<dyn KeyValueStore>> {
    if ephemeral {
        return Ok(Box::new(MemoryStore::new()));
    }
    let path = config.store_file_path()?;
    Ok(Box::new(FileStore::open(&path)))
}

fn build_view(
    config: &Config,
    fixed: Option<Coordinates>,
    ephemeral: bool,
) -> anyhow::Result<WeatherView> {
    let provider = provider_from_config(config)?;
    let geolocator = geolocator_from_config(config, fixed)?;
    let history = HistoryManager::new(open_store(config, ephemeral)?);

    Ok(WeatherView::new(
        provider,
        geolocator,
        history,
        config.default_city.clone(),
    ))
}

fn configure(api_key: Option<String>, default_city: Option<String>) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = match api_key {
        Some(key) => key,
        None => Password::new("OpenWeather API key:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };
    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    config.set_api_key(api_key);

    let default_city = match default_city {
        Some(city) => city,
        None => Text::new("Default city:")
            .with_default(&config.default_city)
            .prompt()
            .context("Failed to read default city")?,
    };
    config.set_default_city(&default_city);

    config.save()?;

    let path = Config::config_file_path()?;
    info!(path = %path.display(), "Configuration saved");
    println!("Saved configuration to {}", path.display());
    Ok(())
}
