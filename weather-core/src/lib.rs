//! Core library for the `weatherview` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather provider, geolocation and key/value store abstractions
//! - The view state, its reducer and the effect runtime (`WeatherView`)
//! - Pure display mapping (icons, backgrounds, date/time, map)
//!
//! It is used by `weatherview-cli`, but can also be driven by other front ends.

pub mod action;
pub mod config;
pub mod display;
pub mod effect;
pub mod error;
pub mod geolocation;
pub mod history;
pub mod model;
pub mod provider;
pub mod reducer;
pub mod state;
pub mod store;
pub mod view;

pub use action::Action;
pub use config::Config;
pub use display::ViewModel;
pub use error::{GeolocationError, ProviderError, StoreError};
pub use geolocation::{DisabledGeolocator, FixedGeolocator, Geolocator, IpGeolocator};
pub use history::{HistoryManager, SearchHistory};
pub use model::{Condition, Coordinates, WeatherQuery, WeatherSnapshot};
pub use provider::WeatherProvider;
pub use state::{AppState, QueryState, UiPreferences};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use view::WeatherView;
