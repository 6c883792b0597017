//! Everything that can happen to the view.
//!
//! Intents come from the user or the host; `*Did*` variants carry the
//! results of effects back into the reducer.

use chrono::NaiveDateTime;
use tui_dispatch_core::Action as DispatchAction;

use crate::{
    model::{Coordinates, WeatherQuery, WeatherSnapshot},
    state::Ticket,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Load history, then try geolocation with default-city fallback.
    Initialize,

    LoadByName(String),

    LoadByCoordinates(Coordinates),

    /// Re-fetch the history entry at the given index.
    HistorySelect(usize),

    UiToggleDarkMode,

    GeolocationDidResolve { ticket: Ticket, coords: Coordinates },

    GeolocationDidFail { ticket: Ticket, reason: String },

    WeatherDidLoad {
        ticket: Ticket,
        snapshot: WeatherSnapshot,
    },

    WeatherDidFail {
        ticket: Ticket,
        query: WeatherQuery,
        reason: String,
    },

    HistoryDidChange(Vec<String>),

    ClockTick(NaiveDateTime),
}

impl Action {
    /// Short form for logs.
    pub fn summary(&self) -> String {
        match self {
            Action::WeatherDidLoad { ticket, snapshot } => format!(
                "WeatherDidLoad {{ ticket: {ticket}, city: {}, temp: {:.1}°C }}",
                snapshot.city, snapshot.temperature_c
            ),
            Action::WeatherDidFail { ticket, query, .. } => {
                format!("WeatherDidFail {{ ticket: {ticket}, query: {query} }}")
            }
            Action::HistoryDidChange(entries) => format!("HistoryDidChange({})", entries.len()),
            _ => format!("{self:?}"),
        }
    }
}

impl DispatchAction for Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Initialize => "Initialize",
            Action::LoadByName(_) => "LoadByName",
            Action::LoadByCoordinates(_) => "LoadByCoordinates",
            Action::HistorySelect(_) => "HistorySelect",
            Action::UiToggleDarkMode => "UiToggleDarkMode",
            Action::GeolocationDidResolve { .. } => "GeolocationDidResolve",
            Action::GeolocationDidFail { .. } => "GeolocationDidFail",
            Action::WeatherDidLoad { .. } => "WeatherDidLoad",
            Action::WeatherDidFail { .. } => "WeatherDidFail",
            Action::HistoryDidChange(_) => "HistoryDidChange",
            Action::ClockTick(_) => "ClockTick",
        }
    }
}
