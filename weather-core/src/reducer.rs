//! Reducer - pure function: (state, action) -> state + effects
//!
//! All state transitions happen here. I/O is only described, as [`Effect`]s.

use tracing::debug;
use tui_dispatch_core::DispatchResult;

use crate::{
    action::Action,
    effect::Effect,
    history::SearchHistory,
    model::WeatherQuery,
    state::{AppState, QueryState, Ticket},
};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Initialize => {
            let ticket = state.issue_ticket();
            state.query = QueryState::Loading;
            DispatchResult::changed_with_many(vec![Effect::LoadHistory, Effect::Locate { ticket }])
        }

        Action::LoadByName(city) => start_query(state, WeatherQuery::ByName(city)),

        Action::LoadByCoordinates(coords) => {
            start_query(state, WeatherQuery::ByCoordinates(coords))
        }

        Action::HistorySelect(index) => match state.history.get(index) {
            Some(city) => {
                let city = city.to_string();
                start_query(state, WeatherQuery::ByName(city))
            }
            None => DispatchResult::unchanged(),
        },

        Action::UiToggleDarkMode => {
            state.prefs.dark_mode = !state.prefs.dark_mode;
            DispatchResult::changed()
        }

        Action::GeolocationDidResolve { ticket, coords } => {
            if state.is_stale(ticket) {
                debug!(ticket, "Dropping stale geolocation result");
                return DispatchResult::unchanged();
            }
            DispatchResult::effect(Effect::Fetch {
                ticket,
                query: WeatherQuery::ByCoordinates(coords),
            })
        }

        Action::GeolocationDidFail { ticket, reason } => {
            if state.is_stale(ticket) {
                debug!(ticket, "Dropping stale geolocation failure");
                return DispatchResult::unchanged();
            }
            debug!(ticket, %reason, "Geolocation failed, using default city");
            DispatchResult::effect(default_city_fetch(state, ticket))
        }

        Action::WeatherDidLoad { ticket, snapshot } => {
            if state.is_stale(ticket) {
                debug!(ticket, city = %snapshot.city, "Dropping stale weather result");
                return DispatchResult::unchanged();
            }
            state.mark_applied(ticket);
            let record = Effect::RecordHistory(snapshot.city.clone());
            state.last_found = Some(snapshot.clone());
            state.query = QueryState::Found(snapshot);
            DispatchResult::changed_with(record)
        }

        Action::WeatherDidFail {
            ticket,
            query,
            reason,
        } => {
            if state.is_stale(ticket) {
                debug!(ticket, "Dropping stale weather failure");
                return DispatchResult::unchanged();
            }
            match query {
                // Coordinate lookups never surface an error; the default city takes over.
                WeatherQuery::ByCoordinates(_) => {
                    debug!(ticket, %reason, "Coordinate lookup failed, using default city");
                    DispatchResult::effect(default_city_fetch(state, ticket))
                }
                WeatherQuery::ByName(city) => {
                    debug!(ticket, %city, %reason, "Lookup by name failed");
                    state.mark_applied(ticket);
                    state.query = QueryState::NotFound;
                    DispatchResult::changed()
                }
            }
        }

        Action::HistoryDidChange(entries) => {
            if state.history.entries() == entries.as_slice() {
                return DispatchResult::unchanged();
            }
            state.history = SearchHistory::from_entries(entries);
            DispatchResult::changed()
        }

        Action::ClockTick(now) => {
            state.now = now;
            DispatchResult::changed()
        }
    }
}

fn start_query(state: &mut AppState, query: WeatherQuery) -> DispatchResult<Effect> {
    let query = match query {
        WeatherQuery::ByName(city) => {
            let trimmed = city.trim();
            if trimmed.is_empty() {
                return DispatchResult::unchanged();
            }
            WeatherQuery::ByName(trimmed.to_string())
        }
        coords => coords,
    };

    let ticket = state.issue_ticket();
    state.query = QueryState::Loading;
    DispatchResult::changed_with(Effect::Fetch { ticket, query })
}

fn default_city_fetch(state: &AppState, ticket: Ticket) -> Effect {
    Effect::Fetch {
        ticket,
        query: WeatherQuery::ByName(state.default_city.clone()),
    }
}
