//! Application state: the single source of truth for what is displayed.
//!
//! Only the reducer mutates it; renderers derive everything else through
//! [`crate::display`].

use chrono::NaiveDateTime;

use crate::{
    history::SearchHistory,
    model::WeatherSnapshot,
};

/// Sequence number attached to every initiated query.
pub type Ticket = u64;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum QueryState {
    #[default]
    Idle,
    Loading,
    Found(WeatherSnapshot),
    NotFound,
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            QueryState::Found(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// Session-only display preferences. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiPreferences {
    pub dark_mode: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub query: QueryState,

    /// Most recent successful snapshot; survives later `Loading`/`NotFound` states.
    pub last_found: Option<WeatherSnapshot>,

    pub history: SearchHistory,

    pub prefs: UiPreferences,

    /// City used when geolocation or the coordinate lookup fails.
    pub default_city: String,

    /// Wall clock as of the last tick.
    pub now: NaiveDateTime,

    last_issued: Ticket,
    last_applied: Ticket,
}

impl AppState {
    pub fn new(default_city: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            query: QueryState::Idle,
            last_found: None,
            history: SearchHistory::new(),
            prefs: UiPreferences::default(),
            default_city: default_city.into(),
            now,
            last_issued: 0,
            last_applied: 0,
        }
    }

    pub(crate) fn issue_ticket(&mut self) -> Ticket {
        self.last_issued += 1;
        self.last_issued
    }

    /// A result is stale once a result with the same or a newer ticket has been applied.
    pub fn is_stale(&self, ticket: Ticket) -> bool {
        ticket <= self.last_applied
    }

    pub(crate) fn mark_applied(&mut self, ticket: Ticket) {
        self.last_applied = ticket;
    }

    pub fn last_issued(&self) -> Ticket {
        self.last_issued
    }

    pub fn last_applied(&self) -> Ticket {
        self.last_applied
    }
}
