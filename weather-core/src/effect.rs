//! Effects - side effects declared by the reducer and run by [`crate::view::WeatherView`].

use crate::{model::WeatherQuery, state::Ticket};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Read persisted history (synchronous).
    LoadHistory,

    Locate { ticket: Ticket },

    Fetch { ticket: Ticket, query: WeatherQuery },

    /// Move the city to the front of the history and persist it (synchronous).
    RecordHistory(String),
}
