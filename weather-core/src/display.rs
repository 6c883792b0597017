//! Pure mapping from state to presentation values. No I/O.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::{
    model::{Condition, Coordinates, WeatherSnapshot},
    state::{AppState, QueryState},
};

pub const LIGHT_DEFAULT_BACKGROUND: &str = "linear-gradient(to right, #f3b07c, #fcd283)";
pub const DARK_DEFAULT_BACKGROUND: &str = "linear-gradient(to top, #4b6cb7, #182848)";

/// Map center when nothing has been found yet (Tbilisi).
pub const DEFAULT_MAP_CENTER: Coordinates = Coordinates::new(41.7151, 44.8271);
pub const MAP_ZOOM: u8 = 10;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
}

impl Icon {
    pub fn asset(&self) -> &'static str {
        match self {
            Icon::Sunny => "sunny.png",
            Icon::Cloudy => "cloudy.png",
            Icon::Rainy => "rainy.png",
            Icon::Snowy => "snowy.png",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::Sunny => "☀",
            Icon::Cloudy => "☁",
            Icon::Rainy => "☂",
            Icon::Snowy => "❄",
        }
    }
}

pub fn icon_for(condition: Option<&Condition>) -> Option<Icon> {
    match condition? {
        Condition::Clear => Some(Icon::Sunny),
        Condition::Clouds | Condition::Haze | Condition::Mist => Some(Icon::Cloudy),
        Condition::Rain => Some(Icon::Rainy),
        Condition::Snow => Some(Icon::Snowy),
        Condition::Other(_) => None,
    }
}

fn light_background(condition: &Condition) -> Option<&'static str> {
    match condition {
        Condition::Clear => Some("linear-gradient(to right, #f3b07c, #fcd283)"),
        Condition::Clouds | Condition::Haze | Condition::Mist => {
            Some("linear-gradient(to right, #57d6d4, #71eeec)")
        }
        Condition::Rain => Some("linear-gradient(to right, #5bc8fb, #80eaff)"),
        Condition::Snow => Some("linear-gradient(to right, #aff2ff, #fff)"),
        Condition::Other(_) => None,
    }
}

// Every known category shares one dark gradient.
fn dark_background(condition: &Condition) -> Option<&'static str> {
    match condition {
        Condition::Other(_) => None,
        _ => Some(DARK_DEFAULT_BACKGROUND),
    }
}

pub fn background_for(condition: Option<&Condition>, dark_mode: bool) -> &'static str {
    if dark_mode {
        condition
            .and_then(dark_background)
            .unwrap_or(DARK_DEFAULT_BACKGROUND)
    } else {
        condition
            .and_then(light_background)
            .unwrap_or(LIGHT_DEFAULT_BACKGROUND)
    }
}

/// Floors, never rounds: 21.9 shows as "21°C".
pub fn format_temperature(celsius: f64) -> String {
    format!("{}°C", celsius.floor() as i64)
}

pub fn format_humidity(pct: u8) -> String {
    format!("{pct}%")
}

pub fn format_wind(speed_mps: f64) -> String {
    format!("{speed_mps} m/s")
}

/// "Wed, 5 Jun", independent of locale.
pub fn format_date(now: &NaiveDateTime) -> String {
    let weekday = WEEKDAYS[now.weekday().num_days_from_sunday() as usize];
    let month = MONTHS[now.month0() as usize];
    format!("{weekday}, {} {month}", now.day())
}

/// 12-hour clock with seconds, e.g. "01:05:09 PM".
pub fn format_time(now: &NaiveDateTime) -> String {
    let (pm, hour) = now.hour12();
    format!(
        "{hour:02}:{:02}:{:02} {}",
        now.minute(),
        now.second(),
        if pm { "PM" } else { "AM" }
    )
}

pub fn flag_url(country: &str) -> String {
    format!("https://flagsapi.com/{country}/flat/24.png")
}

/// Location line, e.g. "Tbilisi, GE".
pub fn location_label(snapshot: &WeatherSnapshot) -> String {
    match &snapshot.country {
        Some(country) => format!("{}, {country}", snapshot.city),
        None => snapshot.city.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
    pub tile_url: String,
    pub link: String,
    /// Marker popup, "City Country".
    pub popup: Option<String>,
}

impl MapView {
    pub fn new(center: Coordinates, popup: Option<String>) -> Self {
        let (x, y) = slippy_tile(center, MAP_ZOOM);
        Self {
            center,
            zoom: MAP_ZOOM,
            tile_url: format!("https://tile.openstreetmap.org/{MAP_ZOOM}/{x}/{y}.png"),
            link: format!(
                "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map={MAP_ZOOM}/{lat}/{lon}",
                lat = center.lat,
                lon = center.lon
            ),
            popup,
        }
    }
}

/// Map centered on the last found snapshot, or on the default center.
pub fn map_view(state: &AppState) -> MapView {
    match &state.last_found {
        Some(snapshot) => {
            let popup = match &snapshot.country {
                Some(country) => format!("{} {country}", snapshot.city),
                None => snapshot.city.clone(),
            };
            MapView::new(snapshot.coordinates, Some(popup))
        }
        None => MapView::new(DEFAULT_MAP_CENTER, None),
    }
}

/// Web Mercator tile containing `coords` at `zoom`.
pub fn slippy_tile(coords: Coordinates, zoom: u8) -> (u32, u32) {
    let n = f64::from(1u32 << zoom);
    let max = n - 1.0;
    let lat_rad = coords.lat.to_radians();

    let x = ((coords.lon + 180.0) / 360.0 * n).floor().clamp(0.0, max);
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max);

    (x as u32, y as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    Idle,
    Loading,
    NotFound,
    Found,
}

/// Everything a renderer needs, derived from one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub status: ViewStatus,
    pub location: Option<String>,
    pub flag_url: Option<String>,
    pub icon: Option<Icon>,
    pub condition: Option<String>,
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub wind: Option<String>,
    pub date: String,
    pub time: String,
    pub background: &'static str,
    pub dark_mode: bool,
    pub map: MapView,
    pub history: Vec<String>,
}

impl ViewModel {
    pub fn from_state(state: &AppState) -> Self {
        let status = match &state.query {
            QueryState::Idle => ViewStatus::Idle,
            QueryState::Loading => ViewStatus::Loading,
            QueryState::NotFound => ViewStatus::NotFound,
            QueryState::Found(_) => ViewStatus::Found,
        };
        let snapshot = state.query.snapshot();
        let condition = snapshot.and_then(|s| s.condition.as_ref());

        Self {
            status,
            location: snapshot.map(location_label),
            flag_url: snapshot
                .and_then(|s| s.country.as_deref())
                .map(flag_url),
            icon: icon_for(condition),
            condition: condition.map(|c| c.to_string()),
            temperature: snapshot.map(|s| format_temperature(s.temperature_c)),
            humidity: snapshot.map(|s| format_humidity(s.humidity_pct)),
            wind: snapshot.map(|s| format_wind(s.wind_speed_mps)),
            date: format_date(&state.now),
            time: format_time(&state.now),
            background: background_for(condition, state.prefs.dark_mode),
            dark_mode: state.prefs.dark_mode,
            map: map_view(state),
            history: state.history.entries().to_vec(),
        }
    }
}
