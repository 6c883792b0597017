//! Orchestration scenarios with scripted providers.
//!
//! Time is paused so provider delays resolve in a deterministic order.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use weatherview_core::{
    Condition, Coordinates, GeolocationError, Geolocator, HistoryManager, KeyValueStore,
    MemoryStore, ProviderError, QueryState, WeatherProvider, WeatherQuery, WeatherSnapshot,
    WeatherView, history::HISTORY_KEY, view::CLOCK_PERIOD,
};

#[derive(Debug, Clone)]
enum Reply {
    Found(WeatherSnapshot),
    NotFound,
    Broken,
}

#[derive(Debug, Default)]
struct ScriptedProvider {
    replies: HashMap<String, (Duration, Reply)>,
    calls: Mutex<Vec<WeatherQuery>>,
}

fn key(query: &WeatherQuery) -> String {
    match query {
        WeatherQuery::ByName(city) => city.to_lowercase(),
        WeatherQuery::ByCoordinates(c) => format!("{},{}", c.lat, c.lon),
    }
}

impl ScriptedProvider {
    fn reply(mut self, query: WeatherQuery, delay_ms: u64, reply: Reply) -> Self {
        self.replies
            .insert(key(&query), (Duration::from_millis(delay_ms), reply));
        self
    }

    fn calls(&self) -> Vec<WeatherQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    async fn current(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, ProviderError> {
        self.calls.lock().unwrap().push(query.clone());
        let (delay, reply) = self
            .replies
            .get(&key(query))
            .cloned()
            .unwrap_or((Duration::ZERO, Reply::NotFound));

        tokio::time::sleep(delay).await;

        match reply {
            Reply::Found(snapshot) => Ok(snapshot),
            Reply::NotFound => Err(ProviderError::NotFound {
                code: "404".into(),
                message: "city not found".into(),
            }),
            Reply::Broken => Err(ProviderError::Transport("connection reset".into())),
        }
    }
}

#[derive(Debug)]
struct ScriptedGeolocator {
    delay: Duration,
    coords: Option<Coordinates>,
}

#[async_trait]
impl Geolocator for ScriptedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        tokio::time::sleep(self.delay).await;
        self.coords
            .ok_or_else(|| GeolocationError::Denied("user denied".into()))
    }
}

fn denied() -> Arc<ScriptedGeolocator> {
    Arc::new(ScriptedGeolocator {
        delay: Duration::ZERO,
        coords: None,
    })
}

fn located_at(coords: Coordinates, delay_ms: u64) -> Arc<ScriptedGeolocator> {
    Arc::new(ScriptedGeolocator {
        delay: Duration::from_millis(delay_ms),
        coords: Some(coords),
    })
}

fn snapshot(city: &str, lat: f64, lon: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        city: city.to_string(),
        country: Some("GE".into()),
        condition: Some(Condition::Clouds),
        temperature_c: 18.3,
        humidity_pct: 55,
        wind_speed_mps: 4.1,
        coordinates: Coordinates::new(lat, lon),
    }
}

fn by_name(city: &str) -> WeatherQuery {
    WeatherQuery::ByName(city.to_string())
}

fn view(
    provider: Arc<ScriptedProvider>,
    geolocator: Arc<ScriptedGeolocator>,
    store: MemoryStore,
) -> WeatherView {
    WeatherView::new(
        provider,
        geolocator,
        HistoryManager::new(Box::new(store)),
        "Tbilisi",
    )
}

fn persisted(view: &WeatherView) -> Option<String> {
    view.history_manager().store().get(HISTORY_KEY)
}

#[tokio::test(start_paused = true)]
async fn geolocation_denial_falls_back_to_default_city() {
    let tbilisi = snapshot("Tbilisi", 41.7151, 44.8271);
    let provider = Arc::new(ScriptedProvider::default().reply(
        by_name("Tbilisi"),
        10,
        Reply::Found(tbilisi.clone()),
    ));
    let mut view = view(provider.clone(), denied(), MemoryStore::new());

    view.initialize();
    assert!(view.state().query.is_loading());
    view.settle().await;

    assert_eq!(view.state().query, QueryState::Found(tbilisi));
    assert_eq!(view.state().history.get(0), Some("Tbilisi"));
    assert_eq!(persisted(&view).as_deref(), Some(r#"["Tbilisi"]"#));
    assert_eq!(provider.calls(), vec![by_name("Tbilisi")]);
}

#[tokio::test(start_paused = true)]
async fn geolocation_success_loads_local_weather() {
    let here = Coordinates::new(42.2679, 42.6946);
    let kutaisi = snapshot("Kutaisi", here.lat, here.lon);
    let provider = Arc::new(ScriptedProvider::default().reply(
        WeatherQuery::ByCoordinates(here),
        10,
        Reply::Found(kutaisi.clone()),
    ));
    let mut view = view(provider.clone(), located_at(here, 5), MemoryStore::new());

    view.initialize();
    view.settle().await;

    assert_eq!(view.state().query, QueryState::Found(kutaisi));
    assert_eq!(view.state().history.entries(), ["Kutaisi"]);
    assert_eq!(provider.calls(), vec![WeatherQuery::ByCoordinates(here)]);
}

#[tokio::test(start_paused = true)]
async fn failing_coordinate_lookup_falls_back_to_default_city() {
    let here = Coordinates::new(1.0, 2.0);
    let tbilisi = snapshot("Tbilisi", 41.7151, 44.8271);
    let provider = Arc::new(
        ScriptedProvider::default()
            .reply(WeatherQuery::ByCoordinates(here), 10, Reply::Broken)
            .reply(by_name("Tbilisi"), 10, Reply::Found(tbilisi.clone())),
    );
    let mut view = view(provider.clone(), located_at(here, 0), MemoryStore::new());

    view.initialize();
    view.settle().await;

    assert_eq!(view.state().query, QueryState::Found(tbilisi));
    assert_eq!(
        provider.calls(),
        vec![WeatherQuery::ByCoordinates(here), by_name("Tbilisi")]
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_city_shows_not_found_and_keeps_history() {
    let provider = Arc::new(ScriptedProvider::default().reply(
        by_name("Atlantis"),
        10,
        Reply::NotFound,
    ));
    let store = MemoryStore::with_entry(HISTORY_KEY, r#"["Rome","Paris"]"#);
    let mut view = view(provider, denied(), store);
    view.load_history();

    view.load_by_name("Atlantis");
    view.settle().await;

    assert_eq!(view.state().query, QueryState::NotFound);
    assert_eq!(view.state().history.entries(), ["Rome", "Paris"]);
    assert_eq!(persisted(&view).as_deref(), Some(r#"["Rome","Paris"]"#));
}

#[tokio::test(start_paused = true)]
async fn transport_failure_on_name_lookup_is_not_found() {
    let provider =
        Arc::new(ScriptedProvider::default().reply(by_name("Rome"), 0, Reply::Broken));
    let mut view = view(provider, denied(), MemoryStore::new());

    view.load_by_name("Rome");
    view.settle().await;

    assert_eq!(view.state().query, QueryState::NotFound);
    assert!(view.state().history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn blank_search_dispatches_nothing() {
    let provider = Arc::new(ScriptedProvider::default());
    let mut view = view(provider.clone(), denied(), MemoryStore::new());

    let changed = view.load_by_name("   ");

    assert!(!changed);
    assert_eq!(view.in_flight(), 0);
    assert_eq!(view.state().query, QueryState::Idle);
    assert!(provider.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn newer_search_wins_over_slower_older_one() {
    let paris = snapshot("Paris", 48.8534, 2.3488);
    let rome = snapshot("Rome", 41.8947, 12.4839);
    let provider = Arc::new(
        ScriptedProvider::default()
            .reply(by_name("Paris"), 500, Reply::Found(paris))
            .reply(by_name("Rome"), 50, Reply::Found(rome.clone())),
    );
    let mut view = view(provider, denied(), MemoryStore::new());

    view.load_by_name("Paris");
    view.load_by_name("Rome");
    view.settle().await;

    assert_eq!(view.state().query, QueryState::Found(rome));
    assert_eq!(view.state().history.entries(), ["Rome"]);
}

#[tokio::test(start_paused = true)]
async fn search_during_slow_geolocation_is_not_overwritten() {
    let here = Coordinates::new(42.2679, 42.6946);
    let rome = snapshot("Rome", 41.8947, 12.4839);
    let provider = Arc::new(
        ScriptedProvider::default()
            .reply(
                WeatherQuery::ByCoordinates(here),
                100,
                Reply::Found(snapshot("Kutaisi", here.lat, here.lon)),
            )
            .reply(by_name("Rome"), 10, Reply::Found(rome.clone())),
    );
    let mut view = view(provider, located_at(here, 300), MemoryStore::new());

    view.initialize();
    view.load_by_name("Rome");
    view.settle().await;

    assert_eq!(view.state().query, QueryState::Found(rome));
    assert_eq!(view.state().history.entries(), ["Rome"]);
}

#[tokio::test(start_paused = true)]
async fn older_result_arriving_first_is_replaced_by_newer() {
    let paris = snapshot("Paris", 48.8534, 2.3488);
    let rome = snapshot("Rome", 41.8947, 12.4839);
    let provider = Arc::new(
        ScriptedProvider::default()
            .reply(by_name("Paris"), 10, Reply::Found(paris))
            .reply(by_name("Rome"), 200, Reply::Found(rome.clone())),
    );
    let mut view = view(provider, denied(), MemoryStore::new());

    view.load_by_name("Paris");
    view.load_by_name("Rome");
    view.settle().await;

    assert_eq!(view.state().query, QueryState::Found(rome));
    assert_eq!(view.state().history.entries(), ["Rome", "Paris"]);
}

#[tokio::test(start_paused = true)]
async fn selecting_history_refetches_instead_of_reusing_data() {
    let rome = snapshot("Rome", 41.8947, 12.4839);
    let provider = Arc::new(ScriptedProvider::default().reply(
        by_name("Rome"),
        0,
        Reply::Found(rome.clone()),
    ));
    let store = MemoryStore::with_entry(HISTORY_KEY, r#"["Paris","Rome"]"#);
    let mut view = view(provider.clone(), denied(), store);
    view.load_history();

    view.select_history(1);
    view.settle().await;
    view.select_history(0);
    view.settle().await;

    assert_eq!(provider.calls(), vec![by_name("Rome"), by_name("Rome")]);
    assert_eq!(view.state().query, QueryState::Found(rome));
}

#[tokio::test(start_paused = true)]
async fn initialize_loads_persisted_history_first() {
    let tbilisi = snapshot("Tbilisi", 41.7151, 44.8271);
    let provider = Arc::new(ScriptedProvider::default().reply(
        by_name("Tbilisi"),
        0,
        Reply::Found(tbilisi),
    ));
    let store = MemoryStore::with_entry(HISTORY_KEY, r#"["Rome","tbilisi","Paris"]"#);
    let mut view = view(provider, denied(), store);

    view.initialize();
    assert_eq!(view.state().history.entries(), ["Rome", "tbilisi", "Paris"]);

    view.settle().await;
    assert_eq!(view.state().history.entries(), ["Tbilisi", "Rome", "Paris"]);
}

#[tokio::test(start_paused = true)]
async fn corrupt_persisted_history_starts_empty() {
    let provider = Arc::new(ScriptedProvider::default());
    let store = MemoryStore::with_entry(HISTORY_KEY, "{definitely not a list");
    let mut view = view(provider, denied(), store);

    view.initialize();

    assert!(view.state().history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn map_remounts_only_when_center_moves() {
    let rome = snapshot("Rome", 41.8947, 12.4839);
    let provider = Arc::new(ScriptedProvider::default().reply(
        by_name("Rome"),
        0,
        Reply::Found(rome),
    ));
    let mut view = view(provider, denied(), MemoryStore::new());
    assert_eq!(view.map_remounts(), 0);

    view.load_by_name("Rome");
    view.settle().await;
    assert_eq!(view.map_remounts(), 1);
    assert_eq!(view.map().popup.as_deref(), Some("Rome GE"));

    view.load_by_name("Rome");
    view.settle().await;
    assert_eq!(view.map_remounts(), 1);
}

#[tokio::test(start_paused = true)]
async fn dark_mode_toggle_changes_background_only() {
    let provider = Arc::new(ScriptedProvider::default());
    let mut view = view(provider, denied(), MemoryStore::new());
    let light = view.view_model().background;

    assert!(view.toggle_dark_mode());

    let vm = view.view_model();
    assert!(vm.dark_mode);
    assert_ne!(vm.background, light);
    assert_eq!(view.state().query, QueryState::Idle);
}

#[tokio::test(start_paused = true)]
async fn clock_ticks_every_second_until_stopped() {
    let provider = Arc::new(ScriptedProvider::default());
    let mut view = view(provider, denied(), MemoryStore::new());

    view.start_clock();
    assert!(view.clock_running());

    for _ in 0..3 {
        let changed = view.next_action().await;
        assert_eq!(changed, Some(true));
    }

    view.stop_clock();
    assert!(!view.clock_running());

    let idle = tokio::time::timeout(Duration::from_secs(5), view.next_action()).await;
    assert!(idle.is_err(), "no ticks expected after stop");
}

#[tokio::test(start_paused = true)]
async fn explicit_coordinates_fall_back_when_lookup_fails() {
    let here = Coordinates::new(-33.8688, 151.2093);
    let tbilisi = snapshot("Tbilisi", 41.7151, 44.8271);
    let provider = Arc::new(
        ScriptedProvider::default()
            .reply(WeatherQuery::ByCoordinates(here), 0, Reply::NotFound)
            .reply(by_name("Tbilisi"), 0, Reply::Found(tbilisi.clone())),
    );
    let mut view = view(provider, denied(), MemoryStore::new());

    view.load_by_coordinates(here);
    view.settle().await;

    assert_eq!(view.state().query, QueryState::Found(tbilisi));
    assert_eq!(view.state().history.entries(), ["Tbilisi"]);
}

#[tokio::test(start_paused = true)]
async fn pump_applies_queued_ticks_without_waiting() {
    let provider = Arc::new(ScriptedProvider::default());
    let mut view = view(provider, denied(), MemoryStore::new());
    assert!(!view.pump());

    view.start_clock();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert!(view.pump());
    assert!(!view.pump());
}

#[tokio::test(start_paused = true)]
async fn idle_clock_keeps_at_most_one_tick_queued() {
    let provider = Arc::new(ScriptedProvider::default());
    let mut view = view(provider, denied(), MemoryStore::new());

    view.start_clock();
    tokio::time::sleep(Duration::from_secs(3600)).await;

    assert!(view.queued() <= 1, "queued {} ticks", view.queued());
    assert!(view.pump());
    assert_eq!(view.queued(), 0);

    // Applying the pending tick lets the clock send again.
    tokio::time::sleep(CLOCK_PERIOD * 2).await;
    assert_eq!(view.queued(), 1);
}

#[tokio::test(start_paused = true)]
async fn fallback_fetch_is_tracked_until_applied() {
    let here = Coordinates::new(-33.8688, 151.2093);
    let tbilisi = snapshot("Tbilisi", 41.7151, 44.8271);
    let provider = Arc::new(
        ScriptedProvider::default()
            .reply(WeatherQuery::ByCoordinates(here), 5, Reply::NotFound)
            .reply(by_name("Tbilisi"), 5, Reply::Found(tbilisi.clone())),
    );
    let mut view = view(provider, denied(), MemoryStore::new());

    view.load_by_coordinates(here);
    assert_eq!(view.in_flight(), 1);

    // The failed coordinate fetch hands its slot to the default-city fetch.
    view.next_action().await;
    assert_eq!(view.in_flight(), 1);
    assert!(view.state().query.is_loading());

    view.settle().await;
    assert_eq!(view.in_flight(), 0);
    assert_eq!(view.state().query, QueryState::Found(tbilisi));
}

#[tokio::test(start_paused = true)]
async fn history_manager_matches_view_history() {
    let rome = snapshot("Rome", 41.9028, 12.4964);
    let provider = Arc::new(ScriptedProvider::default().reply(
        by_name("Rome"),
        0,
        Reply::Found(rome),
    ));
    let mut view = view(provider, denied(), MemoryStore::new());

    view.load_by_name("Rome");
    view.settle().await;

    let shared = &view;
    assert_eq!(
        shared.history_manager().history().entries(),
        shared.state().history.entries()
    );
}
