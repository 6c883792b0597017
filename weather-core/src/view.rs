//! The orchestrating component.
//!
//! `WeatherView` keeps the [`AppState`] in an [`EffectStore`] driven by
//! [`reducer`] and runs the effects it declares. Async work (geolocation,
//! provider calls) goes through a [`TaskManager`] and the wall clock is a
//! [`Subscriptions`] entry; both report back over one channel, so every state
//! transition happens on the task that owns the view.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use chrono::{Local, NaiveDateTime};
use tokio::{
    sync::mpsc,
    time::{MissedTickBehavior, interval},
};
use tokio_stream::{StreamExt, wrappers::IntervalStream};
use tracing::{debug, info, warn};
use tui_dispatch_core::{EffectStore, SubKey, Subscriptions, TaskKey, TaskManager};

use crate::{
    action::Action,
    display::{MapView, ViewModel, map_view},
    effect::Effect,
    geolocation::Geolocator,
    history::HistoryManager,
    model::Coordinates,
    provider::WeatherProvider,
    reducer::reducer,
    state::{AppState, Ticket},
};

pub const CLOCK_PERIOD: Duration = Duration::from_secs(1);

const CLOCK: &str = "clock";

pub struct WeatherView {
    store: EffectStore<AppState, Action, Effect>,
    provider: Arc<dyn WeatherProvider>,
    geolocator: Arc<dyn Geolocator>,
    history: HistoryManager,
    tasks: TaskManager<Action>,
    subscriptions: Subscriptions<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    // Set while a clock tick sits in the channel; the clock skips ticks meanwhile.
    tick_pending: Arc<AtomicBool>,
    map: MapView,
    map_remounts: u64,
}

impl WeatherView {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        geolocator: Arc<dyn Geolocator>,
        history: HistoryManager,
        default_city: impl Into<String>,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let state = AppState::new(default_city, wall_clock());
        let map = map_view(&state);

        Self {
            store: EffectStore::new(state, reducer),
            provider,
            geolocator,
            history,
            tasks: TaskManager::new(action_tx.clone()),
            subscriptions: Subscriptions::new(action_tx),
            action_rx,
            tick_pending: Arc::new(AtomicBool::new(false)),
            map,
            map_remounts: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn view_model(&self) -> ViewModel {
        ViewModel::from_state(self.store.state())
    }

    pub fn map(&self) -> &MapView {
        &self.map
    }

    /// How many times the map was re-centered on new coordinates.
    pub fn map_remounts(&self) -> u64 {
        self.map_remounts
    }

    /// Number of spawned tasks whose results have not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Actions waiting in the channel, clock ticks included.
    pub fn queued(&self) -> usize {
        self.action_rx.len()
    }

    /// Read persisted history into the state without starting a query.
    pub fn load_history(&mut self) -> bool {
        self.run_effect(Effect::LoadHistory)
    }

    pub fn initialize(&mut self) -> bool {
        self.dispatch(Action::Initialize)
    }

    pub fn load_by_name(&mut self, city: &str) -> bool {
        self.dispatch(Action::LoadByName(city.to_string()))
    }

    pub fn load_by_coordinates(&mut self, coords: Coordinates) -> bool {
        self.dispatch(Action::LoadByCoordinates(coords))
    }

    pub fn select_history(&mut self, index: usize) -> bool {
        self.dispatch(Action::HistorySelect(index))
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dispatch(Action::UiToggleDarkMode)
    }

    /// Reduce one action and run whatever effects it declares.
    /// Returns whether the state changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        debug!(action = %action.summary(), "dispatch");

        let result = self.store.dispatch(action);
        let mut changed = result.changed;
        for effect in result.effects {
            changed |= self.run_effect(effect);
        }

        if changed {
            self.sync_map();
        }
        changed
    }

    /// Apply async results until no spawned query is left.
    pub async fn settle(&mut self) {
        while !self.tasks.is_empty() {
            if self.next_action().await.is_none() {
                break;
            }
        }
    }

    /// Wait for the next async result or clock tick and apply it.
    /// Returns whether the state changed, or `None` once no sender is left.
    pub async fn next_action(&mut self) -> Option<bool> {
        let action = self.action_rx.recv().await?;
        Some(self.receive(action))
    }

    /// Apply everything already queued without waiting.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(action) = self.action_rx.try_recv() {
            changed |= self.receive(action);
        }
        changed
    }

    /// Start the one-second wall clock. Restarting replaces the previous timer.
    ///
    /// At most one tick waits in the channel: while it is unapplied the
    /// clock skips, so an idle owner never comes back to a backlog.
    pub fn start_clock(&mut self) {
        self.tick_pending.store(false, Ordering::SeqCst);

        let pending = Arc::clone(&self.tick_pending);
        let mut timer = interval(CLOCK_PERIOD);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let ticks = IntervalStream::new(timer).filter_map(move |_| {
            if pending.swap(true, Ordering::SeqCst) {
                None
            } else {
                Some(Action::ClockTick(wall_clock()))
            }
        });

        self.subscriptions.stream(CLOCK, ticks);
    }

    pub fn stop_clock(&mut self) {
        self.subscriptions.cancel(&SubKey::from(CLOCK));
    }

    pub fn clock_running(&self) -> bool {
        self.subscriptions.is_active(&SubKey::from(CLOCK))
    }

    /// Persisted history manager, for callers that inspect the store.
    pub fn history_manager(&self) -> &HistoryManager {
        &self.history
    }

    fn receive(&mut self, action: Action) -> bool {
        let action = match action {
            // The tick may have waited; show the time it is applied at.
            Action::ClockTick(_) => {
                self.tick_pending.store(false, Ordering::SeqCst);
                Action::ClockTick(wall_clock())
            }
            other => {
                // Release the slot before dispatching: a fallback may reuse the key.
                if let Some(key) = task_key(&other) {
                    self.tasks.cancel(&key);
                }
                other
            }
        };
        self.dispatch(action)
    }

    fn run_effect(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::LoadHistory => {
                let entries = self.history.load().entries().to_vec();
                self.dispatch(Action::HistoryDidChange(entries))
            }

            Effect::RecordHistory(city) => {
                let entries = match self.history.record(&city) {
                    Ok(history) => history.entries().to_vec(),
                    Err(e) => {
                        warn!(error = %e, %city, "Failed to persist search history");
                        self.history.history().entries().to_vec()
                    }
                };
                self.dispatch(Action::HistoryDidChange(entries))
            }

            Effect::Locate { ticket } => {
                let geolocator = Arc::clone(&self.geolocator);
                self.tasks.spawn(locate_key(ticket), async move {
                    match geolocator.locate().await {
                        Ok(coords) => Action::GeolocationDidResolve { ticket, coords },
                        Err(e) => Action::GeolocationDidFail {
                            ticket,
                            reason: e.to_string(),
                        },
                    }
                });
                false
            }

            Effect::Fetch { ticket, query } => {
                let provider = Arc::clone(&self.provider);
                self.tasks.spawn(fetch_key(ticket), async move {
                    match provider.current(&query).await {
                        Ok(snapshot) => Action::WeatherDidLoad { ticket, snapshot },
                        Err(e) => Action::WeatherDidFail {
                            ticket,
                            query,
                            reason: e.to_string(),
                        },
                    }
                });
                false
            }
        }
    }

    // Remount the map only when its center moves.
    fn sync_map(&mut self) {
        let next = map_view(self.store.state());
        if next.center != self.map.center {
            self.map_remounts += 1;
            info!(center = %next.center, zoom = next.zoom, "Map re-centered");
        }
        self.map = next;
    }
}

impl fmt::Debug for WeatherView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherView")
            .field("state", self.store.state())
            .field("provider", &self.provider)
            .field("geolocator", &self.geolocator)
            .field("history", &self.history)
            .field("in_flight", &self.tasks.len())
            .field("clock_running", &self.clock_running())
            .field("map", &self.map)
            .field("map_remounts", &self.map_remounts)
            .finish()
    }
}

// One key per ticket and kind: results of older tickets must not cancel newer work.
fn locate_key(ticket: Ticket) -> TaskKey {
    TaskKey::new(format!("locate-{ticket}"))
}

fn fetch_key(ticket: Ticket) -> TaskKey {
    TaskKey::new(format!("fetch-{ticket}"))
}

fn task_key(action: &Action) -> Option<TaskKey> {
    match action {
        Action::GeolocationDidResolve { ticket, .. } | Action::GeolocationDidFail { ticket, .. } => {
            Some(locate_key(*ticket))
        }
        Action::WeatherDidLoad { ticket, .. } | Action::WeatherDidFail { ticket, .. } => {
            Some(fetch_key(*ticket))
        }
        _ => None,
    }
}

fn wall_clock() -> NaiveDateTime {
    Local::now().naive_local()
}
