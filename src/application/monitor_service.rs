// Monitor service - Polling loop for one character at a time
use crate::application::history_store::HistoryStore;
use crate::application::level_source::LevelSource;
use crate::application::scheduler::RepeatingTimer;
use crate::application::session::MonitorSession;
use crate::application::settings_store::{
    SettingsStore, clear_alert_state, load_alert_state, load_user_settings, save_alert_state,
    save_user_settings,
};
use crate::domain::error::{FetchError, MonitorError, MonitorResult};
use crate::domain::events::{ErrorKind, MonitorEvent, MonitorSnapshot};
use crate::domain::observation::TimeSeries;
use crate::domain::settings::{UserSettings, validate_goal_level};
use crate::infrastructure::config::MonitorConfig;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};

const EVENT_BUFFER: usize = 100;

#[derive(Default)]
struct ServiceState {
    session: Option<MonitorSession>,
    timer: Option<RepeatingTimer>,
    next_generation: u64,
}

/// Runs the `Idle -> Monitoring -> Idle` loop and publishes every tick's
/// outcome as [`MonitorEvent`]s.
///
/// Each session carries a generation number; results of a fetch that was in
/// flight when its session stopped are dropped by comparing generations.
/// Ticks are serialized by `tick_guard`, so at most one fetch is in flight
/// whether it came from the timer or from [`MonitorService::poll_now`].
#[derive(Clone)]
pub struct MonitorService {
    level_source: Arc<dyn LevelSource>,
    history: Arc<dyn HistoryStore>,
    settings: Arc<dyn SettingsStore>,
    config: MonitorConfig,
    state: Arc<Mutex<ServiceState>>,
    tick_guard: Arc<Mutex<()>>,
    events: broadcast::Sender<MonitorEvent>,
}

impl MonitorService {
    pub fn new(
        level_source: Arc<dyn LevelSource>,
        history: Arc<dyn HistoryStore>,
        settings: Arc<dyn SettingsStore>,
        config: MonitorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            level_source,
            history,
            settings,
            config,
            state: Arc::new(Mutex::new(ServiceState::default())),
            tick_guard: Arc::new(Mutex::new(())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Stop any running session, load `name`'s history and latches, poll
    /// once immediately, then keep polling every `poll_interval_secs`.
    pub async fn start(&self, name: &str) -> MonitorResult<()> {
        let name = validate_name(name)?;
        self.stop().await;

        // Wait out any tick of the previous session that is still persisting
        let (series, alert_state) = {
            let _tick = self.tick_guard.lock().await;
            let series = self
                .history
                .load(name)
                .await
                .map_err(MonitorError::persistence)?;
            let alert_state = load_alert_state(self.settings.as_ref(), name)
                .await
                .map_err(MonitorError::persistence)?;
            (series, alert_state)
        };
        let settings = self.user_settings().await?;

        let generation = {
            let mut state = self.state.lock().await;
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }
            state.next_generation += 1;
            let generation = state.next_generation;
            tracing::info!(
                character = name,
                entries = series.len(),
                "Monitoring started"
            );
            state.session = Some(MonitorSession::new(
                name,
                generation,
                series,
                alert_state,
                settings,
                self.config.clone(),
                Utc::now(),
            ));
            generation
        };

        // A failed first poll is reported as an event; the session still starts
        let _ = self.tick(generation).await;

        let service = self.clone();
        let timer = RepeatingTimer::spawn(
            Duration::from_secs(self.config.poll_interval_secs),
            move || {
                let service = service.clone();
                async move {
                    let _ = service.tick(generation).await;
                }
            },
        );

        let mut state = self.state.lock().await;
        if state
            .session
            .as_ref()
            .is_some_and(|s| s.generation() == generation)
        {
            state.timer = Some(timer);
        } else {
            // Stopped or replaced while the first poll was in flight
            timer.cancel();
        }

        Ok(())
    }

    /// Cancel polling and drop the in-memory session. Stored history stays.
    /// Returns the name that was being monitored.
    pub async fn stop(&self) -> Option<String> {
        let session = {
            let mut state = self.state.lock().await;
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }
            state.session.take()?
        };

        let name = session.name().to_string();
        tracing::info!(character = %name, "Monitoring stopped");
        self.emit(MonitorEvent::Stopped { name: name.clone() });
        Some(name)
    }

    /// Run one fetch-and-process cycle for the active session right away.
    /// A failed fetch is returned to the caller as well as published.
    pub async fn poll_now(&self) -> MonitorResult<()> {
        let generation = {
            let state = self.state.lock().await;
            state
                .session
                .as_ref()
                .map(|s| s.generation())
                .ok_or_else(|| MonitorError::invalid("no character is being monitored"))?
        };
        self.tick(generation).await?;
        Ok(())
    }

    pub async fn active_character(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.session.as_ref().map(|s| s.name().to_string())
    }

    pub async fn snapshot(&self) -> Option<MonitorSnapshot> {
        let state = self.state.lock().await;
        state.session.as_ref()?.snapshot(Utc::now())
    }

    pub async fn history(&self, name: &str) -> MonitorResult<TimeSeries> {
        let name = validate_name(name)?;
        {
            let state = self.state.lock().await;
            if let Some(session) = state.session.as_ref().filter(|s| s.name() == name) {
                return Ok(session.series().clone());
            }
        }
        self.history
            .load(name)
            .await
            .map_err(MonitorError::persistence)
    }

    /// Delete `name`'s stored history and alert latches, stopping its
    /// session first if it is the one being monitored.
    pub async fn clear_history(&self, name: &str) -> MonitorResult<()> {
        let name = validate_name(name)?;
        if self.active_character().await.as_deref() == Some(name) {
            self.stop().await;
        }

        let _tick = self.tick_guard.lock().await;
        self.history
            .delete(name)
            .await
            .map_err(MonitorError::persistence)?;
        clear_alert_state(self.settings.as_ref(), name)
            .await
            .map_err(MonitorError::persistence)?;

        tracing::info!(character = name, "History cleared");
        Ok(())
    }

    pub async fn user_settings(&self) -> MonitorResult<UserSettings> {
        let defaults = UserSettings::with_defaults(
            self.config.max_level,
            self.config.default_slow_threshold_secs,
        );
        load_user_settings(self.settings.as_ref(), defaults)
            .await
            .map_err(MonitorError::persistence)
    }

    /// Validate and persist new settings, applying them to the active session.
    pub async fn update_settings(&self, settings: UserSettings) -> MonitorResult<UserSettings> {
        settings.validate(self.config.max_level)?;
        save_user_settings(self.settings.as_ref(), &settings)
            .await
            .map_err(MonitorError::persistence)?;

        let mut state = self.state.lock().await;
        if let Some(session) = state.session.as_mut() {
            session.update_settings(settings.clone());
        }
        Ok(settings)
    }

    pub async fn set_goal_level(&self, level: u32) -> MonitorResult<UserSettings> {
        validate_goal_level(level, self.config.max_level)?;
        let mut settings = self.user_settings().await?;
        settings.goal_level = level;
        self.update_settings(settings).await
    }

    async fn tick(&self, generation: u64) -> Result<(), FetchError> {
        let _tick = self.tick_guard.lock().await;

        let name = {
            let state = self.state.lock().await;
            match state.session.as_ref() {
                Some(session) if session.generation() == generation => session.name().to_string(),
                _ => return Ok(()),
            }
        };

        // The state lock is released while fetching so stop() never waits on the network
        let fetched = self.level_source.fetch(&name).await;

        let now = Utc::now();
        let (outcome, series, latches, snapshot) = {
            let mut state = self.state.lock().await;
            let Some(session) = state
                .session
                .as_mut()
                .filter(|s| s.generation() == generation)
            else {
                tracing::debug!(character = %name, "Discarding poll result for inactive session");
                return Ok(());
            };

            let reading = match fetched {
                Ok(reading) => reading,
                Err(e) => {
                    tracing::warn!(character = %name, "Poll failed: {}", e);
                    self.emit_error(&name, ErrorKind::Fetch, e.to_string());
                    return Err(e);
                }
            };

            let outcome = session.apply(reading, now);
            let series = outcome.appended.then(|| session.series().clone());
            let latches = outcome.alert_state_changed.then(|| session.alert_state());
            (outcome, series, latches, session.snapshot(now))
        };

        if let Some(series) = series {
            if let Err(e) = self.history.save(&name, &series).await {
                let err = MonitorError::persistence(e);
                tracing::warn!(character = %name, "{}", err);
                self.emit_error(&name, ErrorKind::Persistence, err.to_string());
            }
        }

        if let Some(latches) = latches {
            if let Err(e) = save_alert_state(self.settings.as_ref(), &name, &latches).await {
                let err = MonitorError::persistence(e);
                tracing::warn!(character = %name, "{}", err);
                self.emit_error(&name, ErrorKind::Persistence, err.to_string());
            }
        }

        for alert in outcome.alerts {
            self.emit(MonitorEvent::Alert(alert));
        }

        if let Some(snapshot) = snapshot {
            self.emit(MonitorEvent::Status(snapshot));
        }
        Ok(())
    }

    fn emit(&self, event: MonitorEvent) {
        // No subscribers is fine; the snapshot stays queryable
        let _ = self.events.send(event);
    }

    fn emit_error(&self, name: &str, kind: ErrorKind, message: String) {
        self.emit(MonitorEvent::Error {
            name: name.to_string(),
            kind,
            message,
        });
    }
}

fn validate_name(name: &str) -> MonitorResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MonitorError::invalid("character name must not be empty"));
    }
    Ok(name)
}
