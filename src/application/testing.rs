// In-memory collaborators for service tests
use crate::application::history_store::HistoryStore;
use crate::application::level_source::LevelSource;
use crate::application::settings_store::SettingsStore;
use crate::domain::error::FetchError;
use crate::domain::observation::{LevelReading, TimeSeries};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Replays queued results; repeats the last one once the queue runs dry.
#[derive(Default)]
pub struct ScriptedLevelSource {
    script: Mutex<VecDeque<Result<LevelReading, FetchError>>>,
    last: Mutex<Option<Result<LevelReading, FetchError>>>,
}

impl ScriptedLevelSource {
    pub fn new(script: Vec<Result<LevelReading, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
        }
    }

    pub fn push(&self, result: Result<LevelReading, FetchError>) {
        self.script.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl LevelSource for ScriptedLevelSource {
    async fn fetch(&self, name: &str) -> Result<LevelReading, FetchError> {
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(FetchError::NotFound(name.to_string()))),
        }
    }
}

/// Blocks every fetch until released, signalling when a fetch has begun.
pub struct GatedLevelSource {
    pub entered: Notify,
    pub release: Notify,
    pub reading: LevelReading,
}

#[async_trait]
impl LevelSource for GatedLevelSource {
    async fn fetch(&self, _name: &str) -> Result<LevelReading, FetchError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.reading)
    }
}

/// Counts overlapping fetches; each fetch takes `delay` to complete.
pub struct SlowLevelSource {
    pub delay: Duration,
    pub reading: LevelReading,
    pub fetches: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl SlowLevelSource {
    pub fn new(delay: Duration, reading: LevelReading) -> Self {
        Self {
            delay,
            reading,
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LevelSource for SlowLevelSource {
    async fn fetch(&self, _name: &str) -> Result<LevelReading, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.reading)
    }
}

#[derive(Default)]
pub struct MemoryHistoryStore {
    series: Mutex<HashMap<String, TimeSeries>>,
    pub saves: AtomicUsize,
    pub fail_saves: AtomicBool,
}

impl MemoryHistoryStore {
    pub fn with_series(name: &str, series: TimeSeries) -> Self {
        let store = Self::default();
        store.series.lock().unwrap().insert(name.to_string(), series);
        store
    }

    pub fn stored(&self, name: &str) -> Option<TimeSeries> {
        self.series.lock().unwrap().get(name).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self, name: &str) -> anyhow::Result<TimeSeries> {
        Ok(self.stored(name).unwrap_or_default())
    }

    async fn save(&self, name: &str, series: &TimeSeries) -> anyhow::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("history volume is read-only");
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.series
            .lock()
            .unwrap()
            .insert(name.to_string(), series.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> anyhow::Result<()> {
        self.series.lock().unwrap().remove(name);
        Ok(())
    }
}

/// Blocks every save until released, signalling when a save has begun.
#[derive(Default)]
pub struct GatedHistoryStore {
    pub entered: Notify,
    pub release: Notify,
    pub inner: MemoryHistoryStore,
}

#[async_trait]
impl HistoryStore for GatedHistoryStore {
    async fn load(&self, name: &str) -> anyhow::Result<TimeSeries> {
        self.inner.load(name).await
    }

    async fn save(&self, name: &str, series: &TimeSeries) -> anyhow::Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.save(name, series).await
    }

    async fn delete(&self, name: &str) -> anyhow::Result<()> {
        self.inner.delete(name).await
    }
}

#[derive(Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}
