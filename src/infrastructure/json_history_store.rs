// JSON history store - one file per character
use crate::application::history_store::HistoryStore;
use crate::domain::observation::TimeSeries;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names are percent-encoded so any character name maps to a safe file name.
    fn history_file(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("history_{}.json", urlencoding::encode(name)))
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn load(&self, name: &str) -> Result<TimeSeries> {
        let path = self.history_file(name);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TimeSeries::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read history for {}", name));
            }
        };

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse history for {}", name))
    }

    async fn save(&self, name: &str, series: &TimeSeries) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .context("Failed to create history directory")?;

        let json = serde_json::to_string_pretty(series)?;
        let path = self.history_file(name);
        let tmp = path.with_extension("json.tmp");

        // Write then rename so a crash never leaves a truncated history
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write history for {}", name))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace history for {}", name))?;

        tracing::debug!("Saved {} observations for {}", series.len(), name);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.history_file(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete history for {}", name)),
        }
    }
}
