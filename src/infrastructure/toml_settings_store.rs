// TOML-file backed key-value settings store
use crate::application::settings_store::SettingsStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// Keeps every setting in memory and rewrites the whole file on each change.
#[derive(Debug)]
pub struct TomlSettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl TomlSettingsStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path).await {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse settings file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read settings file {}", path.display()));
            }
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create settings directory")?;
            }
        }

        let contents = toml::to_string(values).context("Failed to encode settings")?;
        fs::write(&self.path, contents)
            .await
            .with_context(|| format!("Failed to write settings file {}", self.path.display()))
    }
}

#[async_trait]
impl SettingsStore for TomlSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut values = self.values.lock().await;
        if values.get(key) == Some(&value) {
            return Ok(());
        }
        values.insert(key.to_string(), value);
        self.persist(&values).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().await;
        if values.remove(key).is_some() {
            self.persist(&values).await?;
        }
        Ok(())
    }
}
