// Durable key-value settings and the typed accessors built on it
use crate::domain::alerts::AlertState;
use crate::domain::settings::UserSettings;
use anyhow::Context;
use async_trait::async_trait;

const USER_SETTINGS_KEY: &str = "user_settings";

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()>;

    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

fn alert_state_key(name: &str) -> String {
    format!("alerts.{}", name)
}

/// Stored user settings, or `defaults` when nothing usable is stored.
pub async fn load_user_settings(
    store: &dyn SettingsStore,
    defaults: UserSettings,
) -> anyhow::Result<UserSettings> {
    let Some(raw) = store.get(USER_SETTINGS_KEY).await? else {
        return Ok(defaults);
    };

    match serde_json::from_str(&raw) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            tracing::warn!("Ignoring unreadable user settings: {}", e);
            Ok(defaults)
        }
    }
}

pub async fn save_user_settings(
    store: &dyn SettingsStore,
    settings: &UserSettings,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(settings).context("Failed to encode user settings")?;
    store.set(USER_SETTINGS_KEY, raw).await
}

pub async fn load_alert_state(store: &dyn SettingsStore, name: &str) -> anyhow::Result<AlertState> {
    let Some(raw) = store.get(&alert_state_key(name)).await? else {
        return Ok(AlertState::default());
    };

    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Resetting unreadable alert latches for {}: {}", name, e);
        AlertState::default()
    }))
}

pub async fn save_alert_state(
    store: &dyn SettingsStore,
    name: &str,
    state: &AlertState,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(state).context("Failed to encode alert latches")?;
    store.set(&alert_state_key(name), raw).await
}

pub async fn clear_alert_state(store: &dyn SettingsStore, name: &str) -> anyhow::Result<()> {
    store.remove(&alert_state_key(name)).await
}
