// Repository trait for per-character observation history
use crate::domain::observation::TimeSeries;
use async_trait::async_trait;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the stored series for `name`, empty if none exists
    async fn load(&self, name: &str) -> anyhow::Result<TimeSeries>;

    /// Replace the stored series for `name`
    async fn save(&self, name: &str, series: &TimeSeries) -> anyhow::Result<()>;

    /// Delete the stored series for `name`. Deleting a missing series is not an error.
    async fn delete(&self, name: &str) -> anyhow::Result<()>;
}
