// Level source trait - where observations come from
use crate::domain::error::FetchError;
use crate::domain::observation::LevelReading;
use async_trait::async_trait;

#[async_trait]
pub trait LevelSource: Send + Sync {
    /// Fetch the current level and online status of `name`.
    ///
    /// Timeouts are the implementation's concern; every failure is reported
    /// as a [`FetchError`].
    async fn fetch(&self, name: &str) -> Result<LevelReading, FetchError>;
}
