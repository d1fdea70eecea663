// HTTP level source - queries the ranking service's `/level` endpoint
use crate::application::level_source::LevelSource;
use crate::domain::error::FetchError;
use crate::domain::observation::LevelReading;
use crate::infrastructure::config::SourceSettings;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpLevelSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLevelSource {
    pub fn new(settings: &SourceSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_level_url(&self, name: &str) -> String {
        format!("{}/level?name={}", self.base_url, urlencoding::encode(name))
    }
}

/// Decode a `{"level": n, "isOnline": bool}` body.
fn parse_reading(body: &str) -> Result<LevelReading, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))
}

#[async_trait]
impl LevelSource for HttpLevelSource {
    async fn fetch(&self, name: &str) -> Result<LevelReading, FetchError> {
        let url = self.build_level_url(name);
        tracing::debug!("Fetching level from {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Network(format!(
                "level query failed with status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        parse_reading(&body)
    }
}
