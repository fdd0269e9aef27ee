//! HTTP client for a running voxctl server

use eyre::{Context, Result, eyre};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use voxctl::config::SettingsUpdate;
use voxctl::control::{CommandOutcome, CommandRequest};
use voxctl::domain::{LoopDef, StatusReport};

pub struct ControlClient {
    client: Client,
    base_url: String,
}

impl ControlClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url
        } else {
            format!("http://{}", base_url)
        };
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn status(&self) -> Result<StatusReport> {
        self.get("/api/status").await
    }

    pub async fn loops(&self) -> Result<Vec<LoopDef>> {
        let catalog: Value = self.get("/api/config").await?;
        serde_json::from_value(catalog["loops"].clone()).context("Malformed loop catalog")
    }

    pub async fn command(&self, request: &CommandRequest) -> Result<CommandOutcome> {
        self.post("/api/command", request).await
    }

    pub async fn save_settings(&self, update: &SettingsUpdate) -> Result<Value> {
        self.post("/api/settings", update).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .context(format!("Failed to reach {}", self.base_url))?;
        Self::decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .context(format!("Failed to reach {}", self.base_url))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body["error"].as_str().unwrap_or("no details");
            return Err(eyre!("Server returned {}: {}", status, message));
        }
        response.json().await.context("Malformed server response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(ControlClient::new("127.0.0.1:8080").base_url(), "http://127.0.0.1:8080");
        assert_eq!(ControlClient::new("http://host:1/").base_url(), "http://host:1");
        assert_eq!(ControlClient::new("https://secure").base_url(), "https://secure");
    }
}
