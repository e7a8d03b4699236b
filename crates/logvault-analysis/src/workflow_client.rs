// HTTP client for the external workflow engine's run endpoint.

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("workflow engine returned error: {0}")]
    EngineError(String),
}

#[derive(Debug, Clone)]
pub struct WorkflowClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WorkflowClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Run a named workflow with a JSON payload and return the engine's
    /// JSON response.
    pub async fn run(&self, workflow: &str, payload: &Value) -> Result<Value, WorkflowError> {
        let url = format!("{}/api/v1/workflows/{}/run", self.base_url, workflow);

        let response = self
            .client
            .post(&url)
            .header("X-Workflow-Key", &self.api_key)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(WorkflowError::EngineError(error_text));
        }
        Ok(response.json().await?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = WorkflowClient::new("http://localhost:5678", "wf-key");
        assert_eq!(client.base_url(), "http://localhost:5678");
    }
}
