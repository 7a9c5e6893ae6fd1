//! HTTP implementation of the usage RPCs

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::application::usage::{UsageBackend, UsageError, UsageSnapshot};

/// JSON POST client for the remote usage service.
#[derive(Clone)]
pub struct HttpUsageBackend {
    endpoint: String,
    http: Client,
}

impl HttpUsageBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: Client::new(),
        }
    }

    fn build_url(&self, procedure: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        format!("{base}/{procedure}")
    }

    async fn call<B: Serialize>(
        &self,
        procedure: &str,
        body: &B,
    ) -> Result<UsageSnapshot, UsageError> {
        let url = self.build_url(procedure);
        debug!(procedure, "Calling usage service");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(UsageError::network)?
            .error_for_status()
            .map_err(UsageError::network)?;

        let counters: UsageCounters = response
            .json()
            .await
            .map_err(|e| UsageError::invalid_response(e.to_string()))?;

        Ok(UsageSnapshot {
            prompt_count: counters.prompt_count,
            synthesis_count: counters.synthesis_count,
        })
    }
}

#[async_trait]
impl UsageBackend for HttpUsageBackend {
    async fn get_llm_usage(&self, user_id: &str) -> Result<UsageSnapshot, UsageError> {
        self.call("get_llm_usage", &json!({ "userId": user_id })).await
    }

    async fn update_llm_usage(
        &self,
        user_id: &str,
        count: u32,
    ) -> Result<UsageSnapshot, UsageError> {
        self.call(
            "update_llm_usage",
            &json!({ "userId": user_id, "count": count }),
        )
        .await
    }

    async fn update_synthesize_usage(&self, user_id: &str) -> Result<UsageSnapshot, UsageError> {
        self.call("update_synthesize_usage", &json!({ "userId": user_id }))
            .await
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageCounters {
    prompt_count: u32,
    synthesis_count: u32,
}
