//! Base HTTP client with shared logic

use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::infrastructure::model::types::ProviderError;

/// Base HTTP client with shared functionality
#[derive(Clone)]
pub struct HttpClientBase {
    pub id: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub http: Client,
}

impl HttpClientBase {
    pub fn new(id: String, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            id,
            endpoint,
            api_key,
            http: Client::new(),
        }
    }

    /// Build URL from endpoint and path
    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Post JSON with bearer auth, decode a JSON response
    pub async fn post_with_bearer<Req, Res>(&self, url: &str, body: &Req) -> Result<Res, ProviderError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let response = self.post_raw(url, body, true).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::network(&self.id, e))
    }

    /// Post JSON and hand back the raw response for body streaming.
    /// Non-2xx statuses are already rejected here.
    pub async fn post_streaming<Req>(
        &self,
        url: &str,
        body: &Req,
        bearer: bool,
    ) -> Result<Response, ProviderError>
    where
        Req: Serialize,
    {
        self.post_raw(url, body, bearer).await
    }

    async fn post_raw<Req>(
        &self,
        url: &str,
        body: &Req,
        bearer: bool,
    ) -> Result<Response, ProviderError>
    where
        Req: Serialize,
    {
        let mut request = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);

        if bearer {
            let api_key = self.require_api_key()?;
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::network(&self.id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::status(&self.id, status));
        }
        Ok(response)
    }

    fn require_api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::missing_api_key(&self.id))
    }
}
