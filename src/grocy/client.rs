use super::{Chore, GrocyError, User};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Header Grocy reads the API key from.
pub const API_KEY_HEADER: &str = "GROCY-API-KEY";

/// Authenticated read-only client for a Grocy instance.
pub struct GrocyClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GrocyClient {
    /// `base_url` is the API root, e.g. `http://grocy.local/api`.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, GrocyError> {
        let client = Client::builder()
            .build()
            .map_err(|source| GrocyError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retrieve every chore with its next estimated execution.
    pub async fn fetch_chores(&self) -> Result<Vec<Chore>, GrocyError> {
        self.get_json("chores").await
    }

    /// Retrieve every user known to the instance.
    pub async fn fetch_users(&self) -> Result<Vec<User>, GrocyError> {
        self.get_json("users").await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &'static str,
    ) -> Result<T, GrocyError> {
        let url = format!("{}/{}", self.base_url, resource);
        debug!(%url, "Requesting");

        let transport = |source| GrocyError::Transport {
            url: url.clone(),
            source,
        };

        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(GrocyError::HttpStatus { resource, status });
        }

        let body = resp.bytes().await.map_err(transport)?;
        serde_json::from_slice(&body).map_err(|source| GrocyError::Decode { resource, source })
    }
}

/// Fetch chores with a one-off client.
pub async fn fetch_chores(base_url: &str, api_key: &str) -> Result<Vec<Chore>, GrocyError> {
    GrocyClient::new(base_url, api_key)?.fetch_chores().await
}

/// Fetch users with a one-off client.
pub async fn fetch_users(base_url: &str, api_key: &str) -> Result<Vec<User>, GrocyError> {
    GrocyClient::new(base_url, api_key)?.fetch_users().await
}
