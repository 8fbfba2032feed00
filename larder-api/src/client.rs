use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::ApiError;
use crate::inventory::InventoryApi;
use crate::session::Session;
use crate::types::{InventoryItem, ItemId, ItemUpdate, LoginRequest, LoginResponse, NewItem};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Client for the inventory REST API.
#[derive(Clone)]
pub struct InventoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl InventoryClient {
    /// Creates a client for the default API origin.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchanges credentials for a bearer token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        debug!("Sending login request");

        let response = self.http.post(self.url("/auth/login")).json(&body).send().await?;
        let login: LoginResponse = read_json(response).await?;

        debug!("Login succeeded");
        Ok(login.access_token)
    }

    #[instrument(skip(self, session))]
    pub async fn list_items(&self, session: &Session) -> Result<Vec<InventoryItem>, ApiError> {
        let response = self
            .http
            .get(self.url("/inventory"))
            .header("Authorization", session.bearer())
            .send()
            .await?;

        let items: Vec<InventoryItem> = read_json(response).await?;
        debug!(count = items.len(), "Fetched inventory");
        Ok(items)
    }

    #[instrument(skip(self, session, item), fields(name = %item.item_name))]
    pub async fn create_item(
        &self,
        session: &Session,
        item: &NewItem,
    ) -> Result<InventoryItem, ApiError> {
        let response = self
            .http
            .post(self.url("/inventory"))
            .header("Authorization", session.bearer())
            .json(item)
            .send()
            .await?;

        read_json(response).await
    }

    #[instrument(skip(self, session, update))]
    pub async fn update_item(
        &self,
        session: &Session,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<InventoryItem, ApiError> {
        let response = self
            .http
            .put(self.url(&format!("/inventory/{}", id)))
            .header("Authorization", session.bearer())
            .json(update)
            .send()
            .await?;

        read_json(response).await
    }

    #[instrument(skip(self, session))]
    pub async fn delete_item(&self, session: &Session, id: ItemId) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/inventory/{}", id)))
            .header("Authorization", session.bearer())
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}

impl Default for InventoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryApi for InventoryClient {
    async fn list(&self, session: &Session) -> Result<Vec<InventoryItem>, ApiError> {
        self.list_items(session).await
    }

    async fn create(&self, session: &Session, item: &NewItem) -> Result<InventoryItem, ApiError> {
        self.create_item(session, item).await
    }

    async fn update(
        &self,
        session: &Session,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<InventoryItem, ApiError> {
        self.update_item(session, id, update).await
    }

    async fn delete(&self, session: &Session, id: ItemId) -> Result<(), ApiError> {
        self.delete_item(session, id).await
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!(status = status.as_u16(), %message, "API request failed");

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(message));
    }
    Err(ApiError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Picks the message the server reported, falling back to the raw body and
/// then to the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let reported = ["detail", "message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(|m| m.as_str()));
        if let Some(message) = reported {
            return message.to_string();
        }
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}
