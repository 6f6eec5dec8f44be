//! Typed HTTP client for the opsdesk REST API.
//!
//! Form payloads are validated with the same rules the server applies, so
//! obviously bad input never leaves the process.

pub mod error;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use opsdesk_types::api::{
    CreateProductRequest, IncidentQuery, IncidentView, LoginRequest, LoginResponse,
    MessageResponse, ProductQuery, RegisterRequest, RegisterResponse, UpdateProductRequest,
};
use opsdesk_types::models::Product;
use opsdesk_types::validate::Validate;

pub use crate::error::ClientError;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Uses `API_URL`, falling back to the local dev server.
    pub fn from_env() -> Self {
        let url = std::env::var("API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        Self::new(url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotAuthenticated)?;
        Ok(req.bearer_auth(token))
    }

    /// Registers and keeps the issued token for later calls.
    pub async fn register(&mut self, req: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        req.validate()?;
        let resp = self.http.post(self.url("/auth/register")).json(req).send().await?;
        let registered: RegisterResponse = read_json(resp).await?;
        self.token = Some(registered.token.clone());
        Ok(registered)
    }

    pub async fn login(&mut self, req: &LoginRequest) -> Result<LoginResponse, ClientError> {
        req.validate()?;
        let resp = self.http.post(self.url("/auth/login")).json(req).send().await?;
        let session: LoginResponse = read_json(resp).await?;
        debug!("Logged in as {}", session.email);
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ClientError> {
        query.validate()?;
        let resp = self.http.get(self.url("/products")).query(query).send().await?;
        read_json(resp).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, ClientError> {
        let resp = self.http.get(self.url(&format!("/products/{}", id))).send().await?;
        read_json(resp).await
    }

    pub async fn create_product(&self, req: &CreateProductRequest) -> Result<Product, ClientError> {
        req.validate()?;
        let resp = self
            .authorized(self.http.post(self.url("/products")))?
            .json(req)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        req: &UpdateProductRequest,
    ) -> Result<Product, ClientError> {
        req.validate()?;
        let resp = self
            .authorized(self.http.patch(self.url(&format!("/products/{}", id))))?
            .json(req)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<MessageResponse, ClientError> {
        let resp = self
            .authorized(self.http.delete(self.url(&format!("/products/{}", id))))?
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn list_incidents(&self, query: &IncidentQuery) -> Result<Vec<IncidentView>, ClientError> {
        let resp = self.http.get(self.url("/incidents")).query(query).send().await?;
        read_json(resp).await
    }
}

/// Decode a success body, or turn the server's error envelope into [`ClientError::Http`].
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Http {
        status,
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
