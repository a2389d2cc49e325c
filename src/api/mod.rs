//! Typed client for the marketplace REST backend.
//!
//! Public read calls swallow failures and return empty results, mutations and
//! admin calls return [`ApiError`] whose message is fit for display.

pub mod admin;
pub mod blogs;
pub mod properties;
pub mod vendors;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;

pub use properties::SearchParams;

/// Response of `POST /property/new_property/{realtor_id}`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedProperty {
    pub property_id: String,
    #[serde(default)]
    pub images_saved: u32,
    #[serde(default)]
    pub message: String,
}

/// Response of `POST /vendors/register`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredVendor {
    pub vendor_id: String,
    #[serde(default)]
    pub message: String,
}

/// Marketplace backend client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("flexspace/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(client, &config.api_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return its JSON body (`Null` for empty bodies)
    pub(crate) async fn send(&self, builder: RequestBuilder, action: &str) -> Result<Value, ApiError> {
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(ApiError::from_response(status, &body, action));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub(crate) async fn send_as<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        action: &str,
    ) -> Result<T, ApiError> {
        let body = self.send(builder, action).await?;
        decode(body)
    }

    pub(crate) fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_connect() {
            ApiError::Unreachable {
                base_url: self.base_url.clone(),
            }
        } else {
            ApiError::Http(err)
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Read a list field out of a response object; missing or null means empty
pub(crate) fn list_field<T: DeserializeOwned>(body: &mut Value, key: &str) -> Result<Vec<T>, ApiError> {
    match body.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(items) => decode(items),
    }
}

pub(crate) fn pages_field(body: &Value) -> u32 {
    body.get("pages")
        .and_then(Value::as_u64)
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or(0)
}
