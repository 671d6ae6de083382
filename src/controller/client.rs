//! Controller REST API Client
//!
//! HTTP client for the AppDynamics controller. Credentials, base URL and
//! tenant come from an immutable [`ControllerConfig`] fixed at construction.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;

use super::models::{CatalogEntry, MetricDataRequest, RawSeriesEntry};
use super::ControllerApi;

/// Connection settings for one controller
#[derive(Clone)]
pub struct ControllerConfig {
    /// Base URL of the controller (e.g., "https://acme.saas.appdynamics.com")
    pub base_url: String,
    /// API user name, without the tenant suffix
    pub username: String,
    pub password: String,
    /// Controller account; sent as `username@tenant`
    pub tenant: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            username: String::new(),
            password: String::new(),
            tenant: "customer1".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("tenant", &self.tenant)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl ControllerConfig {
    /// User name as the controller expects it in basic auth
    pub fn auth_user(&self) -> String {
        if self.tenant.is_empty() {
            self.username.clone()
        } else {
            format!("{}@{}", self.username, self.tenant)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn application_url(&self, application: &str, resource: &str) -> String {
        self.url(&format!(
            "/controller/rest/applications/{}/{}",
            urlencoding::encode(application),
            resource
        ))
    }
}

/// reqwest-backed [`ControllerApi`]
pub struct HttpControllerClient {
    client: Client,
    config: ControllerConfig,
}

impl HttpControllerClient {
    /// Create a new controller client with the given configuration
    pub fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        if self.config.username.is_empty() {
            request
        } else {
            request.basic_auth(self.config.auth_user(), Some(&self.config.password))
        }
    }

    /// Send a GET and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ControllerError> {
        tracing::debug!(url = %url, "Controller request");

        let response = self
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ControllerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ControllerError::Decode(e.to_string()))
    }
}

fn map_send_error(e: reqwest::Error) -> ControllerError {
    if e.is_timeout() {
        ControllerError::Timeout
    } else if e.is_connect() {
        ControllerError::Unavailable
    } else {
        ControllerError::Request(e)
    }
}

#[async_trait]
impl ControllerApi for HttpControllerClient {
    async fn metric_data(
        &self,
        request: &MetricDataRequest,
    ) -> Result<Vec<RawSeriesEntry>, ControllerError> {
        let url = self
            .config
            .application_url(&request.application, "metric-data");
        self.get_json(&url, &request.query_params()).await
    }

    async fn applications(&self) -> Result<Vec<CatalogEntry>, ControllerError> {
        let url = self.config.url("/controller/rest/applications");
        self.get_json(&url, &[("output", "json".to_string())]).await
    }

    async fn metrics(
        &self,
        application: &str,
        metric_path: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, ControllerError> {
        let url = self.config.application_url(application, "metrics");

        let mut params = vec![("output", "json".to_string())];
        if let Some(path) = metric_path {
            params.push(("metric-path", path.to_string()));
        }

        self.get_json(&url, &params).await
    }

    async fn ping(&self) -> Result<(), ControllerError> {
        let url = self.config.url("/api/controllerflags");

        let response = self.get(&url).send().await.map_err(map_send_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ControllerError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when communicating with the controller
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Controller unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected response body: {0}")]
    Decode(String),
}
