//! Build-info sources
//!
//! A source turns a filled query url into the raw XML answer. The trait
//! keeps the timeline independent of HTTP so it can be exercised with
//! canned documents.

use async_trait::async_trait;
use hudson_core::HudsonConfig;
use reqwest::{Client, Response, StatusCode};

use crate::auth::{self, Credentials};
use crate::error::{Result, request_error, status_error};

/// Something that can answer build-info queries
#[async_trait]
pub trait BuildInfoSource: Send + Sync {
    /// Fetches the body behind `url`
    ///
    /// # Arguments
    /// * `url` - A query url with the time window already filled in
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP implementation of BuildInfoSource
///
/// Every fetch builds its own connection pool and drops it when the call
/// ends, whether it succeeded or not.
#[derive(Debug, Clone, Default)]
pub struct HttpBuildSource {
    credentials: Option<Credentials>,
}

impl HttpBuildSource {
    /// Creates a source that sends no credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that answers authentication challenges
    ///
    /// # Arguments
    /// * `username` - Account name on the CI server
    /// * `password` - Password or API token
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Some(Credentials {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// Creates a source using the credentials of a configuration, if any
    pub fn from_config(config: &HudsonConfig) -> Self {
        if config.has_credentials() {
            Self::with_credentials(config.username.clone(), config.password.clone())
        } else {
            Self::new()
        }
    }

    /// Whether challenges will be answered
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    async fn read_body(url: &str, response: Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(url, status));
        }

        response.text().await.map_err(|e| request_error(url, &e))
    }
}

#[async_trait]
impl BuildInfoSource for HttpBuildSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching build info from '{}'", url);

        let client = Client::builder()
            .build()
            .map_err(|e| request_error(url, &e))?;

        let mut response = client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, &e))?;

        if response.status() == StatusCode::UNAUTHORIZED
            && let Some(credentials) = &self.credentials
        {
            response = auth::answer_challenge(&client, url, response, credentials).await?;
        }

        Self::read_body(url, response).await
    }
}
