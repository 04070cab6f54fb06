use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{AddProfileRequest, ApiResult, ADD_PROFILE_PATH, REGISTER_SECRET_HEADER};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub mod config;
pub mod controller;
pub mod form;
pub mod notifications;

pub use config::{load_settings, load_settings_from, ClientSettings};
pub use controller::{SubmissionController, SubmissionState, SubmitOutcome};
pub use form::{FormInputError, ProfileForm};
pub use notifications::{ChannelSink, Notification, NotificationKind, NotificationSink};

#[derive(Debug, Error)]
pub enum ProfileServiceError {
    #[error("invalid profile service base url '{base_url}'")]
    InvalidBaseUrl {
        base_url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("profile service request failed")]
    Transport(#[from] reqwest::Error),
    #[error("profile service returned an unreadable body (status {status})")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

/// The backend that stores a registration.
///
/// An `Ok` result may still be an API-level failure (`is_success == false`);
/// `Err` is reserved for requests that never produced an [`ApiResult`].
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn create_profile(
        &self,
        request: &AddProfileRequest,
    ) -> Result<ApiResult, ProfileServiceError>;
}

pub struct HttpProfileService {
    http: Client,
    endpoint: Url,
    secret: String,
}

impl HttpProfileService {
    pub fn new(base_url: &str, secret: impl Into<String>) -> Result<Self, ProfileServiceError> {
        Self::with_client(Client::new(), base_url, secret)
    }

    pub fn with_client(
        http: Client,
        base_url: &str,
        secret: impl Into<String>,
    ) -> Result<Self, ProfileServiceError> {
        Ok(Self {
            http,
            endpoint: add_profile_endpoint(base_url)?,
            secret: secret.into(),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        let base_url = settings.base_url()?;
        Ok(Self::new(base_url.as_str(), settings.api_secret_key.clone())?)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ProfileService for HttpProfileService {
    async fn create_profile(
        &self,
        request: &AddProfileRequest,
    ) -> Result<ApiResult, ProfileServiceError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(REGISTER_SECRET_HEADER, self.secret.as_str())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let result = serde_json::from_slice::<ApiResult>(&body).map_err(|source| {
            ProfileServiceError::Decode {
                status: status.as_u16(),
                source,
            }
        })?;

        if !status.is_success() {
            debug!(
                status = status.as_u16(),
                is_success = result.is_success,
                "profile service answered with error status and a result body"
            );
        }
        Ok(result)
    }
}

fn add_profile_endpoint(base_url: &str) -> Result<Url, ProfileServiceError> {
    let base = base_url.trim().trim_end_matches('/');
    Url::parse(&format!("{base}{ADD_PROFILE_PATH}")).map_err(|source| {
        ProfileServiceError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            source,
        }
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
