use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{utc_midnight_timestamp, Gender, ValidatedProfile};

pub const ADD_PROFILE_PATH: &str = "/PreApplicationUser/Add";
pub const REGISTER_SECRET_HEADER: &str = "X-Register-Secret";

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to create profile. Please try again.";

/// Body of `POST {base}/PreApplicationUser/Add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProfileRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub dob: String,
    pub gender: Gender,
    pub card_number: String,
}

impl From<&ValidatedProfile> for AddProfileRequest {
    fn from(profile: &ValidatedProfile) -> Self {
        Self {
            name: profile.name().to_string(),
            phone: profile.phone().to_string(),
            email: profile.email().to_string(),
            dob: utc_midnight_timestamp(profile.date_of_birth()),
            gender: profile.gender(),
            card_number: profile.card_number().to_string(),
        }
    }
}

/// Response envelope returned by the Profile Service, for success and failure alike.
///
/// `isSuccess` is mandatory; a body without it is not an `ApiResult`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult {
    pub is_success: bool,
    #[serde(default)]
    pub time_generated: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl ApiResult {
    /// Stand-in result for a request that never produced a usable response.
    pub fn network_failure() -> Self {
        Self {
            is_success: false,
            time_generated: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            error_message: Some(NETWORK_ERROR_MESSAGE.to_string()),
            result: None,
        }
    }

    /// Message to show for an unsuccessful result; blank server messages fall back.
    pub fn failure_message(&self) -> &str {
        self.error_message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
    }
}
