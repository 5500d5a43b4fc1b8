//! Wire format for the session endpoint.
//!
//! The raw body is converted into a [`SessionRecord`] through an explicit
//! required-field check, so a schema drift on the backend surfaces as a
//! classified error instead of a silently-stale record.

use serde::Deserialize;
use thiserror::Error;

use super::{OnboardingStatus, ResyProfile, SessionRecord};

/// Raw session endpoint response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(default)]
    pub success: bool,
    pub onboarding_status: Option<OnboardingStatus>,
    pub has_payment_method: Option<bool>,
    #[serde(default)]
    pub resy: Option<ResyProfile>,
    pub error: Option<String>,
}

/// A well-formed HTTP response whose body does not describe a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("session endpoint reported failure: {0}")]
    Failure(String),

    #[error("session body missing required field: {0}")]
    MissingField(&'static str),
}

impl TryFrom<MeResponse> for SessionRecord {
    type Error = WireError;

    fn try_from(body: MeResponse) -> Result<Self, Self::Error> {
        if !body.success {
            let reason = body.error.unwrap_or_else(|| "unspecified".to_string());
            return Err(WireError::Failure(reason));
        }

        let onboarding_status = body
            .onboarding_status
            .ok_or(WireError::MissingField("onboardingStatus"))?;
        let has_payment_method = body
            .has_payment_method
            .ok_or(WireError::MissingField("hasPaymentMethod"))?;

        Ok(SessionRecord {
            onboarding_status,
            has_payment_method,
            resy: body.resy,
        })
    }
}
