use serde::{Deserialize, Serialize};

/// Where the user is in the reservation-assistant onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    NotStarted,
    Completed,
}

impl std::fmt::Display for OnboardingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Profile of the linked reservation-platform account, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResyProfile {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub payment_method_id: Option<String>,
}

/// Backend-owned session record returned by the session endpoint.
///
/// Read-mostly on the client; refreshed on demand and destroyed together
/// with the identity on sign-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub onboarding_status: OnboardingStatus,
    pub has_payment_method: bool,
    pub resy: Option<ResyProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onboarding_status_uses_snake_case_wire_values() {
        assert_eq!(
            serde_json::to_string(&OnboardingStatus::NotStarted).unwrap(),
            "\"not_started\""
        );
        assert_eq!(
            serde_json::to_string(&OnboardingStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn session_record_round_trips() {
        let record = SessionRecord {
            onboarding_status: OnboardingStatus::Completed,
            has_payment_method: true,
            resy: Some(ResyProfile {
                email: "a@b.com".to_string(),
                first_name: Some("Ada".to_string()),
                last_name: None,
                payment_method_id: Some("pm_1".to_string()),
            }),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"onboardingStatus\":\"completed\""));
        assert!(json.contains("\"hasPaymentMethod\":true"));

        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
