use super::{AuthSnapshot, SessionError};
use crate::session::OnboardingStatus;

/// Whether any auth-related work is in flight.
pub fn combined_loading(snapshot: &AuthSnapshot) -> bool {
    snapshot.loading || snapshot.signing_in || snapshot.signing_out
}

/// Whether the authenticated user has completed onboarding.
pub fn is_onboarded(snapshot: &AuthSnapshot) -> bool {
    snapshot
        .session
        .as_ref()
        .map(|record| record.onboarding_status == OnboardingStatus::Completed)
        .unwrap_or(false)
}

/// Classify a non-success session endpoint HTTP status.
///
/// 401 is the only status that means the presented credential is dead;
/// every other failure is recoverable and must not force a sign-out.
pub fn classify_session_status(status: u16) -> SessionError {
    if status == 401 {
        SessionError::Unauthorized
    } else {
        SessionError::Transient(format!("session endpoint returned {status}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRecord;

    fn session_with(status: OnboardingStatus) -> SessionRecord {
        SessionRecord {
            onboarding_status: status,
            has_payment_method: false,
            resy: None,
        }
    }

    // ==================== combined_loading tests ====================

    #[test]
    fn combined_loading_false_when_settled() {
        let snapshot = AuthSnapshot::signed_out();
        assert!(!combined_loading(&snapshot));
    }

    #[test]
    fn combined_loading_true_while_controller_loading() {
        let snapshot = AuthSnapshot::initial();
        assert!(combined_loading(&snapshot));
    }

    #[test]
    fn combined_loading_true_while_signing_in() {
        let mut snapshot = AuthSnapshot::signed_out();
        snapshot.signing_in = true;
        assert!(combined_loading(&snapshot));
    }

    #[test]
    fn combined_loading_true_while_signing_out() {
        let mut snapshot = AuthSnapshot::signed_out();
        snapshot.signing_out = true;
        assert!(combined_loading(&snapshot));
    }

    // ==================== is_onboarded tests ====================

    #[test]
    fn is_onboarded_false_without_session() {
        assert!(!is_onboarded(&AuthSnapshot::signed_out()));
    }

    #[test]
    fn is_onboarded_false_when_not_started() {
        let mut snapshot = AuthSnapshot::signed_out();
        snapshot.session = Some(session_with(OnboardingStatus::NotStarted));
        assert!(!is_onboarded(&snapshot));
    }

    #[test]
    fn is_onboarded_true_when_completed() {
        let mut snapshot = AuthSnapshot::signed_out();
        snapshot.session = Some(session_with(OnboardingStatus::Completed));
        assert!(is_onboarded(&snapshot));
    }

    // ==================== classify_session_status tests ====================

    #[test]
    fn classify_401_as_unauthorized() {
        assert_eq!(classify_session_status(401), SessionError::Unauthorized);
    }

    #[test]
    fn classify_other_failures_as_transient() {
        for status in [400, 403, 404, 429, 500, 502, 503] {
            match classify_session_status(status) {
                SessionError::Transient(reason) => {
                    assert!(reason.contains(&status.to_string()));
                }
                SessionError::Unauthorized => {
                    panic!("status {status} must not be classified as unauthorized")
                }
            }
        }
    }
}
