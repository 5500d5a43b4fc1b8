//! Single-shot sign-out guard.

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use tablesync_core::auth::Clock;

/// Wall-clock time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Collapses bursts of unauthorized outcomes into one forced sign-out.
///
/// The first arm within the cooldown window wins; the guard disarms once
/// the cooldown has elapsed after the triggering arm, independent of any
/// provider events in between. Owned by the controller instance so it
/// survives consumer re-subscriptions.
#[derive(Debug)]
pub struct SignOutGuard {
    cooldown: TimeDelta,
    armed_at: Mutex<Option<DateTime<Utc>>>,
}

impl SignOutGuard {
    pub fn new(cooldown: std::time::Duration) -> Self {
        Self {
            cooldown: TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::MAX),
            armed_at: Mutex::new(None),
        }
    }

    /// Arm the guard at `now`. Returns `true` if this caller owns the
    /// sign-out; `false` while a prior arm is still within its cooldown.
    pub async fn try_arm(&self, now: DateTime<Utc>) -> bool {
        let mut armed_at = self.armed_at.lock().await;
        match *armed_at {
            Some(at) if now.signed_duration_since(at) < self.cooldown => false,
            _ => {
                *armed_at = Some(now);
                true
            }
        }
    }
}
