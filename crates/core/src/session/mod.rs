mod types;
mod wire;

pub use types::{OnboardingStatus, ResyProfile, SessionRecord};
pub use wire::{MeResponse, WireError};
