// src/models/profile.rs
// DOCUMENTATION: Profile row as seen by the engine

use serde::Serialize;

use super::{Preference, QuotaState, Role};

/// Everything the engine reads from a user's profile row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub preference: Preference,
    pub role: Role,
    pub quota: QuotaState,
}
