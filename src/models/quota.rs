// src/models/quota.rs
// DOCUMENTATION: Daily spin quota
// PURPOSE: Lazy-reset quota state and the response DTO reporting it

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Spins a non-privileged actor may use per local calendar day
pub const DAILY_SPIN_LIMIT: u32 = 10;

/// Persisted quota for one user
/// DOCUMENTATION: When `last_spin_date` is not today the stored count is
/// stale and the effective count is 0. The row is only rewritten by a spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuotaState {
    pub spins_used_today: u32,
    pub last_spin_date: Option<NaiveDate>,
}

impl QuotaState {
    pub fn effective_spins(&self, today: NaiveDate) -> u32 {
        if self.last_spin_date == Some(today) {
            self.spins_used_today
        } else {
            0
        }
    }

    /// State to persist after one more spin today
    pub fn after_spin(&self, today: NaiveDate) -> QuotaState {
        QuotaState {
            spins_used_today: self.effective_spins(today).saturating_add(1),
            last_spin_date: Some(today),
        }
    }
}

/// Response DTO for GET /quota and spin results
#[derive(Debug, Clone, Serialize)]
pub struct QuotaResponse {
    pub spins_used_today: u32,
    pub last_spin_date: Option<NaiveDate>,
    /// None for privileged actors
    pub daily_limit: Option<u32>,
    /// None for privileged actors
    pub remaining: Option<u32>,
}

impl QuotaResponse {
    pub fn new(state: &QuotaState, today: NaiveDate, limit: Option<u32>) -> Self {
        let used = state.effective_spins(today);
        Self {
            spins_used_today: used,
            last_spin_date: state.last_spin_date,
            daily_limit: limit,
            remaining: limit.map(|l| l.saturating_sub(used)),
        }
    }
}
