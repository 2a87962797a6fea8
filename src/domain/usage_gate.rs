//! Free-tier gate for AI schedule generation.
//!
//! The decision here is pure. `ProfilePort::try_reserve_usage` takes a slot with a single
//! conditional update and, when it cannot, hands back the stored profile for `check` to judge.

use crate::domain::{DomainError, Profile, UsageStatus};

/// Generations a non-premium user gets.
pub const DEFAULT_FREE_LIMIT: u32 = 3;

/// Outcome of taking a generation slot before calling the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageReservation {
    /// Premium users are not counted.
    Premium,
    /// Slot taken; `usage_after` is the stored count including this request.
    Counted { user_id: String, usage_after: u32 },
}

impl UsageReservation {
    pub fn is_counted(&self) -> bool {
        matches!(self, UsageReservation::Counted { .. })
    }
}

/// What the store did with a reservation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotAttempt {
    /// Counter incremented; `usage_after` includes this request.
    Taken { usage_after: u32 },
    /// Nothing changed. The profile as read right after the attempt.
    Refused(Profile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageGate {
    free_limit: u32,
}

impl Default for UsageGate {
    fn default() -> Self {
        Self::new(DEFAULT_FREE_LIMIT)
    }
}

impl UsageGate {
    pub fn new(free_limit: u32) -> Self {
        Self { free_limit }
    }

    pub fn free_limit(&self) -> u32 {
        self.free_limit
    }

    /// `QuotaExceeded` when a free user has used up the limit.
    pub fn check(&self, is_premium: bool, usage_count: u32) -> Result<(), DomainError> {
        if !is_premium && usage_count >= self.free_limit {
            return Err(DomainError::QuotaExceeded {
                limit: self.free_limit,
            });
        }
        Ok(())
    }

    pub fn status(&self, profile: &Profile) -> UsageStatus {
        UsageStatus {
            is_premium: profile.is_premium,
            ai_usage_count: profile.ai_usage_count,
            free_limit: self.free_limit,
            remaining: (!profile.is_premium)
                .then(|| self.free_limit.saturating_sub(profile.ai_usage_count)),
        }
    }
}
