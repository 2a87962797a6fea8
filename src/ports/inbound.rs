//! Inbound port. The HTTP adapter calls into the application through this.

use crate::domain::{
    CalendarEvent, DomainError, ScheduleProposal, SuggestionSet, UsageStatus, WeeklySummary,
};
use serde_json::Value;

/// Use cases exposed to the outside. `token` is the raw bearer token, if any;
/// `body` is the parsed JSON request body.
#[async_trait::async_trait]
pub trait ScheduleApi: Send + Sync {
    /// Ask the model to rearrange the week. Quota-gated for free users.
    async fn optimize_schedule(
        &self,
        token: Option<&str>,
        body: &Value,
    ) -> Result<ScheduleProposal, DomainError>;

    /// Ask the model for extra events. Not counted against the quota.
    async fn suggest_events(
        &self,
        token: Option<&str>,
        body: &Value,
    ) -> Result<SuggestionSet, DomainError>;

    /// Plain-text coaching summary of the week.
    async fn weekly_summary(
        &self,
        token: Option<&str>,
        body: &Value,
    ) -> Result<WeeklySummary, DomainError>;

    async fn saved_events(&self, token: Option<&str>) -> Result<Vec<CalendarEvent>, DomainError>;

    /// Replace the saved week. Every event must be well-formed.
    async fn save_events(
        &self,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Vec<CalendarEvent>, DomainError>;

    async fn usage(&self, token: Option<&str>) -> Result<UsageStatus, DomainError>;
}
