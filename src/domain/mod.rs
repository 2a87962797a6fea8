//! Core domain layer. No external I/O dependencies.
//!
//! Entities, the model-output validator and the usage gate live here.

pub mod entities;
pub mod errors;
pub mod proposal;
pub mod usage_gate;

pub use entities::{
    CalendarEvent, EventType, Profile, ScheduleProposal, Suggestion, SuggestionSet, UsageStatus,
    User, Weekday, WeeklySummary,
};
pub use errors::DomainError;
pub use proposal::{
    DEFAULT_EXPLANATION, EventRejection, ProposalOutcome, SuggestionOutcome, filter_events,
    parse_proposal, parse_suggestions, validate_event, validate_events_strict,
};
pub use usage_gate::{DEFAULT_FREE_LIMIT, SlotAttempt, UsageGate, UsageReservation};
