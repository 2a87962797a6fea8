//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{CalendarEvent, DomainError, Profile, SlotAttempt, User};

/// One text-completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Optional system message sent before the prompt.
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    /// Ask the provider for a JSON object reply when it supports it.
    pub json_mode: bool,
}

/// Language-model collaborator. Treated as a black box returning raw text.
#[async_trait::async_trait]
pub trait AiPort: Send + Sync {
    /// Send one prompt and return the model's raw reply text (may be empty).
    async fn complete(&self, request: CompletionRequest) -> Result<String, DomainError>;
}

/// Identity collaborator. Resolves bearer tokens to users.
#[async_trait::async_trait]
pub trait IdentityPort: Send + Sync {
    /// Returns `Unauthorized` when the token is not accepted.
    async fn user_for_token(&self, token: &str) -> Result<User, DomainError>;
}

/// Entitlement storage: premium flag and AI usage counter per user.
#[async_trait::async_trait]
pub trait ProfilePort: Send + Sync {
    /// Load the profile, creating a free one with zero usage on first sight.
    async fn get_or_create_profile(&self, user_id: &str) -> Result<Profile, DomainError>;

    /// Take one generation slot if the user is free and below `free_limit`,
    /// in a single atomic step. Otherwise returns the stored profile unchanged.
    async fn try_reserve_usage(
        &self,
        user_id: &str,
        free_limit: u32,
    ) -> Result<SlotAttempt, DomainError>;

    /// Give back a slot taken by `try_reserve_usage`. Never drops below zero.
    async fn release_usage(&self, user_id: &str) -> Result<(), DomainError>;

    async fn set_premium(&self, user_id: &str, is_premium: bool) -> Result<(), DomainError>;
}

/// Saved week per user.
#[async_trait::async_trait]
pub trait EventStorePort: Send + Sync {
    /// Events in the order they were saved. Empty if the user never saved.
    async fn load_events(&self, user_id: &str) -> Result<Vec<CalendarEvent>, DomainError>;

    /// Replace the user's whole week.
    async fn replace_events(
        &self,
        user_id: &str,
        events: &[CalendarEvent],
    ) -> Result<(), DomainError>;
}
