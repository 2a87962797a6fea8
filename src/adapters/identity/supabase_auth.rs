//! Supabase auth adapter. Implements IdentityPort via the GoTrue REST API.

use crate::domain::{DomainError, User};
use crate::ports::IdentityPort;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// Resolves access tokens with `GET {project_url}/auth/v1/user`.
///
/// Requires the project URL and anon key (from the project's API settings).
pub struct SupabaseAuthAdapter {
    client: Arc<Client>,
    user_url: String,
    anon_key: String,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl SupabaseAuthAdapter {
    /// # Arguments
    /// * `project_url` - e.g. "https://xyzcompany.supabase.co"
    /// * `anon_key` - public anon key sent as the `apikey` header
    pub fn new(project_url: &str, anon_key: String) -> Self {
        Self {
            client: Arc::new(Client::new()),
            user_url: format!("{}/auth/v1/user", project_url.trim_end_matches('/')),
            anon_key,
        }
    }
}

#[async_trait::async_trait]
impl IdentityPort for SupabaseAuthAdapter {
    async fn user_for_token(&self, token: &str) -> Result<User, DomainError> {
        let res = self
            .client
            .get(&self.user_url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                DomainError::UpstreamUnavailable(format!("Auth service unreachable: {}", e))
            })?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DomainError::Unauthorized("invalid session".to_string()));
        }
        if !status.is_success() {
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            warn!(status = %status, body = %text, "auth service returned error");
            return Err(DomainError::Upstream(format!(
                "Auth API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let user: AuthUser = res
            .json()
            .await
            .map_err(|e| DomainError::Upstream(format!("Failed to parse auth response: {}", e)))?;
        Ok(User {
            id: user.id,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_url_tolerates_trailing_slash() {
        let a = SupabaseAuthAdapter::new("https://demo.supabase.co/", "anon".into());
        assert_eq!(a.user_url, "https://demo.supabase.co/auth/v1/user");
    }
}
