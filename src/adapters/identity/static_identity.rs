//! Fixed token table for local development and tests.

use crate::domain::{DomainError, User};
use crate::ports::IdentityPort;
use std::collections::HashMap;

/// Maps bearer tokens to user ids. Unknown tokens are unauthorized.
#[derive(Debug, Default)]
pub struct StaticIdentityAdapter {
    users: HashMap<String, String>,
}

impl StaticIdentityAdapter {
    pub fn from_pairs<I, T, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            users: pairs
                .into_iter()
                .map(|(t, u)| (t.into(), u.into()))
                .collect(),
        }
    }

    /// Parse `token=user_id` pairs separated by commas. Malformed entries are skipped.
    pub fn parse(spec: &str) -> Self {
        Self::from_pairs(spec.split(',').filter_map(|pair| {
            let (token, user) = pair.split_once('=')?;
            let (token, user) = (token.trim(), user.trim());
            (!token.is_empty() && !user.is_empty()).then(|| (token.to_string(), user.to_string()))
        }))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait::async_trait]
impl IdentityPort for StaticIdentityAdapter {
    async fn user_for_token(&self, token: &str) -> Result<User, DomainError> {
        self.users
            .get(token)
            .map(|id| User {
                id: id.clone(),
                email: None,
            })
            .ok_or_else(|| DomainError::Unauthorized("invalid session".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_pairs_and_skips_garbage() {
        let ids = StaticIdentityAdapter::parse(" dev-token = alice ,broken,=bob, t2=carol");
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.user_for_token("dev-token").await.unwrap().id, "alice");
        assert_eq!(ids.user_for_token("t2").await.unwrap().id, "carol");
        assert!(ids.user_for_token("broken").await.is_err());
    }
}
