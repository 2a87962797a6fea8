//! Who is calling and what they may do. Token -> user, quota reservation, usage status.

use crate::domain::{DomainError, SlotAttempt, UsageGate, UsageReservation, UsageStatus, User};
use crate::ports::{IdentityPort, ProfilePort};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attempts before giving up when a slot frees between the update and the read-back.
const RESERVE_ATTEMPTS: usize = 3;

pub struct EntitlementService {
    identity: Arc<dyn IdentityPort>,
    profiles: Arc<dyn ProfilePort>,
    gate: UsageGate,
}

/// A taken generation slot.
///
/// Must end in [`commit`](Self::commit) or [`release`](Self::release). Dropped
/// unsettled (the request future was cancelled), a counted slot is handed back
/// on a spawned task.
pub struct ReservedSlot {
    reservation: UsageReservation,
    profiles: Arc<dyn ProfilePort>,
    settled: bool,
}

impl ReservedSlot {
    pub fn reservation(&self) -> &UsageReservation {
        &self.reservation
    }

    /// Keep the slot: the generation succeeded.
    pub fn commit(mut self) {
        self.settled = true;
    }

    /// Hand the slot back. Premium is a no-op.
    pub async fn release(mut self) -> Result<(), DomainError> {
        let result = match &self.reservation {
            UsageReservation::Premium => Ok(()),
            UsageReservation::Counted { user_id, .. } => {
                info!(user_id = %user_id, "releasing unused generation slot");
                self.profiles.release_usage(user_id).await
            }
        };
        self.settled = true;
        result
    }
}

impl Drop for ReservedSlot {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let UsageReservation::Counted { user_id, .. } = &self.reservation else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(user_id = %user_id, "no runtime to release abandoned generation slot");
            return;
        };
        info!(user_id = %user_id, "request dropped, releasing generation slot");
        let profiles = Arc::clone(&self.profiles);
        let user_id = user_id.clone();
        handle.spawn(async move {
            if let Err(e) = profiles.release_usage(&user_id).await {
                warn!(user_id = %user_id, error = %e, "failed to release abandoned slot");
            }
        });
    }
}

impl EntitlementService {
    pub fn new(
        identity: Arc<dyn IdentityPort>,
        profiles: Arc<dyn ProfilePort>,
        gate: UsageGate,
    ) -> Self {
        Self {
            identity,
            profiles,
            gate,
        }
    }

    /// Resolve the bearer token.
    ///
    /// A rejected token is an invalid session; an identity service outage keeps its own error.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<User, DomainError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DomainError::Unauthorized("missing session token".to_string()))?;

        self.identity
            .user_for_token(token)
            .await
            .map_err(|e| match e {
                DomainError::Unauthorized(reason) => {
                    warn!(reason = %reason, "token rejected by identity service");
                    DomainError::Unauthorized("invalid session".to_string())
                }
                other => {
                    warn!(error = %other, "identity service failed");
                    other
                }
            })
    }

    /// Take a generation slot. `QuotaExceeded` for free users at the limit.
    pub async fn reserve(&self, user: &User) -> Result<ReservedSlot, DomainError> {
        let limit = self.gate.free_limit();
        for _ in 0..RESERVE_ATTEMPTS {
            match self.profiles.try_reserve_usage(&user.id, limit).await? {
                SlotAttempt::Taken { usage_after } => {
                    info!(
                        user_id = %user.id,
                        usage_after,
                        free_limit = limit,
                        "free generation reserved"
                    );
                    return Ok(self.slot(UsageReservation::Counted {
                        user_id: user.id.clone(),
                        usage_after,
                    }));
                }
                SlotAttempt::Refused(profile) => {
                    self.gate.check(profile.is_premium, profile.ai_usage_count)?;
                    if profile.is_premium {
                        return Ok(self.slot(UsageReservation::Premium));
                    }
                    debug!(user_id = %user.id, "slot freed during reservation, retrying");
                }
            }
        }
        Err(DomainError::QuotaExceeded { limit })
    }

    fn slot(&self, reservation: UsageReservation) -> ReservedSlot {
        ReservedSlot {
            reservation,
            profiles: Arc::clone(&self.profiles),
            settled: false,
        }
    }

    pub async fn status(&self, user: &User) -> Result<UsageStatus, DomainError> {
        let profile = self.profiles.get_or_create_profile(&user.id).await?;
        Ok(self.gate.status(&profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::StaticIdentityAdapter;
    use crate::adapters::persistence::SqliteRepo;
    use std::time::Duration;

    struct DownIdentity;

    #[async_trait::async_trait]
    impl IdentityPort for DownIdentity {
        async fn user_for_token(&self, _token: &str) -> Result<User, DomainError> {
            Err(DomainError::UpstreamUnavailable("auth service unreachable".into()))
        }
    }

    async fn service(dir: &tempfile::TempDir) -> (EntitlementService, Arc<SqliteRepo>) {
        let repo = Arc::new(SqliteRepo::connect(dir.path()).await.unwrap());
        let identity = Arc::new(StaticIdentityAdapter::from_pairs([("tok-free", "free-user")]));
        let svc = EntitlementService::new(identity, repo.clone(), UsageGate::new(3));
        (svc, repo)
    }

    async fn usage_settles_at(svc: &EntitlementService, user: &User, expected: u32) {
        for _ in 0..100 {
            if svc.status(user).await.unwrap().ai_usage_count == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("usage never reached {}", expected);
    }

    #[tokio::test]
    async fn missing_and_blank_tokens_are_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, _) = service(&dir).await;
        for token in [None, Some(""), Some("   ")] {
            assert_eq!(
                svc.authenticate(token).await,
                Err(DomainError::Unauthorized("missing session token".to_string()))
            );
        }
        assert_eq!(
            svc.authenticate(Some("nope")).await,
            Err(DomainError::Unauthorized("invalid session".to_string()))
        );
    }

    #[tokio::test]
    async fn identity_outage_is_not_an_auth_failure() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(SqliteRepo::connect(dir.path()).await.unwrap());
        let svc = EntitlementService::new(Arc::new(DownIdentity), repo, UsageGate::new(3));
        assert_eq!(
            svc.authenticate(Some("any")).await,
            Err(DomainError::UpstreamUnavailable("auth service unreachable".into()))
        );
    }

    #[tokio::test]
    async fn released_slots_do_not_consume_quota() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, _) = service(&dir).await;
        let user = svc.authenticate(Some("tok-free")).await.unwrap();

        for _ in 0..5 {
            svc.reserve(&user).await.unwrap().release().await.unwrap();
        }
        let status = svc.status(&user).await.unwrap();
        assert_eq!(status.ai_usage_count, 0);
        assert_eq!(status.remaining, Some(3));
    }

    #[tokio::test]
    async fn fourth_free_generation_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, _) = service(&dir).await;
        let user = svc.authenticate(Some("tok-free")).await.unwrap();

        for expected in 1..=3 {
            let slot = svc.reserve(&user).await.unwrap();
            assert_eq!(
                slot.reservation(),
                &UsageReservation::Counted {
                    user_id: "free-user".into(),
                    usage_after: expected
                }
            );
            slot.commit();
        }
        assert!(matches!(
            svc.reserve(&user).await,
            Err(DomainError::QuotaExceeded { limit: 3 })
        ));
        assert_eq!(svc.status(&user).await.unwrap().ai_usage_count, 3);
    }

    #[tokio::test]
    async fn dropped_slot_is_handed_back() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, _) = service(&dir).await;
        let user = svc.authenticate(Some("tok-free")).await.unwrap();

        let slot = svc.reserve(&user).await.unwrap();
        assert_eq!(svc.status(&user).await.unwrap().ai_usage_count, 1);
        drop(slot);
        usage_settles_at(&svc, &user, 0).await;

        svc.reserve(&user).await.unwrap().commit();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(svc.status(&user).await.unwrap().ai_usage_count, 1);
    }

    #[tokio::test]
    async fn premium_users_are_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, repo) = service(&dir).await;
        repo.set_premium("free-user", true).await.unwrap();
        let user = svc.authenticate(Some("tok-free")).await.unwrap();

        for _ in 0..10 {
            let slot = svc.reserve(&user).await.unwrap();
            assert_eq!(slot.reservation(), &UsageReservation::Premium);
            slot.commit();
        }
        let status = svc.status(&user).await.unwrap();
        assert!(status.is_premium);
        assert_eq!(status.ai_usage_count, 0);
        assert_eq!(status.remaining, None);
    }
}
