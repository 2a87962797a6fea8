//! Planner service. Orchestrates the AI-assisted week planning flow.
//!
//! Coordinates entitlement (identity + quota), the language model, the output
//! validator and the saved-week store. Implements the inbound `ScheduleApi`.

use crate::domain::{
    CalendarEvent, DomainError, ScheduleProposal, SuggestionSet, UsageStatus, WeeklySummary,
    filter_events, parse_proposal, parse_suggestions, validate_events_strict,
};
use crate::ports::{AiPort, CompletionRequest, EventStorePort, ScheduleApi};
use crate::usecases::EntitlementService;
use crate::usecases::prompts;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Service behind every HTTP route.
///
/// `ai` is `None` when no model is configured; AI routes then answer
/// `UpstreamUnavailable`.
pub struct PlannerService {
    entitlements: Arc<EntitlementService>,
    ai: Option<Arc<dyn AiPort>>,
    store: Arc<dyn EventStorePort>,
}

impl PlannerService {
    pub fn new(
        entitlements: Arc<EntitlementService>,
        ai: Option<Arc<dyn AiPort>>,
        store: Arc<dyn EventStorePort>,
    ) -> Self {
        Self {
            entitlements,
            ai,
            store,
        }
    }

    fn ai(&self) -> Result<&Arc<dyn AiPort>, DomainError> {
        self.ai.as_ref().ok_or_else(|| {
            DomainError::UpstreamUnavailable(
                "AI is temporarily unavailable (missing OpenAI API key).".to_string(),
            )
        })
    }

    /// `body.events` must be an array; elements are passed through as-is.
    fn input_events(body: &Value) -> Result<&[Value], DomainError> {
        body.get("events")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| DomainError::InvalidInput("Invalid events input".to_string()))
    }

    /// Call the model and insist on a non-blank reply.
    async fn complete(&self, request: CompletionRequest) -> Result<String, DomainError> {
        let raw = self.ai()?.complete(request).await?;
        if raw.trim().is_empty() {
            return Err(DomainError::MalformedResponse("Empty AI response".to_string()));
        }
        debug!(raw_len = raw.len(), "received AI response");
        Ok(raw)
    }

    async fn generate_schedule(&self, body: &Value) -> Result<ScheduleProposal, DomainError> {
        self.ai()?;
        let events = Self::input_events(body)?;

        let raw = self
            .complete(CompletionRequest {
                system: Some(prompts::SCHEDULE_SYSTEM.to_string()),
                prompt: prompts::schedule_prompt(events),
                temperature: prompts::SCHEDULE_TEMPERATURE,
                json_mode: true,
            })
            .await?;

        let outcome = parse_proposal(&raw).inspect_err(|_| {
            warn!(
                raw = %raw.chars().take(200).collect::<String>(),
                "AI JSON parse error"
            );
        })?;
        if outcome.rejected > 0 {
            warn!(
                rejected = outcome.rejected,
                kept = outcome.proposal.events.len(),
                "dropped malformed events from AI proposal"
            );
        }
        Ok(outcome.proposal)
    }
}

#[async_trait::async_trait]
impl ScheduleApi for PlannerService {
    async fn optimize_schedule(
        &self,
        token: Option<&str>,
        body: &Value,
    ) -> Result<ScheduleProposal, DomainError> {
        let user = self.entitlements.authenticate(token).await?;
        // Dropping the slot (cancelled request) hands it back.
        let slot = self.entitlements.reserve(&user).await?;
        let counted = slot.reservation().is_counted();

        let proposal = match self.generate_schedule(body).await {
            Ok(proposal) => {
                slot.commit();
                proposal
            }
            Err(e) => {
                if let Err(release_err) = slot.release().await {
                    // Keep the caller's outcome; a stuck slot only costs the user one free use.
                    warn!(user_id = %user.id, error = %release_err, "failed to release usage slot");
                }
                return Err(e);
            }
        };

        info!(
            user_id = %user.id,
            events = proposal.events.len(),
            counted,
            "AI schedule generated"
        );
        Ok(proposal)
    }

    async fn suggest_events(
        &self,
        token: Option<&str>,
        body: &Value,
    ) -> Result<SuggestionSet, DomainError> {
        let user = self.entitlements.authenticate(token).await?;
        self.ai()?;
        let events = Self::input_events(body)?;

        let raw = self
            .complete(CompletionRequest {
                system: Some(prompts::SUGGEST_SYSTEM.to_string()),
                prompt: prompts::suggest_prompt(events),
                temperature: prompts::SUGGEST_TEMPERATURE,
                json_mode: true,
            })
            .await?;
        let outcome = parse_suggestions(&raw)?;
        if outcome.rejected > 0 {
            warn!(rejected = outcome.rejected, "dropped malformed AI suggestions");
        }

        info!(user_id = %user.id, suggestions = outcome.suggestions.len(), "AI suggestions generated");
        Ok(SuggestionSet {
            suggestions: outcome.suggestions,
        })
    }

    async fn weekly_summary(
        &self,
        token: Option<&str>,
        body: &Value,
    ) -> Result<WeeklySummary, DomainError> {
        let user = self.entitlements.authenticate(token).await?;
        self.ai()?;
        let (events, skipped) = filter_events(Self::input_events(body)?);
        if skipped > 0 {
            debug!(skipped, "skipped malformed events in summary input");
        }

        let raw = self
            .complete(CompletionRequest {
                system: Some(prompts::SUMMARY_SYSTEM.to_string()),
                prompt: prompts::weekly_summary_prompt(&events),
                temperature: prompts::SUMMARY_TEMPERATURE,
                json_mode: false,
            })
            .await?;

        info!(user_id = %user.id, events = events.len(), "weekly summary generated");
        Ok(WeeklySummary {
            summary: raw.trim().to_string(),
        })
    }

    async fn saved_events(&self, token: Option<&str>) -> Result<Vec<CalendarEvent>, DomainError> {
        let user = self.entitlements.authenticate(token).await?;
        self.store.load_events(&user.id).await
    }

    async fn save_events(
        &self,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Vec<CalendarEvent>, DomainError> {
        let user = self.entitlements.authenticate(token).await?;
        let events = body
            .get("events")
            .ok_or_else(|| DomainError::InvalidInput("Invalid events input".to_string()))
            .and_then(validate_events_strict)?;

        self.store.replace_events(&user.id, &events).await?;
        info!(user_id = %user.id, events = events.len(), "saved week replaced");
        Ok(events)
    }

    async fn usage(&self, token: Option<&str>) -> Result<UsageStatus, DomainError> {
        let user = self.entitlements.authenticate(token).await?;
        self.entitlements.status(&user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiAdapter;
    use crate::adapters::identity::StaticIdentityAdapter;
    use crate::adapters::persistence::SqliteRepo;
    use crate::domain::{DEFAULT_EXPLANATION, SlotAttempt, UsageGate};
    use crate::ports::ProfilePort;
    use serde_json::json;
    use std::time::Duration;

    const CALC_HW_RESPONSE: &str = r#"{"events":[{"title":"Calc HW","type":"Assignment","day":"Monday","start_hour":10,"duration":2},{"title":"Study","type":"Study","day":"Monday","start_hour":8,"duration":1}],"explanation":"ok"}"#;

    struct Fixture {
        _dir: tempfile::TempDir,
        repo: Arc<SqliteRepo>,
        ai: Arc<MockAiAdapter>,
        service: PlannerService,
    }

    async fn fixture(with_ai: bool) -> Fixture {
        build_fixture(with_ai, MockAiAdapter::with_delay(0)).await
    }

    async fn build_fixture(with_ai: bool, mock: MockAiAdapter) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(SqliteRepo::connect(dir.path()).await.unwrap());
        let identity = Arc::new(StaticIdentityAdapter::from_pairs([
            ("tok-free", "free-user"),
            ("tok-premium", "premium-user"),
        ]));
        repo.set_premium("premium-user", true).await.unwrap();
        let entitlements = Arc::new(EntitlementService::new(
            identity,
            repo.clone(),
            UsageGate::new(3),
        ));
        let ai = Arc::new(mock);
        let port: Option<Arc<dyn AiPort>> = with_ai.then(|| ai.clone() as Arc<dyn AiPort>);
        let service = PlannerService::new(entitlements, port, repo.clone());
        Fixture {
            _dir: dir,
            repo,
            ai,
            service,
        }
    }

    fn calc_hw_body() -> Value {
        json!({"events": [{"title": "Calc HW", "type": "Assignment", "day": "Monday", "start_hour": 10, "duration": 2}]})
    }

    #[tokio::test]
    async fn end_to_end_keeps_both_events_and_explanation() {
        let f = fixture(true).await;
        f.ai.push_response(CALC_HW_RESPONSE);

        let proposal = f
            .service
            .optimize_schedule(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap();

        assert_eq!(proposal.explanation, "ok");
        assert_eq!(
            serde_json::to_value(&proposal.events).unwrap(),
            json!([
                {"title": "Calc HW", "type": "Assignment", "day": "Monday", "start_hour": 10, "duration": 2},
                {"title": "Study", "type": "Study", "day": "Monday", "start_hour": 8, "duration": 1}
            ])
        );
        let request = &f.ai.requests()[0];
        assert!(request.prompt.contains("\"title\": \"Calc HW\""));
        assert_eq!(request.system.as_deref(), Some(prompts::SCHEDULE_SYSTEM));
        assert!(request.json_mode);
        assert_eq!(f.service.usage(Some("tok-free")).await.unwrap().ai_usage_count, 1);
    }

    #[tokio::test]
    async fn invalid_json_is_malformed_and_not_counted() {
        let f = fixture(true).await;
        f.ai.push_response("Sure! Here is your schedule.");

        let err = f
            .service
            .optimize_schedule(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::MalformedResponse("AI returned invalid JSON".into()));
        assert_eq!(f.service.usage(Some("tok-free")).await.unwrap().ai_usage_count, 0);
    }

    #[tokio::test]
    async fn empty_reply_is_malformed() {
        let f = fixture(true).await;
        f.ai.push_response("   ");
        let err = f
            .service
            .optimize_schedule(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::MalformedResponse("Empty AI response".into()));
    }

    #[tokio::test]
    async fn quota_is_checked_before_input_and_ai() {
        let f = fixture(false).await;
        for n in 1..=3 {
            assert_eq!(
                f.repo.try_reserve_usage("free-user", 3).await.unwrap(),
                SlotAttempt::Taken { usage_after: n }
            );
        }
        let err = f
            .service
            .optimize_schedule(Some("tok-free"), &json!({"events": "nope"}))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::QuotaExceeded { limit: 3 });
    }

    #[tokio::test]
    async fn missing_model_is_unavailable_and_releases_slot() {
        let f = fixture(false).await;
        let err = f
            .service
            .optimize_schedule(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UpstreamUnavailable(_)));
        assert_eq!(f.service.usage(Some("tok-free")).await.unwrap().ai_usage_count, 0);
    }

    #[tokio::test]
    async fn non_array_events_is_invalid_input() {
        let f = fixture(true).await;
        for body in [json!({"events": {"a": 1}}), json!({}), json!([1, 2])] {
            let err = f
                .service
                .optimize_schedule(Some("tok-premium"), &body)
                .await
                .unwrap_err();
            assert_eq!(err, DomainError::InvalidInput("Invalid events input".into()));
        }
        assert!(f.ai.prompts().is_empty());
    }

    #[tokio::test]
    async fn fallback_explanation_when_model_omits_it() {
        let f = fixture(true).await;
        f.ai.push_response(r#"{"events": []}"#);
        let proposal = f
            .service
            .optimize_schedule(Some("tok-premium"), &calc_hw_body())
            .await
            .unwrap();
        assert!(proposal.events.is_empty());
        assert_eq!(proposal.explanation, DEFAULT_EXPLANATION);
    }

    #[tokio::test]
    async fn suggestions_are_filtered() {
        let f = fixture(true).await;
        f.ai.push_response(
            r#"{"suggestions":[{"title":"Review","type":"Study","day":"Sunday","start_hour":17,"duration":1,"description":"Prep for Monday"},{"title":"Nap","type":"Rest","day":"Sunday","start_hour":13,"duration":1,"description":"zz"}]}"#,
        );
        let set = f
            .service
            .suggest_events(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap();
        assert_eq!(set.suggestions.len(), 1);
        assert_eq!(set.suggestions[0].event.title, "Review");
        // Suggestions are not quota-gated.
        assert_eq!(f.service.usage(Some("tok-free")).await.unwrap().ai_usage_count, 0);
    }

    #[tokio::test]
    async fn weekly_summary_lists_events_in_prompt() {
        let f = fixture(true).await;
        f.ai.push_response("  Busy Monday. Start early.\n");
        let summary = f
            .service
            .weekly_summary(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap();
        assert_eq!(summary.summary, "Busy Monday. Start early.");
        assert!(f.ai.prompts()[0].contains("Monday at 10:00 for 2h - Calc HW (Assignment)"));
    }

    #[tokio::test]
    async fn saved_week_round_trips_per_user() {
        let f = fixture(true).await;
        let saved = f
            .service
            .save_events(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(f.service.saved_events(Some("tok-free")).await.unwrap(), saved);
        assert!(f.service.saved_events(Some("tok-premium")).await.unwrap().is_empty());

        let bad = json!({"events": [{"title": "x", "type": "Exam", "day": "Monday", "start_hour": 9, "duration": 1}]});
        assert!(matches!(
            f.service.save_events(Some("tok-free"), &bad).await,
            Err(DomainError::InvalidInput(_))
        ));
        assert_eq!(f.service.saved_events(Some("tok-free")).await.unwrap(), saved);
    }

    async fn usage_of(f: &Fixture) -> u32 {
        f.service.usage(Some("tok-free")).await.unwrap().ai_usage_count
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_generations_are_not_counted() {
        let f = build_fixture(true, MockAiAdapter::with_delay(500)).await;

        for _ in 0..3 {
            let body = calc_hw_body();
            let call = f.service.optimize_schedule(Some("tok-free"), &body);
            assert!(tokio::time::timeout(Duration::from_millis(50), call).await.is_err());
        }

        let mut usage = usage_of(&f).await;
        for _ in 0..100 {
            if usage == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            usage = usage_of(&f).await;
        }
        assert_eq!(usage, 0);

        f.ai.push_response(CALC_HW_RESPONSE);
        let proposal = f
            .service
            .optimize_schedule(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap();
        assert_eq!(proposal.events.len(), 2);
        assert_eq!(usage_of(&f).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_requests_never_exceed_the_limit() {
        let f = Arc::new(fixture(true).await);

        let mut handles = Vec::new();
        for _ in 0..6 {
            let f = Arc::clone(&f);
            handles.push(tokio::spawn(async move {
                f.service
                    .optimize_schedule(Some("tok-free"), &calc_hw_body())
                    .await
                    .map(|p| p.events.len())
            }));
        }
        let mut ok = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(DomainError::QuotaExceeded { limit: 3 }) => {}
                Err(other) => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(ok, 3);
        assert_eq!(usage_of(&f).await, 3);
    }

    #[tokio::test]
    async fn each_route_sends_its_system_message() {
        let f = fixture(true).await;
        f.ai.push_response(r#"{"suggestions": []}"#);
        f.ai.push_response("Fine week.");
        f.service
            .suggest_events(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap();
        f.service
            .weekly_summary(Some("tok-free"), &calc_hw_body())
            .await
            .unwrap();

        let requests = f.ai.requests();
        assert_eq!(requests[0].system.as_deref(), Some(prompts::SUGGEST_SYSTEM));
        assert_eq!(requests[1].system.as_deref(), Some(prompts::SUMMARY_SYSTEM));
        assert!(!requests[1].json_mode);
    }
}
