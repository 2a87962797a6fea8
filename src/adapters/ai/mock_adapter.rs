//! Mock AI adapter for development and tests without API calls.
//!
//! Replies are scripted: queued responses are returned in order, then a canned
//! fallback. Every request received is recorded.

use crate::domain::DomainError;
use crate::ports::{AiPort, CompletionRequest};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

const FALLBACK_SCHEDULE: &str = r#"{"events":[{"title":"[MOCK] Review lecture notes","type":"Study","day":"Monday","start_hour":18,"duration":1}],"explanation":"[MOCK] Configure a real AI API key to get a personalised schedule."}"#;

/// Scripted AI adapter.
///
/// Simulates network latency with configurable delay.
pub struct MockAiAdapter {
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
    responses: Mutex<VecDeque<Result<String, DomainError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockAiAdapter {
    /// Create a new mock adapter with default delay (100ms).
    pub fn new() -> Self {
        Self::with_delay(100)
    }

    /// Create a mock adapter with custom delay.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a raw reply.
    pub fn push_response(&self, raw: impl Into<String>) {
        self.lock_responses().push_back(Ok(raw.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, err: DomainError) {
        self.lock_responses().push_back(Err(err));
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// User prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, DomainError>>> {
        self.responses.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for MockAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AiPort for MockAiAdapter {
    async fn complete(&self, request: CompletionRequest) -> Result<String, DomainError> {
        info!(
            prompt_len = request.prompt.len(),
            "[MOCK] Simulating AI completion"
        );
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request);

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        let scripted = self.lock_responses().pop_front();
        scripted.unwrap_or_else(|| Ok(FALLBACK_SCHEDULE.to_string()))
    }
}
