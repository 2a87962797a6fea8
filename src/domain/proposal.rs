//! Validation of model-proposed calendar events.
//!
//! The model's reply is untrusted text. It is parsed once, then every candidate
//! element goes through [`validate_event`]; elements failing any single check are
//! dropped without surfacing an error. Order is preserved, nothing is deduplicated.

use crate::domain::{CalendarEvent, DomainError, EventType, ScheduleProposal, Suggestion, Weekday};
use serde_json::{Map, Value};
use std::fmt;

/// Used when the model omits `explanation` or leaves it empty.
pub const DEFAULT_EXPLANATION: &str =
    "This schedule balances your workload and adds study time ahead of deadlines to reduce stress.";

/// Why a single candidate element was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRejection {
    NotAnObject,
    Title,
    Type,
    Day,
    StartHour,
    Duration,
    Description,
}

impl fmt::Display for EventRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventRejection::NotAnObject => "not an object",
            EventRejection::Title => "title must be a string",
            EventRejection::Type => "type must be Lecture, Assignment or Study",
            EventRejection::Day => "day must be a weekday name",
            EventRejection::StartHour => "start_hour must be an integer in 0..=23",
            EventRejection::Duration => "duration must be a positive number",
            EventRejection::Description => "description must be a string",
        };
        f.write_str(s)
    }
}

/// Cleaned proposal plus how many model events were thrown away.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalOutcome {
    pub proposal: ScheduleProposal,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionOutcome {
    pub suggestions: Vec<Suggestion>,
    pub rejected: usize,
}

/// Check one candidate against the CalendarEvent shape. No field is coerced.
pub fn validate_event(candidate: &Value) -> Result<CalendarEvent, EventRejection> {
    let obj = candidate.as_object().ok_or(EventRejection::NotAnObject)?;
    event_from_object(obj)
}

fn event_from_object(obj: &Map<String, Value>) -> Result<CalendarEvent, EventRejection> {
    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .ok_or(EventRejection::Title)?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(EventType::parse)
        .ok_or(EventRejection::Type)?;
    let day = obj
        .get("day")
        .and_then(Value::as_str)
        .and_then(Weekday::parse)
        .ok_or(EventRejection::Day)?;
    let start_hour = obj
        .get("start_hour")
        .and_then(whole_hour)
        .ok_or(EventRejection::StartHour)?;
    let duration = obj
        .get("duration")
        .and_then(Value::as_f64)
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or(EventRejection::Duration)?;

    Ok(CalendarEvent {
        title: title.to_string(),
        kind,
        day,
        start_hour,
        duration,
    })
}

/// Integral JSON number in 0..=23. `10.0` counts as integral, `10.5` does not.
fn whole_hour(v: &Value) -> Option<u8> {
    if let Some(n) = v.as_u64() {
        return (n <= 23).then_some(n as u8);
    }
    if v.is_i64() {
        return None;
    }
    let f = v.as_f64()?;
    (f.fract() == 0.0 && (0.0..=23.0).contains(&f)).then_some(f as u8)
}

/// Keep the candidates that pass, in order. Returns the survivors and the drop count.
pub fn filter_events(candidates: &[Value]) -> (Vec<CalendarEvent>, usize) {
    let mut kept = Vec::with_capacity(candidates.len());
    let mut rejected = 0;
    for candidate in candidates {
        match validate_event(candidate) {
            Ok(event) => kept.push(event),
            Err(_) => rejected += 1,
        }
    }
    (kept, rejected)
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, DomainError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|_| DomainError::MalformedResponse("AI returned invalid JSON".to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(DomainError::MalformedResponse(
            "AI returned JSON without a usable shape".to_string(),
        )),
    }
}

/// Parse the model's raw reply into a cleaned [`ScheduleProposal`].
///
/// Non-JSON or non-object replies are `MalformedResponse`. A missing `events`
/// array is an empty proposal; a missing or empty `explanation` gets
/// [`DEFAULT_EXPLANATION`].
pub fn parse_proposal(raw: &str) -> Result<ProposalOutcome, DomainError> {
    let obj = parse_object(raw)?;

    let (events, rejected) = match obj.get("events") {
        Some(Value::Array(items)) => filter_events(items),
        _ => (Vec::new(), 0),
    };

    let explanation = obj
        .get("explanation")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_EXPLANATION)
        .to_string();

    Ok(ProposalOutcome {
        proposal: ScheduleProposal {
            events,
            explanation,
        },
        rejected,
    })
}

fn validate_suggestion(candidate: &Value) -> Result<Suggestion, EventRejection> {
    let obj = candidate.as_object().ok_or(EventRejection::NotAnObject)?;
    let event = event_from_object(obj)?;
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .ok_or(EventRejection::Description)?;
    Ok(Suggestion {
        event,
        description: description.to_string(),
    })
}

/// Same rules as [`parse_proposal`] over a `suggestions` array, plus a required
/// `description` string per element.
pub fn parse_suggestions(raw: &str) -> Result<SuggestionOutcome, DomainError> {
    let obj = parse_object(raw)?;
    let mut suggestions = Vec::new();
    let mut rejected = 0;
    if let Some(Value::Array(items)) = obj.get("suggestions") {
        for item in items {
            match validate_suggestion(item) {
                Ok(s) => suggestions.push(s),
                Err(_) => rejected += 1,
            }
        }
    }
    Ok(SuggestionOutcome {
        suggestions,
        rejected,
    })
}

/// Validate a client-supplied week for storage. Unlike the model filter, one bad
/// element rejects the whole list.
pub fn validate_events_strict(value: &Value) -> Result<Vec<CalendarEvent>, DomainError> {
    let items = value
        .as_array()
        .ok_or_else(|| DomainError::InvalidInput("Invalid events input".to_string()))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            validate_event(item)
                .map_err(|why| DomainError::InvalidInput(format!("Invalid event at index {}: {}", i, why)))
        })
        .collect()
}
