//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/DB types here; adapters map into these.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Kind of calendar block. Anything else proposed by the model is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Lecture,
    Assignment,
    Study,
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::Lecture, EventType::Assignment, EventType::Study];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Lecture => "Lecture",
            EventType::Assignment => "Assignment",
            EventType::Study => "Study",
        }
    }

    /// Exact, case-sensitive match on the wire name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week, Monday first. Serialized as the full English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scheduled block (lecture, assignment or study session).
///
/// Identity is positional within the enclosing list; overlap is not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub day: Weekday,
    /// Hour of day in 0..=23.
    pub start_hour: u8,
    /// Length in hours. Always finite and > 0 once validated.
    #[serde(serialize_with = "serialize_hours")]
    pub duration: f64,
}

/// Whole hours go out as integers (`2`, not `2.0`) so accepted events
/// serialize back to the JSON the model produced.
fn serialize_hours<S: Serializer>(hours: &f64, s: S) -> Result<S::Ok, S::Error> {
    if hours.fract() == 0.0 && hours.abs() < i64::MAX as f64 {
        s.serialize_i64(*hours as i64)
    } else {
        s.serialize_f64(*hours)
    }
}

/// Model-proposed week after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleProposal {
    pub events: Vec<CalendarEvent>,
    pub explanation: String,
}

/// One additional event suggested by the model, with the reason it helps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(flatten)]
    pub event: CalendarEvent,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub suggestions: Vec<Suggestion>,
}

/// Plain-text coaching summary of a week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub summary: String,
}

/// Authenticated caller as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Entitlement row for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub is_premium: bool,
    pub ai_usage_count: u32,
}

/// Entitlement summary returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatus {
    pub is_premium: bool,
    pub ai_usage_count: u32,
    pub free_limit: u32,
    /// Free generations left; `None` for premium users.
    pub remaining: Option<u32>,
}
