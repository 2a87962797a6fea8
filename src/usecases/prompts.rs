//! Prompt builders for the language model.

use crate::domain::CalendarEvent;
use serde_json::Value;

pub const SCHEDULE_TEMPERATURE: f32 = 0.5;
pub const SUGGEST_TEMPERATURE: f32 = 0.5;
pub const SUMMARY_TEMPERATURE: f32 = 0.6;

/// System messages, one per route. The user prompt carries the data and format.
pub const SCHEDULE_SYSTEM: &str = "You are a scheduling assistant for a university student.";
pub const SUGGEST_SYSTEM: &str = "You are an AI assistant that suggests additional events (lectures, assignments, or study sessions) to help a university student manage their week.";
pub const SUMMARY_SYSTEM: &str = "You are a productivity coach.";

const EVENT_FORMAT: &str = r#"      "title": string,
      "type": "Lecture" | "Assignment" | "Study",
      "day": "Monday" | "Tuesday" | "Wednesday" | "Thursday" | "Friday" | "Saturday" | "Sunday",
      "start_hour": number,
      "duration": number"#;

fn pretty(events: &[Value]) -> String {
    serde_json::to_string_pretty(events).unwrap_or_else(|_| "[]".to_string())
}

/// Rearrange-the-week prompt. Input events are embedded verbatim.
pub fn schedule_prompt(events: &[Value]) -> String {
    format!(
        r#"INPUT EVENTS:
{events}

RULES:
- Keep lectures fixed
- Add study sessions before assignments
- Avoid overlapping times
- Use realistic hours (8–21)
- Do NOT remove assignments
- Be supportive and student-friendly

OUTPUT JSON ONLY in this format:
{{
  "events": [
    {{
{format}
    }}
  ],
  "explanation": string
}}

No markdown. No extra text.
"#,
        events = pretty(events),
        format = EVENT_FORMAT,
    )
}

pub fn suggest_prompt(events: &[Value]) -> String {
    format!(
        r#"INPUT EVENTS:
{events}

RULES:
- Suggest up to 3 new events
- Keep existing events unchanged
- Use realistic hours (8–21)
- Include a short description of why the suggestion is helpful

OUTPUT JSON ONLY in this format:
{{
  "suggestions": [
    {{
{format},
      "description": string
    }}
  ]
}}
No markdown, no extra text.
"#,
        events = pretty(events),
        format = EVENT_FORMAT,
    )
}

/// One line per event, e.g. `Monday at 10:00 for 2h - Calc HW (Assignment)`.
pub fn format_event_line(e: &CalendarEvent) -> String {
    format!(
        "{} at {}:00 for {}h - {} ({})",
        e.day, e.start_hour, e.duration, e.title, e.kind
    )
}

pub fn weekly_summary_prompt(events: &[CalendarEvent]) -> String {
    let lines: Vec<String> = events.iter().map(format_event_line).collect();
    format!(
        r#"Here is a user's weekly schedule:
{}

Give:
1. A short summary of how balanced or busy the week is
2. 2–3 actionable suggestions
Keep it concise and friendly.
"#,
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventType, Weekday};
    use serde_json::json;

    #[test]
    fn schedule_prompt_embeds_events_and_rules() {
        let events = vec![json!({"title": "Calc HW", "type": "Assignment"})];
        let p = schedule_prompt(&events);
        assert!(p.contains("\"title\": \"Calc HW\""));
        assert!(p.contains("- Keep lectures fixed"));
        assert!(p.contains("\"explanation\": string"));
        assert!(p.ends_with("No markdown. No extra text.\n"));
    }

    #[test]
    fn suggest_prompt_asks_for_descriptions() {
        let p = suggest_prompt(&[]);
        assert!(p.starts_with("INPUT EVENTS:\n[]"));
        assert!(p.contains("\"description\": string"));
    }

    #[test]
    fn event_lines_print_whole_hours_plainly() {
        let e = CalendarEvent {
            title: "Calc HW".into(),
            kind: EventType::Assignment,
            day: Weekday::Monday,
            start_hour: 10,
            duration: 2.0,
        };
        assert_eq!(format_event_line(&e), "Monday at 10:00 for 2h - Calc HW (Assignment)");

        let half = CalendarEvent { duration: 1.5, ..e };
        assert_eq!(format_event_line(&half), "Monday at 10:00 for 1.5h - Calc HW (Assignment)");
    }
}
