use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::category::{Appetite, Confidence, Emotion};

pub const SCHEDULE_HEADING: &str = "## 今日日程";
pub const JOURNAL_HEADING: &str = "## 今日随笔";
pub const EXERCISE_HEADING: &str = "## 运动情况";

/// Header fields of a daily record. Anything missing or unrecognised on
/// disk reads back as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiaryMetadata {
    pub recorded_at: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub emotion: Option<Emotion>,
    pub appetite: Option<Appetite>,
    pub confidence: Option<Confidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub subject: String,
    #[serde(deserialize_with = "de_event_time")]
    pub start: NaiveTime,
    #[serde(deserialize_with = "de_event_time")]
    pub end: NaiveTime,
}

impl CalendarEvent {
    pub fn schedule_line(&self) -> String {
        format!(
            "- {} - {}: {}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.subject
        )
    }

    /// Inverse of [`schedule_line`](Self::schedule_line).
    pub fn from_schedule_line(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix("- ")?;
        let (span, subject) = rest.split_once(": ")?;
        let (start, end) = span.split_once(" - ")?;
        Some(Self {
            subject: subject.trim().to_string(),
            start: NaiveTime::parse_from_str(start.trim(), "%H:%M").ok()?,
            end: NaiveTime::parse_from_str(end.trim(), "%H:%M").ok()?,
        })
    }
}

/// Event feeds send either a bare time or a full timestamp.
fn de_event_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    for fmt in ["%H:%M:%S%.f", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(raw, fmt) {
            return Ok(t);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.time());
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local().time());
    }
    Err(serde::de::Error::custom(format!("unrecognised event time: {raw}")))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiaryRecord {
    pub date: NaiveDate,
    pub metadata: DiaryMetadata,
    pub events: Vec<CalendarEvent>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    CreateNew,
    Overwrite,
}

/// Everything needed to compose a new daily entry.
#[derive(Debug, Clone)]
pub struct DiaryDraft {
    pub date: NaiveDate,
    pub recorded_at: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub emotion: Option<Emotion>,
    pub appetite: Option<Appetite>,
    pub confidence: Option<Confidence>,
    pub events: Vec<CalendarEvent>,
    pub journal: String,
    pub exercise: String,
}

impl DiaryDraft {
    /// Builds the header and the markdown body. A blank location falls back
    /// to `default_location`; the timestamp is kept to whole seconds.
    pub fn compose(&self, default_location: &str) -> (DiaryMetadata, String) {
        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(default_location)
            .to_string();

        let metadata = DiaryMetadata {
            recorded_at: Some(
                self.recorded_at
                    .map(|at| at.with_nanosecond(0).unwrap_or(at))
                    .unwrap_or_else(|| self.date.and_time(NaiveTime::MIN)),
            ),
            location: Some(location),
            emotion: self.emotion,
            appetite: self.appetite,
            confidence: self.confidence,
        };

        let mut lines: Vec<String> = vec![SCHEDULE_HEADING.into(), String::new()];
        if self.events.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(self.events.iter().map(CalendarEvent::schedule_line));
        }
        lines.push(String::new());
        lines.push(JOURNAL_HEADING.into());
        lines.push(String::new());
        lines.push(self.journal.trim_end().to_string());
        lines.push(String::new());
        lines.push(EXERCISE_HEADING.into());
        lines.push(String::new());
        lines.push(self.exercise.trim_end().to_string());
        lines.push(String::new());

        (metadata, lines.join("\n"))
    }
}

/// Schedule lines found under the schedule heading of a body.
pub fn events_from_body(body: &str) -> Vec<CalendarEvent> {
    body.lines()
        .skip_while(|l| l.trim() != SCHEDULE_HEADING)
        .skip(1)
        .take_while(|l| !l.trim_start().starts_with("## "))
        .filter_map(CalendarEvent::from_schedule_line)
        .collect()
}

/// POST /api/diaries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDiaryRequest {
    /// Defaults to today
    pub date: Option<NaiveDate>,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    pub emotion: Option<String>,
    pub appetite: Option<String>,
    pub confidence: Option<String>,

    #[serde(default)]
    pub events: Vec<CalendarEvent>,

    #[serde(default)]
    #[validate(length(max = 20000, message = "Diary text must be at most 20000 characters"))]
    pub diary: String,

    #[serde(default)]
    #[validate(length(max = 20000, message = "Exercise text must be at most 20000 characters"))]
    pub exercise: String,

    /// Confirms replacing an existing entry for the same date.
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Serialize)]
pub struct SaveDiaryResponse {
    pub message: String,
    pub file: String,
}

/// One row of GET /api/history
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub emotion: Option<Emotion>,
    pub appetite: Option<Appetite>,
    pub confidence: Option<Confidence>,
}
