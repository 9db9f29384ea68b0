use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::timestamp;

pub const DEFAULT_STATUS: i64 = 0;
pub const DEFAULT_PRIORITY: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskValidationError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Invalid due date")]
    InvalidDueDate(String),
    #[error("{0} must be an integer")]
    NullField(&'static str),
}

/// Body of a create request. Missing or `null` numeric fields fall back to
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<i64>,
    pub priority: Option<i64>,
    pub due_date: Option<String>,
}

/// Body of a partial update.
///
/// The outer `Option` records whether the field was present in the body at
/// all, the inner one whether it was `null`. `title` is the exception: an
/// empty or `null` title is never applied, so a single `Option` is enough.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub priority: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: i64,
    pub priority: i64,
    #[serde(with = "timestamp::option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a new task owned by `user_id` from a create request.
    pub fn create(user_id: &str, request: TaskRequest) -> Result<Self, TaskValidationError> {
        let title = match request.title {
            Some(title) if !title.is_empty() => title,
            _ => return Err(TaskValidationError::MissingTitle),
        };
        let due_date = match request.due_date.as_deref() {
            Some(input) => parse_due_date(input)?,
            None => None,
        };

        let now = timestamp::now();
        Ok(Task {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title,
            description: request.description,
            status: request.status.unwrap_or(DEFAULT_STATUS),
            priority: request.priority.unwrap_or(DEFAULT_PRIORITY),
            due_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update. Every field is checked before anything is
    /// written, so a rejected update leaves the task untouched.
    pub fn apply(&mut self, update: TaskUpdate) -> Result<(), TaskValidationError> {
        let status = match update.status {
            Some(Some(status)) => Some(status),
            Some(None) => return Err(TaskValidationError::NullField("status")),
            None => None,
        };
        let priority = match update.priority {
            Some(Some(priority)) => Some(priority),
            Some(None) => return Err(TaskValidationError::NullField("priority")),
            None => None,
        };
        let due_date = match update.due_date {
            Some(Some(input)) => Some(parse_due_date(&input)?),
            Some(None) => Some(None),
            None => None,
        };

        if let Some(title) = update.title.filter(|title| !title.is_empty()) {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(priority) = priority {
            self.priority = priority;
        }
        if let Some(due_date) = due_date {
            self.due_date = due_date;
        }
        self.touch();
        Ok(())
    }

    /// Refreshes `updated_at`, keeping it strictly after the previous value
    /// even when two mutations land in the same millisecond.
    pub fn touch(&mut self) {
        let now = timestamp::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::milliseconds(1)
        };
    }
}

// Naive forms are read as UTC.
const NAIVE_DUE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses a due date into UTC. An empty string means "no due date".
///
/// Accepts RFC 3339 timestamps, minute-precision date-times with or without a
/// `Z` or `±HH:MM` suffix (what a `datetime-local` input sends),
/// `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC and bare `YYYY-MM-DD` dates (UTC
/// midnight).
pub fn parse_due_date(input: &str) -> Result<Option<DateTime<Utc>>, TaskValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parse_naive = |value: &str| {
        NAIVE_DUE_DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .map(|naive| naive.and_utc())
    };

    let parsed = DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_naive(trimmed))
        .or_else(|| trimmed.strip_suffix(['Z', 'z']).and_then(parse_naive))
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        });

    match parsed {
        Some(dt) => Ok(Some(timestamp::truncate(dt))),
        None => Err(TaskValidationError::InvalidDueDate(trimmed.to_string())),
    }
}
