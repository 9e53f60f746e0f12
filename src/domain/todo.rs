use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TodoId(pub Uuid);

impl Default for TodoId {
    fn default() -> Self { Self(Uuid::new_v4()) }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SubtaskId(pub Uuid);

impl Default for SubtaskId {
    fn default() -> Self { Self(Uuid::new_v4()) }
}

impl fmt::Display for SubtaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority { Low, Medium, High }

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self { Priority::Low => "low", Priority::Medium => "medium", Priority::High => "high" }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.as_str()) }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError { kind: "priority", value: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category { Work, Study, Personal, Fitness, Other }

impl Category {
    pub const ALL: [Category; 5] = [Category::Work, Category::Study, Category::Personal, Category::Fitness, Category::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Study => "study",
            Category::Personal => "personal",
            Category::Fitness => "fitness",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.as_str()) }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError { kind: "category", value: s.to_string() })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtask {
    pub id: SubtaskId,
    pub text: String,
    pub completed: bool,
}

/// A single task as stored in the persisted collection.
///
/// Field names and the epoch-millisecond timestamps follow the stored JSON
/// layout, so a collection can be round-tripped through any repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "chrono::serde::ts_milliseconds_option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Where a task's due date falls relative to the viewer's current day.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DueStatus { None, Overdue, Today, Tomorrow, Upcoming }

impl Todo {
    /// `(completed, total)` over the subtasks.
    pub fn subtask_progress(&self) -> (usize, usize) {
        (self.subtasks.iter().filter(|s| s.completed).count(), self.subtasks.len())
    }

    /// Completed tasks never report a due status.
    pub fn due_status<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DueStatus {
        let Some(due) = self.due_date else { return DueStatus::None };
        if self.completed { return DueStatus::None; }
        let today = now.date_naive();
        let due_day = due.with_timezone(&now.timezone()).date_naive();
        if due_day < today {
            DueStatus::Overdue
        } else if due_day == today {
            DueStatus::Today
        } else if due_day == today + Duration::days(1) {
            DueStatus::Tomorrow
        } else {
            DueStatus::Upcoming
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub text: String,
    pub priority: Priority,
    pub category: Category,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTodo {
    pub text: String,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub due_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(due: Option<DateTime<Utc>>) -> Todo {
        Todo {
            id: TodoId::default(),
            text: "Read".into(),
            completed: false,
            priority: Priority::Medium,
            category: Category::Study,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            completed_at: None,
            due_date: due,
            subtasks: vec![],
        }
    }

    #[test]
    fn serializes_with_stored_layout() {
        let todo = sample(None);
        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["createdAt"], 1_714_554_000_000i64);
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["category"], "study");
        assert!(value.get("completedAt").is_none());
        assert!(value.get("dueDate").is_none());
    }

    #[test]
    fn reads_records_without_subtasks() {
        let raw = r#"{"id":"7f1c0e4e-0a4e-4b8e-9d4e-2d6f3a9b1c11","text":"Run","completed":true,
            "priority":"high","category":"fitness","createdAt":1714554000000,"completedAt":1714557600000}"#;
        let todo: Todo = serde_json::from_str(raw).unwrap();
        assert!(todo.subtasks.is_empty());
        assert_eq!(todo.completed_at, Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));
    }

    #[test]
    fn parses_enums_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(" fitness ".parse::<Category>(), Ok(Category::Fitness));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn due_status_relative_to_today() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(sample(None).due_status(&now), DueStatus::None);
        assert_eq!(sample(Some(now - Duration::days(2))).due_status(&now), DueStatus::Overdue);
        assert_eq!(sample(Some(now + Duration::hours(3))).due_status(&now), DueStatus::Today);
        assert_eq!(sample(Some(now + Duration::days(1))).due_status(&now), DueStatus::Tomorrow);
        assert_eq!(sample(Some(now + Duration::days(5))).due_status(&now), DueStatus::Upcoming);
        let mut done = sample(Some(now - Duration::days(2)));
        done.completed = true;
        assert_eq!(done.due_status(&now), DueStatus::None);
    }
}
