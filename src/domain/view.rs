use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::todo::{Category, ParseError, Todo};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => todo.completed,
            StatusFilter::Pending => !todo.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self { StatusFilter::All => "all", StatusFilter::Completed => "completed", StatusFilter::Pending => "pending" }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "pending" => Ok(StatusFilter::Pending),
            _ => Err(ParseError { kind: "status", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoFilter {
    pub status: StatusFilter,
    pub categories: BTreeSet<Category>,
}

impl Default for TodoFilter {
    fn default() -> Self { Self { status: StatusFilter::All, categories: Category::ALL.into_iter().collect() } }
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        self.status.matches(todo) && self.categories.contains(&todo.category)
    }
}

/// Parses a comma-separated category list such as `work,study`. Empty
/// segments are skipped, so `""` selects no category.
pub fn parse_categories(raw: &str) -> Result<BTreeSet<Category>, ParseError> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::parse).collect()
}

/// The tasks to display for `filter`, in display order.
///
/// Pending tasks come first. Within each group, tasks with a due date come
/// first (earliest due first), then undated tasks newest first. The sort is
/// stable so remaining ties keep collection order.
pub fn visible_todos(todos: &[Todo], filter: &TodoFilter) -> Vec<Todo> {
    let mut visible: Vec<Todo> = todos.iter().filter(|t| filter.matches(t)).cloned().collect();
    visible.sort_by(display_order);
    visible
}

fn display_order(a: &Todo, b: &Todo) -> Ordering {
    a.completed.cmp(&b.completed).then_with(|| match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at.cmp(&a.created_at),
    })
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

/// Overall completion across the whole collection, ignoring any filter.
pub fn progress(todos: &[Todo]) -> Progress {
    let completed = todos.iter().filter(|t| t.completed).count();
    let total = todos.len();
    let percent = if total > 0 { completed as f64 / total as f64 * 100.0 } else { 0.0 };
    Progress { completed, total, percent }
}
