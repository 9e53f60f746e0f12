//! Aggregate statistics over the task collection.
//!
//! Calendar days are evaluated in the time zone of the `now` argument, so
//! callers pass `Local::now()` for a user-facing report and a fixed UTC
//! instant under test.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::todo::{Category, ParseError, Todo};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "all")]
    All,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self { TimeWindow::SevenDays => "7days", TimeWindow::Month => "month", TimeWindow::All => "all" }
    }

    pub fn label(self) -> &'static str {
        match self { TimeWindow::SevenDays => "Last 7 days", TimeWindow::Month => "This month", TimeWindow::All => "All time" }
    }

    pub fn next(self) -> Self {
        match self { TimeWindow::SevenDays => TimeWindow::Month, TimeWindow::Month => TimeWindow::All, TimeWindow::All => TimeWindow::SevenDays }
    }

    /// Whether a task created at `todo.created_at` falls inside the window ending at `now`.
    pub fn contains<Tz: TimeZone>(self, todo: &Todo, now: &DateTime<Tz>) -> bool {
        match self {
            TimeWindow::SevenDays => todo.created_at >= now.clone() - Duration::days(7),
            TimeWindow::Month => {
                let created = local_day(&todo.created_at, now);
                let today = now.date_naive();
                (created.year(), created.month()) >= (today.year(), today.month())
            }
            TimeWindow::All => true,
        }
    }
}

impl FromStr for TimeWindow {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7days" => Ok(TimeWindow::SevenDays),
            "month" => Ok(TimeWindow::Month),
            "all" => Ok(TimeWindow::All),
            _ => Err(ParseError { kind: "time window", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Category,
    pub completed: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub completed: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CompletionSeries {
    Daily { days: Vec<DayCount> },
    Totals { completed: usize, pending: usize },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub window: TimeWindow,
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
    pub categories: Vec<CategoryCount>,
    pub series: CompletionSeries,
    pub streak: u32,
}

pub fn report<Tz: TimeZone>(todos: &[Todo], window: TimeWindow, now: &DateTime<Tz>) -> AnalyticsReport {
    let windowed = in_window(todos, window, now);
    let completed = windowed.iter().filter(|t| t.completed).count();
    let series = match window {
        TimeWindow::SevenDays => CompletionSeries::Daily { days: daily_completions(&windowed, now) },
        TimeWindow::Month | TimeWindow::All => CompletionSeries::Totals { completed, pending: windowed.len() - completed },
    };
    AnalyticsReport {
        window,
        total: windowed.len(),
        completed,
        completion_rate: completion_rate(&windowed),
        categories: category_breakdown(&windowed),
        series,
        streak: streak(todos, now),
    }
}

pub fn in_window<Tz: TimeZone>(todos: &[Todo], window: TimeWindow, now: &DateTime<Tz>) -> Vec<Todo> {
    todos.iter().filter(|t| window.contains(t, now)).cloned().collect()
}

/// Percentage of completed tasks, `0.0` for an empty slice.
pub fn completion_rate(todos: &[Todo]) -> f64 {
    if todos.is_empty() { return 0.0; }
    let completed = todos.iter().filter(|t| t.completed).count();
    completed as f64 / todos.len() as f64 * 100.0
}

/// Completed counts per category; categories without completions are left out.
pub fn category_breakdown(todos: &[Todo]) -> Vec<CategoryCount> {
    Category::ALL
        .into_iter()
        .map(|category| CategoryCount {
            category,
            completed: todos.iter().filter(|t| t.category == category && t.completed).count(),
        })
        .filter(|c| c.completed > 0)
        .collect()
}

/// One entry per calendar day for the last seven days, oldest first. Each
/// counts completed tasks created on that day.
pub fn daily_completions<Tz: TimeZone>(todos: &[Todo], now: &DateTime<Tz>) -> Vec<DayCount> {
    let today = now.date_naive();
    (0..7)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let completed = todos.iter().filter(|t| t.completed && local_day(&t.created_at, now) == date).count();
            DayCount { date, completed }
        })
        .collect()
}

/// Consecutive completion days ending today or yesterday.
///
/// Runs over the whole collection. If the most recent completion day is
/// neither today nor yesterday the streak is zero; otherwise it counts back
/// from that day until the first missing day.
pub fn streak<Tz: TimeZone>(todos: &[Todo], now: &DateTime<Tz>) -> u32 {
    let days: BTreeSet<NaiveDate> = todos
        .iter()
        .filter(|t| t.completed)
        .filter_map(|t| t.completed_at.as_ref())
        .map(|at| local_day(at, now))
        .collect();
    let mut newest_first = days.into_iter().rev();
    let Some(latest) = newest_first.next() else { return 0 };

    let gap = (now.date_naive() - latest).num_days();
    if !(0..=1).contains(&gap) { return 0; }

    let mut count = 1;
    let mut previous = latest;
    for day in newest_first {
        if previous - day != Duration::days(1) { break; }
        count += 1;
        previous = day;
    }
    count
}

fn local_day<Tz: TimeZone, Tz2: TimeZone>(at: &DateTime<Tz2>, now: &DateTime<Tz>) -> NaiveDate {
    at.with_timezone(&now.timezone()).date_naive()
}
