use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::to_iso_date;
use crate::error::CoreError;

/// Grouping used for tasks that name no list.
pub const DEFAULT_LIST: &str = "Inbox";

/// Placeholder shown for tasks stored without a title.
pub const UNTITLED_TASK: &str = "(untitled task)";

// ============================================================================
// Recurrence Rule
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceUnit {
    Day,
    Week,
    Month,
    Year,
}

impl RecurrenceUnit {
    /// Unit name agreeing in number with `every` ("day" / "days").
    pub fn label(&self, every: u32) -> String {
        if every == 1 {
            self.to_string()
        } else {
            format!("{}s", self)
        }
    }
}

impl fmt::Display for RecurrenceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceUnit::Day => write!(f, "day"),
            RecurrenceUnit::Week => write!(f, "week"),
            RecurrenceUnit::Month => write!(f, "month"),
            RecurrenceUnit::Year => write!(f, "year"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence unit: {0}")]
pub struct ParseRecurrenceUnitError(String);

impl FromStr for RecurrenceUnit {
    type Err = ParseRecurrenceUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "days" | "daily" => Ok(RecurrenceUnit::Day),
            "week" | "weeks" | "weekly" => Ok(RecurrenceUnit::Week),
            "month" | "months" | "monthly" => Ok(RecurrenceUnit::Month),
            "year" | "years" | "yearly" => Ok(RecurrenceUnit::Year),
            _ => Err(ParseRecurrenceUnitError(s.to_string())),
        }
    }
}

/// Termination condition of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecurrenceEnd {
    Never,
    /// Last occurrence falls on or before `date`.
    On { date: NaiveDate },
    /// Exactly `count` occurrences, counted from `starts`.
    After { count: u32 },
}

/// Time of day attached to a task or series. Informational only: it orders
/// occurrences within a day but never moves them to another date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid time of day: {0} (expected HH:MM)")]
pub struct ParseTimeOfDayError(String);

impl FromStr for TimeOfDay {
    type Err = ParseTimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(Self)
            .map_err(|_| ParseTimeOfDayError(s.to_string()))
    }
}

/// A repeating schedule: `starts`, then every `every` `unit`s until `ends`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub every: u32,
    pub unit: RecurrenceUnit,
    pub starts: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeOfDay>,
    pub ends: RecurrenceEnd,
}

impl RecurrenceRule {
    /// Builds a rule, rejecting it if it could never describe a valid series.
    pub fn new(
        every: u32,
        unit: RecurrenceUnit,
        starts: NaiveDate,
        ends: RecurrenceEnd,
    ) -> Result<Self, CoreError> {
        let rule = Self {
            every,
            unit,
            starts,
            time: None,
            ends,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn with_time(mut self, time: Option<TimeOfDay>) -> Self {
        self.time = time;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.every < 1 {
            return Err(CoreError::InvalidRule("interval must be at least 1".to_string()));
        }
        match self.ends {
            RecurrenceEnd::On { date } if date < self.starts => Err(CoreError::InvalidRule(format!(
                "end date {} is before start date {}",
                to_iso_date(date),
                to_iso_date(self.starts)
            ))),
            RecurrenceEnd::After { count } if count < 1 => Err(CoreError::InvalidRule(
                "occurrence count must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Nearest well-formed rule: zero intervals and counts become 1.
    ///
    /// An `on` date before `starts` is left alone; it simply yields nothing.
    pub fn sanitized(&self) -> Self {
        let mut rule = self.clone();
        rule.every = rule.every.max(1);
        if let RecurrenceEnd::After { count } = rule.ends {
            rule.ends = RecurrenceEnd::After { count: count.max(1) };
        }
        rule
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.every == 1 {
            write!(f, "Every {}", self.unit)?;
        } else {
            write!(f, "Every {} {}", self.every, self.unit.label(self.every))?;
        }
        match self.ends {
            RecurrenceEnd::Never => write!(f, " (never ends)"),
            RecurrenceEnd::On { date } => write!(f, " (until {})", to_iso_date(date)),
            RecurrenceEnd::After { count } => write!(f, " (after {}x)", count),
        }
    }
}

// ============================================================================
// Task Definitions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Done,
    Failed,
    /// Any status string this version does not know about.
    #[serde(other)]
    Other,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Active => write!(f, "active"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Other => write!(f, "other"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(TaskStatus::Active),
            "done" => Ok(TaskStatus::Done),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid difficulty: {0}")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Importance {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Importance::Low => write!(f, "Low"),
            Importance::Medium => write!(f, "Medium"),
            Importance::High => write!(f, "High"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid importance: {0}")]
pub struct ParseImportanceError(String);

impl FromStr for Importance {
    type Err = ParseImportanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Importance::Low),
            "medium" => Ok(Importance::Medium),
            "high" => Ok(Importance::High),
            _ => Err(ParseImportanceError(s.to_string())),
        }
    }
}

/// The temporal mode of a task. A task is either a singleton or a series,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Single {
        date: Option<NaiveDate>,
        time: Option<TimeOfDay>,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    },
    Recurring {
        rule: RecurrenceRule,
        /// Occurrence dates marked done.
        completed_dates: BTreeSet<NaiveDate>,
        /// Occurrence dates hidden without touching the rest of the series.
        skipped_dates: BTreeSet<NaiveDate>,
    },
}

impl Schedule {
    pub fn is_recurring(&self) -> bool {
        matches!(self, Schedule::Recurring { .. })
    }

    pub fn rule(&self) -> Option<&RecurrenceRule> {
        match self {
            Schedule::Recurring { rule, .. } => Some(rule),
            Schedule::Single { .. } => None,
        }
    }
}

/// A task as the engine sees it: read-only, built from a store document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub id: Uuid,
    pub title: Option<String>,
    /// `None` means the default list.
    pub list: Option<String>,
    pub difficulty: Difficulty,
    pub importance: Importance,
    pub schedule: Schedule,
    pub created_at: DateTime<Utc>,
}

impl TaskDefinition {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED_TASK)
    }

    pub fn list_name(&self) -> &str {
        self.list.as_deref().unwrap_or(DEFAULT_LIST)
    }

    pub fn is_recurring(&self) -> bool {
        self.schedule.is_recurring()
    }
}

/// The flat document shape persisted by the task store.
///
/// Single-task fields and series fields live side by side; `recurrence`
/// decides which set is meaningful. Fields of the inactive mode are kept, so
/// switching a task back restores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDocument {
    pub id: Uuid,
    #[serde(default, alias = "text")]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub importance: Option<Importance>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<TimeOfDay>,
    #[serde(default)]
    pub list: Option<String>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub skipped_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TaskDocument {
    /// Name of the list this document effectively belongs to.
    pub fn list_name(&self) -> &str {
        normalize_text(self.list.as_deref()).unwrap_or(DEFAULT_LIST)
    }
}

fn normalize_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl From<TaskDocument> for TaskDefinition {
    fn from(doc: TaskDocument) -> Self {
        let title = normalize_text(doc.title.as_deref()).map(str::to_string);
        let list = normalize_text(doc.list.as_deref()).map(str::to_string);
        let schedule = match doc.recurrence {
            Some(rule) => Schedule::Recurring {
                rule,
                completed_dates: doc.completed_dates,
                skipped_dates: doc.skipped_dates,
            },
            None => Schedule::Single {
                date: doc.date,
                time: doc.time,
                status: doc.status.unwrap_or(TaskStatus::Active),
                completed_at: doc.completed_at,
            },
        };
        Self {
            id: doc.id,
            title,
            list,
            difficulty: doc.difficulty.unwrap_or_default(),
            importance: doc.importance.unwrap_or_default(),
            schedule,
            created_at: doc.created_at,
        }
    }
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub list: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub importance: Option<Importance>,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeOfDay>,
    /// When present the task is created as a series.
    pub recurrence: Option<RecurrenceRule>,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
        }
        if let Some(rule) = &self.recurrence {
            rule.validate()?;
        }
        Ok(())
    }

    /// Builds the stored document. A series records its start date and time
    /// in `date`/`time` as well, mirroring what editing does.
    pub fn into_document(self, id: Uuid, created_at: DateTime<Utc>) -> TaskDocument {
        let list = normalize_text(self.list.as_deref())
            .filter(|name| *name != DEFAULT_LIST)
            .map(str::to_string);
        let (date, time) = match &self.recurrence {
            Some(rule) => (Some(rule.starts), rule.time),
            None => (self.date, self.time),
        };
        TaskDocument {
            id,
            title: Some(self.title.trim().to_string()),
            status: Some(TaskStatus::Active),
            difficulty: Some(self.difficulty.unwrap_or_default()),
            importance: Some(self.importance.unwrap_or_default()),
            date,
            time,
            list,
            recurrence: self.recurrence,
            completed_dates: BTreeSet::new(),
            skipped_dates: BTreeSet::new(),
            completed_at: None,
            created_at,
        }
    }
}

/// Display metadata for a list of tasks. Not needed for expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDefinition {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Occurrences (derived, never stored)
// ============================================================================

/// Identity of one occurrence across snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceKey {
    pub task_id: Uuid,
    /// `None` only for undated single tasks.
    pub date: Option<NaiveDate>,
}

impl OccurrenceKey {
    pub fn new(task_id: Uuid, date: Option<NaiveDate>) -> Self {
        Self { task_id, date }
    }
}

/// One dated instance of a task, resolved against its completion state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub task_id: Uuid,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeOfDay>,
    pub done: bool,
    pub recurring: bool,
    pub title: String,
    pub list: String,
    pub difficulty: Difficulty,
    pub importance: Importance,
    pub created_at: DateTime<Utc>,
}

impl Occurrence {
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey::new(self.task_id, self.date)
    }
}
