//! Occurrence mutations expressed as patch intents.
//!
//! Nothing in this module touches storage. Each operation reads the task as
//! it appears in the latest snapshot and returns a [`Mutation`] that a
//! [`TaskStore`](crate::store::TaskStore) applies atomically. The outcome
//! becomes visible once the next snapshot is pushed.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::calendar::to_iso_date;
use crate::error::CoreError;
use crate::models::{
    Difficulty, Importance, RecurrenceRule, Schedule, TaskDefinition, TaskDocument, TaskStatus,
    TimeOfDay, DEFAULT_LIST,
};

/// Partial update of a stored task document.
///
/// `None` leaves a field alone. For nullable fields `Some(None)` clears the
/// value. The exception sets are replaced wholesale, so concurrent writers
/// resolve last-write-wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub list: Option<Option<String>>,
    pub difficulty: Option<Difficulty>,
    pub importance: Option<Importance>,
    pub status: Option<TaskStatus>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub date: Option<Option<NaiveDate>>,
    pub time: Option<Option<TimeOfDay>>,
    pub recurrence: Option<Option<RecurrenceRule>>,
    pub completed_dates: Option<BTreeSet<NaiveDate>>,
    pub skipped_dates: Option<BTreeSet<NaiveDate>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Rejects patches that would store an empty title or a malformed rule.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
            }
        }
        if let Some(Some(rule)) = &self.recurrence {
            rule.validate()?;
        }
        Ok(())
    }

    pub fn apply_to(&self, doc: &mut TaskDocument) {
        if let Some(title) = &self.title {
            doc.title = Some(title.trim().to_string());
        }
        if let Some(list) = &self.list {
            doc.list = normalize_list(list.as_deref());
        }
        if let Some(difficulty) = self.difficulty {
            doc.difficulty = Some(difficulty);
        }
        if let Some(importance) = self.importance {
            doc.importance = Some(importance);
        }
        if let Some(status) = &self.status {
            doc.status = Some(status.clone());
        }
        if let Some(completed_at) = self.completed_at {
            doc.completed_at = completed_at;
        }
        if let Some(date) = self.date {
            doc.date = date;
        }
        if let Some(time) = self.time {
            doc.time = time;
        }
        if let Some(recurrence) = &self.recurrence {
            doc.recurrence = recurrence.clone();
        }
        if let Some(completed) = &self.completed_dates {
            doc.completed_dates = completed.clone();
        }
        if let Some(skipped) = &self.skipped_dates {
            doc.skipped_dates = skipped.clone();
        }
    }
}

/// The stored form of a list reference: the default list is `None`.
pub(crate) fn normalize_list(list: Option<&str>) -> Option<String> {
    list.map(str::trim)
        .filter(|name| !name.is_empty() && *name != DEFAULT_LIST)
        .map(str::to_string)
}

/// A write intent handed to the task store.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Patch { task_id: Uuid, patch: TaskPatch },
    Delete { task_id: Uuid },
}

impl Mutation {
    pub fn task_id(&self) -> Uuid {
        match self {
            Mutation::Patch { task_id, .. } | Mutation::Delete { task_id } => *task_id,
        }
    }
}

/// Marks one occurrence done or not done.
///
/// Series need the occurrence `date`; single tasks ignore it. Setting the
/// state a task already has produces a patch that leaves the document as it
/// is, including the original `completed_at` stamp.
pub fn toggle_occurrence_done(
    task: &TaskDefinition,
    date: Option<NaiveDate>,
    done: bool,
    now: DateTime<Utc>,
) -> Result<Mutation, CoreError> {
    let patch = match &task.schedule {
        Schedule::Recurring { completed_dates, .. } => {
            let date = date.ok_or_else(|| {
                CoreError::InvalidInput(format!(
                    "'{}' repeats; choose which occurrence to update",
                    task.display_title()
                ))
            })?;
            let mut completed = completed_dates.clone();
            if done {
                completed.insert(date);
            } else {
                completed.remove(&date);
            }
            TaskPatch {
                completed_dates: Some(completed),
                ..Default::default()
            }
        }
        Schedule::Single {
            status,
            completed_at,
            ..
        } => {
            let completed_at = match (done, status, completed_at) {
                (true, TaskStatus::Done, Some(stamp)) => Some(*stamp),
                (true, _, _) => Some(now),
                (false, _, _) => None,
            };
            TaskPatch {
                status: Some(if done { TaskStatus::Done } else { TaskStatus::Active }),
                completed_at: Some(completed_at),
                ..Default::default()
            }
        }
    };
    Ok(Mutation::Patch {
        task_id: task.id,
        patch,
    })
}

/// Hides one occurrence of a series. A skipped date is also removed from
/// the completed set.
pub fn delete_occurrence(task: &TaskDefinition, date: NaiveDate) -> Result<Mutation, CoreError> {
    match &task.schedule {
        Schedule::Recurring {
            completed_dates,
            skipped_dates,
            ..
        } => {
            let mut skipped = skipped_dates.clone();
            skipped.insert(date);
            let mut completed = completed_dates.clone();
            completed.remove(&date);
            Ok(Mutation::Patch {
                task_id: task.id,
                patch: TaskPatch {
                    completed_dates: Some(completed),
                    skipped_dates: Some(skipped),
                    ..Default::default()
                },
            })
        }
        Schedule::Single { .. } => Err(CoreError::InvalidInput(format!(
            "'{}' does not repeat; delete the task instead of the occurrence on {}",
            task.display_title(),
            to_iso_date(date)
        ))),
    }
}

/// Removes a series and with it every derived occurrence.
pub fn delete_series(task: &TaskDefinition) -> Result<Mutation, CoreError> {
    if !task.is_recurring() {
        return Err(CoreError::InvalidInput(format!(
            "'{}' is not a recurring task",
            task.display_title()
        )));
    }
    Ok(delete_task(task))
}

pub fn delete_task(task: &TaskDefinition) -> Mutation {
    Mutation::Delete { task_id: task.id }
}

/// Replaces the rule of a series.
///
/// The completed and skipped sets are kept as they are: dates the new rule
/// no longer produces stop showing up, and come back if the rule reverts.
pub fn edit_series(task: &TaskDefinition, rule: RecurrenceRule) -> Result<Mutation, CoreError> {
    if !task.is_recurring() {
        return Err(CoreError::InvalidInput(format!(
            "'{}' is not a recurring task",
            task.display_title()
        )));
    }
    rule.validate()?;
    Ok(Mutation::Patch {
        task_id: task.id,
        patch: rule_patch(rule),
    })
}

fn rule_patch(rule: RecurrenceRule) -> TaskPatch {
    TaskPatch {
        date: Some(Some(rule.starts)),
        time: Some(rule.time),
        recurrence: Some(Some(rule)),
        ..Default::default()
    }
}

/// User-facing edit of a whole task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub list: Option<Option<String>>,
    pub difficulty: Option<Difficulty>,
    pub importance: Option<Importance>,
    pub date: Option<Option<NaiveDate>>,
    pub time: Option<Option<TimeOfDay>>,
    /// `Some(None)` turns a series back into a single task.
    pub recurrence: Option<Option<RecurrenceRule>>,
}

/// Builds the patch for a [`TaskEdit`].
///
/// Giving a task a rule moves its date and time to the rule's start. A
/// series keeps its date in the rule, so only its time of day can be edited
/// directly.
pub fn edit_task(task: &TaskDefinition, edit: TaskEdit) -> Result<Mutation, CoreError> {
    let mut patch = TaskPatch {
        title: edit.title,
        list: edit.list,
        difficulty: edit.difficulty,
        importance: edit.importance,
        ..Default::default()
    };

    match (edit.recurrence, task.schedule.rule()) {
        (Some(Some(rule)), _) => {
            rule.validate()?;
            let rule_fields = rule_patch(rule);
            patch.date = rule_fields.date;
            patch.time = rule_fields.time;
            patch.recurrence = rule_fields.recurrence;
        }
        (Some(None), _) => {
            patch.recurrence = Some(None);
            patch.date = edit.date;
            patch.time = edit.time;
        }
        (None, Some(rule)) => {
            if edit.date.is_some() {
                return Err(CoreError::InvalidInput(format!(
                    "'{}' repeats; change its recurrence to move it",
                    task.display_title()
                )));
            }
            if let Some(time) = edit.time {
                let rule = rule.clone().with_time(time);
                patch.time = Some(time);
                patch.recurrence = Some(Some(rule));
            }
        }
        (None, None) => {
            patch.date = edit.date;
            patch.time = edit.time;
        }
    }

    patch.validate()?;
    Ok(Mutation::Patch {
        task_id: task.id,
        patch,
    })
}
