use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::calendar::DateWindow;
use crate::models::{Occurrence, OccurrenceKey, Schedule, TaskDefinition, TaskStatus, TimeOfDay};
use crate::recurrence::{ExpansionConfig, RecurrenceExpander};
use crate::store::TaskSnapshot;

/// The merged, sorted occurrence list for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedOccurrences {
    occurrences: Vec<Occurrence>,
}

impl ResolvedOccurrences {
    pub fn as_slice(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Occurrence> {
        self.occurrences.iter()
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Dated occurrences bucketed by day, each bucket in display order.
    pub fn by_day(&self) -> BTreeMap<NaiveDate, Vec<&Occurrence>> {
        let mut days: BTreeMap<NaiveDate, Vec<&Occurrence>> = BTreeMap::new();
        for occurrence in &self.occurrences {
            if let Some(date) = occurrence.date {
                days.entry(date).or_default().push(occurrence);
            }
        }
        days
    }

    /// Single tasks without a date. Only present for unbounded windows.
    pub fn undated(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.iter().filter(|o| o.date.is_none())
    }

    /// Re-locates an occurrence after the snapshot changed.
    ///
    /// `None` means it is gone (task deleted or date skipped); callers drop
    /// whatever referred to it.
    pub fn locate(&self, key: &OccurrenceKey) -> Option<&Occurrence> {
        self.occurrences.iter().find(|o| o.key() == *key)
    }

    pub fn for_task(&self, task_id: Uuid) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.iter().filter(move |o| o.task_id == task_id)
    }
}

impl<'a> IntoIterator for &'a ResolvedOccurrences {
    type Item = &'a Occurrence;
    type IntoIter = std::slice::Iter<'a, Occurrence>;

    fn into_iter(self) -> Self::IntoIter {
        self.occurrences.iter()
    }
}

/// Display order: date, then time (untimed last), then creation order.
///
/// Undated occurrences sort after every dated one. The task id breaks any
/// remaining tie so the order is total.
pub fn compare_occurrences(a: &Occurrence, b: &Occurrence) -> Ordering {
    missing_last(a.date, b.date)
        .then_with(|| missing_last(a.time, b.time))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.task_id.cmp(&b.task_id))
}

fn missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// OccurrenceResolver: one resolver for every view, parameterized by window.
///
/// A bounded window (the week calendar) keeps only dated single tasks inside
/// it. An unbounded window (the board) keeps every single task, dated or
/// not; series are still clamped by the expansion policy.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceResolver {
    expander: RecurrenceExpander,
}

impl OccurrenceResolver {
    pub fn new(config: ExpansionConfig) -> Self {
        Self {
            expander: RecurrenceExpander::new(config),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ExpansionConfig::default())
    }

    pub fn expander(&self) -> &RecurrenceExpander {
        &self.expander
    }

    pub fn resolve(
        &self,
        tasks: &[TaskDefinition],
        window: &DateWindow,
        today: NaiveDate,
    ) -> ResolvedOccurrences {
        let mut occurrences: Vec<Occurrence> = tasks
            .iter()
            .flat_map(|task| self.resolve_task(task, window, today))
            .collect();
        occurrences.sort_by(compare_occurrences);

        debug!(
            tasks = tasks.len(),
            occurrences = occurrences.len(),
            window = ?window,
            "resolved occurrences"
        );
        ResolvedOccurrences { occurrences }
    }

    /// Occurrences of a single task inside `window`, unsorted.
    pub fn resolve_task(
        &self,
        task: &TaskDefinition,
        window: &DateWindow,
        today: NaiveDate,
    ) -> Vec<Occurrence> {
        match &task.schedule {
            Schedule::Recurring {
                rule,
                completed_dates,
                skipped_dates,
            } => self
                .expander
                .occurrences(rule, task.created_at, window, today)
                .filter(|date| !skipped_dates.contains(date))
                .map(|date| occurrence(task, Some(date), rule.time, completed_dates.contains(&date)))
                .collect(),
            Schedule::Single {
                date, time, status, ..
            } => {
                let visible = match date {
                    Some(date) => window.contains(*date),
                    None => window.is_unbounded(),
                };
                if visible {
                    vec![occurrence(task, *date, *time, *status == TaskStatus::Done)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// The next `count` visible occurrences of `task` on or after `from`.
    pub fn preview(
        &self,
        task: &TaskDefinition,
        from: NaiveDate,
        today: NaiveDate,
        count: usize,
    ) -> Vec<Occurrence> {
        let window = DateWindow::starting(from);
        match &task.schedule {
            Schedule::Recurring {
                rule,
                completed_dates,
                skipped_dates,
            } => self
                .expander
                .occurrences(rule, task.created_at, &window, today)
                .filter(|date| !skipped_dates.contains(date))
                .take(count)
                .map(|date| occurrence(task, Some(date), rule.time, completed_dates.contains(&date)))
                .collect(),
            Schedule::Single { .. } => {
                let mut single = self.resolve_task(task, &window, today);
                single.truncate(count);
                single
            }
        }
    }
}

fn occurrence(
    task: &TaskDefinition,
    date: Option<NaiveDate>,
    time: Option<TimeOfDay>,
    done: bool,
) -> Occurrence {
    Occurrence {
        task_id: task.id,
        date,
        time,
        done,
        recurring: task.is_recurring(),
        title: task.display_title().to_string(),
        list: task.list_name().to_string(),
        difficulty: task.difficulty,
        importance: task.importance,
        created_at: task.created_at,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MemoKey {
    version: u64,
    window: DateWindow,
    today: NaiveDate,
}

/// Caches the last resolve, keyed on snapshot version, window and today.
///
/// A new snapshot or a different window simply recomputes; nothing is
/// patched in place.
#[derive(Debug, Default)]
pub struct MemoizedResolver {
    resolver: OccurrenceResolver,
    cached: Option<(MemoKey, Arc<ResolvedOccurrences>)>,
}

impl MemoizedResolver {
    pub fn new(resolver: OccurrenceResolver) -> Self {
        Self {
            resolver,
            cached: None,
        }
    }

    pub fn resolve(
        &mut self,
        snapshot: &TaskSnapshot,
        window: &DateWindow,
        today: NaiveDate,
    ) -> Arc<ResolvedOccurrences> {
        let key = MemoKey {
            version: snapshot.version(),
            window: *window,
            today,
        };
        if let Some((cached_key, resolved)) = &self.cached {
            if *cached_key == key {
                return Arc::clone(resolved);
            }
        }
        let resolved = Arc::new(self.resolver.resolve(snapshot.items(), window, today));
        self.cached = Some((key, Arc::clone(&resolved)));
        resolved
    }
}
