use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::calendar::DateWindow;
use crate::models::{ListDefinition, Occurrence, Schedule, TaskDefinition, DEFAULT_LIST};
use crate::resolver::OccurrenceResolver;

/// A task on the board with what the resolver says about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    pub task: TaskDefinition,
    /// First occurrence on or after today that is not done. Single tasks
    /// carry their own date when still open.
    pub next_open: Option<NaiveDate>,
}

/// One column of the list board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardColumn {
    pub name: String,
    pub color: Option<String>,
    pub entries: Vec<BoardEntry>,
}

/// Groups tasks by list from an unbounded resolve.
///
/// Column order is the default list first, then stored lists in creation
/// order, then names only referenced by tasks, alphabetically. A single
/// task whose occurrence is done is left out unless `include_done` is set;
/// a series is always shown. Within a column tasks are ordered by date
/// (a series by its start, undated last), newest first on ties.
pub fn build_board(
    resolver: &OccurrenceResolver,
    tasks: &[TaskDefinition],
    lists: &[ListDefinition],
    today: NaiveDate,
    include_done: bool,
) -> Vec<BoardColumn> {
    let resolved = resolver.resolve(tasks, &DateWindow::unbounded(), today);
    let mut by_task: HashMap<Uuid, Vec<&Occurrence>> = HashMap::new();
    for occurrence in &resolved {
        by_task.entry(occurrence.task_id).or_default().push(occurrence);
    }

    let mut names: Vec<&str> = vec![DEFAULT_LIST];
    names.extend(lists.iter().map(|list| list.name.as_str()));
    let mut extra: Vec<&str> = tasks.iter().map(TaskDefinition::list_name).collect();
    extra.sort_unstable();
    names.extend(extra);
    let mut seen = HashSet::new();
    names.retain(|name| seen.insert(*name));

    let mut columns: Vec<BoardColumn> = names
        .into_iter()
        .map(|name| BoardColumn {
            name: name.to_string(),
            color: lists
                .iter()
                .find(|list| list.name == name)
                .and_then(|list| list.color.clone()),
            entries: Vec::new(),
        })
        .collect();

    for task in tasks {
        let occurrences = by_task.get(&task.id).map(Vec::as_slice).unwrap_or_default();
        let entry = match &task.schedule {
            Schedule::Recurring { .. } => BoardEntry {
                task: task.clone(),
                next_open: occurrences
                    .iter()
                    .filter(|o| !o.done)
                    .filter_map(|o| o.date)
                    .find(|date| *date >= today),
            },
            Schedule::Single { .. } => {
                let Some(occurrence) = occurrences.first() else {
                    continue;
                };
                if occurrence.done && !include_done {
                    continue;
                }
                BoardEntry {
                    task: task.clone(),
                    next_open: occurrence.date.filter(|_| !occurrence.done),
                }
            }
        };
        if let Some(column) = columns.iter_mut().find(|c| c.name == task.list_name()) {
            column.entries.push(entry);
        }
    }
    for column in &mut columns {
        column.entries.sort_by(|a, b| compare_board_tasks(&a.task, &b.task));
    }
    columns
}

fn board_date(task: &TaskDefinition) -> Option<NaiveDate> {
    match &task.schedule {
        Schedule::Single { date, .. } => *date,
        Schedule::Recurring { rule, .. } => Some(rule.starts),
    }
}

fn compare_board_tasks(a: &TaskDefinition, b: &TaskDefinition) -> Ordering {
    match (board_date(a), board_date(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.created_at.cmp(&a.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_iso_date;
    use crate::models::{Difficulty, Importance, RecurrenceEnd, RecurrenceRule, RecurrenceUnit, TaskStatus};
    use std::collections::BTreeSet;
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap()
    }

    fn task(title: &str, list: Option<&str>, date: Option<&str>, status: TaskStatus, created: u32) -> TaskDefinition {
        TaskDefinition {
            id: Uuid::now_v7(),
            title: Some(title.to_string()),
            list: list.map(str::to_string),
            difficulty: Difficulty::Medium,
            importance: Importance::Medium,
            schedule: Schedule::Single {
                date: date.map(|s| parse_iso_date(s).unwrap()),
                time: None,
                status,
                completed_at: None,
            },
            created_at: at(created),
        }
    }

    fn list(name: &str, created: u32) -> ListDefinition {
        ListDefinition {
            id: Uuid::now_v7(),
            name: name.to_string(),
            color: Some("#ff0000".to_string()),
            created_at: at(created),
        }
    }

    fn today() -> NaiveDate {
        parse_iso_date("2024-01-10").unwrap()
    }

    fn board_for(tasks: &[TaskDefinition], lists: &[ListDefinition], include_done: bool) -> Vec<BoardColumn> {
        build_board(&OccurrenceResolver::with_defaults(), tasks, lists, today(), include_done)
    }

    fn weekly(title: &str, completed: &[&str], skipped: &[&str]) -> TaskDefinition {
        let dates = |list: &[&str]| list.iter().map(|s| parse_iso_date(s).unwrap()).collect::<BTreeSet<_>>();
        TaskDefinition {
            id: Uuid::now_v7(),
            title: Some(title.to_string()),
            list: None,
            difficulty: Difficulty::Medium,
            importance: Importance::Medium,
            schedule: Schedule::Recurring {
                rule: RecurrenceRule::new(
                    1,
                    RecurrenceUnit::Week,
                    parse_iso_date("2024-01-01").unwrap(),
                    RecurrenceEnd::Never,
                )
                .unwrap(),
                completed_dates: dates(completed),
                skipped_dates: dates(skipped),
            },
            created_at: at(1),
        }
    }

    #[test]
    fn test_column_order() {
        let tasks = vec![
            task("a", Some("Zeta"), None, TaskStatus::Active, 1),
            task("b", Some("Alpha"), None, TaskStatus::Active, 1),
            task("c", None, None, TaskStatus::Active, 1),
        ];
        let lists = vec![list("Work", 1), list("Home", 2)];
        let names: Vec<String> = board_for(&tasks, &lists, false)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Inbox", "Work", "Home", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_done_tasks_hidden_by_default() {
        let tasks = vec![
            task("open", None, None, TaskStatus::Active, 1),
            task("finished", None, None, TaskStatus::Done, 2),
        ];
        let board = board_for(&tasks, &[], false);
        assert_eq!(board[0].entries.len(), 1);
        let board = board_for(&tasks, &[], true);
        assert_eq!(board[0].entries.len(), 2);
    }

    #[test]
    fn test_tasks_sorted_by_date_then_newest() {
        let tasks = vec![
            task("undated", None, None, TaskStatus::Active, 5),
            task("later", None, Some("2024-03-01"), TaskStatus::Active, 1),
            task("sooner old", None, Some("2024-02-01"), TaskStatus::Active, 1),
            task("sooner new", None, Some("2024-02-01"), TaskStatus::Active, 3),
        ];
        let board = board_for(&tasks, &[], false);
        let titles: Vec<&str> = board[0].entries.iter().map(|e| e.task.display_title()).collect();
        assert_eq!(titles, vec!["sooner new", "sooner old", "later", "undated"]);
    }

    #[test]
    fn test_column_color_comes_from_list() {
        let board = board_for(&[], &[list("Work", 1)], false);
        assert_eq!(board[1].color.as_deref(), Some("#ff0000"));
        assert_eq!(board[0].color, None);
    }

    #[test]
    fn test_series_next_open_comes_from_resolved_occurrences() {
        let tasks = vec![
            weekly("plain", &[], &[]),
            weekly("busy", &["2024-01-15"], &["2024-01-22"]),
        ];
        let board = board_for(&tasks, &[], false);
        let next: Vec<(&str, Option<String>)> = board[0]
            .entries
            .iter()
            .map(|e| (e.task.display_title(), e.next_open.map(crate::calendar::to_iso_date)))
            .collect();
        assert!(next.contains(&("plain", Some("2024-01-15".to_string()))));
        assert!(next.contains(&("busy", Some("2024-01-29".to_string()))));
    }

    #[test]
    fn test_single_task_next_open_is_its_date_until_done() {
        let tasks = vec![
            task("open", None, Some("2024-01-12"), TaskStatus::Active, 1),
            task("finished", None, Some("2024-01-11"), TaskStatus::Done, 1),
        ];
        let board = board_for(&tasks, &[], true);
        let entries = &board[0].entries;
        assert_eq!(entries[0].task.display_title(), "finished");
        assert_eq!(entries[0].next_open, None);
        assert_eq!(entries[1].next_open, parse_iso_date("2024-01-12").ok());
    }
}
