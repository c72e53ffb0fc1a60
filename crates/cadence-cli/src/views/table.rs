use std::collections::HashMap;

use cadence_core::board::{BoardColumn, BoardEntry};
use cadence_core::calendar::to_iso_date;
use cadence_core::models::{
    Difficulty, Importance, ListDefinition, Occurrence, Schedule, TaskStatus, DEFAULT_LIST,
};
use chrono::NaiveDate;
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use owo_colors::OwoColorize;

use super::{hex_rgb, relative_day, table_color};
use crate::util::short_id;

fn importance_cell(importance: Importance) -> Cell {
    let cell = Cell::new(importance.to_string());
    match importance {
        Importance::High => cell.fg(Color::Red).add_attribute(Attribute::Bold),
        Importance::Medium => cell.fg(Color::Yellow),
        Importance::Low => cell.fg(Color::Green),
    }
}

fn difficulty_cell(difficulty: Difficulty) -> Cell {
    let cell = Cell::new(difficulty.to_string());
    match difficulty {
        Difficulty::Hard => cell.add_attribute(Attribute::Bold),
        Difficulty::Medium => cell,
        Difficulty::Easy => cell.fg(Color::DarkGrey),
    }
}

/// Prints one table per list column.
pub fn display_board(columns: &[BoardColumn], today: NaiveDate) {
    for (index, column) in columns.iter().enumerate() {
        if index > 0 {
            println!();
        }
        let heading = format!("{} ({})", column.name, column.entries.len());
        match column.color.as_deref().and_then(hex_rgb) {
            Some((r, g, b)) => println!("{} {}", "■".truecolor(r, g, b), heading.bold()),
            None => println!("■ {}", heading.bold()),
        }

        if column.entries.is_empty() {
            println!("  {}", "No tasks.".bright_black());
            continue;
        }

        let mut table = Table::new();
        table.set_header(vec!["ID", "Task", "When", "Repeats", "Difficulty", "Importance"]);
        for entry in &column.entries {
            table.add_row(board_row(entry, today));
        }
        println!("{table}");
    }
}

fn board_row(entry: &BoardEntry, today: NaiveDate) -> Row {
    let task = &entry.task;
    let mut row = Row::new();
    row.add_cell(Cell::new(short_id(task.id)));

    let (title, when, repeats) = match &task.schedule {
        Schedule::Recurring { rule, .. } => {
            let when = match entry.next_open {
                Some(date) => format!("next {}", when_label(date, rule.time.map(|t| t.to_string()), today)),
                None => "no upcoming".to_string(),
            };
            (format!("↻ {}", task.display_title()), when, rule.to_string())
        }
        Schedule::Single { date, time, .. } => {
            let when = date
                .map(|date| when_label(date, time.map(|t| t.to_string()), today))
                .unwrap_or_else(|| "-".to_string());
            (task.display_title().to_string(), when, String::new())
        }
    };

    let mut title_cell = Cell::new(title);
    if let Schedule::Single {
        status: TaskStatus::Done,
        ..
    } = task.schedule
    {
        title_cell = title_cell.add_attribute(Attribute::CrossedOut).fg(Color::DarkGrey);
    }
    row.add_cell(title_cell);

    let mut when_cell = Cell::new(when);
    if let Schedule::Single {
        date: Some(date),
        status: TaskStatus::Active,
        ..
    } = task.schedule
    {
        if date < today {
            when_cell = when_cell.fg(Color::Red);
        } else if date == today {
            when_cell = when_cell.fg(Color::Yellow);
        }
    }
    row.add_cell(when_cell);
    row.add_cell(Cell::new(repeats).fg(Color::Cyan));
    row.add_cell(difficulty_cell(task.difficulty));
    row.add_cell(importance_cell(task.importance));
    row
}

fn when_label(date: NaiveDate, time: Option<String>, today: NaiveDate) -> String {
    match time {
        Some(time) => format!("{} {} ({})", to_iso_date(date), time, relative_day(date, today)),
        None => format!("{} ({})", to_iso_date(date), relative_day(date, today)),
    }
}

/// Upcoming occurrences of one series.
pub fn display_preview(occurrences: &[Occurrence], today: NaiveDate) {
    if occurrences.is_empty() {
        println!("No upcoming occurrences.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Day", "When", "Time", "Status"]);
    for (index, occurrence) in occurrences.iter().enumerate() {
        let mut row = Row::new();
        row.add_cell(Cell::new(index + 1));
        match occurrence.date {
            Some(date) => {
                row.add_cell(Cell::new(to_iso_date(date)));
                row.add_cell(Cell::new(date.format("%a")));
                row.add_cell(Cell::new(relative_day(date, today)));
            }
            None => {
                row.add_cell(Cell::new("-"));
                row.add_cell(Cell::new(""));
                row.add_cell(Cell::new(""));
            }
        }
        row.add_cell(Cell::new(occurrence.time.map(|t| t.to_string()).unwrap_or_default()));
        row.add_cell(if occurrence.done {
            Cell::new("done").fg(Color::Green)
        } else {
            Cell::new("open")
        });
        table.add_row(row);
    }
    println!("{table}");
}

/// Stored lists with their task counts. `counts` is keyed by list name.
pub fn display_lists(lists: &[ListDefinition], counts: &HashMap<&str, usize>) {
    let mut table = Table::new();
    table.set_header(vec!["Name", "Color", "Tasks", "Created"]);

    let mut inbox = Row::new();
    inbox.add_cell(Cell::new(DEFAULT_LIST).add_attribute(Attribute::Bold));
    inbox.add_cell(Cell::new("-"));
    inbox.add_cell(Cell::new(counts.get(DEFAULT_LIST).copied().unwrap_or(0)));
    inbox.add_cell(Cell::new("-"));
    table.add_row(inbox);

    for list in lists.iter().filter(|list| list.name != DEFAULT_LIST) {
        let mut row = Row::new();
        row.add_cell(Cell::new(&list.name));
        let color_cell = match list.color.as_deref() {
            Some(color) => {
                let cell = Cell::new(color);
                match table_color(color) {
                    Some(fg) => cell.fg(fg),
                    None => cell,
                }
            }
            None => Cell::new("-"),
        };
        row.add_cell(color_cell);
        row.add_cell(Cell::new(counts.get(list.name.as_str()).copied().unwrap_or(0)));
        row.add_cell(Cell::new(list.created_at.humanize()));
        table.add_row(row);
    }

    println!("{table}");
}
