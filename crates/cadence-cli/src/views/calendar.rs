use cadence_core::calendar::to_iso_date;
use cadence_core::models::{Occurrence, DEFAULT_LIST};
use cadence_core::resolver::ResolvedOccurrences;
use chrono::{Datelike, NaiveDate};
use owo_colors::{OwoColorize, Style};

use super::relative_day;
use crate::util::short_id;

/// Prints `days` in order, each followed by its occurrences.
///
/// Days without occurrences are printed only when `show_empty` is set.
pub fn display_days(days: &[NaiveDate], resolved: &ResolvedOccurrences, today: NaiveDate, show_empty: bool) {
    let by_day = resolved.by_day();
    for day in days {
        let entries = by_day.get(day).map(Vec::as_slice).unwrap_or_default();
        if entries.is_empty() && !show_empty {
            continue;
        }
        print_day_header(*day, today);
        if entries.is_empty() {
            println!("  {}", "-".bright_black());
        }
        for occurrence in entries {
            println!("  {}", occurrence_line(occurrence));
        }
    }
}

fn print_day_header(day: NaiveDate, today: NaiveDate) {
    let label = format!("{} {}", day.format("%a"), to_iso_date(day));
    if day == today {
        println!("{} {}", label.cyan().bold(), "(today)".cyan());
    } else {
        println!("{} {}", label.bold(), relative_day(day, today).bright_black());
    }
}

fn occurrence_line(occurrence: &Occurrence) -> String {
    let check = if occurrence.done { "[x]" } else { "[ ]" };
    let time = occurrence
        .time
        .map(|time| time.to_string())
        .unwrap_or_else(|| "     ".to_string());
    let mut title = occurrence.title.clone();
    if occurrence.recurring {
        title.push_str(" ↻");
    }
    let title = if occurrence.done {
        title.strikethrough().bright_black().to_string()
    } else {
        title
    };
    let list = if occurrence.list == DEFAULT_LIST {
        String::new()
    } else {
        format!(" · {}", occurrence.list)
    };
    format!(
        "{} {}  {}{}  {}",
        check,
        time,
        title,
        list.bright_black(),
        format!("[{}]", short_id(occurrence.task_id)).yellow()
    )
}

/// Prints a six-week month page. Days with open occurrences carry a `•`,
/// days whose occurrences are all done a `✓`.
pub fn display_month(
    anchor: NaiveDate,
    grid: &[NaiveDate],
    resolved: &ResolvedOccurrences,
    today: NaiveDate,
    week_starts_monday: bool,
) {
    let by_day = resolved.by_day();
    println!("{}", anchor.format("%B %Y").to_string().bold());

    let weekdays = if week_starts_monday {
        ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]
    } else {
        ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
    };
    let header: Vec<String> = weekdays.iter().map(|day| format!("{:>3} ", day)).collect();
    println!("{}", header.concat().bright_black());

    for week in grid.chunks(7) {
        let cells: Vec<String> = week
            .iter()
            .map(|day| {
                let marker = match by_day.get(day) {
                    Some(entries) if entries.iter().any(|o| !o.done) => "•",
                    Some(_) => "✓",
                    None => " ",
                };
                let cell = format!("{:>3}{}", day.day(), marker);
                let style = if *day == today {
                    Style::new().cyan().bold().reversed()
                } else if day.month() != anchor.month() {
                    Style::new().bright_black()
                } else {
                    Style::new()
                };
                cell.style(style).to_string()
            })
            .collect();
        println!("{}", cells.concat());
    }
}
