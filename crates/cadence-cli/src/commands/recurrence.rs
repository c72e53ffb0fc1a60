use std::collections::BTreeSet;

use anyhow::Result;
use cadence_core::calendar::to_iso_date;
use cadence_core::error::CoreError;
use cadence_core::models::{RecurrenceRule, Schedule, TaskDefinition};
use cadence_core::store::TaskStore;
use chrono::NaiveDate;
use owo_colors::{OwoColorize, Style};

use super::Context;
use crate::cli::{RecurrenceCommand, RecurrencePreviewCommand, RecurrenceSubcommand};
use crate::util::{resolve_task, short_id};
use crate::views::table::display_preview;

pub async fn recurrence_command(store: &impl TaskStore, command: RecurrenceCommand, ctx: &Context) -> Result<()> {
    match command.command {
        RecurrenceSubcommand::Info(info) => show_info(store, &info.id, ctx),
        RecurrenceSubcommand::Preview(preview) => show_preview(store, preview, ctx),
    }
}

struct Series<'a> {
    rule: &'a RecurrenceRule,
    completed: &'a BTreeSet<NaiveDate>,
    skipped: &'a BTreeSet<NaiveDate>,
}

fn series(task: &TaskDefinition) -> Result<Series<'_>> {
    match &task.schedule {
        Schedule::Recurring {
            rule,
            completed_dates,
            skipped_dates,
        } => Ok(Series {
            rule,
            completed: completed_dates,
            skipped: skipped_dates,
        }),
        Schedule::Single { .. } => Err(CoreError::InvalidInput(format!(
            "'{}' is not a recurring task",
            task.display_title()
        ))
        .into()),
    }
}

fn format_dates(dates: &BTreeSet<NaiveDate>) -> String {
    if dates.is_empty() {
        return "none".to_string();
    }
    dates.iter().map(|date| to_iso_date(*date)).collect::<Vec<_>>().join(", ")
}

fn show_info(store: &impl TaskStore, id: &str, ctx: &Context) -> Result<()> {
    let task = resolve_task(&store.tasks(), id)?;
    let series = series(&task)?;
    let label = Style::new().bold();

    println!(
        "{} {} [{}]",
        "↻".cyan(),
        task.display_title().bright_white().bold(),
        short_id(task.id).yellow()
    );
    println!("  {} {}", "Rule:".style(label), series.rule.to_string().cyan());
    println!("  {} {}", "Starts:".style(label), to_iso_date(series.rule.starts));
    if let Some(time) = series.rule.time {
        println!("  {} {}", "Time:".style(label), time);
    }
    println!("  {} {}", "List:".style(label), task.list_name());

    let next = ctx
        .resolver
        .preview(&task, ctx.today, ctx.today, 1)
        .into_iter()
        .find_map(|occurrence| occurrence.date);
    match next {
        Some(date) => println!("  {} {}", "Next:".style(label), to_iso_date(date)),
        None => println!("  {} {}", "Next:".style(label), "no upcoming occurrences".bright_black()),
    }
    println!("  {} {}", "Completed:".style(label), format_dates(series.completed));
    println!("  {} {}", "Skipped:".style(label), format_dates(series.skipped));
    Ok(())
}

fn show_preview(store: &impl TaskStore, command: RecurrencePreviewCommand, ctx: &Context) -> Result<()> {
    let task = resolve_task(&store.tasks(), &command.id)?;
    let series = series(&task)?;
    let from = ctx.parse_optional_date(command.from.as_deref())?.unwrap_or(ctx.today);

    println!(
        "{} {} ({})\n",
        "↻".cyan(),
        task.display_title().bright_white().bold(),
        series.rule
    );
    let occurrences = ctx.resolver.preview(&task, from, ctx.today, command.count);
    display_preview(&occurrences, ctx.today);
    Ok(())
}
