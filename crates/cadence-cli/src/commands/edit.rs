use anyhow::{bail, Result};
use cadence_core::models::{Schedule, TaskDefinition, TimeOfDay};
use cadence_core::mutation::{edit_task as build_edit, TaskEdit};
use cadence_core::store::TaskStore;
use chrono::NaiveDate;
use owo_colors::{OwoColorize, Style};

use super::{build_rule, Context};
use crate::cli::EditCommand;
use crate::util::{resolve_task, short_id};

fn current_date(task: &TaskDefinition) -> Option<NaiveDate> {
    match &task.schedule {
        Schedule::Single { date, .. } => *date,
        Schedule::Recurring { rule, .. } => Some(rule.starts),
    }
}

fn current_time(task: &TaskDefinition) -> Option<TimeOfDay> {
    match &task.schedule {
        Schedule::Single { time, .. } => *time,
        Schedule::Recurring { rule, .. } => rule.time,
    }
}

pub async fn edit_task(store: &impl TaskStore, command: EditCommand, ctx: &Context) -> Result<()> {
    let task = resolve_task(&store.tasks(), &command.id)?;

    let date = if command.date_clear {
        Some(None)
    } else {
        ctx.parse_optional_date(command.date.as_deref())?.map(Some)
    };
    let time = if command.time_clear {
        Some(None)
    } else {
        command.time.map(Some)
    };

    let recurrence = if command.repeat_clear {
        Some(None)
    } else {
        let default_start = date
            .flatten()
            .or_else(|| current_date(&task))
            .unwrap_or(ctx.today);
        let rule_time = time.unwrap_or_else(|| current_time(&task));
        build_rule(&command.rule, default_start, ctx)?.map(|rule| Some(rule.with_time(rule_time)))
    };

    let edit = TaskEdit {
        title: command.title,
        list: command.list.map(Some),
        difficulty: command.difficulty,
        importance: command.importance,
        date,
        time,
        recurrence,
    };
    if edit == TaskEdit::default() {
        bail!("Nothing to change. Pass at least one field to edit.");
    }

    let mutation = build_edit(&task, edit)?;
    store.apply(mutation).await?;

    let updated = store
        .tasks()
        .find(task.id)
        .map(|task| task.display_title().to_string())
        .unwrap_or_else(|| task.display_title().to_string());
    println!(
        "{} Updated task: {} [{}]",
        "✓".style(Style::new().green().bold()),
        updated.bright_white().bold(),
        short_id(task.id).yellow()
    );
    Ok(())
}
