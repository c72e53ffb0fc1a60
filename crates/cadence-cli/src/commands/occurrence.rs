use anyhow::Result;
use cadence_core::calendar::{to_iso_date, DateWindow};
use cadence_core::error::CoreError;
use cadence_core::models::TaskDefinition;
use cadence_core::mutation::{delete_occurrence, delete_series, delete_task, toggle_occurrence_done};
use cadence_core::store::TaskStore;
use chrono::{NaiveDate, Utc};
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};

use super::Context;
use crate::cli::{DeleteCommand, OccurrenceCommand, SkipCommand};
use crate::util::resolve_task;

/// Fails unless `date` is a visible occurrence of the series `task`.
fn ensure_occurrence(ctx: &Context, task: &TaskDefinition, date: NaiveDate) -> Result<()> {
    let window = DateWindow::new(date, date)?;
    if ctx.resolver.resolve_task(task, &window, ctx.today).is_empty() {
        return Err(CoreError::InvalidInput(format!(
            "'{}' has no occurrence on {}",
            task.display_title(),
            to_iso_date(date)
        ))
        .into());
    }
    Ok(())
}

/// Marks a single task, or one occurrence of a series, done or not done.
pub async fn set_done(
    store: &impl TaskStore,
    command: OccurrenceCommand,
    ctx: &Context,
    done: bool,
) -> Result<()> {
    let task = resolve_task(&store.tasks(), &command.id)?;
    let date = if task.is_recurring() {
        let date = ctx.parse_optional_date(command.on.as_deref())?.unwrap_or(ctx.today);
        ensure_occurrence(ctx, &task, date)?;
        Some(date)
    } else {
        None
    };

    let mutation = toggle_occurrence_done(&task, date, done, Utc::now())?;
    store.apply(mutation).await?;

    let occurrence = date
        .map(|date| format!(" on {}", to_iso_date(date)))
        .unwrap_or_default();
    if done {
        println!(
            "{} Completed: {}{}",
            "✓".style(Style::new().green().bold()),
            task.display_title().bright_white().bold(),
            occurrence
        );
    } else {
        println!(
            "{} Reopened: {}{}",
            "↺".style(Style::new().yellow().bold()),
            task.display_title().bright_white().bold(),
            occurrence
        );
    }
    Ok(())
}

/// Hides one occurrence of a series.
pub async fn skip(store: &impl TaskStore, command: SkipCommand, ctx: &Context) -> Result<()> {
    let task = resolve_task(&store.tasks(), &command.id)?;
    let date = ctx.parse_date(&command.on)?;
    if task.is_recurring() {
        ensure_occurrence(ctx, &task, date)?;
    }
    let mutation = delete_occurrence(&task, date)?;
    store.apply(mutation).await?;

    println!(
        "{} Skipped {} on {}",
        "✓".style(Style::new().green().bold()),
        task.display_title().bright_white().bold(),
        to_iso_date(date).cyan()
    );
    Ok(())
}

pub async fn delete(store: &impl TaskStore, command: DeleteCommand) -> Result<()> {
    let task = resolve_task(&store.tasks(), &command.id)?;

    if !command.force {
        let prompt = if task.is_recurring() {
            format!(
                "Delete recurring task '{}' and all of its occurrences?",
                task.display_title()
            )
        } else {
            format!("Are you sure you want to delete task '{}'?", task.display_title())
        };
        let confirmation = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let mutation = if task.is_recurring() {
        delete_series(&task)?
    } else {
        delete_task(&task)
    };
    store.apply(mutation).await?;

    println!(
        "{} Deleted task: {}",
        "✓".style(Style::new().green().bold()),
        task.display_title()
    );
    Ok(())
}
