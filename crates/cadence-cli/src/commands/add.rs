use anyhow::Result;
use cadence_core::calendar::to_iso_date;
use cadence_core::models::{NewTask, DEFAULT_LIST};
use cadence_core::store::TaskStore;
use owo_colors::{OwoColorize, Style};

use super::{build_rule, Context};
use crate::cli::AddCommand;
use crate::util::short_id;

pub async fn add_task(store: &impl TaskStore, command: AddCommand, ctx: &Context) -> Result<()> {
    let date = ctx.parse_optional_date(command.date.as_deref())?;
    let recurrence = build_rule(&command.rule, date.unwrap_or(ctx.today), ctx)?
        .map(|rule| rule.with_time(command.time));

    let new_task = NewTask {
        title: command.title,
        list: command.list,
        difficulty: command.difficulty,
        importance: command.importance,
        date,
        time: command.time,
        recurrence,
    };
    let task = store.create_task(new_task).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    let id = short_id(task.id);

    match task.schedule.rule() {
        Some(rule) => {
            println!(
                "{} Created recurring task: {}",
                "✓".style(success_style),
                task.display_title().bright_white().bold()
            );
            println!("  {} Task ID: [{}]", "→".style(info_style), id.yellow());
            println!(
                "  {} {} starting {}",
                "→".style(info_style),
                rule,
                to_iso_date(rule.starts).cyan()
            );
            println!(
                "  {} Preview upcoming: cadence recur preview {}",
                "→".style(info_style),
                id.yellow()
            );
        }
        None => {
            println!(
                "{} Created task: {}",
                "✓".style(success_style),
                task.display_title().bright_white().bold()
            );
            println!("  {} Task ID: [{}]", "→".style(info_style), id.yellow());
            if let Some(date) = date {
                let when = match command.time {
                    Some(time) => format!("{} {}", to_iso_date(date), time),
                    None => to_iso_date(date),
                };
                println!("  {} Date: {}", "→".style(info_style), when.cyan());
            }
        }
    }
    if task.list_name() != DEFAULT_LIST {
        println!("  {} List: {}", "→".style(info_style), task.list_name());
    }

    Ok(())
}
