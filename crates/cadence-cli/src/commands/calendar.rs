use anyhow::Result;
use cadence_core::calendar::{month_grid, to_iso_date, DateWindow};
use cadence_core::store::TaskStore;
use owo_colors::OwoColorize;

use super::Context;
use crate::cli::{AgendaCommand, MonthCommand, WeekCommand};
use crate::views::calendar::{display_days, display_month};

pub async fn show_week(store: &impl TaskStore, command: WeekCommand, ctx: &Context) -> Result<()> {
    let anchor = ctx.parse_optional_date(command.date.as_deref())?.unwrap_or(ctx.today);
    let window = DateWindow::week_of(anchor, ctx.config.calendar.week_starts_monday);
    let tasks = store.tasks();
    let resolved = ctx.resolver.resolve(tasks.items(), &window, ctx.today);

    let days = window.days().unwrap_or_default();
    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        println!(
            "{}\n",
            format!("Week of {} to {}", to_iso_date(*first), to_iso_date(*last)).bold()
        );
    }
    display_days(&days, &resolved, ctx.today, true);
    Ok(())
}

pub async fn show_month(store: &impl TaskStore, command: MonthCommand, ctx: &Context) -> Result<()> {
    let anchor = ctx.parse_optional_date(command.date.as_deref())?.unwrap_or(ctx.today);
    let week_starts_monday = ctx.config.calendar.week_starts_monday;
    let grid = month_grid(anchor, week_starts_monday);
    let tasks = store.tasks();

    // The page shows a few days of the neighbouring months too.
    let page = match (grid.first(), grid.last()) {
        (Some(first), Some(last)) => DateWindow::new(*first, *last)?,
        _ => DateWindow::month_of(anchor),
    };
    let resolved = ctx.resolver.resolve(tasks.items(), &page, ctx.today);
    display_month(anchor, &grid, &resolved, ctx.today, week_starts_monday);

    let month = DateWindow::month_of(anchor);
    let month_days = month.days().unwrap_or_default();
    let scheduled = resolved
        .iter()
        .filter(|occurrence| occurrence.date.is_some_and(|date| month.contains(date)))
        .count();
    if scheduled > 0 {
        println!();
        display_days(&month_days, &resolved, ctx.today, false);
    }
    Ok(())
}

pub async fn show_agenda(store: &impl TaskStore, command: AgendaCommand, ctx: &Context) -> Result<()> {
    let from = ctx.parse_optional_date(command.from.as_deref())?.unwrap_or(ctx.today);
    let to = ctx.parse_optional_date(command.to.as_deref())?.unwrap_or(from);
    let window = DateWindow::new(from, to)?;
    let tasks = store.tasks();
    let resolved = ctx.resolver.resolve(tasks.items(), &window, ctx.today);

    if resolved.is_empty() {
        println!(
            "Nothing scheduled from {} to {}.",
            to_iso_date(from),
            to_iso_date(to)
        );
        return Ok(());
    }
    display_days(&window.days().unwrap_or_default(), &resolved, ctx.today, false);
    Ok(())
}
