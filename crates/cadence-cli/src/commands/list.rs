use anyhow::Result;
use cadence_core::board::build_board;
use cadence_core::store::TaskStore;

use super::Context;
use crate::cli::ListCommand;
use crate::views::table::display_board;

pub async fn show_board(store: &impl TaskStore, command: ListCommand, ctx: &Context) -> Result<()> {
    let tasks = store.tasks();
    let lists = store.lists();
    let columns = build_board(&ctx.resolver, tasks.items(), lists.items(), ctx.today, command.all);
    display_board(&columns, ctx.today);
    Ok(())
}
