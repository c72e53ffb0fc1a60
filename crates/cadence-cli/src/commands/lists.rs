use std::collections::HashMap;

use anyhow::Result;
use cadence_core::store::TaskStore;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};

use crate::cli::{ListsCommand, ListsSubcommand};
use crate::views::table::display_lists;

pub async fn lists_command(store: &impl TaskStore, command: ListsCommand) -> Result<()> {
    let success_style = Style::new().green().bold();
    match command.command {
        ListsSubcommand::Add { name } => {
            let list = store.create_list(&name).await?;
            println!("{} Created list: {}", "✓".style(success_style), list.name.bold());
        }
        ListsSubcommand::Rename { old_name, new_name } => {
            let moved = store.rename_list(&old_name, &new_name).await?;
            println!(
                "{} Renamed list '{}' to '{}' ({} task{} moved)",
                "✓".style(success_style),
                old_name,
                new_name.trim().bold(),
                moved,
                if moved == 1 { "" } else { "s" }
            );
        }
        ListsSubcommand::Color { name, color } => {
            let list = store.set_list_color(&name, color).await?;
            match list.color {
                Some(color) => println!("{} List '{}' is now {}", "✓".style(success_style), list.name, color),
                None => println!("{} Cleared the color of list '{}'", "✓".style(success_style), list.name),
            }
        }
        ListsSubcommand::Delete { name, force } => {
            if !force {
                let confirmation = Confirm::new()
                    .with_prompt(format!(
                        "Delete list '{}' and all of its tasks? This cannot be undone.",
                        name
                    ))
                    .default(false)
                    .interact()
                    .unwrap_or(false);

                if !confirmation {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }
            let removed = store.delete_list(&name).await?;
            println!(
                "{} Deleted list '{}' and {} task{}",
                "✓".style(success_style),
                name,
                removed,
                if removed == 1 { "" } else { "s" }
            );
        }
        ListsSubcommand::Show => {
            let tasks = store.tasks();
            let lists = store.lists();
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for task in tasks.items() {
                *counts.entry(task.list_name()).or_default() += 1;
            }
            display_lists(lists.items(), &counts);
        }
    }
    Ok(())
}
