use cadence_core::calendar::parse_iso_date;
use cadence_core::models::{Difficulty, Importance, RecurrenceUnit, TimeOfDay};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Cadence: a calendar of one-off and recurring tasks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_iso_arg)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_iso_arg(s: &str) -> Result<NaiveDate, String> {
    parse_iso_date(s).map_err(|e| e.to_string())
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new task
    Add(AddCommand),
    /// Show the week calendar
    Week(WeekCommand),
    /// Show a month at a glance
    Month(MonthCommand),
    /// List occurrences day by day over a date range
    Agenda(AgendaCommand),
    /// Show tasks grouped by list
    List(ListCommand),
    /// Mark a task or one occurrence as done
    Done(OccurrenceCommand),
    /// Mark a task or one occurrence as not done
    Undo(OccurrenceCommand),
    /// Hide one occurrence of a recurring task
    Skip(SkipCommand),
    /// Delete a task (a recurring task is deleted with all its occurrences)
    Delete(DeleteCommand),
    /// Edit a task
    Edit(EditCommand),
    /// Inspect recurring tasks
    Recur(RecurrenceCommand),
    /// Manage lists
    Lists(ListsCommand),
}

/// Options describing a recurrence rule.
#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    /// Repeat unit (day, week, month, year)
    #[arg(long)]
    pub repeat: Option<RecurrenceUnit>,
    /// Repeat every N units
    #[arg(long, requires = "repeat")]
    pub every: Option<u32>,
    /// First occurrence (defaults to the task date, then today)
    #[arg(long, requires = "repeat")]
    pub starts: Option<String>,
    /// Last possible occurrence date
    #[arg(long, requires = "repeat", conflicts_with = "count")]
    pub until: Option<String>,
    /// Number of occurrences
    #[arg(long, requires = "repeat")]
    pub count: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// The list to put the task in
    #[arg(short, long)]
    pub list: Option<String>,
    /// The date of the task (e.g. 2024-01-08, "tomorrow", "next friday")
    #[arg(short, long)]
    pub date: Option<String>,
    /// Time of day (HH:MM)
    #[arg(short, long)]
    pub time: Option<TimeOfDay>,
    #[arg(long)]
    pub difficulty: Option<Difficulty>,
    #[arg(long)]
    pub importance: Option<Importance>,
    #[command(flatten)]
    pub rule: RuleArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct WeekCommand {
    /// Any date inside the week to show
    #[arg(short, long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct MonthCommand {
    /// Any date inside the month to show
    #[arg(short, long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AgendaCommand {
    /// First day (defaults to today)
    #[arg(long)]
    pub from: Option<String>,
    /// Last day (defaults to the first day)
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Include finished tasks
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct OccurrenceCommand {
    /// The ID (or unique ID prefix) of the task
    pub id: String,
    /// Occurrence date of a recurring task (defaults to today)
    #[arg(long)]
    pub on: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SkipCommand {
    /// The ID (or unique ID prefix) of the recurring task
    pub id: String,
    /// The occurrence date to hide
    #[arg(long)]
    pub on: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID (or unique ID prefix) of the task
    pub id: String,
    /// Delete without asking for confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID (or unique ID prefix) of the task
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    /// Move the task to another list ("Inbox" for the default list)
    #[arg(short, long)]
    pub list: Option<String>,

    #[arg(long)]
    pub difficulty: Option<Difficulty>,
    #[arg(long)]
    pub importance: Option<Importance>,

    #[arg(short, long)]
    pub date: Option<String>,
    #[arg(long, conflicts_with = "date")]
    pub date_clear: bool,

    #[arg(short, long)]
    pub time: Option<TimeOfDay>,
    #[arg(long, conflicts_with = "time")]
    pub time_clear: bool,

    #[command(flatten)]
    pub rule: RuleArgs,
    /// Remove the recurrence (convert to a one-time task)
    #[arg(long, conflicts_with = "repeat")]
    pub repeat_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RecurrenceCommand {
    #[command(subcommand)]
    pub command: RecurrenceSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecurrenceSubcommand {
    /// Show the rule and exception dates of a recurring task
    Info(RecurrenceInfoCommand),
    /// Show the next occurrences of a recurring task
    Preview(RecurrencePreviewCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct RecurrenceInfoCommand {
    /// The ID (or unique ID prefix) of the task
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RecurrencePreviewCommand {
    /// The ID (or unique ID prefix) of the task
    pub id: String,
    /// Start from this date (defaults to today)
    #[arg(long)]
    pub from: Option<String>,
    /// Number of occurrences to show
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct ListsCommand {
    #[command(subcommand)]
    pub command: ListsSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListsSubcommand {
    /// Create a list
    Add { name: String },
    /// Rename a list and move its tasks along
    Rename { old_name: String, new_name: String },
    /// Set or clear the color of a list
    Color {
        name: String,
        /// Hex color such as #3b82f6; omit to clear
        color: Option<String>,
    },
    /// Delete a list and all of its tasks
    Delete {
        name: String,
        #[arg(short, long)]
        force: bool,
    },
    /// Show all lists
    Show,
}
