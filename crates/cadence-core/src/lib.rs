//! # Cadence Core Library
//!
//! Recurring-task engine: a task stores one recurrence rule plus two small
//! exception sets, and every dated occurrence is derived on demand for the
//! window being looked at. Nothing per-occurrence is ever persisted.
//!
//! ## Core Modules
//!
//! - [`calendar`]: Zone-less date arithmetic and date windows
//! - [`models`]: Rules, task definitions, store documents and occurrences
//! - [`recurrence`]: Clamped expansion of a rule into occurrence dates
//! - [`resolver`]: Merging expansions with completion/skip state for a window
//! - [`mutation`]: Occurrence operations expressed as store patches
//! - [`board`]: Tasks grouped by list
//! - [`store`]: Snapshot-pushing document stores (memory and SQLite)
//! - [`db`]: Database connection and migration management
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     calendar::DateWindow,
//!     models::{NewTask, RecurrenceEnd, RecurrenceRule, RecurrenceUnit},
//!     resolver::OccurrenceResolver,
//!     store::{SqliteStore, TaskStore},
//! };
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SqliteStore::open(std::path::Path::new("cadence.db"), "default").await?;
//!
//!     let starts = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!     let rule = RecurrenceRule::new(1, RecurrenceUnit::Week, starts, RecurrenceEnd::After { count: 3 })?;
//!     store
//!         .create_task(NewTask {
//!             title: "Weekly review".to_string(),
//!             recurrence: Some(rule),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let window = DateWindow::week_of(starts, true);
//!     let resolved = OccurrenceResolver::with_defaults().resolve(store.tasks().items(), &window, starts);
//!     for occurrence in &resolved {
//!         println!("{:?} {}", occurrence.date, occurrence.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod calendar;
pub mod db;
pub mod error;
pub mod models;
pub mod mutation;
pub mod recurrence;
pub mod resolver;
pub mod store;
