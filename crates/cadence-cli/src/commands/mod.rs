pub mod add;
pub mod calendar;
pub mod edit;
pub mod list;
pub mod lists;
pub mod occurrence;
pub mod recurrence;

use anyhow::Result;
use cadence_core::models::{RecurrenceEnd, RecurrenceRule};
use cadence_core::resolver::OccurrenceResolver;
use chrono::NaiveDate;

use crate::cli::RuleArgs;
use crate::config::Config;
use crate::parser::{parse_date, parse_optional_date};

/// Everything a command needs besides the store.
pub struct Context {
    pub config: Config,
    pub today: NaiveDate,
    pub resolver: OccurrenceResolver,
}

impl Context {
    pub fn new(config: Config, today: NaiveDate) -> Self {
        let resolver = OccurrenceResolver::new(config.expansion.clone());
        Self {
            config,
            today,
            resolver,
        }
    }

    pub fn parse_date(&self, input: &str) -> Result<NaiveDate> {
        parse_date(input, self.today)
    }

    pub fn parse_optional_date(&self, input: Option<&str>) -> Result<Option<NaiveDate>> {
        parse_optional_date(input, self.today)
    }
}

/// Builds the rule described by `--repeat` and friends, if any.
///
/// `default_start` is used when `--starts` is not given.
pub fn build_rule(
    args: &RuleArgs,
    default_start: NaiveDate,
    ctx: &Context,
) -> Result<Option<RecurrenceRule>> {
    let Some(unit) = args.repeat else {
        return Ok(None);
    };
    let starts = ctx
        .parse_optional_date(args.starts.as_deref())?
        .unwrap_or(default_start);
    let ends = match (&args.until, args.count) {
        (Some(until), _) => RecurrenceEnd::On {
            date: ctx.parse_date(until)?,
        },
        (None, Some(count)) => RecurrenceEnd::After { count },
        (None, None) => RecurrenceEnd::Never,
    };
    let rule = RecurrenceRule::new(args.every.unwrap_or(1), unit, starts, ends)?;
    Ok(Some(rule))
}
