use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::warn;

use crate::calendar::{add_interval, shift_months, DateWindow};
use crate::models::{RecurrenceEnd, RecurrenceRule, RecurrenceUnit};

/// Policy bounds applied to every expansion so open-ended series terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Occurrences older than this many years before today are never produced.
    pub lookback_years: u32,
    /// Occurrences later than this many years after the task's creation are
    /// never produced.
    pub lookahead_years: u32,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            lookback_years: 1,
            lookahead_years: 2,
        }
    }
}

/// RecurrenceExpander: turns one rule into the dates it produces inside a window.
///
/// Responsibilities:
/// 1. Compute the clamp bounds from the window, the rule's own end, and the
///    lookback/lookahead policy
/// 2. Walk the series from `starts` one step at a time (month and year steps
///    are not a fixed number of days, so there is no shortcut)
/// 3. Never loop forever, even on a malformed rule
///
/// Output is a pure function of the inputs: ascending, duplicate-free, and
/// identical across calls.
#[derive(Debug, Clone, Default)]
pub struct RecurrenceExpander {
    config: ExpansionConfig,
}

impl RecurrenceExpander {
    pub fn new(config: ExpansionConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ExpansionConfig::default())
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    /// Computes the closed range `[lower, upper]` that expansion may emit into.
    ///
    /// # Behavior
    /// - lower = max(window start, rule start, today - lookback)
    /// - upper = min(window end, rule end, creation date + lookahead)
    /// - `None` when the range is empty
    pub fn clamp_bounds(
        &self,
        rule: &RecurrenceRule,
        created_at: DateTime<Utc>,
        window: &DateWindow,
        today: NaiveDate,
    ) -> Option<(NaiveDate, NaiveDate)> {
        let rule = effective_rule(rule);

        let floor = shift_months(today, -i64::from(self.config.lookback_years) * 12)
            .unwrap_or(NaiveDate::MIN);
        let lower = window
            .start()
            .unwrap_or(NaiveDate::MIN)
            .max(rule.starts)
            .max(floor);

        let cap = shift_months(
            created_at.date_naive(),
            i64::from(self.config.lookahead_years) * 12,
        )
        .unwrap_or(NaiveDate::MAX);
        let mut upper = window.end().unwrap_or(NaiveDate::MAX).min(cap);
        match rule.ends {
            RecurrenceEnd::Never => {}
            RecurrenceEnd::On { date } => upper = upper.min(date),
            RecurrenceEnd::After { count } => upper = upper.min(last_counted(&rule, count, upper)),
        }

        (lower <= upper).then_some((lower, upper))
    }

    /// Lazily walks the occurrences of `rule` inside `window`.
    pub fn occurrences(
        &self,
        rule: &RecurrenceRule,
        created_at: DateTime<Utc>,
        window: &DateWindow,
        today: NaiveDate,
    ) -> OccurrenceDates {
        let rule = effective_rule(rule);
        let Some((lower, upper)) = self.clamp_bounds(&rule, created_at, window, today) else {
            return OccurrenceDates::empty(rule.every, rule.unit);
        };

        // Skip forward without emitting until the series reaches the window.
        let mut cur = Some(rule.starts);
        while let Some(date) = cur {
            if date >= lower {
                break;
            }
            cur = add_interval(date, rule.every, rule.unit);
        }

        OccurrenceDates {
            next: cur,
            upper,
            every: rule.every,
            unit: rule.unit,
        }
    }

    /// Every occurrence date of `rule` inside `window`, ascending.
    pub fn expand(
        &self,
        rule: &RecurrenceRule,
        created_at: DateTime<Utc>,
        window: &DateWindow,
        today: NaiveDate,
    ) -> Vec<NaiveDate> {
        self.occurrences(rule, created_at, window, today).collect()
    }
}

/// Iterator over the dates of one series within its clamp bounds.
#[derive(Debug, Clone)]
pub struct OccurrenceDates {
    next: Option<NaiveDate>,
    upper: NaiveDate,
    every: u32,
    unit: RecurrenceUnit,
}

impl OccurrenceDates {
    fn empty(every: u32, unit: RecurrenceUnit) -> Self {
        Self {
            next: None,
            upper: NaiveDate::MIN,
            every,
            unit,
        }
    }
}

impl Iterator for OccurrenceDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let cur = self.next.filter(|date| *date <= self.upper)?;
        self.next = add_interval(cur, self.every, self.unit);
        Some(cur)
    }
}

impl std::iter::FusedIterator for OccurrenceDates {}

fn effective_rule(rule: &RecurrenceRule) -> Cow<'_, RecurrenceRule> {
    let malformed = rule.every < 1 || matches!(rule.ends, RecurrenceEnd::After { count: 0 });
    if malformed {
        warn!(every = rule.every, ends = ?rule.ends, "expanding malformed recurrence rule with clamped values");
        Cow::Owned(rule.sanitized())
    } else {
        Cow::Borrowed(rule)
    }
}

/// Date of the `count`-th occurrence, or `limit` once the walk passes it.
fn last_counted(rule: &RecurrenceRule, count: u32, limit: NaiveDate) -> NaiveDate {
    let mut cur = rule.starts;
    for _ in 1..count {
        match add_interval(cur, rule.every, rule.unit) {
            Some(next) if next <= limit => cur = next,
            _ => return limit,
        }
    }
    cur
}
