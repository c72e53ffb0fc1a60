use cadence_core::calendar::{add_days, add_interval, parse_iso_date, to_iso_date, DateWindow};
use cadence_core::models::{
    Difficulty, Importance, RecurrenceEnd, RecurrenceRule, RecurrenceUnit, Schedule, TaskDefinition,
};
use cadence_core::recurrence::RecurrenceExpander;
use cadence_core::resolver::OccurrenceResolver;
use chrono::{Datelike, DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeSet;
use uuid::Uuid;

fn unit_strategy() -> impl Strategy<Value = RecurrenceUnit> {
    prop_oneof![
        Just(RecurrenceUnit::Day),
        Just(RecurrenceUnit::Week),
        Just(RecurrenceUnit::Month),
        Just(RecurrenceUnit::Year),
    ]
}

/// Dates with a day-of-month that exists in every month.
fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2018i32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Any day, including month ends that roll over.
fn any_day_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..6000).prop_map(|offset| add_days(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(), offset))
}

fn end_strategy() -> impl Strategy<Value = (u8, u32)> {
    (0u8..3, 1u32..40)
}

fn build_rule(every: u32, unit: RecurrenceUnit, starts: NaiveDate, end: (u8, u32)) -> RecurrenceRule {
    let ends = match end.0 {
        0 => RecurrenceEnd::Never,
        1 => RecurrenceEnd::After { count: end.1 },
        _ => RecurrenceEnd::On {
            date: add_days(starts, i64::from(end.1) * 20),
        },
    };
    RecurrenceRule::new(every, unit, starts, ends).unwrap()
}

fn window(start: NaiveDate, len: i64) -> DateWindow {
    DateWindow::new(start, add_days(start, len)).unwrap()
}

fn created(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(10, 0, 0).unwrap())
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    i64::from(to.year() - from.year()) * 12 + i64::from(to.month()) - i64::from(from.month())
}

proptest! {
    #[test]
    fn prop_output_is_sorted_and_unique(
        every in 1u32..6,
        unit in unit_strategy(),
        starts in any_day_strategy(),
        end in end_strategy(),
        window_start in any_day_strategy(),
        len in 0i64..900,
    ) {
        let rule = build_rule(every, unit, starts, end);
        let dates = RecurrenceExpander::with_defaults().expand(
            &rule,
            created(starts),
            &window(window_start, len),
            window_start,
        );
        prop_assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn prop_consecutive_dates_are_one_step_apart(
        every in 1u32..6,
        unit in unit_strategy(),
        starts in any_day_strategy(),
        end in end_strategy(),
        len in 0i64..900,
    ) {
        let rule = build_rule(every, unit, starts, end);
        let dates = RecurrenceExpander::with_defaults().expand(
            &rule,
            created(starts),
            &window(starts, len),
            starts,
        );
        if let Some(first) = dates.first() {
            prop_assert_eq!(*first, starts);
        }
        for pair in dates.windows(2) {
            prop_assert_eq!(add_interval(pair[0], every, unit), Some(pair[1]));
        }
    }

    #[test]
    fn prop_dates_are_whole_multiples_of_the_interval(
        every in 1u32..6,
        unit in unit_strategy(),
        starts in date_strategy(),
        window_start in date_strategy(),
        len in 0i64..900,
    ) {
        let rule = build_rule(every, unit, starts, (0, 1));
        let dates = RecurrenceExpander::with_defaults().expand(
            &rule,
            created(starts),
            &window(window_start, len),
            window_start,
        );
        for date in dates {
            let k = match unit {
                RecurrenceUnit::Day => (date - starts).num_days(),
                RecurrenceUnit::Week => {
                    prop_assert_eq!((date - starts).num_days() % 7, 0);
                    (date - starts).num_days() / 7
                }
                RecurrenceUnit::Month => {
                    prop_assert_eq!(date.day(), starts.day());
                    months_between(starts, date)
                }
                RecurrenceUnit::Year => {
                    prop_assert_eq!((date.month(), date.day()), (starts.month(), starts.day()));
                    i64::from(date.year() - starts.year())
                }
            };
            prop_assert!(k >= 0);
            prop_assert_eq!(k % i64::from(every), 0);
        }
    }

    #[test]
    fn prop_expansion_is_idempotent(
        every in 1u32..6,
        unit in unit_strategy(),
        starts in any_day_strategy(),
        end in end_strategy(),
        window_start in any_day_strategy(),
        len in 0i64..900,
    ) {
        let expander = RecurrenceExpander::with_defaults();
        let rule = build_rule(every, unit, starts, end);
        let w = window(window_start, len);
        let first = expander.expand(&rule, created(starts), &w, window_start);
        let second = expander.expand(&rule, created(starts), &w, window_start);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_widening_the_window_never_removes_dates(
        every in 1u32..6,
        unit in unit_strategy(),
        starts in any_day_strategy(),
        end in end_strategy(),
        window_start in any_day_strategy(),
        len in 0i64..400,
        grow_before in 0i64..200,
        grow_after in 0i64..200,
    ) {
        let expander = RecurrenceExpander::with_defaults();
        let rule = build_rule(every, unit, starts, end);
        let narrow = window(window_start, len);
        let wide = DateWindow::new(
            add_days(window_start, -grow_before),
            add_days(window_start, len + grow_after),
        ).unwrap();

        let narrow_dates = expander.expand(&rule, created(starts), &narrow, window_start);
        let wide_dates: BTreeSet<NaiveDate> = expander
            .expand(&rule, created(starts), &wide, window_start)
            .into_iter()
            .collect();
        for date in &narrow_dates {
            prop_assert!(wide_dates.contains(date));
        }
        for date in wide_dates.iter().filter(|date| !narrow_dates.contains(*date)) {
            prop_assert!(!narrow.contains(*date));
        }
    }

    #[test]
    fn prop_skip_dominates_completion(
        every in 1u32..4,
        unit in unit_strategy(),
        starts in date_strategy(),
        pick in 0usize..10,
    ) {
        let rule = build_rule(every, unit, starts, (1, 10));
        let w = window(starts, 5000);
        let dates = RecurrenceExpander::with_defaults().expand(&rule, created(starts), &w, starts);
        let target = dates[pick % dates.len()];

        let both: BTreeSet<NaiveDate> = [target].into_iter().collect();
        let task = TaskDefinition {
            id: Uuid::now_v7(),
            title: None,
            list: None,
            difficulty: Difficulty::default(),
            importance: Importance::default(),
            schedule: Schedule::Recurring {
                rule,
                completed_dates: both.clone(),
                skipped_dates: both,
            },
            created_at: created(starts),
        };
        let resolved = OccurrenceResolver::with_defaults().resolve(&[task], &w, starts);
        prop_assert!(resolved.iter().all(|occurrence| occurrence.date != Some(target)));
        prop_assert!(resolved.iter().all(|occurrence| !occurrence.done));
        prop_assert_eq!(resolved.len(), dates.len() - 1);
    }

    #[test]
    fn prop_iso_date_round_trip(days in -700_000i64..700_000) {
        let date = add_days(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), days);
        prop_assert_eq!(parse_iso_date(&to_iso_date(date)).unwrap(), date);
    }
}
