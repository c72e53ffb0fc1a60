pub mod calendar;
pub mod table;

use chrono::{Duration, NaiveDate};
use chrono_humanize::HumanTime;
use comfy_table::Color;

/// "today", "tomorrow", "in 3 days", "2 weeks ago".
pub fn relative_day(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        days => HumanTime::from(Duration::days(days)).to_string(),
    }
}

/// RGB components of a stored `#rrggbb` / `#rgb` list color.
pub fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

pub fn table_color(color: &str) -> Option<Color> {
    hex_rgb(color).map(|(r, g, b)| Color::Rgb { r, g, b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[rstest]
    #[case("2024-01-10", "today")]
    #[case("2024-01-11", "tomorrow")]
    #[case("2024-01-09", "yesterday")]
    fn test_relative_day_names(#[case] date: &str, #[case] expected: &str) {
        assert_eq!(relative_day(d(date), d("2024-01-10")), expected);
    }

    #[test]
    fn test_relative_day_humanizes_distance() {
        assert!(relative_day(d("2024-01-13"), d("2024-01-10")).contains("days"));
    }

    #[rstest]
    #[case("#3b82f6", Some((0x3b, 0x82, 0xf6)))]
    #[case("#fff", Some((255, 255, 255)))]
    #[case("3b82f6", None)]
    #[case("#12345", None)]
    fn test_hex_rgb(#[case] input: &str, #[case] expected: Option<(u8, u8, u8)>) {
        assert_eq!(hex_rgb(input), expected);
    }
}
