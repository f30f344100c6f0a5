// Shoot folder names: YYYY-MM-DD_Name or YYYY-MM-DD_to_YYYY-MM-DD_Name

use std::sync::OnceLock;
use chrono::NaiveDate;
use regex::Regex;
use crate::constants::{SHOOT_DATE_FORMAT, SHOOT_RANGE_JOINER};

/// Date range and suffix parsed out of a shoot folder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredShoot {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub suffix: String,
}

impl DeclaredShoot {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date_in_range(date, self.start, self.end)
    }
}

/// Parse a shoot name into its declared date range.
/// Returns None when the name carries no leading date.
pub fn parse_shoot_date_range(shoot_name: &str) -> Option<DeclaredShoot> {
    if let Some(caps) = range_regex()?.captures(shoot_name) {
        let start = parse_date(caps.get(1)?.as_str());
        let end = parse_date(caps.get(2)?.as_str());
        if let (Some(start), Some(end)) = (start, end) {
            return Some(DeclaredShoot {
                start,
                end,
                suffix: caps.get(3)?.as_str().to_string(),
            });
        }
    }

    let caps = single_regex()?.captures(shoot_name)?;
    let date = parse_date(caps.get(1)?.as_str())?;
    Some(DeclaredShoot {
        start: date,
        end: date,
        suffix: caps.get(2)?.as_str().to_string(),
    })
}

fn range_regex() -> Option<&'static Regex> {
    static RANGE: OnceLock<Option<Regex>> = OnceLock::new();
    RANGE
        .get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})_to_(\d{4}-\d{2}-\d{2})_(.+)$").ok())
        .as_ref()
}

fn single_regex() -> Option<&'static Regex> {
    static SINGLE: OnceLock<Option<Regex>> = OnceLock::new();
    SINGLE
        .get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})_(.+)$").ok())
        .as_ref()
}

/// `2025-09-15` for a single day, `2025-09-15_to_2025-09-17` for a range
pub fn format_date_label(start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        start.format(SHOOT_DATE_FORMAT).to_string()
    } else {
        format!(
            "{}{}{}",
            start.format(SHOOT_DATE_FORMAT),
            SHOOT_RANGE_JOINER,
            end.format(SHOOT_DATE_FORMAT)
        )
    }
}

/// Build a shoot folder name from a date range and an optional suffix
pub fn format_shoot_name(start: NaiveDate, end: NaiveDate, suffix: Option<&str>) -> String {
    let label = format_date_label(start, end);
    match suffix {
        Some(s) if !s.is_empty() => format!("{}_{}", label, s),
        _ => label,
    }
}

/// Inclusive date range check
pub fn date_in_range(check: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= check && check <= end
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, SHOOT_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_single_date() {
        let parsed = parse_shoot_date_range("2025-09-15_Stockholm_Broll").unwrap();
        assert_eq!(parsed.start, d(2025, 9, 15));
        assert_eq!(parsed.end, d(2025, 9, 15));
        assert_eq!(parsed.suffix, "Stockholm_Broll");
    }

    #[test]
    fn test_parse_date_range() {
        let parsed = parse_shoot_date_range("2025-09-15_to_2025-09-17_Trip").unwrap();
        assert_eq!(parsed.start, d(2025, 9, 15));
        assert_eq!(parsed.end, d(2025, 9, 17));
        assert_eq!(parsed.suffix, "Trip");
        assert!(parsed.contains(d(2025, 9, 16)));
        assert!(!parsed.contains(d(2025, 9, 18)));
    }

    #[test]
    fn test_parse_rejects_undated_and_invalid() {
        assert!(parse_shoot_date_range("Stockholm").is_none());
        assert!(parse_shoot_date_range("2025-09-15").is_none());
        assert!(parse_shoot_date_range("2025-13-40_Bad").is_none());
    }

    #[test]
    fn test_patterns_compile_once_and_are_reused() {
        let first = range_regex().unwrap() as *const Regex;
        assert_eq!(parse_shoot_date_range("2025-09-15_Trip").unwrap().suffix, "Trip");
        assert_eq!(parse_shoot_date_range("2025-09-16_Trip").unwrap().start, d(2025, 9, 16));
        assert!(std::ptr::eq(first, range_regex().unwrap()));
        assert!(std::ptr::eq(single_regex().unwrap(), single_regex().unwrap()));
    }

    #[test]
    fn test_format_shoot_name() {
        assert_eq!(format_shoot_name(d(2025, 9, 15), d(2025, 9, 15), Some("Trip")), "2025-09-15_Trip");
        assert_eq!(
            format_shoot_name(d(2025, 9, 15), d(2025, 9, 17), Some("Trip")),
            "2025-09-15_to_2025-09-17_Trip"
        );
        assert_eq!(format_shoot_name(d(2025, 9, 15), d(2025, 9, 15), None), "2025-09-15");
        assert_eq!(format_shoot_name(d(2025, 9, 15), d(2025, 9, 15), Some("")), "2025-09-15");
    }
}
