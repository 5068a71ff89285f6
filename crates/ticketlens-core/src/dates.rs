//! Date normalizer: best-effort parsing of a heterogeneous date column.
//!
//! Each cell goes through a day-first heuristic first; cells it cannot read
//! are retried against [`FALLBACK_FORMATS`] in order. Whatever is still
//! unreadable, or lies after the normalizer's clock, becomes `None`. Nothing
//! in here fails.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, warn};

/// Explicit formats tried, in order, for cells the heuristic rejects.
pub const FALLBACK_FORMATS: &[&str] = &[
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Source of the "now" upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Host local time, read on every call.
    Local,
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::Local => chrono::Local::now().naive_local(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Column-level date parser bounded above by a [`Clock`].
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    clock: Clock,
}

impl DateNormalizer {
    /// Normalizer that rejects anything after `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            clock: Clock::Fixed(now),
        }
    }

    /// Normalizer bounded by the host's local time at each call.
    pub fn local_now() -> Self {
        Self { clock: Clock::Local }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Parse a whole column. Output has the same length as the input.
    pub fn normalize_column(&self, column: &[Option<&str>]) -> Vec<Option<NaiveDateTime>> {
        let now = self.clock.now();
        let mut parsed: Vec<Option<NaiveDateTime>> = column
            .iter()
            .map(|cell| cell.and_then(parse_day_first))
            .collect();
        let heuristic_hits = parsed.iter().filter(|p| p.is_some()).count();

        let mut fallback_hits = 0usize;
        for (slot, cell) in parsed.iter_mut().zip(column) {
            if slot.is_none() {
                if let Some(raw) = cell {
                    *slot = parse_with_formats(raw);
                    fallback_hits += usize::from(slot.is_some());
                }
            }
        }

        let mut future = 0usize;
        for slot in parsed.iter_mut() {
            if slot.is_some_and(|d| d > now) {
                *slot = None;
                future += 1;
            }
        }

        let unresolved = column
            .iter()
            .zip(&parsed)
            .filter(|(cell, p)| p.is_none() && cell.is_some_and(|c| !c.trim().is_empty()))
            .count();

        debug!(heuristic_hits, fallback_hits, future, "date column parsed");
        if unresolved > 0 {
            warn!(unresolved, rows = column.len(), "unreadable dates left empty");
        }

        parsed
    }

    /// Parse one cell with both strategies and the clock bound applied.
    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        parse_day_first(raw)
            .or_else(|| parse_with_formats(raw))
            .filter(|d| *d <= self.clock.now())
    }
}

// ---------------------------------------------------------------------------
// Heuristic
// ---------------------------------------------------------------------------

/// Day-first heuristic for `D-M-Y`, `Y-M-D` and `M-D-Y` shaped cells with an
/// optional `H:M[:S[.f]]` time separated by a space or `T`.
///
/// Separators may be `-`, `/` or `.`, but must be consistent within the date.
/// A four-digit first token means year-first. Otherwise day-first is
/// assumed, swapping day and month only when day-first cannot be a real date.
pub fn parse_day_first(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let (date_part, time_part) = match s.find([' ', 'T']) {
        Some(i) => (&s[..i], Some(s[i + 1..].trim())),
        None => (s, None),
    };

    let sep = date_part.chars().find(|c| matches!(c, '-' | '/' | '.'))?;
    let parts: Vec<&str> = date_part.split(sep).collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || p.len() > 4 || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    let nums: Vec<u32> = parts.iter().map(|p| p.parse().ok()).collect::<Option<_>>()?;

    let date = if parts[0].len() == 4 {
        NaiveDate::from_ymd_opt(nums[0] as i32, nums[1], nums[2])?
    } else {
        let year = match parts[2].len() {
            4 => nums[2] as i32,
            2 => expand_two_digit_year(nums[2]),
            _ => return None,
        };
        NaiveDate::from_ymd_opt(year, nums[1], nums[0])
            .or_else(|| NaiveDate::from_ymd_opt(year, nums[0], nums[1]))?
    };

    let time = match time_part {
        None | Some("") => NaiveTime::from_hms_opt(0, 0, 0)?,
        Some(t) => parse_clock(t)?,
    };

    Some(date.and_time(time))
}

fn expand_two_digit_year(yy: u32) -> i32 {
    if yy <= 68 {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    }
}

fn parse_clock(t: &str) -> Option<NaiveTime> {
    let fields: Vec<&str> = t.split(':').collect();
    let (hour, minute, second) = match fields.as_slice() {
        [h, m] => (*h, *m, "0"),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };

    let (second, fraction) = second.split_once('.').unwrap_or((second, ""));
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nanos = if fraction.is_empty() {
        0
    } else {
        // Right-pad to nanosecond precision, dropping anything finer.
        let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
        digits.parse().ok()?
    };

    NaiveTime::from_hms_nano_opt(hour.parse().ok()?, minute.parse().ok()?, second.parse().ok()?, nanos)
}

// ---------------------------------------------------------------------------
// Explicit formats
// ---------------------------------------------------------------------------

/// First format in [`FALLBACK_FORMATS`] that matches the trimmed cell exactly.
pub fn parse_with_formats(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    FALLBACK_FORMATS.iter().find_map(|fmt| {
        if fmt.contains("%H") {
            NaiveDateTime::parse_from_str(s, fmt).ok()
        } else {
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn clock() -> DateNormalizer {
        DateNormalizer::new(at(2026, 1, 1, 0, 0, 0))
    }

    #[rstest]
    #[case::dash_with_time("01-03-2024 10:00", at(2024, 3, 1, 10, 0, 0))]
    #[case::slash_date_only("15/03/2024", at(2024, 3, 15, 0, 0, 0))]
    #[case::iso_space("2024-04-02 09:00:30", at(2024, 4, 2, 9, 0, 30))]
    #[case::iso_t("2024-03-01T10:00:00", at(2024, 3, 1, 10, 0, 0))]
    #[case::month_first_when_forced("03/15/2024", at(2024, 3, 15, 0, 0, 0))]
    #[case::dotted_short_year("01.03.24", at(2024, 3, 1, 0, 0, 0))]
    #[case::unpadded(" 1-3-2024 8:05 ", at(2024, 3, 1, 8, 5, 0))]
    fn heuristic_reads(#[case] raw: &str, #[case] expected: NaiveDateTime) {
        assert_eq!(parse_day_first(raw), Some(expected));
    }

    #[test]
    fn heuristic_keeps_fraction() {
        let parsed = parse_day_first("2024-03-01 10:00:05.25").unwrap();
        assert_eq!(parsed.and_utc().timestamp_subsec_millis(), 250);
    }

    #[rstest]
    #[case("not-a-date")]
    #[case("")]
    #[case("   ")]
    #[case("%d-%m-%Y %H:%M")]
    #[case("32-13-2024")]
    #[case("01-03/2024")]
    #[case("01-03-2024 25:00")]
    #[case("2024-03")]
    #[case("12345-01-01")]
    fn rejects(#[case] raw: &str) {
        assert_eq!(clock().parse(raw), None);
    }

    #[test]
    fn fallback_order_is_day_first() {
        assert_eq!(parse_with_formats("01/02/2024"), Some(at(2024, 2, 1, 0, 0, 0)));
        assert_eq!(parse_with_formats("13/02/2024 07:30"), Some(at(2024, 2, 13, 7, 30, 0)));
        assert_eq!(parse_with_formats("02/13/2024"), Some(at(2024, 2, 13, 0, 0, 0)));
        assert_eq!(parse_with_formats("garbage"), None);
    }

    #[test]
    fn local_clock_is_read_per_call() {
        let dates = DateNormalizer::local_now();
        assert_eq!(dates.clock(), Clock::Local);
        std::thread::sleep(std::time::Duration::from_millis(1100));

        let recent = (chrono::Local::now().naive_local() - chrono::Duration::seconds(1))
            .format("%d-%m-%Y %H:%M:%S")
            .to_string();
        assert!(dates.normalize_column(&[Some(recent.as_str())])[0].is_some());
        assert!(dates.parse(&recent).is_some());
    }

    #[test]
    fn column_keeps_positions_and_drops_future() {
        let column = [
            Some("01-03-2024 10:00"),
            None,
            Some("not-a-date"),
            Some("01-01-2099"),
            Some("2024-04-02"),
        ];
        let parsed = clock().normalize_column(&column);
        assert_eq!(
            parsed,
            vec![
                Some(at(2024, 3, 1, 10, 0, 0)),
                None,
                None,
                None,
                Some(at(2024, 4, 2, 0, 0, 0)),
            ]
        );
    }
}
