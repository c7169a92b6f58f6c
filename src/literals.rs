//! Literal parsers for the Forthic interpreter
//!
//! When a word token resolves to nothing in the module stack, the
//! interpreter consults its literal pipeline: an ordered list of handlers,
//! tried last-registered first, each mapping a bareword to a typed value.
//!
//! Standard literal forms:
//! - Boolean: `TRUE`, `FALSE`
//! - Integer: `42`, `-10`
//! - Float: `3.14`, `-2.5`, `.5`
//! - Time: `9:00`, `22:15:30`, `11:30 PM` (direct API; in source, AM/PM are
//!   separate words handled by the datetime module)
//! - Date: `2024-06-05`, with `YYYY`/`MM`/`DD` wildcards resolved against
//!   today in the interpreter's timezone
//! - Zoned datetime: `2024-06-05T10:15:00Z`, `...+05:30`,
//!   `...[Europe/London]`, or naive (interpreter timezone)

use crate::values::Value;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::rc::Rc;
use std::sync::OnceLock;

/// A literal handler maps a bareword to a value, or declines with `None`.
///
/// Handlers never observe the stack and never mutate interpreter state.
pub type LiteralHandler = Rc<dyn Fn(&str) -> Option<Value>>;

fn int_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+$").unwrap())
}

fn float_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?(?:\d+\.\d*|\.\d+)$").unwrap())
}

fn time_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*(AM|PM))?$").unwrap())
}

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4}|YYYY)-(\d{2}|MM)-(\d{2}|DD)$").unwrap())
}

fn offset_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[+-]\d{2}:\d{2}$").unwrap())
}

/// Parse boolean literals: the exact texts TRUE and FALSE
pub fn to_bool(s: &str) -> Option<Value> {
    match s {
        "TRUE" => Some(Value::Bool(true)),
        "FALSE" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Parse integer literals: optional sign, digits
pub fn to_int(s: &str) -> Option<Value> {
    if !int_pattern().is_match(s) {
        return None;
    }
    s.parse::<i64>().ok().map(Value::Int)
}

/// Parse float literals. A decimal point is required; `.5` is accepted.
pub fn to_float(s: &str) -> Option<Value> {
    if !float_pattern().is_match(s) {
        return None;
    }
    s.parse::<f64>().ok().map(Value::Float)
}

/// Parse time literals: `HH:MM`, `HH:MM:SS`, optionally `AM`/`PM` suffixed
pub fn to_time(s: &str) -> Option<Value> {
    let caps = time_pattern().captures(s)?;

    let mut hours: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: u32 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: u32 = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    match caps.get(4).map(|m| m.as_str()) {
        Some("PM") if hours < 12 => hours += 12,
        Some("AM") if hours == 12 => hours = 0,
        _ => {}
    }

    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    NaiveTime::from_hms_opt(hours, minutes, seconds).map(Value::Time)
}

/// Date literal parser: `YYYY-MM-DD` numeric, with any of the year, month,
/// and day groups replaceable by the literal `YYYY`/`MM`/`DD` wildcards,
/// which resolve against today in the given timezone.
pub fn literal_date(timezone: String) -> impl Fn(&str) -> Option<Value> {
    move |s: &str| {
        let caps = date_pattern().captures(s)?;

        let tz: Tz = timezone.parse().ok()?;
        let today = Utc::now().with_timezone(&tz).date_naive();

        let year = match caps.get(1)?.as_str() {
            "YYYY" => today.year(),
            y => y.parse().ok()?,
        };
        let month = match caps.get(2)?.as_str() {
            "MM" => today.month(),
            m => m.parse().ok()?,
        };
        let day = match caps.get(3)?.as_str() {
            "DD" => today.day(),
            d => d.parse().ok()?,
        };

        NaiveDate::from_ymd_opt(year, month, day).map(Value::Date)
    }
}

/// Zoned datetime literal parser: ISO 8601 with `Z`, a `±HH:MM` offset, a
/// bracketed IANA zone, or nothing (interpreted in the given timezone).
/// Offset+zone combinations are re-expressed in the bracketed zone, so the
/// zone's wall clock wins in the result.
pub fn zoned_datetime(timezone: String) -> impl Fn(&str) -> Option<Value> {
    move |s: &str| {
        if !s.contains('T') {
            return None;
        }

        if let Some(idx) = s.find('[') {
            if !s.ends_with(']') {
                return None;
            }
            let zone: Tz = s[idx + 1..s.len() - 1].parse().ok()?;
            return parse_datetime_in_zone(&s[..idx], &zone);
        }

        let tz: Tz = timezone.parse().ok()?;
        parse_datetime_in_zone(s, &tz)
    }
}

fn parse_datetime_in_zone(s: &str, tz: &Tz) -> Option<Value> {
    if s.ends_with('Z') || offset_pattern().is_match(s) {
        let dt = DateTime::parse_from_rfc3339(s).ok()?;
        return Some(Value::DateTime(dt.with_timezone(tz)));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()?;

    // Earliest interpretation on DST-ambiguous wall clocks
    tz.from_local_datetime(&naive).earliest().map(Value::DateTime)
}
