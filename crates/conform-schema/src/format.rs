//! # String Formats
//!
//! Named string predicates for the `format` keyword. The built-in set
//! covers the formats product schemas actually use; callers can register
//! more through [`KeywordRegistry::register_format`](crate::KeywordRegistry::register_format).
//!
//! Formats only constrain strings. Non-string values pass.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime};

type FormatFn = dyn Fn(&str) -> bool + Send + Sync;

/// A named string predicate.
#[derive(Clone)]
pub struct FormatDefinition {
    check: Arc<FormatFn>,
}

impl FormatDefinition {
    /// Wrap a predicate.
    pub fn new(check: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            check: Arc::new(check),
        }
    }

    /// Whether `s` conforms.
    pub fn is_valid(&self, s: &str) -> bool {
        (self.check)(s)
    }
}

impl fmt::Debug for FormatDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatDefinition").finish_non_exhaustive()
    }
}

/// Names of the built-in formats, sorted.
pub const BUILTIN_FORMATS: &[&str] = &[
    "date",
    "date-time",
    "email",
    "hostname",
    "ipv4",
    "ipv6",
    "regex",
    "time",
    "uri",
    "uuid",
];

/// Resolve a built-in format by name.
pub fn builtin_format(name: &str) -> Option<FormatDefinition> {
    let check: fn(&str) -> bool = match name {
        "date" => is_date,
        "time" => is_time,
        "date-time" => |s| DateTime::parse_from_rfc3339(s).is_ok(),
        "email" => is_email,
        "hostname" => is_hostname,
        "ipv4" => |s| s.parse::<Ipv4Addr>().is_ok(),
        "ipv6" => |s| s.parse::<Ipv6Addr>().is_ok(),
        "uri" => |s| url::Url::parse(s).is_ok(),
        "uuid" => |s| s.len() == 36 && uuid::Uuid::parse_str(s).is_ok(),
        "regex" => |s| regex::Regex::new(s).is_ok(),
        _ => return None,
    };
    Some(FormatDefinition::new(check))
}

/// RFC 3339 `full-date`: exactly `YYYY-MM-DD` and a real calendar day.
fn is_date(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return false;
    }
    let digits = b
        .iter()
        .enumerate()
        .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    digits && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// RFC 3339 `partial-time` with an optional `Z` or `+HH:MM` offset.
fn is_time(s: &str) -> bool {
    let (clock, offset) = if let Some(stripped) = s.strip_suffix(['Z', 'z']) {
        (stripped, None)
    } else if let Some(idx) = s.get(8..).and_then(|rest| rest.find(['+', '-'])) {
        (&s[..idx + 8], Some(&s[idx + 9..]))
    } else {
        (s, None)
    };
    if clock.len() < 8 || NaiveTime::parse_from_str(clock, "%H:%M:%S%.f").is_err() {
        return false;
    }
    match offset {
        None => true,
        Some(off) => {
            let b = off.as_bytes();
            b.len() == 5
                && b[2] == b':'
                && NaiveTime::parse_from_str(&format!("{off}:00"), "%H:%M:%S").is_ok()
        }
    }
}

fn is_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    !s.is_empty()
        && s.len() <= 253
        && s.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    const LOCAL_EXTRA: &str = "!#$%&'*+/=?^_`{|}~.-";
    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LOCAL_EXTRA.contains(c))
        && domain.contains('.')
        && is_hostname(domain)
}
