//! Human-readable durations
//!
//! Durations are written as a sequence of decimal numbers, each with an
//! optional fraction and a unit suffix, such as `30s`, `1.5h` or `2h45m`.
//! Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Errors from parsing a duration string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("negative duration {0:?} is not allowed")]
    Negative(String),

    #[error("duration {0:?} is out of range")]
    Overflow(String),
}

/// A non-negative span of time, read from and written as a duration string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(StdDuration);

impl Duration {
    pub const ZERO: Duration = Duration(StdDuration::ZERO);

    pub const fn from_secs(secs: u64) -> Self {
        Self(StdDuration::from_secs(secs))
    }

    pub const fn from_mins(mins: u64) -> Self {
        Self::from_secs(mins * 60)
    }

    pub const fn from_hours(hours: u64) -> Self {
        Self::from_secs(hours * 3600)
    }

    pub const fn as_std(&self) -> StdDuration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<StdDuration> for Duration {
    fn from(value: StdDuration) -> Self {
        Self(value)
    }
}

impl From<Duration> for StdDuration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(Self)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let nanos = self.0.subsec_nanos();

        if secs == 0 {
            return match nanos {
                0 => f.write_str("0s"),
                n if n % 1_000_000 == 0 => write!(f, "{}ms", n / 1_000_000),
                n if n % 1_000 == 0 => write!(f, "{}us", n / 1_000),
                n => write!(f, "{n}ns"),
            };
        }

        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        let mut out = String::new();
        if hours > 0 {
            let _ = write!(out, "{hours}h");
        }
        if hours > 0 || minutes > 0 {
            let _ = write!(out, "{minutes}m");
        }
        let _ = write!(out, "{seconds}");
        if nanos > 0 {
            let fraction = format!("{nanos:09}");
            let _ = write!(out, ".{}", fraction.trim_end_matches('0'));
        }
        out.push('s');
        f.write_str(&out)
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a duration string into a [`std::time::Duration`]
///
/// A leading sign is accepted, but any negative non-zero value is rejected.
pub fn parse_duration(input: &str) -> Result<StdDuration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());
    let overflow = || DurationError::Overflow(input.to_string());

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(StdDuration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after) = rest.split_at(int_len);
        let (frac_part, after) = match after.strip_prefix('.') {
            Some(tail) => tail.split_at(tail.bytes().take_while(u8::is_ascii_digit).count()),
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        let unit_nanos: u128 = match unit {
            "" => return Err(DurationError::MissingUnit(input.to_string())),
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3600 * NANOS_PER_SEC,
            other => {
                return Err(DurationError::UnknownUnit {
                    unit: other.to_string(),
                    input: input.to_string(),
                });
            }
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut value = whole.checked_mul(unit_nanos).ok_or_else(overflow)?;

        if !frac_part.is_empty() {
            // Digits beyond nanosecond precision of the largest unit cannot matter.
            let digits = &frac_part[..frac_part.len().min(18)];
            let fraction: u128 = digits.parse().map_err(|_| invalid())?;
            value += fraction * unit_nanos / 10u128.pow(digits.len() as u32);
        }

        total = total.checked_add(value).ok_or_else(overflow)?;
        rest = after;
    }

    if negative && total > 0 {
        return Err(DurationError::Negative(input.to_string()));
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| overflow())?;
    let nanos = (total % NANOS_PER_SEC) as u32;
    Ok(StdDuration::new(secs, nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", StdDuration::ZERO)]
    #[case("10s", StdDuration::from_secs(10))]
    #[case("1m", StdDuration::from_secs(60))]
    #[case("24h", StdDuration::from_secs(86_400))]
    #[case("1.5h", StdDuration::from_secs(5_400))]
    #[case("2h45m", StdDuration::from_secs(9_900))]
    #[case("300ms", StdDuration::from_millis(300))]
    #[case("15us", StdDuration::from_micros(15))]
    #[case("15µs", StdDuration::from_micros(15))]
    #[case("7ns", StdDuration::from_nanos(7))]
    #[case(".5s", StdDuration::from_millis(500))]
    #[case("+5s", StdDuration::from_secs(5))]
    #[case("-0", StdDuration::ZERO)]
    fn test_parse_valid(#[case] input: &str, #[case] expected: StdDuration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case(".s")]
    #[case("-")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(matches!(
            parse_duration(input),
            Err(DurationError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_missing_unit() {
        assert_eq!(
            parse_duration("10"),
            Err(DurationError::MissingUnit("10".into()))
        );
    }

    #[test]
    fn test_parse_unknown_unit() {
        assert!(matches!(
            parse_duration("3d"),
            Err(DurationError::UnknownUnit { unit, .. }) if unit == "d"
        ));
    }

    #[test]
    fn test_parse_negative_rejected() {
        assert_eq!(
            parse_duration("-5m"),
            Err(DurationError::Negative("-5m".into()))
        );
    }

    #[rstest]
    #[case(Duration::ZERO, "0s")]
    #[case(Duration::from_secs(10), "10s")]
    #[case(Duration::from_secs(90), "1m30s")]
    #[case(Duration::from_hours(24), "24h0m0s")]
    #[case(Duration::from(StdDuration::from_millis(1500)), "1.5s")]
    #[case(Duration::from(StdDuration::from_millis(250)), "250ms")]
    fn test_display(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(duration.to_string(), expected);
        assert_eq!(expected.parse::<Duration>().unwrap(), duration);
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let parsed: Duration = serde_yaml::from_str("\"2h\"").unwrap();
        assert_eq!(parsed, Duration::from_hours(2));

        let err = serde_yaml::from_str::<Duration>("\"soon\"").unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
    }
}
