//! Day slicer
//!
//! Cuts a day into fixed-length slices and maps calendar days to store keys.
//! Pure date arithmetic; persistence goes through [`Store`].

use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::config::TimesliceConfig;
use crate::error::{Result, TimeslicerError};
use crate::store::Store;
use crate::value::Slices;

/// A day sliced every `interval` from `start` to `end` (both offsets from midnight)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySlicer {
    interval: Duration,
    start: Duration,
    end: Duration,
}

impl DaySlicer {
    /// Build from duration strings such as `30m`, `8h` or `17h30m`
    pub fn new(interval: &str, start: &str, end: &str) -> Result<Self> {
        let interval = parse_duration(interval)?;
        let start = parse_duration(start)?;
        let end = parse_duration(end)?;

        if interval <= Duration::ZERO {
            return Err(TimeslicerError::Config(
                "timeslice interval must be positive".to_string(),
            ));
        }
        if start > end {
            return Err(TimeslicerError::Config(format!(
                "timeslice start {} is after end {}",
                start, end
            )));
        }
        if end > Duration::DAY {
            return Err(TimeslicerError::Config(format!(
                "timeslice end {} is past the end of the day",
                end
            )));
        }

        Ok(Self {
            interval,
            start,
            end,
        })
    }

    pub fn from_config(config: &TimesliceConfig) -> Result<Self> {
        Self::new(&config.interval, &config.start, &config.end)
    }

    /// Slice labels from `start` to `end` inclusive
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        let mut at = self.start;
        while at <= self.end {
            labels.push(label(at));
            at += self.interval;
        }
        labels
    }

    /// Every slice of the day with no activity
    pub fn empty_day(&self) -> Slices {
        self.labels()
            .into_iter()
            .map(|label| (label, String::new()))
            .collect()
    }

    /// The stored slices of `date`, created empty on first access
    pub fn get_or_create<S: Store + ?Sized>(&self, store: &S, date: Date) -> Result<Slices> {
        let key = day_key(date)?;
        let slices = store.get_or_insert(&key, self.empty_day())?;
        tracing::debug!(key = %key, slices = slices.len(), "Loaded day");
        Ok(slices)
    }
}

/// Store key of a calendar day, `YYYY-MM-DD`
pub fn day_key(date: Date) -> Result<String> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|e| TimeslicerError::Serialization(e.to_string()))
}

/// UTC calendar day of a unix timestamp (seconds)
pub fn date_of(timestamp: i64) -> Result<Date> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map(|t| t.date())
        .map_err(|_| TimeslicerError::InvalidTimestamp(timestamp.to_string()))
}

/// `HHhMM` label of an offset from midnight
fn label(offset: Duration) -> String {
    let minutes = offset.whole_minutes();
    format!("{:02}h{:02}", (minutes / 60) % 24, minutes % 60)
}

/// Parse `<number><unit>` groups with units `h`, `m` and `s`, e.g. `17h30m`
pub fn parse_duration(text: &str) -> Result<Duration> {
    let invalid = || TimeslicerError::Config(format!("invalid duration {:?}", text));

    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.is_empty() {
        return Err(invalid());
    }

    let mut total = Duration::ZERO;
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let amount: i64 = digits.parse().map_err(|_| invalid())?;
        total += match c {
            'h' => Duration::hours(amount),
            'm' => Duration::minutes(amount),
            's' => Duration::seconds(amount),
            _ => return Err(invalid()),
        };
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(invalid());
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("8h").unwrap(), Duration::hours(8));
        assert_eq!(
            parse_duration("17h30m").unwrap(),
            Duration::hours(17) + Duration::minutes(30)
        );
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for text in ["", "h", "30", "30x", "1h30", "-1h"] {
            assert!(parse_duration(text).is_err(), "{:?} should not parse", text);
        }
    }

    #[test]
    fn test_labels_are_inclusive() {
        let slicer = DaySlicer::new("30m", "8h", "10h").unwrap();
        assert_eq!(
            slicer.labels(),
            vec!["08h00", "08h30", "09h00", "09h30", "10h00"]
        );
    }

    #[test]
    fn test_labels_with_uneven_interval_stop_before_end() {
        let slicer = DaySlicer::new("45m", "9h", "10h").unwrap();
        assert_eq!(slicer.labels(), vec!["09h00", "09h45"]);
    }

    #[test]
    fn test_empty_day_has_blank_activities() {
        let slicer = DaySlicer::new("1h", "8h", "9h").unwrap();
        let day = slicer.empty_day();

        assert_eq!(day.len(), 2);
        assert!(day.values().all(String::is_empty));
        assert!(day.contains_key("08h00"));
    }

    #[test]
    fn test_invalid_slicers_rejected() {
        assert!(DaySlicer::new("0m", "8h", "9h").is_err());
        assert!(DaySlicer::new("30m", "10h", "9h").is_err());
        assert!(DaySlicer::new("30m", "8h", "25h").is_err());
    }

    #[test]
    fn test_day_key_format() {
        assert_eq!(day_key(date!(2024 - 03 - 07)).unwrap(), "2024-03-07");
    }

    #[test]
    fn test_date_of_timestamp_is_utc() {
        // 2021-01-01T23:59:59Z
        assert_eq!(date_of(1_609_545_599).unwrap(), date!(2021 - 01 - 01));
        assert_eq!(date_of(1_609_545_600).unwrap(), date!(2021 - 01 - 02));
    }

    #[test]
    fn test_date_of_out_of_range() {
        assert!(matches!(
            date_of(i64::MAX),
            Err(TimeslicerError::InvalidTimestamp(_))
        ));
    }
}
