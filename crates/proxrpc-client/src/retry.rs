use std::fmt;
use std::time::Duration;

use proxrpc_common::config::names;
use proxrpc_common::Properties;
use tracing::warn;

/// Backoff intervals between retries, in milliseconds.
///
/// The schedule length is the number of retries an invocation may make; the
/// n-th retry waits `intervals[n - 1]` first.
///
/// # Parsing
///
/// The configuration string is a space or tab separated list of integers:
///
/// - a leading `-1` disables retries altogether (empty schedule)
/// - any other negative value is clamped to `0`
/// - an empty or blank string means a single immediate retry (`[0]`)
///
/// # Example
///
/// ```
/// use proxrpc_client::RetrySchedule;
///
/// assert_eq!(RetrySchedule::parse("100 -5 200").intervals(), &[100, 0, 200]);
/// assert_eq!(RetrySchedule::parse("").intervals(), &[0]);
/// assert!(RetrySchedule::parse("-1 100").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    intervals: Vec<u64>,
}

impl RetrySchedule {
    pub fn parse(s: &str) -> Self {
        let mut intervals = Vec::new();

        for token in s.split([' ', '\t']).filter(|t| !t.is_empty()) {
            let value = match token.parse::<i64>() {
                Ok(value) => value,
                Err(_) => {
                    warn!(token, "retry interval is not an integer, using 0");
                    0
                }
            };

            if value == -1 && intervals.is_empty() {
                return Self { intervals };
            }
            intervals.push(value.max(0) as u64);
        }

        if intervals.is_empty() {
            intervals.push(0);
        }
        Self { intervals }
    }

    /// Schedule from `Proxrpc.RetryIntervals`, default `"0"`.
    pub fn from_properties(props: &Properties) -> Self {
        Self::parse(&props.get_property_with_default(names::RETRY_INTERVALS, "0"))
    }

    /// Number of retries allowed per invocation.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Wait before retry number `attempt` (1-based). `None` past the end of the
    /// schedule or for attempt 0.
    pub fn delay(&self, attempt: usize) -> Option<Duration> {
        attempt
            .checked_sub(1)
            .and_then(|index| self.intervals.get(index))
            .map(|ms| Duration::from_millis(*ms))
    }

    pub fn intervals(&self) -> &[u64] {
        &self.intervals
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self { intervals: vec![0] }
    }
}

/// Prints a string that parses back to the same schedule.
impl fmt::Display for RetrySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.intervals.is_empty() {
            return f.write_str("-1");
        }
        let parts: Vec<String> = self.intervals.iter().map(u64::to_string).collect();
        f.write_str(&parts.join(" "))
    }
}
