use chrono::{DateTime, NaiveDate};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Wall-clock timer; logs how long the labelled work took when dropped.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        debug!("Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("Finished: {} (took {:.2?})", self.label, self.start.elapsed());
    }
}

/// One value or many, as accepted by the `query` of every endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(vs) => vs,
        }
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(s: &str) -> Self {
        OneOrMany::One(s.to_string())
    }
}

impl From<String> for OneOrMany<String> {
    fn from(s: String) -> Self {
        OneOrMany::One(s)
    }
}

impl From<Vec<String>> for OneOrMany<String> {
    fn from(v: Vec<String>) -> Self {
        OneOrMany::Many(v)
    }
}

impl From<Vec<&str>> for OneOrMany<String> {
    fn from(v: Vec<&str>) -> Self {
        OneOrMany::Many(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for OneOrMany<String> {
    fn from(v: &[&str]) -> Self {
        OneOrMany::Many(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany<String> {
    fn from(v: [&str; N]) -> Self {
        OneOrMany::Many(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Wrap a scalar into a one-element list; lists pass through untouched.
pub fn as_list(value: impl Into<OneOrMany<String>>) -> Vec<String> {
    value.into().into_vec()
}

/// `fields` travel as a single comma-joined string.
pub fn parse_fields(fields: impl Into<OneOrMany<String>>) -> String {
    fields.into().into_vec().join(",")
}

/// Waypoints of one route are joined with four spaces.
pub fn format_direction_query<S: AsRef<str>>(waypoints: &[S]) -> String {
    waypoints
        .iter()
        .map(|w| w.as_ref().trim())
        .collect::<Vec<_>>()
        .join("    ")
}

/// Waypoints of a route written as one string, separated by `|` or by the
/// four-space separator itself.
pub fn split_route(route: &str) -> Vec<&str> {
    route
        .split("    ")
        .flat_map(|part| part.split('|'))
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Unix seconds from an integer string, "YYYY-MM-DD" (midnight UTC) or RFC 3339.
pub fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();

    if let Ok(ts) = s.parse::<i64>() {
        return Some(ts);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    }

    None
}
