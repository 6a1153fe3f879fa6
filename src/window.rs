use super::grouper::SeriesGroup;
use super::{GrapherError, Result, TIME_FMT};
use chrono::prelude::*;
use chrono::LocalResult;
use chrono_tz::Tz;

/// Parses an HH:MM time-of-day as given on the command line.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), TIME_FMT)
        .map_err(|_| GrapherError::InvalidTimeOfDay(s.to_string()))
}

/// Attaches the timezone to a wall-clock datetime.
/// Ambiguous times (DST fold) take the earliest instant,
/// non-existent times (DST gap) are moved one hour forward.
pub fn localize(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

/// The instant of `time` on `date` in the timezone.
pub fn at_time_of_day(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    localize(tz, date.and_time(time))
}

/// Inclusive time range of samples kept for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl TimeWindow {
    pub fn contains(&self, t: &DateTime<Tz>) -> bool {
        self.start <= *t && *t <= self.end
    }
}

/// A series reduced to its window.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesWindow {
    pub window: TimeWindow,
    pub points: Vec<(DateTime<Tz>, f64)>,
}

/// Resolves the window of a series and keeps the samples inside it.
///
/// An absent bound falls back to the data extent. An explicit bound is taken
/// on the date of the first record of the group, also when the series spans
/// midnight. An empty result is not an error.
pub fn resolve_window(
    group: &SeriesGroup,
    min: Option<NaiveTime>,
    max: Option<NaiveTime>,
) -> SeriesWindow {
    let tz = group.timezone();
    let date = group.anchor_date();
    let (first, last) = group.time_extent();
    let window = TimeWindow {
        start: min.map_or(first, |t| at_time_of_day(&tz, date, t)),
        end: max.map_or(last, |t| at_time_of_day(&tz, date, t)),
    };
    let points = group
        .records()
        .iter()
        .filter(|r| window.contains(&r.timestamp))
        .map(|r| (r.timestamp.clone(), r.value))
        .collect();
    SeriesWindow { window, points }
}
