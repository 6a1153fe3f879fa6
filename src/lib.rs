use chrono::prelude::*;
use chrono_tz::Tz;
pub mod cli;
pub mod error;
pub mod grouper;
pub mod highlight;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod window;

pub use error::{GrapherError, Result};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Format of every time-of-day given on the command line and drawn on the charts.
pub const TIME_FMT: &str = "%H:%M";

/// Reference timezone all timestamps are normalized into.
pub const DEFAULT_TIMEZONE: &str = "Europe/Rome";

/// First character of the annotation lines that introduce a header block.
pub const COMMENT_MARKER: char = '#';

/// Lines discarded after a comment line before the header line.
pub const DEFAULT_SKIP_LINES: usize = 1;

pub const HIGHLIGHT_TOLERANCE_MINUTES: i64 = 30;

/// A highlight is accepted only if its nearest sample is strictly closer than this.
pub fn highlight_tolerance() -> chrono::Duration {
    chrono::Duration::minutes(HIGHLIGHT_TOLERANCE_MINUTES)
}

/// One data row of the export.
/// The descriptive tags are assumed constant within a series.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub series_id: i64,
    pub field: String,
    pub timestamp: DateTime<Tz>,
    pub value: f64,
    pub host: String,
    pub location: String,
    pub room: String,
}

/// Smallest and largest element of the slice, None when it is empty.
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

/// x axis label format that fits the span of the plotted window
pub fn suitable_xfmt(d: chrono::Duration) -> &'static str {
    if d > chrono::Duration::weeks(1) {
        "%y-%m-%d"
    } else if d > chrono::Duration::days(1) {
        "%m-%d %H:%M"
    } else {
        TIME_FMT
    }
}
