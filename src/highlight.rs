use super::window::at_time_of_day;
use super::{highlight_tolerance, TIME_FMT};
use chrono::prelude::*;
use chrono_tz::Tz;
use std::fmt;
use tracing::{debug, warn};

/// A requested time-of-day matched to a sample of the filtered series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHighlight {
    /// Index into the filtered samples.
    pub index: usize,
    /// The requested HH:MM, not the time of the matched sample.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The nearest sample is this far away, not strictly within tolerance.
    OutOfTolerance { nearest: chrono::Duration },
    /// No sample left in the window.
    EmptySeries,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OutOfTolerance { nearest } => {
                write!(f, "nearest sample is {} minute(s) away", nearest.num_minutes())
            }
            SkipReason::EmptySeries => write!(f, "no samples in the window"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedHighlight {
    pub label: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HighlightOutcome {
    pub resolved: Vec<ResolvedHighlight>,
    pub skipped: Vec<SkippedHighlight>,
}

/// Index of the sample closest to `target` with its distance.
/// Ties keep the lowest index, None for no samples.
pub fn nearest_index(
    points: &[(DateTime<Tz>, f64)],
    target: &DateTime<Tz>,
) -> Option<(usize, chrono::Duration)> {
    let mut best: Option<(usize, chrono::Duration)> = None;
    for (i, (t, _)) in points.iter().enumerate() {
        let delta = t.clone() - target.clone();
        let distance = if delta < chrono::Duration::zero() {
            -delta
        } else {
            delta
        };
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((i, distance)),
        }
    }
    best
}

/// Resolves each requested time-of-day, taken on `date` in `tz`, to its nearest
/// sample. Accepted highlights are sorted by index; two requests matching the
/// same sample both stay.
pub fn match_highlights(
    points: &[(DateTime<Tz>, f64)],
    date: NaiveDate,
    tz: &Tz,
    requests: &[NaiveTime],
) -> HighlightOutcome {
    let mut outcome = HighlightOutcome::default();
    for th in requests {
        let label = th.format(TIME_FMT).to_string();
        let dth = at_time_of_day(tz, date, *th);
        let reason = match nearest_index(points, &dth) {
            Some((index, distance)) if distance < highlight_tolerance() => {
                debug!(
                    "time highlight {} approximated to {}",
                    label,
                    points[index].0.format(TIME_FMT)
                );
                outcome.resolved.push(ResolvedHighlight { index, label });
                continue;
            }
            Some((_, nearest)) => SkipReason::OutOfTolerance { nearest },
            None => SkipReason::EmptySeries,
        };
        warn!("skipping time highlight {}: {}", label, reason);
        outcome.skipped.push(SkippedHighlight { label, reason });
    }
    outcome.resolved.sort_by_key(|h| h.index);
    outcome
}
