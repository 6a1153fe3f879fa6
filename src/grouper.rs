use super::MeasurementRecord;
use chrono::prelude::*;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::fmt;

/// Descriptive tags of a series, taken from its first record.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTags {
    pub field: String,
    pub host: String,
    pub location: String,
    pub room: String,
}

impl SeriesTags {
    /// Output file name without extension: `{field}_{host}_{room}_{location}`
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}_{}", self.field, self.host, self.room, self.location)
    }
}

impl fmt::Display for SeriesTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} {}",
            self.field, self.host, self.room, self.location
        )
    }
}

/// The records sharing one `table` identifier, in input order.
/// A group always holds at least one record.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGroup {
    series_id: i64,
    records: Vec<MeasurementRecord>,
}

impl SeriesGroup {
    fn new(first: MeasurementRecord) -> SeriesGroup {
        SeriesGroup {
            series_id: first.series_id,
            records: vec![first],
        }
    }

    pub fn series_id(&self) -> i64 {
        self.series_id
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> &MeasurementRecord {
        &self.records[0]
    }

    pub fn tags(&self) -> SeriesTags {
        let first = self.first();
        SeriesTags {
            field: first.field.clone(),
            host: first.host.clone(),
            location: first.location.clone(),
            room: first.room.clone(),
        }
    }

    /// Calendar date of the first record, the day explicit times-of-day refer to.
    pub fn anchor_date(&self) -> NaiveDate {
        self.first().timestamp.date_naive()
    }

    pub fn timezone(&self) -> Tz {
        self.first().timestamp.timezone()
    }

    /// Earliest and latest timestamp present in the group.
    pub fn time_extent(&self) -> (DateTime<Tz>, DateTime<Tz>) {
        let first = self.first().timestamp.clone();
        self.records
            .iter()
            .skip(1)
            .fold((first.clone(), first), |(min, max), r| {
                (min.min(r.timestamp.clone()), max.max(r.timestamp.clone()))
            })
    }
}

/// Partitions the records by `series_id`.
/// Groups follow the first appearance of their id, records keep their relative order.
pub fn group_by_series(records: Vec<MeasurementRecord>) -> Vec<SeriesGroup> {
    let mut groups: Vec<SeriesGroup> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();
    for record in records {
        match positions.get(&record.series_id) {
            Some(&pos) => groups[pos].records.push(record),
            None => {
                positions.insert(record.series_id, groups.len());
                groups.push(SeriesGroup::new(record));
            }
        }
    }
    groups
}
