//! Parsing of the csv exports produced by InfluxDB queries.
//!
//! An export is made of header blocks: a comment line, a fixed number of
//! discarded lines, then the header naming the columns. Data lines are read
//! by column name against the most recent header, so column order does not
//! matter and each block may order its columns differently.

use super::window::localize;
use super::{GrapherError, MeasurementRecord, Result, COMMENT_MARKER, DEFAULT_SKIP_LINES};
use chrono::prelude::*;
use chrono_tz::Tz;
use std::path::Path;
use tracing::debug;

const DELIMITER: char = ',';

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Columns every data line must provide, found by name in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Table,
    Field,
    Time,
    Value,
    Host,
    Location,
    Room,
}

impl Column {
    const ALL: [Column; 7] = [
        Column::Table,
        Column::Field,
        Column::Time,
        Column::Value,
        Column::Host,
        Column::Location,
        Column::Room,
    ];

    fn name(self) -> &'static str {
        match self {
            Column::Table => "table",
            Column::Field => "_field",
            Column::Time => "_time",
            Column::Value => "_value",
            Column::Host => "host",
            Column::Location => "location",
            Column::Room => "room",
        }
    }
}

/// Positions of the required columns in one header line.
#[derive(Debug, Clone, PartialEq)]
struct Columns([usize; 7]);

impl Columns {
    /// Err carries the first required column the header lacks.
    fn resolve(header: &str) -> std::result::Result<Columns, &'static str> {
        let names: Vec<&str> = header.split(DELIMITER).collect();
        let mut positions = [0usize; 7];
        for (slot, column) in positions.iter_mut().zip(Column::ALL.iter()) {
            *slot = names
                .iter()
                .position(|n| *n == column.name())
                .ok_or_else(|| column.name())?;
        }
        Ok(Columns(positions))
    }

    fn get<'a>(&self, fields: &[&'a str], column: Column, line: usize) -> Result<&'a str> {
        let pos = self.0[column as usize];
        fields.get(pos).copied().ok_or_else(|| {
            GrapherError::parse(
                line,
                format!("missing '{}' column (position {})", column.name(), pos + 1),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Header {
    line: usize,
    columns: std::result::Result<Columns, &'static str>,
}

/// What the parser expects from the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Any,
    Discard(usize),
    Header,
}

#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Lines discarded between a comment line and its header.
    pub skip_lines: usize,
    /// Reference timezone of the produced timestamps.
    pub timezone: Tz,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            skip_lines: DEFAULT_SKIP_LINES,
            timezone: Tz::Europe__Rome,
        }
    }
}

/// Line-by-line parser holding the active header.
#[derive(Debug, Clone)]
pub struct RecordParser {
    options: ParserOptions,
    header: Option<Header>,
    expect: Expect,
    marker_line: usize,
}

impl RecordParser {
    pub fn new(options: ParserOptions) -> RecordParser {
        RecordParser {
            options,
            header: None,
            expect: Expect::Any,
            marker_line: 0,
        }
    }

    /// Consumes the line with 1-based number `line`,
    /// returns the record if it was a data line.
    pub fn feed(&mut self, line: usize, raw: &str) -> Result<Option<MeasurementRecord>> {
        let text = raw.trim_end_matches(|c: char| c == '\n' || c == '\r');
        match self.expect {
            Expect::Discard(n) => {
                self.expect = if n > 1 {
                    Expect::Discard(n - 1)
                } else {
                    Expect::Header
                };
                return Ok(None);
            }
            Expect::Header => {
                debug!("header at line {}: {}", line, text);
                self.header = Some(Header {
                    line,
                    columns: Columns::resolve(text),
                });
                self.expect = Expect::Any;
                return Ok(None);
            }
            Expect::Any => {}
        }
        if text.is_empty() {
            return Ok(None);
        }
        if text.starts_with(COMMENT_MARKER) {
            self.marker_line = line;
            self.expect = match self.options.skip_lines {
                0 => Expect::Header,
                n => Expect::Discard(n),
            };
            return Ok(None);
        }
        self.parse_data(line, text).map(Some)
    }

    /// Checks that the input did not stop inside a header block.
    pub fn finish(self) -> Result<()> {
        match self.expect {
            Expect::Any => Ok(()),
            _ => Err(GrapherError::parse(
                self.marker_line,
                "input ended before the header line of this block",
            )),
        }
    }

    fn parse_data(&self, line: usize, text: &str) -> Result<MeasurementRecord> {
        let header = self
            .header
            .as_ref()
            .ok_or_else(|| GrapherError::parse(line, "data line found before any csv header"))?;
        let columns = header.columns.as_ref().map_err(|missing| {
            GrapherError::parse(
                line,
                format!("header at line {} has no '{}' column", header.line, missing),
            )
        })?;
        let fields: Vec<&str> = text.split(DELIMITER).collect();

        let table = columns.get(&fields, Column::Table, line)?;
        let series_id = table.trim().parse::<i64>().map_err(|e| {
            GrapherError::parse(line, format!("invalid table id '{}': {}", table, e))
        })?;
        let time = columns.get(&fields, Column::Time, line)?;
        let timestamp = parse_timestamp(time, &self.options.timezone)
            .ok_or_else(|| GrapherError::parse(line, format!("invalid _time '{}'", time)))?;
        let value = columns.get(&fields, Column::Value, line)?;
        let value = value.trim().parse::<f64>().map_err(|e| {
            GrapherError::parse(line, format!("invalid _value '{}': {}", value, e))
        })?;

        Ok(MeasurementRecord {
            series_id,
            field: columns.get(&fields, Column::Field, line)?.to_string(),
            timestamp,
            value,
            host: columns.get(&fields, Column::Host, line)?.to_string(),
            location: columns.get(&fields, Column::Location, line)?.to_string(),
            room: columns.get(&fields, Column::Room, line)?.to_string(),
        })
    }
}

/// Parses an RFC 3339 timestamp, or a naive one taken as wall-clock time in `tz`,
/// and converts it to `tz`.
pub fn parse_timestamp(s: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(tz));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| localize(tz, naive))
}

/// Parses all the lines of an export, failing on the first bad line.
pub fn parse_lines<S: AsRef<str>>(
    lines: &[S],
    options: ParserOptions,
) -> Result<Vec<MeasurementRecord>> {
    let mut parser = RecordParser::new(options);
    let mut records = Vec::with_capacity(lines.len());
    for (i, l) in lines.iter().enumerate() {
        if let Some(record) = parser.feed(i + 1, l.as_ref())? {
            records.push(record);
        }
    }
    parser.finish()?;
    debug!("parsed {} records from {} lines", records.len(), lines.len());
    Ok(records)
}

/// Reads the whole export into memory.
pub fn read_lines(fin: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(fin).map_err(|source| GrapherError::FileRead {
        path: fin.to_path_buf(),
        source,
    })?;
    Ok(content.lines().map(String::from).collect())
}
