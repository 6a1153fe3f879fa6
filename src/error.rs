use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while turning an export into charts.
#[derive(Error, Debug)]
pub enum GrapherError {
    /// A line of the export could not be turned into a record.
    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A time-of-day argument is not in HH:MM form.
    #[error("invalid time of day '{0}', expected HH:MM")]
    InvalidTimeOfDay(String),

    /// The reference timezone is not a known IANA name.
    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),

    /// A numeric command line value could not be parsed.
    #[error("invalid value '{value}' for {name}")]
    InvalidArgument { name: &'static str, value: String },

    /// The input export could not be read.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("failed to create output dir {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Drawing or writing a chart failed.
    #[error("failed to render {path}: {reason}")]
    Render { path: PathBuf, reason: String },
}

impl GrapherError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        GrapherError::Parse {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GrapherError>;
