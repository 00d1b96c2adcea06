//! Error types for the skysonde-skewt crate.
use thiserror::Error;

/// Error type for sounding analysis.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum AnalysisError {
    /// A profile that is required for this analysis is missing.
    #[error("missing profile required for the analysis")]
    MissingProfile,
    /// A value (surface value, profile level, etc) that is required is not available.
    #[error("missing value required for the analysis")]
    MissingValue,
    /// Not enough data available for analysis.
    #[error("not enough data available for the analysis")]
    NotEnoughData,
    /// The cleaned sounding ended up empty.
    #[error("profile is empty after quality control, cannot do analysis")]
    NoDataProfile,
    /// Bad or invalid input.
    #[error("invalid input")]
    InvalidInput,
    /// Missing data during interpolation, or it would have been extrapolation.
    #[error("none value encountered during interpolation")]
    InterpolationError,
    /// The pressure profile never stopped decreasing, so no balloon burst was found.
    #[error("no descent detected in the pressure profile")]
    NoDescent,
    /// A calculation in the metfor crate left its domain of validity.
    #[error("error bubbled up from metfor")]
    MetForError,
}

/// Shorthand for results.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error from the end-to-end file-to-analysis pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The file could not be read or parsed.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The cleaned sounding could not be analyzed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Error type for reading a Skysonde CSV file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Could not open or read the file.
    #[error("unable to read sounding file")]
    Io(#[from] std::io::Error),
    /// The CSV layer rejected the file.
    #[error("unable to parse sounding file")]
    Csv(#[from] csv::Error),
    /// A row had fewer columns than the format requires.
    #[error("record {0} too short: expected at least {1} columns")]
    ShortRecord(usize, usize),
    /// A selected column held something that is neither a number nor the sentinel.
    #[error("record {record}, column {column}: unparseable value {value:?}")]
    BadValue {
        /// Zero-based record number within the data section.
        record: usize,
        /// Zero-based column index in the raw file.
        column: usize,
        /// The offending field contents.
        value: String,
    },
}
