use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Schema mismatch in record {index}: expected fields {expected:?}, found {found:?}")]
    SchemaMismatch {
        index: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Duplicate field '{name}' in schema")]
    DuplicateField { name: String },

    #[error("Invalid field name '{name}': {reason}")]
    InvalidFieldName { name: String, reason: String },

    /// `row` is the 1-based sheet row; row 1 is the header.
    #[error("Unsupported value in row {row}, field '{field}': {reason}")]
    UnsupportedCellValue {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("Refusing to export an empty batch as {format}")]
    EmptyBatch { format: String },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export worker for {format} stopped: {message}")]
    WorkerLost { format: String, message: String },

    #[error("Unsupported export format '{0}'. Supported formats: csv, xml, xls")]
    UnsupportedFormat(String),

    #[error("Sheet limit exceeded: {rows} rows x {columns} columns (max 1048576 x 16384)")]
    SheetLimitExceeded { rows: usize, columns: usize },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

/// Stable name of an error variant, used in export reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SchemaMismatch,
    InvalidFieldName,
    UnsupportedCellValue,
    EmptyBatch,
    WriteFailure,
    ReadFailure,
    WorkerLost,
    Io,
    UnsupportedFormat,
    SheetLimitExceeded,
    InvalidInput,
    Encoding,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::SchemaMismatch { .. } | ExportError::DuplicateField { .. } => {
                ErrorKind::SchemaMismatch
            }
            ExportError::InvalidFieldName { .. } => ErrorKind::InvalidFieldName,
            ExportError::UnsupportedCellValue { .. } => ErrorKind::UnsupportedCellValue,
            ExportError::EmptyBatch { .. } => ErrorKind::EmptyBatch,
            ExportError::WriteFailure { .. } => ErrorKind::WriteFailure,
            ExportError::ReadFailure { .. } => ErrorKind::ReadFailure,
            ExportError::WorkerLost { .. } => ErrorKind::WorkerLost,
            ExportError::IoError(_) => ErrorKind::Io,
            ExportError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ExportError::SheetLimitExceeded { .. } => ErrorKind::SheetLimitExceeded,
            ExportError::InvalidInput { .. } | ExportError::SerializationError(_) => {
                ErrorKind::InvalidInput
            }
            ExportError::ZipError(_) | ExportError::CsvError(_) => ErrorKind::Encoding,
            ExportError::ConfigError { .. }
            | ExportError::InvalidConfigValueError { .. }
            | ExportError::MissingConfigError { .. } => ErrorKind::Config,
        }
    }

    pub fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::WriteFailure {
            path: path.into(),
            source,
        }
    }

    pub fn read_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::ReadFailure {
            path: path.into(),
            source,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Config | ErrorKind::UnsupportedFormat
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ExportError::SchemaMismatch { index, .. } => format!(
                "Record {} does not have the same fields as the rest of the batch",
                index
            ),
            ExportError::DuplicateField { name } => {
                format!("Field '{}' is declared more than once", name)
            }
            ExportError::EmptyBatch { format } => {
                format!("There are no records to export as {}", format)
            }
            ExportError::UnsupportedFormat(value) => {
                format!("'{}' is not a supported file type", value)
            }
            ExportError::WriteFailure { path, .. } => {
                format!("Could not write output file {}", path.display())
            }
            ExportError::ReadFailure { path, .. } => {
                format!("Could not read input file {}", path.display())
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        if let ExportError::DuplicateField { .. } = self {
            return "List each field only once in --fields or the [source] fields setting";
        }

        match self.kind() {
            ErrorKind::SchemaMismatch => "Make sure every scraped record has the same fields in the same order",
            ErrorKind::InvalidFieldName => "Rename fields so they stay distinct after XML name sanitization",
            ErrorKind::UnsupportedCellValue => "Flatten booleans and nested values into strings before exporting to xls",
            ErrorKind::EmptyBatch => "Check the scrape produced records, or pass --header-only",
            ErrorKind::WriteFailure => "Check the output directory exists and is writable",
            ErrorKind::ReadFailure => "Check the input file exists and is UTF-8 encoded",
            ErrorKind::WorkerLost => "Retry the export; the worker thread panicked or was cancelled",
            ErrorKind::Io => "Check file permissions and free disk space",
            ErrorKind::UnsupportedFormat => "Use one of: csv, xml, xls",
            ErrorKind::SheetLimitExceeded => "Split the batch or export it as csv",
            ErrorKind::InvalidInput => "Input must be a JSON array of objects or JSON Lines",
            ErrorKind::Encoding => "Retry the export; if it persists, report the input that triggered it",
            ErrorKind::Config => "Review the command line flags and the TOML configuration file",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
