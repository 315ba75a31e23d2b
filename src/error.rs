//! Error types for pliegue.

use std::path::PathBuf;

/// Result type alias for pliegue operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, cleaning or splitting datasets.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The path where the error occurred, if known.
        path: Option<PathBuf>,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Arrow error during data processing.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error during file operations.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Column not found in schema.
    #[error("Column '{name}' not found in schema")]
    ColumnNotFound {
        /// The name of the missing column.
        name: String,
    },

    /// Invalid or missing configuration (fold count, group labels, ...).
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Fewer distinct groups than requested folds.
    #[error("Cannot split {groups} distinct groups into {n_splits} folds")]
    InsufficientGroups {
        /// Number of distinct groups found in the labels.
        groups: usize,
        /// Number of folds requested.
        n_splits: usize,
    },

    /// Unsupported file format.
    #[error("Unsupported format: {format}")]
    UnsupportedFormat {
        /// The unsupported format name or extension.
        format: String,
    },

    /// Empty dataset error.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Schema mismatch between batches.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the schema mismatch.
        message: String,
    },

    /// Transform error.
    #[error("Transform error: {message}")]
    Transform {
        /// Description of the transform error.
        message: String,
    },

    /// Data error (null group labels, malformed values).
    #[error("Data error: {message}")]
    Data {
        /// Description of the data error.
        message: String,
    },

    /// Output formatting error.
    #[error("Format error: {0}")]
    Format(String),
}

impl Error {
    /// Create an I/O error with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Create a column not found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound { name: name.into() }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an insufficient groups error.
    #[must_use]
    pub fn insufficient_groups(groups: usize, n_splits: usize) -> Self {
        Self::InsufficientGroups { groups, n_splits }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Create a transform error.
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Create a data error.
    pub fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Returns true for configuration errors (bad fold count, missing labels).
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}
