//! Error types for Textrux

/// Result type alias for Textrux operations
pub type Result<T> = std::result::Result<T, TextruxError>;

/// Main error type for Textrux
#[derive(Debug, thiserror::Error)]
pub enum TextruxError {
    /// Row or column outside the 1-indexed grid
    #[error("Invalid coordinate ({row}, {col}): rows and columns are 1-indexed")]
    InvalidCoordinate {
        /// Offending row
        row: usize,
        /// Offending column
        col: usize,
    },

    /// A cell cluster with no filled cells reached a construct builder
    #[error("Cell cluster has no filled cells")]
    EmptyCluster,

    /// A builder failed while producing a nested construct inside a tree domain
    #[error("Nested construct build failed: {reason}")]
    NestedBuildFailed {
        /// Reason for failure
        reason: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The parse was cancelled through its cancellation token
    #[error("Parse cancelled")]
    Cancelled,

    /// Invalid parser configuration
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Malformed delimited (CSV/TSV) input
    #[error("Malformed delimited input at line {line}: {message}")]
    MalformedInput {
        /// 1-indexed line of the offending record
        line: usize,
        /// What went wrong
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl TextruxError {
    /// Create a nested-build failure
    pub fn nested_build_failed<S: Into<String>>(reason: S) -> Self {
        Self::NestedBuildFailed {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a nested-build failure with source
    pub fn nested_build_failed_with_source<S: Into<String>, E>(reason: S, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::NestedBuildFailed {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a malformed-input error
    pub fn malformed_input<S: Into<String>>(line: usize, message: S) -> Self {
        Self::MalformedInput {
            line,
            message: message.into(),
        }
    }

    /// Check if the error came from cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if the error is contained by the outer parse (nested-domain
    /// failures and empty clusters never abort a parse)
    pub fn is_contained(&self) -> bool {
        matches!(self, Self::NestedBuildFailed { .. } | Self::EmptyCluster)
    }

    /// Check if the error indicates bad caller input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCoordinate { .. } | Self::InvalidOptions(_) | Self::MalformedInput { .. }
        )
    }
}
