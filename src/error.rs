use thiserror::Error;

/// Why a single raw row could not become a [`crate::model::DensityRow`].
///
/// Recovered by the table converter: the row is skipped and the rest of the
/// table is still written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowDecodeError {
    #[error("row has insufficient columns: expected 4, got {found}")]
    InsufficientColumns { found: usize },

    #[error("column {column} should be {expected}, got {found}")]
    TypeMismatch {
        column: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Failures that end a command with a non-zero exit status.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("could not invoke {function}: {reason}")]
    Transport { function: String, reason: String },

    #[error("{action} failed: {detail}")]
    Remote { action: &'static str, detail: String },

    #[error("'{0}' is not a valid timestamp")]
    InvalidTimestamp(String),

    #[error("unrecognised command. Use --help to see how to use this app")]
    Usage,
}
