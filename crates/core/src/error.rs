use std::fmt;

/// Refusal to run the pipeline. Raised before any record reaches the filter stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingColumns(Vec<String>),
    EmptySource,
    InvalidOptions(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingColumns(cols) => {
                write!(f, "missing required columns: {}", cols.join(", "))
            }
            ValidationError::EmptySource => write!(f, "source contains no data rows"),
            ValidationError::InvalidOptions(detail) => {
                write!(f, "invalid pipeline options: {detail}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
