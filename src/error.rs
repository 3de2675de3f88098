/// Failure categories surfaced by the analysis pipeline.
///
/// Every failure is terminal for the current request: the input itself is at
/// fault, so nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceNotFound,
    UnsupportedFormat,
    Parse,
    MissingColumns,
    ImputationImpossible,
    InsufficientData,
    InsufficientCodes,
    ModelFit,
    /// Report/export writes (charts, workbooks, PDFs, JSON).
    Output,
}

impl ErrorKind {
    /// Stable snake_case label used in JSON error envelopes.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::SourceNotFound => "source_not_found",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::Parse => "parse_error",
            ErrorKind::MissingColumns => "missing_columns",
            ErrorKind::ImputationImpossible => "imputation_impossible",
            ErrorKind::InsufficientData => "insufficient_data",
            ErrorKind::InsufficientCodes => "insufficient_codes",
            ErrorKind::ModelFit => "model_fit",
            ErrorKind::Output => "output_error",
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::SourceNotFound
            | ErrorKind::UnsupportedFormat
            | ErrorKind::Parse
            | ErrorKind::MissingColumns => 2,
            ErrorKind::ImputationImpossible | ErrorKind::InsufficientData => 3,
            ErrorKind::InsufficientCodes | ErrorKind::ModelFit => 4,
            ErrorKind::Output => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_group_by_stage() {
        assert_eq!(AppError::new(ErrorKind::Parse, "x").exit_code(), 2);
        assert_eq!(AppError::new(ErrorKind::InsufficientData, "x").exit_code(), 3);
        assert_eq!(AppError::new(ErrorKind::ModelFit, "x").exit_code(), 4);
        assert_eq!(AppError::new(ErrorKind::Output, "x").exit_code(), 5);
    }

    #[test]
    fn display_is_message_only() {
        let err = AppError::new(ErrorKind::MissingColumns, "Missing required columns: region");
        assert_eq!(err.to_string(), "Missing required columns: region");
        assert_eq!(err.kind().label(), "missing_columns");
    }
}
