//! Error types for seqpick

use thiserror::Error;

/// Main error type for seqpick operations
#[derive(Error, Debug)]
pub enum SeqpickError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("{tool} failed: {message}{}", format_diagnostics(.diagnostics))]
    ExternalTool {
        tool: String,
        message: String,
        diagnostics: String,
    },

    #[error("Matrix validation error: {0}")]
    MatrixValidation(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_diagnostics(diagnostics: &str) -> String {
    let trimmed = diagnostics.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{}", trimmed)
    }
}

impl SeqpickError {
    pub fn external_tool(
        tool: impl Into<String>,
        message: impl Into<String>,
        diagnostics: impl Into<String>,
    ) -> Self {
        SeqpickError::ExternalTool {
            tool: tool.into(),
            message: message.into(),
            diagnostics: diagnostics.into(),
        }
    }

    /// Short class name shown by the CLI next to the message
    pub fn class(&self) -> &'static str {
        match self {
            SeqpickError::Configuration(_) => "ConfigurationError",
            SeqpickError::EmptyInput(_) => "EmptyInputError",
            SeqpickError::ExternalTool { .. } => "ExternalToolError",
            SeqpickError::MatrixValidation(_) => "MatrixValidationError",
            SeqpickError::Parse(_) => "ParseError",
            SeqpickError::Io(_) => "IoError",
        }
    }

    /// Process exit code for this error class. 2 is left to clap usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            SeqpickError::Configuration(_) => 8,
            SeqpickError::Io(_) => 3,
            SeqpickError::Parse(_) => 4,
            SeqpickError::ExternalTool { .. } => 5,
            SeqpickError::MatrixValidation(_) => 6,
            SeqpickError::EmptyInput(_) => 7,
        }
    }
}

impl From<toml::de::Error> for SeqpickError {
    fn from(err: toml::de::Error) -> Self {
        SeqpickError::Configuration(format!("Failed to parse config: {}", err))
    }
}

impl From<toml::ser::Error> for SeqpickError {
    fn from(err: toml::ser::Error) -> Self {
        SeqpickError::Configuration(format!("Failed to serialize config: {}", err))
    }
}

impl From<serde_json::Error> for SeqpickError {
    fn from(err: serde_json::Error) -> Self {
        SeqpickError::Parse(err.to_string())
    }
}

/// Result type alias for seqpick operations
pub type Result<T> = std::result::Result<T, SeqpickError>;
