use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum NotesError {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("unknown template combination '{template_type}/{format}'")]
    #[diagnostic(help("valid combinations: {valid}"))]
    UnknownTemplate {
        template_type: String,
        format: String,
        valid: String,
    },

    #[error("unknown notes format '{value}'")]
    #[diagnostic(help("use one of: {expected}"))]
    InvalidFormat { value: String, expected: String },

    #[error("{kind} not found with selector {selector}")]
    GuestNotFound { kind: String, selector: String },

    #[error("multiple {kind}s match name '{name}' on nodes {nodes}")]
    #[diagnostic(help("pass --node to pick one"))]
    AmbiguousGuest {
        kind: String,
        name: String,
        nodes: String,
    },

    #[error("{action} is destructive")]
    #[diagnostic(help("pass --yes to proceed, or --dry-run to preview"))]
    ConfirmationRequired { action: String },

    #[error("platform request failed: {message}")]
    Platform {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("platform returned HTTP {status} for {context}")]
    PlatformStatus { status: u16, context: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse grouping used by callers that decide between reporting and retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad caller input; never retried.
    Input,
    /// The platform call failed; propagated unchanged.
    Collaborator,
    Config,
}

impl NotesError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NotesError::UnknownTemplate { .. }
            | NotesError::InvalidFormat { .. }
            | NotesError::GuestNotFound { .. }
            | NotesError::AmbiguousGuest { .. }
            | NotesError::Validation { .. }
            | NotesError::ConfirmationRequired { .. } => ErrorCategory::Input,
            NotesError::Platform { .. } | NotesError::PlatformStatus { .. } => {
                ErrorCategory::Collaborator
            }
            NotesError::ConfigLoad { .. } | NotesError::ConfigParse { .. } | NotesError::Io { .. } => {
                ErrorCategory::Config
            }
        }
    }
}
