//! Error types for the VM translator.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("line {line_no}: malformed command `{line}`: {reason}")]
    MalformedCommand {
        line_no: usize,
        line: String,
        reason: String,
    },

    #[error("unsupported operation `{command}`: {reason}")]
    UnsupportedOperation { command: String, reason: String },

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("label `{0}` is declared more than once")]
    DuplicateLabel(String),

    #[error("no .vm files found in {0}")]
    NoSources(String),

    #[error(transparent)]
    Resource(#[from] io::Error),
}

impl TranslateError {
    pub(crate) fn unsupported(command: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
