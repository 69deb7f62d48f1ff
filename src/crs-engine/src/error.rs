//! Engine error types

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::api::CallResult;

/// Nonzero status code returned by an engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    /// Wrap a raw status. Returns `None` for 0, which means success.
    pub fn from_status(status: i32) -> Option<Self> {
        if status == 0 {
            None
        } else {
            Some(Self(status))
        }
    }

    #[cfg(feature = "mock")]
    pub(crate) const fn raw(status: i32) -> Self {
        Self(status)
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convert a raw status into a `Result`
pub fn check_status(status: i32) -> CallResult {
    match ErrorCode::from_status(status) {
        None => Ok(()),
        Some(code) => Err(code),
    }
}

/// Errors surfaced by the session layer
#[derive(Error, Debug)]
pub enum EngineError {
    /// An engine call returned a nonzero status
    #[error("{call} failed with code {code}: {message}")]
    Call {
        call: &'static str,
        code: ErrorCode,
        message: String,
    },

    #[error("path cannot be passed to the engine: {0:?}")]
    InvalidPath(PathBuf),

    #[error("noise filter level {0} out of range (0 disables, 1-7 enable)")]
    InvalidNoiseFilter(u8),

    #[error("{call} returned {len} bytes, more than the {max} byte limit")]
    TextTooLong {
        call: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{0} called out of order")]
    OutOfOrder(&'static str),
}

impl EngineError {
    /// Engine status code, if the error came from the engine
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            EngineError::Call { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Diagnostic text as reported to the user
    pub fn message(&self) -> String {
        match self {
            EngineError::Call { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
