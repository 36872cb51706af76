//! Error types and error codes for netsot
//!
//! This module defines:
//! - `NetsotError`: Application-specific error enum
//! - `AppError`: Wrapper around `anyhow::Error` that resolves its `ErrorCode`
//! - `ErrorCode`: Structured error codes for surfacing to API consumers

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum NetsotError {
    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("{0} '{1}' already exist")]
    DuplicateName(&'static str, String),

    #[error("{0} '{1}' not exist")]
    ObjectNotExist(&'static str, String),

    #[error("target '{0}' not exist")]
    TargetNotExist(String),

    #[error("feature '{0}' is not enabled for content type '{1}'")]
    FeatureNotEnabled(String, String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("snapshot error: {0}")]
    SnapshotError(String),
}

impl NetsotError {
    /// Map the error onto its structured code
    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            NetsotError::IllegalArgument(_) => PARAMETER_VALIDATE_ERROR,
            NetsotError::ValidationError(_) => DATA_VALIDATION_FAILED,
            NetsotError::DuplicateName(..) => RESOURCE_CONFLICT,
            NetsotError::ObjectNotExist(..) | NetsotError::TargetNotExist(_) => {
                RESOURCE_NOT_FOUND
            }
            NetsotError::FeatureNotEnabled(..) => FEATURE_NOT_ENABLED,
            NetsotError::ConfigError(_) => CONFIGURATION_ERROR,
            NetsotError::SnapshotError(_) => PARSING_DATA_FAILED,
        }
    }
}

/// Wrapper for application errors
#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl AppError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Structured code for this error, `SERVER_ERROR` when it is not a `NetsotError`
    pub fn error_code(&self) -> ErrorCode<'static> {
        self.downcast_ref::<NetsotError>()
            .map(NetsotError::error_code)
            .unwrap_or(SERVER_ERROR)
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

pub const FEATURE_NOT_ENABLED: ErrorCode<'static> = ErrorCode {
    code: 20020,
    message: "feature not enabled for content type",
};

pub const CONFIGURATION_ERROR: ErrorCode<'static> = ErrorCode {
    code: 23003,
    message: "configuration error",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

pub const DATA_VALIDATION_FAILED: ErrorCode<'static> = ErrorCode {
    code: 100003,
    message: "data validation failed",
};

pub const PARSING_DATA_FAILED: ErrorCode<'static> = ErrorCode {
    code: 100004,
    message: "Failed to parse data",
};
