use std::path::PathBuf;

use thiserror::Error;

/// Stable error codes surfaced to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    TaskNotFound,
    QueueUnavailable,
    StorageError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::QueueUnavailable => "QUEUE_UNAVAILABLE",
            Self::StorageError => "STORAGE_ERROR",
        }
    }
}

/// Rejections raised while accepting a task definition.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("task definition must be a JSON object")]
    NotAnObject,
    #[error("task definition must include 'steps'")]
    MissingSteps,
    #[error("invalid task definition: {0}")]
    Invalid(String),
    #[error("task queue is full")]
    QueueFull,
    #[error("task queue is closed")]
    QueueClosed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubmitError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotAnObject | Self::MissingSteps | Self::Invalid(_) => ErrorCode::ValidationError,
            Self::QueueFull | Self::QueueClosed => ErrorCode::QueueUnavailable,
            Self::Store(_) => ErrorCode::StorageError,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.error_code() == ErrorCode::ValidationError
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid task id: {0:?}")]
    InvalidTaskId(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt record at {path}: {source}")]
    Serde {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure to load a persisted task definition at execution time.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid task id: {0:?}")]
    InvalidTaskId(String),
    #[error("task definition not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read task definition {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed task definition {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// A step path argument that would leave the task's working directory.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("absolute paths are not allowed: {0}")]
    Absolute(String),
    #[error("path escapes the working directory: {0}")]
    Traversal(String),
    #[error("path resolves outside the working directory via a link: {0}")]
    LinkEscape(String),
    #[error("cannot resolve path {path}: {reason}")]
    Unresolvable { path: String, reason: String },
}
