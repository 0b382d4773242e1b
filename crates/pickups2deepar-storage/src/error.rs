//! Error types for object store access

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Storage configuration missing or invalid
    E001InvalidConfig,
    /// E002: Listing or downloading source objects failed
    E002FetchFailure,
    /// E003: Uploading a dataset file failed
    E003UploadFailure,
    /// E004: Local staging or dataset file I/O failed
    E004LocalIo,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001InvalidConfig => "E001",
            Self::E002FetchFailure => "E002",
            Self::E003UploadFailure => "E003",
            Self::E004LocalIo => "E004",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while talking to the object store
#[derive(Debug, Error)]
pub enum StorageError {
    /// Invalid configuration provided
    #[error("[{code}] Invalid storage configuration: {message}")]
    InvalidConfig { code: ErrorCode, message: String },

    /// Source listing or download failed
    #[error("[{code}] Fetch failed for '{key}': {message}")]
    FetchFailure {
        code: ErrorCode,
        key: String,
        message: String,
    },

    /// Dataset upload failed
    #[error("[{code}] Upload failed for '{key}': {message}")]
    UploadFailure {
        code: ErrorCode,
        key: String,
        message: String,
    },

    /// Local file could not be read or written
    #[error("[{code}] Local file error at '{path}': {source}")]
    LocalIo {
        code: ErrorCode,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Create an invalid config error with error code
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            code: ErrorCode::E001InvalidConfig,
            message: message.into(),
        }
    }

    /// Create a fetch failure error with error code
    pub fn fetch_failure(key: impl Into<String>, message: impl ToString) -> Self {
        Self::FetchFailure {
            code: ErrorCode::E002FetchFailure,
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create an upload failure error with error code
    pub fn upload_failure(key: impl Into<String>, message: impl ToString) -> Self {
        Self::UploadFailure {
            code: ErrorCode::E003UploadFailure,
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create a local I/O error with error code
    pub fn local_io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::LocalIo {
            code: ErrorCode::E004LocalIo,
            path: path.display().to_string(),
            source,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { code, .. }
            | Self::FetchFailure { code, .. }
            | Self::UploadFailure { code, .. }
            | Self::LocalIo { code, .. } => *code,
        }
    }
}

/// Result type alias for StorageError
pub type Result<T> = std::result::Result<T, StorageError>;
