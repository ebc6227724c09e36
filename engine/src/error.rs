use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that can end an invocation. None of these are retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "GEMINI_API_KEY environment variable is not set.\n\n\
         Get an API key from: https://aistudio.google.com/apikey\n\n\
         Then add to your environment:\n  export GEMINI_API_KEY=\"your-api-key-here\""
    )]
    MissingCredential,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Opaque failure reported by (or on the way to) the remote service
    #[error("{0}")]
    RemoteCall(String),

    #[error("Invalid config file {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::Io {
                action,
                path,
                source,
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::RemoteCall(e.to_string())
    }
}

impl From<crate::gemini::ApiError> for Error {
    fn from(e: crate::gemini::ApiError) -> Self {
        Self::RemoteCall(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
