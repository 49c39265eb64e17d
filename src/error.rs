//! Error types for set-audio-format

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A failed call into the OS audio subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OsError {
    #[error("{call} returned status {status}")]
    Status { call: &'static str, status: i32 },

    #[error("{call} reported {actual} bytes, expected {expected}")]
    UnexpectedSize {
        call: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    /// Bad command-line value. The message is printed as is.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("No valid options provided.")]
    NoOptions,

    /// Unknown option, missing value, help request.
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error("Error getting default output device: {0}")]
    DefaultDevice(#[source] OsError),

    #[error("Error getting current stream format for modification: {0}")]
    ReadFormat(#[source] OsError),

    #[error("Error setting stream format: {0}")]
    WriteFormat(#[source] OsError),

    #[error("Error verifying stream format application: {0}")]
    VerifyFormat(#[source] OsError),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// True for errors raised while talking to the audio subsystem.
    pub fn is_os_error(&self) -> bool {
        matches!(
            self,
            Error::DefaultDevice(_)
                | Error::ReadFormat(_)
                | Error::WriteFormat(_)
                | Error::VerifyFormat(_)
        )
    }
}
