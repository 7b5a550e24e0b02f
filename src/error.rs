//! Top level error for a compress or decompress run.
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::StreamError;
use crate::mapping::MapError;
use crate::transform::TransformError;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("input file '{}' and output file '{}' are the same file", .input.display(), .output.display())]
    SameFile { input: PathBuf, output: PathBuf },
}

impl Error {
    /// The codec failure behind this error, if it was one.
    pub fn stream_error(&self) -> Option<&StreamError> {
        match self {
            Error::Transform(e) => e.stream_error(),
            _ => None,
        }
    }

    /// True if the input was damaged or cut short.
    pub fn is_corruption(&self) -> bool {
        self.stream_error().map_or(false, StreamError::is_corruption)
    }

    /// The OS error code behind this error, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::Map(e) | Error::Transform(TransformError::Grow(e)) => e.raw_os_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
