use std::fmt;

use crate::gpu::GpuError;

/// A convenient result type wrapping [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct AlignmentError {
    pub binding: u32,
    pub byte_size: u32,
}

impl fmt::Display for AlignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uniform buffer for binding {} has size {} which is not a multiple of 16!",
            self.binding, self.byte_size
        )
    }
}

impl std::error::Error for AlignmentError {}

#[derive(Debug)]
pub enum Error {
    Alignment(AlignmentError),
    Gpu(GpuError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Alignment(err) => err.fmt(f),
            Error::Gpu(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Alignment(err) => Some(err),
            Error::Gpu(err) => Some(err),
        }
    }
}

impl From<GpuError> for Error {
    fn from(value: GpuError) -> Self {
        Error::Gpu(value)
    }
}
