use std::fmt;

use crate::render::cache;

/// A convenient result type wrapping [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct DecodeError {
    pub path: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct DimensionError {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to decode heightmap '{}': {}",
            self.path, self.reason
        )
    }
}

impl fmt::Display for DimensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Heightmap '{}' is {}x{}, but both dimensions must be powers of two!",
            self.path, self.width, self.height
        )
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for DimensionError {}

#[derive(Debug)]
pub enum Error {
    Decode(DecodeError),
    Dimensions(DimensionError),
    Cache(cache::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Decode(err) => err.fmt(f),
            Error::Dimensions(err) => err.fmt(f),
            Error::Cache(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(err) => Some(err),
            Error::Dimensions(err) => Some(err),
            Error::Cache(err) => Some(err),
        }
    }
}

impl From<cache::Error> for Error {
    fn from(value: cache::Error) -> Self {
        Error::Cache(value)
    }
}
