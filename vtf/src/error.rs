use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VtfError>;

#[derive(Debug, Error)]
pub enum VtfError {
    #[error("malformed VTF data: {0}")]
    MalformedData(String),
    #[error("unsupported VTF version {major}.{minor}")]
    UnsupportedVersion { major: u32, minor: u32 },
    #[error("unsupported image format {0}")]
    UnsupportedFormat(String),
    #[error("unsupported pixel mode {0}, only RGBA8 images can be saved")]
    UnsupportedMode(String),
    #[error("invalid dimensions {width}x{height}, both sides must be non-zero powers of two")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl VtfError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        VtfError::MalformedData(msg.into())
    }
}

pub(crate) fn is_power_of_two(x: u32) -> bool {
    x != 0 && x & (x - 1) == 0
}

/// Fails with [`VtfError::InvalidDimensions`] unless both sides are non-zero powers of two.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if is_power_of_two(width) && is_power_of_two(height) {
        Ok(())
    } else {
        Err(VtfError::InvalidDimensions { width, height })
    }
}
