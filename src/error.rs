// src/error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a level build.
///
/// All of these are fatal: the build stops at the first one and the caller
/// throws away whatever output it had opened. Unknown texture names are not
/// represented here, they only produce a warning.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Quake1 build failure: exceeded limit of {limit} {what}")]
    LimitExceeded { what: &'static str, limit: usize },

    #[error("INTERNAL ERROR: zero-length edge at ({x:.1} {y:.1} {z:.1})")]
    ZeroLengthEdge { x: f64, y: f64, z: f64 },

    #[error("No such file: {}", path.display())]
    MissingResource { path: PathBuf },

    #[error("INTERNAL ERROR: lighting quality = {0}")]
    InvalidQuality(i32),

    #[error("INTERNAL ERROR: face #{0} referenced by a leaf before it was written")]
    FaceNotWritten(usize),

    #[error("texture name too long (max 15 chars): {0}")]
    TextureNameTooLong(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("bad config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;

/// Shorthand for the capacity checks scattered through the writers.
pub(crate) fn check_limit(what: &'static str, count: usize, limit: usize) -> Result<()> {
    if count > limit {
        return Err(BuildError::LimitExceeded { what, limit });
    }
    Ok(())
}
