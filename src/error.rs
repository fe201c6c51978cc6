// src/error.rs

use thiserror::Error;

/// Errors surfaced by the session core.
///
/// Out-of-range dial edits are not errors: they are silent no-ops,
/// reported as `Ok(false)` / `Ok(None)` by the dial registry.
#[derive(Error, Debug)]
pub enum SimViewError {
    #[error("Unknown spectrum shape: {0}")]
    UnknownSpectrumShape(String),

    #[error("Unknown dial: {0}")]
    UnknownDial(String),

    #[error("Dial {0} is not active in the current experiment mode")]
    InactiveDial(String),

    #[error("SASE pulse source exhausted after {0} pulses")]
    PulsesExhausted(usize),

    #[error("Simulation gateway failed: {0}")]
    Gateway(String),

    #[error("Gateway returned {got} intensities for {expected} pixel addresses")]
    PixelCountMismatch { expected: usize, got: usize },

    #[error("Orientation matrix is singular")]
    SingularOrientation,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimViewError>;
