//! Gameplay error types.
//!
//! Errors only surface at level-build and configuration time.  Nothing on the
//! per-frame path returns a [`GameError`]: stale collision references are
//! skipped silently and a full particle pool evicts instead of failing.

use thiserror::Error;

/// Why an outline could not be turned into a body.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OutlineDefect {
    #[error("outline has {got} usable points (need at least 3)")]
    TooFewPoints { got: usize },

    #[error("outline encloses zero area")]
    ZeroArea,

    #[error("scale factor {scale} must be finite and positive")]
    InvalidScale { scale: f32 },

    #[error("outline edges intersect")]
    SelfIntersecting,

    #[error("outline could not be tessellated: {reason}")]
    Untessellable { reason: String },
}

/// Top-level error enum for the gameplay core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// The caller should discard this spawn attempt.
    #[error("malformed outline: {reason}")]
    MalformedOutline { reason: OutlineDefect },

    #[error("no outline registered under '{id}'")]
    UnknownOutline { id: String },

    #[error("outline sample step {step} must be finite and positive")]
    InvalidSampleStep { step: f32 },

    #[error("invalid config value for '{field}': {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error("config could not be parsed: {reason}")]
    ConfigParse { reason: String },
}

impl From<OutlineDefect> for GameError {
    fn from(reason: OutlineDefect) -> Self {
        GameError::MalformedOutline { reason }
    }
}

/// Convenience alias: a `Result` using [`GameError`] as the error type.
pub type GameResult<T> = Result<T, GameError>;
