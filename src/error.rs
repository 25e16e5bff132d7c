//! Error types for the bridge.
//!
//! Every failure in this crate is terminal for the current run; nothing is
//! retried. The variants follow the failure taxonomy at the bridge boundary:
//! bad options or unsupported host configurations, inconsistent host models
//! discovered during translation, missing backend installations, refused
//! devices, memory-diagnostic findings, and errors surfaced by the backend
//! engine itself.

use std::fmt;
use thiserror::Error;

/// Whether a memory diagnostic ran before or after the trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticStage {
    Pre,
    Post,
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => f.write_str("pre"),
            Self::Post => f.write_str("post"),
        }
    }
}

/// Errors that can occur while initializing, stepping, or tearing down a
/// bridged simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// A malformed or unknown token in the platform option string.
    #[error("invalid platform option \"{token}\": {detail}")]
    InvalidOption {
        /// The offending `key=value` token as the user wrote it.
        token: String,
        /// What was wrong with it.
        detail: String,
    },

    /// The host configuration uses a feature outside the backend's subset.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    /// The host model could not be translated into the backend model.
    ///
    /// Indicates an inconsistent host model, e.g. a malformed coefficient
    /// pair.
    #[error("model translation failed: {0}")]
    Translation(String),

    /// A bonded or constraint term references an atom index outside the
    /// system.
    #[error("{term} term references atom {index}, but the system has {num_atoms} atoms")]
    AtomIndexOutOfRange {
        /// Which term list the bad index came from.
        term: &'static str,
        index: usize,
        num_atoms: usize,
    },

    /// No backend platforms are available (installation problem).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The requested platform is not among the registered ones.
    #[error("the requested platform \"{0}\" could not be found")]
    PlatformNotFound(String),

    /// The bound device is not on the supported-hardware list.
    #[error(
        "the selected device (#{device}, {name}) is not supported; it may be slow or unstable. \
         Use force-device=yes to run on it anyway"
    )]
    DeviceIncompatible { device: i64, name: String },

    /// The memory self-test detected errors.
    ///
    /// Pre-run findings abort before any step executes; post-run findings
    /// flag the completed trajectory as unreliable.
    #[error(
        "the {stage}-simulation device memory test detected {errors} error(s); memory errors \
         would cause incorrect results. Check device cooling and clocks"
    )]
    Diagnostic { stage: DiagnosticStage, errors: u64 },

    /// The backend engine reported a failure.
    #[error("backend error while {phase}: {message}")]
    Backend { phase: String, message: String },
}

impl Error {
    /// Creates an [`InvalidOption`](Error::InvalidOption) error.
    pub fn invalid_option(token: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidOption {
            token: token.into(),
            detail: detail.into(),
        }
    }

    /// Creates an [`Unsupported`](Error::Unsupported) error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Creates a [`Translation`](Error::Translation) error.
    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation(message.into())
    }

    /// Wraps a backend-reported failure with the phase that triggered it.
    pub fn backend(phase: impl Into<String>, source: crate::backend::BackendError) -> Self {
        Self::Backend {
            phase: phase.into(),
            message: source.to_string(),
        }
    }
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;
