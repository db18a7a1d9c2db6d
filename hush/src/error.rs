//! Caller-facing error type and the engine status translator.

use std::fmt;

use thiserror::Error;

use crate::engine::{EngineFault, EngineStatus};
use crate::model::ModelError;

/// Result type for suppressor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Diagnostic payload carried by translated engine failures: the short
/// message plus the engine's message stack, innermost cause first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostic {
    pub message: String,
    pub trail: Vec<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trail: Vec::new(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.trail.is_empty() {
            write!(f, " [{}]", self.trail.join("; "))?;
        }
        Ok(())
    }
}

/// Errors surfaced by the facade.
///
/// One variant per engine status code, each keeping the originating
/// message stack, plus facade-level failures (model resolution, dead
/// worker). Unknown statuses land in [`Error::UnknownStatus`] so the
/// mapping stays forward-compatible.
#[derive(Debug, Error)]
pub enum Error {
    #[error("out of memory: {0}")]
    OutOfMemory(Diagnostic),

    #[error("io error: {0}")]
    Io(Diagnostic),

    #[error("invalid argument: {0}")]
    InvalidArgument(Diagnostic),

    #[error("stop iteration: {0}")]
    StopIteration(Diagnostic),

    #[error("access key rejected: {0}")]
    KeyError(Diagnostic),

    #[error("invalid state: {0}")]
    InvalidState(Diagnostic),

    #[error("runtime error: {0}")]
    Runtime(Diagnostic),

    #[error("activation error: {0}")]
    ActivationError(Diagnostic),

    #[error("activation limit reached: {0}")]
    ActivationLimitReached(Diagnostic),

    #[error("activation throttled: {0}")]
    ActivationThrottled(Diagnostic),

    #[error("activation refused: {0}")]
    ActivationRefused(Diagnostic),

    /// The engine reported a status this crate does not know.
    #[error("engine status {status}: {diagnostic}")]
    UnknownStatus {
        status: String,
        diagnostic: Diagnostic,
    },

    /// Model resolution failed before the worker was involved.
    #[error("model load failed: {0}")]
    Model(#[from] ModelError),

    /// The worker stopped before acknowledging a pending operation.
    #[error("worker channel closed")]
    ChannelClosed,
}

impl Error {
    /// Translates a raw engine fault, preserving status and stack order.
    pub fn from_fault(fault: EngineFault) -> Self {
        let diagnostic = Diagnostic {
            message: fault.short_message,
            trail: fault.message_stack,
        };
        match fault.status {
            EngineStatus::OutOfMemory => Error::OutOfMemory(diagnostic),
            EngineStatus::IoError => Error::Io(diagnostic),
            EngineStatus::InvalidArgument => Error::InvalidArgument(diagnostic),
            EngineStatus::StopIteration => Error::StopIteration(diagnostic),
            EngineStatus::KeyError => Error::KeyError(diagnostic),
            EngineStatus::InvalidState => Error::InvalidState(diagnostic),
            EngineStatus::RuntimeError => Error::Runtime(diagnostic),
            EngineStatus::ActivationError => Error::ActivationError(diagnostic),
            EngineStatus::ActivationLimitReached => Error::ActivationLimitReached(diagnostic),
            EngineStatus::ActivationThrottled => Error::ActivationThrottled(diagnostic),
            EngineStatus::ActivationRefused => Error::ActivationRefused(diagnostic),
            EngineStatus::Other(status) => Error::UnknownStatus { status, diagnostic },
        }
    }

    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime(Diagnostic::new(message))
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(Diagnostic::new(message))
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState(Diagnostic::new(message))
    }

    /// Engine status this error translates, if any.
    pub fn status(&self) -> Option<EngineStatus> {
        match self {
            Error::OutOfMemory(_) => Some(EngineStatus::OutOfMemory),
            Error::Io(_) => Some(EngineStatus::IoError),
            Error::InvalidArgument(_) => Some(EngineStatus::InvalidArgument),
            Error::StopIteration(_) => Some(EngineStatus::StopIteration),
            Error::KeyError(_) => Some(EngineStatus::KeyError),
            Error::InvalidState(_) => Some(EngineStatus::InvalidState),
            Error::Runtime(_) => Some(EngineStatus::RuntimeError),
            Error::ActivationError(_) => Some(EngineStatus::ActivationError),
            Error::ActivationLimitReached(_) => Some(EngineStatus::ActivationLimitReached),
            Error::ActivationThrottled(_) => Some(EngineStatus::ActivationThrottled),
            Error::ActivationRefused(_) => Some(EngineStatus::ActivationRefused),
            Error::UnknownStatus { status, .. } => Some(EngineStatus::Other(status.clone())),
            Error::Model(_) | Error::ChannelClosed => None,
        }
    }

    /// Diagnostic payload, if this error carries one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Error::OutOfMemory(d)
            | Error::Io(d)
            | Error::InvalidArgument(d)
            | Error::StopIteration(d)
            | Error::KeyError(d)
            | Error::InvalidState(d)
            | Error::Runtime(d)
            | Error::ActivationError(d)
            | Error::ActivationLimitReached(d)
            | Error::ActivationThrottled(d)
            | Error::ActivationRefused(d)
            | Error::UnknownStatus { diagnostic: d, .. } => Some(d),
            Error::Model(_) | Error::ChannelClosed => None,
        }
    }

    /// Ordered diagnostic trail, innermost cause first. Empty when the
    /// error carries no engine message stack.
    pub fn trail(&self) -> &[String] {
        self.diagnostic().map(|d| d.trail.as_slice()).unwrap_or(&[])
    }
}
