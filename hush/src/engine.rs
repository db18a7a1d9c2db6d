//! Engine binding contract.
//!
//! The signal-processing engine itself is opaque to this crate. Host
//! applications supply an [`EngineFactory`] that builds an [`Engine`] from an
//! access key and a resolved model path; the worker then owns that engine
//! exclusively and drives it from a single thread.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::EngineHints;

/// Status code reported by an engine binding.
///
/// The known values mirror the engine's status vocabulary; anything the
/// binding does not recognize is carried verbatim in [`EngineStatus::Other`]
/// so newer engines keep working against older facades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineStatus {
    OutOfMemory,
    IoError,
    InvalidArgument,
    StopIteration,
    KeyError,
    InvalidState,
    RuntimeError,
    ActivationError,
    ActivationLimitReached,
    ActivationThrottled,
    ActivationRefused,
    /// Status value not known to this binding.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineStatus::OutOfMemory => "OUT_OF_MEMORY",
            EngineStatus::IoError => "IO_ERROR",
            EngineStatus::InvalidArgument => "INVALID_ARGUMENT",
            EngineStatus::StopIteration => "STOP_ITERATION",
            EngineStatus::KeyError => "KEY_ERROR",
            EngineStatus::InvalidState => "INVALID_STATE",
            EngineStatus::RuntimeError => "RUNTIME_ERROR",
            EngineStatus::ActivationError => "ACTIVATION_ERROR",
            EngineStatus::ActivationLimitReached => "ACTIVATION_LIMIT_REACHED",
            EngineStatus::ActivationThrottled => "ACTIVATION_THROTTLED",
            EngineStatus::ActivationRefused => "ACTIVATION_REFUSED",
            EngineStatus::Other(value) => value.as_str(),
        };
        f.write_str(name)
    }
}

/// Failure reported by an engine binding: a status code, a short message,
/// and an ordered message stack, innermost cause first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineFault {
    pub status: EngineStatus,
    pub short_message: String,
    #[serde(default)]
    pub message_stack: Vec<String>,
}

impl EngineFault {
    /// Creates a fault with an empty message stack.
    pub fn new(status: EngineStatus, short_message: impl Into<String>) -> Self {
        Self {
            status,
            short_message: short_message.into(),
            message_stack: Vec::new(),
        }
    }

    /// Attaches a message stack, innermost cause first.
    pub fn with_stack(mut self, stack: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.message_stack = stack.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for EngineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_message)?;
        if !self.message_stack.is_empty() {
            write!(f, " [{}]", self.message_stack.join("; "))?;
        }
        Ok(())
    }
}

/// Metadata describing a successfully initialized engine instance.
///
/// Immutable once created; exactly one exists per live
/// [`NoiseSuppressor`](crate::NoiseSuppressor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInfo {
    /// Engine version string.
    pub version: String,
    /// Number of samples per frame accepted by `process`.
    pub frame_length: usize,
    /// Sample rate the engine expects, in Hz.
    pub sample_rate: u32,
    /// Look-ahead delay: the enhanced frame delivered for an input frame
    /// corresponds to audio submitted this many samples earlier.
    pub delay_sample: u32,
}

/// A live noise-suppression engine instance.
///
/// The worker drives the engine from one thread, so `&mut self` methods
/// never race. Frame-length validation is the engine's responsibility.
pub trait Engine: Send {
    /// Processes one frame and returns the enhanced frame. Output may lag
    /// input by `delay_sample` samples due to internal look-ahead buffering.
    fn process(&mut self, frame: &[i16]) -> Result<Vec<i16>, EngineFault>;

    /// Drops internal buffering state, as if freshly initialized. Called on
    /// audio discontinuities between frames.
    fn reset(&mut self) -> Result<(), EngineFault>;

    /// Releases engine resources. The engine is not used afterwards.
    fn release(&mut self) -> Result<(), EngineFault>;
}

/// Builds [`Engine`] instances from an access key and a resolved model path.
pub trait EngineFactory: Send + Sync {
    fn init(
        &self,
        access_key: &str,
        model_path: &Path,
        hints: &EngineHints,
    ) -> Result<(Box<dyn Engine>, EngineInfo), EngineFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&EngineStatus::InvalidArgument).unwrap();
        assert_eq!(json, "\"INVALID_ARGUMENT\"");

        let status: EngineStatus = serde_json::from_str("\"ACTIVATION_THROTTLED\"").unwrap();
        assert_eq!(status, EngineStatus::ActivationThrottled);
    }

    #[test]
    fn test_status_unknown_value_falls_back() {
        let status: EngineStatus = serde_json::from_str("\"QUOTA_EXCEEDED\"").unwrap();
        assert_eq!(status, EngineStatus::Other("QUOTA_EXCEEDED".to_string()));
        assert_eq!(status.to_string(), "QUOTA_EXCEEDED");

        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"QUOTA_EXCEEDED\"");
    }

    #[test]
    fn test_fault_display_keeps_stack_order() {
        let fault = EngineFault::new(EngineStatus::IoError, "cannot open model")
            .with_stack(["fopen failed", "loading model"]);
        assert_eq!(
            fault.to_string(),
            "cannot open model [fopen failed; loading model]"
        );
    }
}
