//! Command and response envelopes exchanged between facade and worker.
//!
//! One ordered channel runs in each direction. The worker emits exactly one
//! response per command, in command order, which is what makes the facade's
//! callback sequence match the `process` call sequence.
//!
//! Envelope wire format (JSON representation):
//!
//! - commands: `{"command": "init" | "process" | "reset" | "release", ...}`
//! - responses: `{"command": "ok" | "ok-process" | "ok-reset" | "failed" | "error", ...}`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::EngineHints;
use crate::engine::{EngineFault, EngineInfo};

/// Command envelope, facade → worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    /// Constructs the engine. Sent exactly once per facade instance.
    /// Facade-local callbacks are never part of this payload.
    #[serde(rename_all = "camelCase")]
    Init {
        access_key: String,
        model_path: PathBuf,
        #[serde(default)]
        hints: EngineHints,
    },
    /// Processes one frame of input audio.
    #[serde(rename_all = "camelCase")]
    Process { input_frame: Vec<i16> },
    /// Drops engine buffering state.
    Reset,
    /// Releases engine resources and stops the worker.
    Release,
}

impl Command {
    /// Wire name of the command, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init { .. } => "init",
            Command::Process { .. } => "process",
            Command::Reset => "reset",
            Command::Release => "release",
        }
    }
}

/// Response envelope, worker → facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Response {
    /// Acknowledges `init` (carries the engine info) or `release` (carries
    /// none).
    Ok {
        #[serde(flatten)]
        info: Option<EngineInfo>,
    },
    /// Enhanced frame for an earlier `process` command.
    #[serde(rename_all = "camelCase")]
    OkProcess { enhanced_pcm: Vec<i16> },
    /// Acknowledges `reset`.
    OkReset,
    /// The engine reported a status-code failure.
    Failed(EngineFault),
    /// The worker hit a fault outside the engine status contract.
    Error(EngineFault),
    /// Command value outside the known vocabulary.
    #[serde(other)]
    Unknown,
}

impl Response {
    /// Wire name of the response command, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Response::Ok { .. } => "ok",
            Response::OkProcess { .. } => "ok-process",
            Response::OkReset => "ok-reset",
            Response::Failed(_) => "failed",
            Response::Error(_) => "error",
            Response::Unknown => "unknown",
        }
    }
}
