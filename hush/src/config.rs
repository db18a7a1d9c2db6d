//! Process-wide runtime configuration and per-instance options.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::EngineFactory;
use crate::error::Error;
use crate::model::{FsModelLoader, ModelLoader};

/// Engine-selection hints forwarded verbatim inside the init command.
/// All fields are optional; the factory applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineHints {
    /// Named engine build variant (e.g. a SIMD flavor).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Thread count the engine may use internally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<u32>,
}

/// Process-wide configuration.
///
/// Build one at startup and pass it by reference into every
/// [`NoiseSuppressor::create`](crate::NoiseSuppressor::create) call. There
/// is no global mutable state; everything an instance needs travels
/// through this struct.
#[derive(Clone)]
pub struct RuntimeConfig {
    pub(crate) engine: Arc<dyn EngineFactory>,
    pub(crate) models: Arc<dyn ModelLoader>,
    pub(crate) hints: EngineHints,
}

impl RuntimeConfig {
    /// Creates a configuration around an engine factory, with the
    /// filesystem model store and default hints.
    pub fn new(engine: Arc<dyn EngineFactory>) -> Result<Self, Error> {
        Ok(Self {
            engine,
            models: Arc::new(FsModelLoader::new()?),
            hints: EngineHints::default(),
        })
    }

    /// Replaces the model loader.
    pub fn with_model_loader(mut self, models: Arc<dyn ModelLoader>) -> Self {
        self.models = models;
        self
    }

    /// Sets the engine-selection hints used by new instances.
    pub fn with_hints(mut self, hints: EngineHints) -> Self {
        self.hints = hints;
        self
    }
}

/// Hook receiving failures that have no caller to return to: process and
/// reset faults, late protocol errors.
pub type ErrorHook = Box<dyn Fn(Error) + Send + Sync>;

/// Per-instance options for [`NoiseSuppressor::create`](crate::NoiseSuppressor::create).
#[derive(Default)]
pub struct SuppressorOptions {
    /// Receives asynchronous failures. When unset they are logged at error
    /// level instead. Stays facade-local, never transmitted to the worker.
    pub on_error: Option<ErrorHook>,
}

impl SuppressorOptions {
    /// Options with an error hook installed.
    pub fn with_error_hook(hook: impl Fn(Error) + Send + Sync + 'static) -> Self {
        Self {
            on_error: Some(Box::new(hook)),
        }
    }
}
