//! Asynchronous facade for streaming noise-suppression engines.
//!
//! The engine runs on a dedicated blocking worker that owns it exclusively;
//! the facade talks to the worker over one ordered command channel and one
//! ordered response channel, so per-frame processing never blocks the
//! caller. Because both channels are FIFO and the worker handles one
//! command at a time, enhanced frames reach the frame callback in the exact
//! order the input frames were submitted.
//!
//! The engine itself is opaque: implement [`EngineFactory`] and [`Engine`]
//! over the binding of your choice, and hand the factory to a
//! [`RuntimeConfig`] built once at startup.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hush::{ModelDescriptor, NoiseSuppressor, RuntimeConfig, SuppressorOptions};
//!
//! # async fn run(factory: Arc<dyn hush::EngineFactory>) -> hush::Result<()> {
//! let config = RuntimeConfig::new(factory)?;
//!
//! let suppressor = NoiseSuppressor::create(
//!     &config,
//!     "your-access-key",
//!     |enhanced| {
//!         // One call per submitted frame, in submission order.
//!         let _ = enhanced;
//!     },
//!     ModelDescriptor::from_path("suppressor.model"),
//!     SuppressorOptions::default(),
//! )
//! .await?;
//!
//! let frame = vec![0i16; suppressor.frame_length()];
//! suppressor.process(&frame);
//!
//! suppressor.release().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod model;
pub mod protocol;
mod suppressor;
pub mod testing;
mod worker;

pub use config::{EngineHints, ErrorHook, RuntimeConfig, SuppressorOptions};
pub use engine::{Engine, EngineFactory, EngineFault, EngineInfo, EngineStatus};
pub use error::{Diagnostic, Error, Result};
pub use model::{FsModelLoader, ModelContent, ModelDescriptor, ModelError, ModelLoader};
pub use suppressor::NoiseSuppressor;
