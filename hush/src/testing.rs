//! Deterministic engine doubles for tests.
//!
//! [`ScriptedFactory`] builds [`ScriptedEngine`] instances whose outcomes
//! are scripted ahead of time; unscripted process calls echo the input
//! frame back. A shared [`CallLog`] counts binding calls.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::EngineHints;
use crate::engine::{Engine, EngineFactory, EngineFault, EngineInfo};

/// Counts calls made against the binding.
#[derive(Debug, Default)]
pub struct CallLog {
    pub init_calls: AtomicUsize,
    pub process_calls: AtomicUsize,
    pub reset_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
}

impl CallLog {
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn process_calls(&self) -> usize {
        self.process_calls.load(Ordering::SeqCst)
    }
}

type ProcessOutcome = std::result::Result<Vec<i16>, EngineFault>;

/// Factory double with scripted init/process/reset/release outcomes.
pub struct ScriptedFactory {
    info: EngineInfo,
    init_fault: Mutex<Option<EngineFault>>,
    process_script: Mutex<VecDeque<ProcessOutcome>>,
    reset_fault: Mutex<Option<EngineFault>>,
    release_fault: Mutex<Option<EngineFault>>,
    log: Arc<CallLog>,
}

impl ScriptedFactory {
    /// Factory reporting a 512-sample, 16 kHz engine with 256 samples of
    /// look-ahead delay.
    pub fn new() -> Self {
        Self::with_info(EngineInfo {
            version: "1.0.0".to_string(),
            frame_length: 512,
            sample_rate: 16000,
            delay_sample: 256,
        })
    }

    pub fn with_info(info: EngineInfo) -> Self {
        Self {
            info,
            init_fault: Mutex::new(None),
            process_script: Mutex::new(VecDeque::new()),
            reset_fault: Mutex::new(None),
            release_fault: Mutex::new(None),
            log: Arc::new(CallLog::default()),
        }
    }

    /// Makes the next init call fail with `fault`.
    pub fn fail_init(self, fault: EngineFault) -> Self {
        if let Ok(mut slot) = self.init_fault.lock() {
            *slot = Some(fault);
        }
        self
    }

    /// Queues an outcome for the next unscripted process call.
    pub fn script_process(self, outcome: ProcessOutcome) -> Self {
        if let Ok(mut script) = self.process_script.lock() {
            script.push_back(outcome);
        }
        self
    }

    /// Makes the next reset call fail with `fault`.
    pub fn fail_reset(self, fault: EngineFault) -> Self {
        if let Ok(mut slot) = self.reset_fault.lock() {
            *slot = Some(fault);
        }
        self
    }

    /// Makes the next release call fail with `fault`.
    pub fn fail_release(self, fault: EngineFault) -> Self {
        if let Ok(mut slot) = self.release_fault.lock() {
            *slot = Some(fault);
        }
        self
    }

    /// Shared call counters.
    pub fn log(&self) -> Arc<CallLog> {
        Arc::clone(&self.log)
    }
}

impl Default for ScriptedFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for ScriptedFactory {
    fn init(
        &self,
        _access_key: &str,
        _model_path: &Path,
        _hints: &EngineHints,
    ) -> std::result::Result<(Box<dyn Engine>, EngineInfo), EngineFault> {
        self.log.init_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = self.init_fault.lock().ok().and_then(|mut slot| slot.take()) {
            return Err(fault);
        }
        let script = self
            .process_script
            .lock()
            .map(|mut script| script.drain(..).collect())
            .unwrap_or_default();
        let engine = ScriptedEngine {
            script,
            reset_fault: self.reset_fault.lock().ok().and_then(|mut slot| slot.take()),
            release_fault: self
                .release_fault
                .lock()
                .ok()
                .and_then(|mut slot| slot.take()),
            log: Arc::clone(&self.log),
        };
        Ok((Box::new(engine), self.info.clone()))
    }
}

/// Engine double driven by the factory's script.
pub struct ScriptedEngine {
    script: VecDeque<ProcessOutcome>,
    reset_fault: Option<EngineFault>,
    release_fault: Option<EngineFault>,
    log: Arc<CallLog>,
}

impl Engine for ScriptedEngine {
    fn process(&mut self, frame: &[i16]) -> std::result::Result<Vec<i16>, EngineFault> {
        self.log.process_calls.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(outcome) => outcome,
            None => Ok(frame.to_vec()),
        }
    }

    fn reset(&mut self) -> std::result::Result<(), EngineFault> {
        self.log.reset_calls.fetch_add(1, Ordering::SeqCst);
        match self.reset_fault.take() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn release(&mut self) -> std::result::Result<(), EngineFault> {
        self.log.release_calls.fetch_add(1, Ordering::SeqCst);
        match self.release_fault.take() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}
