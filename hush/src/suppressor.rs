//! Public facade over the worker-hosted engine.
//!
//! [`NoiseSuppressor::create`] spawns exactly one worker, sends the single
//! init command of the instance's lifetime, and consumes the first response
//! inline. Every later response is routed by a steady-state dispatcher
//! task: enhanced frames to the frame callback, faults to the error sink,
//! the release acknowledgment to the pending `release` call.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::{RuntimeConfig, SuppressorOptions};
use crate::engine::EngineInfo;
use crate::error::{Error, Result};
use crate::model::ModelDescriptor;
use crate::protocol::{Command, Response};
use crate::worker;

/// Routes failures that have no caller to return to.
struct ErrorSink {
    hook: Option<crate::config::ErrorHook>,
}

impl ErrorSink {
    fn emit(&self, err: Error) {
        match &self.hook {
            Some(hook) => hook(err),
            None => error!(error = %err, "unhandled suppressor error"),
        }
    }
}

type ReleaseSlot = Arc<Mutex<Option<oneshot::Sender<Result<()>>>>>;

fn take_release(slot: &ReleaseSlot) -> Option<oneshot::Sender<Result<()>>> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

/// Asynchronous handle to one worker-hosted noise-suppression engine.
///
/// `process` and `reset` enqueue and return immediately; `create` and
/// `release` suspend until the worker acknowledges. The command channel is
/// FIFO and the worker handles one command at a time, so enhanced frames
/// reach the frame callback in submission order.
///
/// `release` and `terminate` consume the handle, so no command can follow
/// teardown. Dropping the handle behaves like `terminate`.
pub struct NoiseSuppressor {
    info: EngineInfo,
    commands: mpsc::UnboundedSender<Command>,
    release_slot: ReleaseSlot,
    errors: Arc<ErrorSink>,
    cancel: CancellationToken,
    dispatcher: JoinHandle<()>,
    _worker: JoinHandle<()>,
}

impl std::fmt::Debug for NoiseSuppressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseSuppressor")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl NoiseSuppressor {
    /// Creates a suppressor: resolves the model, spawns the worker, and
    /// suspends until the engine reports ready.
    ///
    /// `on_frame` receives each enhanced frame, in submission order. Note
    /// that the engine buffers look-ahead internally, so an enhanced frame
    /// corresponds to audio submitted [`delay_sample`](Self::delay_sample)
    /// samples earlier.
    ///
    /// Fails with the translated engine error when initialization is
    /// rejected, or with [`Error::Model`] when the model cannot be
    /// resolved.
    pub async fn create<F>(
        config: &RuntimeConfig,
        access_key: &str,
        on_frame: F,
        model: ModelDescriptor,
        options: SuppressorOptions,
    ) -> Result<Self>
    where
        F: FnMut(Vec<i16>) + Send + 'static,
    {
        if access_key.is_empty() {
            return Err(Error::invalid_argument("access key must not be empty"));
        }

        let model_path = config.models.load(&model).await?;
        debug!(path = %model_path.display(), "model resolved");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (response_tx, mut response_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let factory = Arc::clone(&config.engine);
        let worker_cancel = cancel.clone();
        let worker = tokio::task::spawn_blocking(move || {
            worker::run(factory, command_rx, response_tx, worker_cancel)
        });

        command_tx
            .send(Command::Init {
                access_key: access_key.to_string(),
                model_path,
                hints: config.hints.clone(),
            })
            .map_err(|_| Error::ChannelClosed)?;

        // The first response is special: it resolves creation. Everything
        // after it belongs to the steady-state dispatcher.
        let info = match response_rx.recv().await {
            Some(Response::Ok { info: Some(info) }) => info,
            Some(Response::Ok { info: None }) => {
                return Err(Error::runtime("init response carried no engine info"));
            }
            Some(Response::Failed(fault)) | Some(Response::Error(fault)) => {
                return Err(Error::from_fault(fault));
            }
            Some(other) => {
                return Err(Error::runtime(format!(
                    "Unrecognized command: {}",
                    other.name()
                )));
            }
            None => return Err(Error::ChannelClosed),
        };

        let errors = Arc::new(ErrorSink {
            hook: options.on_error,
        });
        let release_slot: ReleaseSlot = Arc::new(Mutex::new(None));
        let dispatcher = tokio::spawn(dispatch_responses(
            response_rx,
            on_frame,
            Arc::clone(&errors),
            Arc::clone(&release_slot),
        ));

        debug!(
            version = %info.version,
            frame_length = info.frame_length,
            sample_rate = info.sample_rate,
            delay_sample = info.delay_sample,
            "suppressor ready"
        );

        Ok(Self {
            info,
            commands: command_tx,
            release_slot,
            errors,
            cancel,
            dispatcher,
            _worker: worker,
        })
    }

    /// Enqueues one frame of exactly [`frame_length`](Self::frame_length)
    /// samples and returns immediately. The enhanced frame arrives on the
    /// frame callback; failures go to the error hook. Frame length is not
    /// validated here, the engine rejects malformed frames.
    pub fn process(&self, pcm: &[i16]) {
        let command = Command::Process {
            input_frame: pcm.to_vec(),
        };
        if self.commands.send(command).is_err() {
            self.errors
                .emit(Error::invalid_state("process after worker stopped"));
        }
    }

    /// Enqueues a reset of the engine's internal buffering state, as if
    /// freshly initialized. Call on audio discontinuities between frames.
    /// Fire-and-forget; a reset fault is routed to the error hook.
    pub fn reset(&self) {
        if self.commands.send(Command::Reset).is_err() {
            self.errors
                .emit(Error::invalid_state("reset after worker stopped"));
        }
    }

    /// Releases engine resources, consuming the handle. Frames submitted
    /// before this call still complete; once the returned future resolves,
    /// no further callbacks fire.
    pub async fn release(self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if let Ok(mut slot) = self.release_slot.lock() {
            *slot = Some(ack_tx);
        }
        self.commands
            .send(Command::Release)
            .map_err(|_| Error::ChannelClosed)?;
        match ack_rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::ChannelClosed),
        }
    }

    /// Stops the worker immediately without waiting for acknowledgment,
    /// discarding queued and in-flight work. For teardown paths where
    /// `release` cannot be awaited.
    pub fn terminate(self) {
        debug!("suppressor terminated");
        // Drop performs the teardown.
    }

    /// Engine version string.
    pub fn version(&self) -> &str {
        &self.info.version
    }

    /// Number of samples per frame the engine accepts.
    pub fn frame_length(&self) -> usize {
        self.info.frame_length
    }

    /// Sample rate the engine expects, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    /// Look-ahead delay between an input frame and its enhanced output, in
    /// samples.
    pub fn delay_sample(&self) -> u32 {
        self.info.delay_sample
    }

    /// Full engine metadata.
    pub fn info(&self) -> &EngineInfo {
        &self.info
    }
}

impl Drop for NoiseSuppressor {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.dispatcher.abort();
    }
}

/// Steady-state response routing. Runs until the worker closes its side of
/// the response channel.
async fn dispatch_responses<F>(
    mut responses: mpsc::UnboundedReceiver<Response>,
    mut on_frame: F,
    errors: Arc<ErrorSink>,
    release_slot: ReleaseSlot,
) where
    F: FnMut(Vec<i16>) + Send + 'static,
{
    while let Some(response) = responses.recv().await {
        match response {
            Response::OkProcess { enhanced_pcm } => on_frame(enhanced_pcm),
            Response::OkReset => {}
            Response::Ok { .. } => match take_release(&release_slot) {
                Some(pending) => {
                    let _ = pending.send(Ok(()));
                }
                None => errors.emit(Error::runtime("ok response with no pending release")),
            },
            Response::Failed(fault) | Response::Error(fault) => {
                let err = Error::from_fault(fault);
                // Responses carry no correlation id; under FIFO ordering a
                // fault seen while a release is pending answers the release.
                match take_release(&release_slot) {
                    Some(pending) => {
                        let _ = pending.send(Err(err));
                    }
                    None => errors.emit(err),
                }
            }
            other @ Response::Unknown => {
                errors.emit(Error::runtime(format!(
                    "Unrecognized command: {}",
                    other.name()
                )));
            }
        }
    }
    if let Some(pending) = take_release(&release_slot) {
        let _ = pending.send(Err(Error::ChannelClosed));
    }
}
