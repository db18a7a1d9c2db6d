//! Worker-side command dispatcher.
//!
//! The worker runs as a blocking task, exclusively owns the engine, and
//! emits exactly one response per command, in command order. The facade and
//! the worker share no state beyond the two channels.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::{Engine, EngineFactory, EngineFault, EngineStatus};
use crate::protocol::{Command, Response};

enum State {
    Uninitialized,
    Ready(Box<dyn Engine>),
    Done,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Uninitialized => "uninitialized",
            State::Ready(_) => "ready",
            State::Done => "done",
        }
    }
}

/// Drains the command channel until release, cancellation, or the facade
/// dropping its sender.
pub(crate) fn run(
    factory: Arc<dyn EngineFactory>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    responses: mpsc::UnboundedSender<Response>,
    cancel: CancellationToken,
) {
    let mut state = State::Uninitialized;
    while let Some(command) = commands.blocking_recv() {
        if cancel.is_cancelled() {
            debug!(command = command.name(), "worker cancelled, discarding queued command");
            break;
        }
        let (next, response) = dispatch(factory.as_ref(), state, command);
        state = next;
        if responses.send(response).is_err() {
            // Facade side is gone; nothing left to report to.
            break;
        }
        if matches!(state, State::Done) {
            break;
        }
    }
    debug!("worker loop exited");
}

fn dispatch(factory: &dyn EngineFactory, state: State, command: Command) -> (State, Response) {
    match (state, command) {
        (
            State::Uninitialized,
            Command::Init {
                access_key,
                model_path,
                hints,
            },
        ) => match factory.init(&access_key, &model_path, &hints) {
            Ok((engine, info)) => {
                debug!(
                    version = %info.version,
                    frame_length = info.frame_length,
                    "engine initialized"
                );
                (State::Ready(engine), Response::Ok { info: Some(info) })
            }
            Err(fault) => {
                warn!(status = %fault.status, "engine init failed");
                (State::Uninitialized, Response::Failed(fault))
            }
        },
        (State::Ready(mut engine), Command::Process { input_frame }) => {
            let response = match engine.process(&input_frame) {
                Ok(enhanced_pcm) => Response::OkProcess { enhanced_pcm },
                Err(fault) => Response::Failed(fault),
            };
            (State::Ready(engine), response)
        }
        (State::Ready(mut engine), Command::Reset) => {
            let response = match engine.reset() {
                Ok(()) => Response::OkReset,
                Err(fault) => Response::Failed(fault),
            };
            (State::Ready(engine), response)
        }
        (State::Ready(mut engine), Command::Release) => {
            let response = match engine.release() {
                Ok(()) => Response::Ok { info: None },
                Err(fault) => Response::Failed(fault),
            };
            (State::Done, response)
        }
        (state, command) => {
            warn!(state = state.name(), command = command.name(), "command outside valid state");
            let fault = EngineFault::new(
                EngineStatus::RuntimeError,
                format!(
                    "Unrecognized command in {} state: {}",
                    state.name(),
                    command.name()
                ),
            );
            (state, Response::Error(fault))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineHints;
    use crate::testing::ScriptedFactory;
    use std::path::PathBuf;

    fn init_command() -> Command {
        Command::Init {
            access_key: "key".to_string(),
            model_path: PathBuf::from("/tmp/model"),
            hints: EngineHints::default(),
        }
    }

    #[test]
    fn test_init_transitions_to_ready() {
        let factory = ScriptedFactory::new();
        let (state, response) = dispatch(&factory, State::Uninitialized, init_command());
        assert!(matches!(state, State::Ready(_)));
        match response {
            Response::Ok { info: Some(info) } => assert_eq!(info.frame_length, 512),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_init_failure_stays_uninitialized() {
        let factory = ScriptedFactory::new().fail_init(EngineFault::new(
            EngineStatus::ActivationError,
            "bad key",
        ));
        let (state, response) = dispatch(&factory, State::Uninitialized, init_command());
        assert!(matches!(state, State::Uninitialized));
        assert!(matches!(response, Response::Failed(_)));
    }

    #[test]
    fn test_process_before_init_is_protocol_error() {
        let factory = ScriptedFactory::new();
        let (state, response) = dispatch(
            &factory,
            State::Uninitialized,
            Command::Process { input_frame: vec![0; 4] },
        );
        assert!(matches!(state, State::Uninitialized));
        match response {
            Response::Error(fault) => {
                assert_eq!(fault.status, EngineStatus::RuntimeError);
                assert!(fault.short_message.contains("Unrecognized command"));
                assert!(fault.short_message.contains("process"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_release_transitions_to_done() {
        let factory = ScriptedFactory::new();
        let (state, _) = dispatch(&factory, State::Uninitialized, init_command());
        let (state, response) = dispatch(&factory, state, Command::Release);
        assert!(matches!(state, State::Done));
        assert_eq!(response, Response::Ok { info: None });
    }

    #[tokio::test]
    async fn test_run_emits_one_response_per_command_in_order() {
        let factory: Arc<dyn EngineFactory> = Arc::new(ScriptedFactory::new());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (response_tx, mut response_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        command_tx.send(init_command()).unwrap();
        command_tx
            .send(Command::Process { input_frame: vec![1; 4] })
            .unwrap();
        command_tx
            .send(Command::Process { input_frame: vec![2; 4] })
            .unwrap();
        command_tx.send(Command::Release).unwrap();

        let worker =
            tokio::task::spawn_blocking(move || run(factory, command_rx, response_tx, cancel));

        let mut names = Vec::new();
        while let Some(response) = response_rx.recv().await {
            names.push(response.name());
        }
        assert_eq!(names, ["ok", "ok-process", "ok-process", "ok"]);
        worker.await.unwrap();
    }
}
