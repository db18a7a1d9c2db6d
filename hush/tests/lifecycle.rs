//! End-to-end lifecycle tests against scripted engine doubles.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_test::assert_ok;
use tokio::time::timeout;

use hush::testing::ScriptedFactory;
use hush::{
    EngineFault, EngineStatus, Error, FsModelLoader, ModelDescriptor, NoiseSuppressor,
    RuntimeConfig, SuppressorOptions,
};

static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

fn scratch_root() -> PathBuf {
    std::env::temp_dir().join(format!(
        "hush-lifecycle-{}-{}",
        std::process::id(),
        DIR_SEQ.fetch_add(1, Ordering::Relaxed)
    ))
}

fn test_config(factory: ScriptedFactory) -> RuntimeConfig {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    RuntimeConfig::new(Arc::new(factory))
        .expect("runtime config")
        .with_model_loader(Arc::new(FsModelLoader::with_root(scratch_root())))
}

fn test_model() -> ModelDescriptor {
    ModelDescriptor::from_bytes("suppressor", vec![0xAB; 16])
}

async fn recv_frame(rx: &mut mpsc::UnboundedReceiver<Vec<i16>>) -> Option<Vec<i16>> {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for frame")
}

#[tokio::test]
async fn test_create_reports_engine_metadata() {
    let config = test_config(ScriptedFactory::new());
    let suppressor = NoiseSuppressor::create(
        &config,
        "key",
        |_| {},
        test_model(),
        SuppressorOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(suppressor.version(), "1.0.0");
    assert_eq!(suppressor.frame_length(), 512);
    assert_eq!(suppressor.sample_rate(), 16000);
    assert_eq!(suppressor.delay_sample(), 256);

    tokio_test::assert_ok!(suppressor.release().await);
}

#[tokio::test]
async fn test_empty_access_key_rejected() {
    let config = test_config(ScriptedFactory::new());
    let result = NoiseSuppressor::create(
        &config,
        "",
        |_| {},
        test_model(),
        SuppressorOptions::default(),
    )
    .await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn test_callbacks_preserve_submission_order() {
    let config = test_config(ScriptedFactory::new());
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let suppressor = NoiseSuppressor::create(
        &config,
        "key",
        move |frame| {
            let _ = frame_tx.send(frame);
        },
        test_model(),
        SuppressorOptions::default(),
    )
    .await
    .unwrap();

    let frame_length = suppressor.frame_length();
    for n in 0..8i16 {
        suppressor.process(&vec![n; frame_length]);
    }

    for n in 0..8i16 {
        let frame = recv_frame(&mut frame_rx).await.unwrap();
        assert_eq!(frame.len(), frame_length);
        assert_eq!(frame, vec![n; frame_length]);
    }

    tokio_test::assert_ok!(suppressor.release().await);
}

#[tokio::test]
async fn test_scripted_enhanced_frame_reaches_callback_once() {
    let enhanced = vec![7i16; 512];
    let factory = ScriptedFactory::new().script_process(Ok(enhanced.clone()));
    let config = test_config(factory);

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let suppressor = NoiseSuppressor::create(
        &config,
        "key",
        move |frame| {
            let _ = frame_tx.send(frame);
        },
        test_model(),
        SuppressorOptions::default(),
    )
    .await
    .unwrap();

    suppressor.process(&vec![0; 512]);
    assert_eq!(recv_frame(&mut frame_rx).await.unwrap(), enhanced);

    tokio_test::assert_ok!(suppressor.release().await);
    assert!(frame_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_single_init_across_lifetime() {
    let factory = ScriptedFactory::new();
    let log = factory.log();
    let config = test_config(factory);

    let suppressor = NoiseSuppressor::create(
        &config,
        "key",
        |_| {},
        test_model(),
        SuppressorOptions::default(),
    )
    .await
    .unwrap();

    suppressor.process(&vec![0; 512]);
    suppressor.reset();
    suppressor.process(&vec![1; 512]);
    tokio_test::assert_ok!(suppressor.release().await);

    assert_eq!(log.init_calls(), 1);
    assert_eq!(log.process_calls(), 2);
}

#[tokio::test]
async fn test_release_drains_pending_frames_then_stops() {
    let config = test_config(ScriptedFactory::new());
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let suppressor = NoiseSuppressor::create(
        &config,
        "key",
        move |frame| {
            let _ = frame_tx.send(frame);
        },
        test_model(),
        SuppressorOptions::default(),
    )
    .await
    .unwrap();

    for n in 0..3i16 {
        suppressor.process(&vec![n; 512]);
    }
    tokio_test::assert_ok!(suppressor.release().await);

    // Frames submitted before release all completed, in order, and the
    // stream ends: no callback can fire after release resolves.
    for n in 0..3i16 {
        assert_eq!(recv_frame(&mut frame_rx).await.unwrap(), vec![n; 512]);
    }
    assert!(frame_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_init_failure_translates_status_and_trail() {
    let fault = EngineFault::new(EngineStatus::InvalidArgument, "bad frame")
        .with_stack(["m1", "m2"]);
    let config = test_config(ScriptedFactory::new().fail_init(fault));

    let err = NoiseSuppressor::create(
        &config,
        "key",
        |_| {},
        test_model(),
        SuppressorOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), Some(EngineStatus::InvalidArgument));
    assert_eq!(err.trail(), ["m1", "m2"]);
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_model_load_failure_rejects_create() {
    let config = test_config(ScriptedFactory::new());
    let err = NoiseSuppressor::create(
        &config,
        "key",
        |_| {},
        ModelDescriptor::from_path("/nonexistent/suppressor.model"),
        SuppressorOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Model(_)));
}

#[tokio::test]
async fn test_process_fault_routed_to_error_hook() {
    let fault = EngineFault::new(EngineStatus::RuntimeError, "engine fault");
    let factory = ScriptedFactory::new().script_process(Err(fault));
    let config = test_config(factory);

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let (error_tx, mut error_rx) = mpsc::unbounded_channel();
    let suppressor = NoiseSuppressor::create(
        &config,
        "key",
        move |frame| {
            let _ = frame_tx.send(frame);
        },
        test_model(),
        SuppressorOptions::with_error_hook(move |err| {
            let _ = error_tx.send(err);
        }),
    )
    .await
    .unwrap();

    suppressor.process(&vec![0; 512]);

    let err = timeout(Duration::from_secs(5), error_rx.recv())
        .await
        .expect("timed out waiting for error")
        .unwrap();
    assert_eq!(err.status(), Some(EngineStatus::RuntimeError));

    tokio_test::assert_ok!(suppressor.release().await);
    // The failed frame produced no callback.
    assert!(frame_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_reset_fault_routed_to_error_hook() {
    let fault = EngineFault::new(EngineStatus::InvalidState, "reset rejected");
    let config = test_config(ScriptedFactory::new().fail_reset(fault));

    let (error_tx, mut error_rx) = mpsc::unbounded_channel();
    let suppressor = NoiseSuppressor::create(
        &config,
        "key",
        |_| {},
        test_model(),
        SuppressorOptions::with_error_hook(move |err| {
            let _ = error_tx.send(err);
        }),
    )
    .await
    .unwrap();

    suppressor.reset();

    let err = timeout(Duration::from_secs(5), error_rx.recv())
        .await
        .expect("timed out waiting for error")
        .unwrap();
    assert_eq!(err.status(), Some(EngineStatus::InvalidState));

    tokio_test::assert_ok!(suppressor.release().await);
}

#[tokio::test]
async fn test_release_fault_rejects_release() {
    let fault = EngineFault::new(EngineStatus::RuntimeError, "release failed");
    let config = test_config(ScriptedFactory::new().fail_release(fault));

    let suppressor = NoiseSuppressor::create(
        &config,
        "key",
        |_| {},
        test_model(),
        SuppressorOptions::default(),
    )
    .await
    .unwrap();

    let err = suppressor.release().await.unwrap_err();
    assert_eq!(err.status(), Some(EngineStatus::RuntimeError));
}

#[tokio::test]
async fn test_terminate_discards_without_acknowledgment() {
    let config = test_config(ScriptedFactory::new());
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let suppressor = NoiseSuppressor::create(
        &config,
        "key",
        move |frame| {
            let _ = frame_tx.send(frame);
        },
        test_model(),
        SuppressorOptions::default(),
    )
    .await
    .unwrap();

    suppressor.terminate();

    // The dispatcher is gone; the callback channel closes without any
    // guarantee of deliveries.
    let _ = timeout(Duration::from_secs(5), async {
        while frame_rx.recv().await.is_some() {}
    })
    .await;
}

#[tokio::test]
async fn test_unknown_engine_status_preserved() {
    let fault = EngineFault::new(EngineStatus::Other("NEW_STATUS".to_string()), "??");
    let config = test_config(ScriptedFactory::new().fail_init(fault));

    let err = NoiseSuppressor::create(
        &config,
        "key",
        |_| {},
        test_model(),
        SuppressorOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.status(),
        Some(EngineStatus::Other("NEW_STATUS".to_string()))
    );
    assert!(matches!(err, Error::UnknownStatus { .. }));
}
