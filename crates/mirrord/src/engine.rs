use mirror_core::classifier::ClassifierError;
use mirror_core::{EmotionClassifier, FrameSource, MirrorConfig, OnnxEmotionClassifier};
use mirror_core::{Pipeline, PipelineState, Transcript};
use mirror_hw::CameraSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Messages sent from HTTP handlers to the engine thread.
enum EngineRequest {
    Capture {
        reply: oneshot::Sender<Transcript>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    running: Arc<AtomicBool>,
}

impl EngineHandle {
    /// Request one capture run. Runs are serialized on the engine thread;
    /// the returned transcript holds every event the run emitted.
    pub async fn capture(&self) -> Result<Transcript, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Capture { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    pub fn state(&self) -> PipelineState {
        if self.running.load(Ordering::SeqCst) {
            PipelineState::Running
        } else {
            PipelineState::Idle
        }
    }
}

/// Marks the engine as running until dropped, including on unwind.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Load the models and spawn the engine on a dedicated OS thread.
///
/// Fails fast at startup if a model file is missing. The camera is not
/// touched here; each run opens and releases it.
pub fn spawn_engine(config: &MirrorConfig) -> Result<EngineHandle, EngineError> {
    let classifier = OnnxEmotionClassifier::load(
        &config.detector_model_path(),
        &config.emotion_model_path(),
    )?;
    tracing::info!(dir = %config.model_dir.display(), "emotion models loaded");

    let source = CameraSource::new(config.camera_device.clone());
    let pipeline = Pipeline::new(source, classifier, config.pipeline_settings());
    start(pipeline)
}

/// Run `pipeline` on its own thread, serving capture requests in order.
pub fn start<S, C>(mut pipeline: Pipeline<S, C>) -> Result<EngineHandle, EngineError>
where
    S: FrameSource + Send + 'static,
    C: EmotionClassifier + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);
    let running = Arc::new(AtomicBool::new(false));
    let thread_running = running.clone();

    std::thread::Builder::new()
        .name("mirror-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Capture { reply } => {
                        let transcript = {
                            let _running = RunningGuard::set(&thread_running);
                            let mut transcript = Transcript::default();
                            // Failures are already in the transcript.
                            let _ = pipeline.run(&mut transcript);
                            transcript
                        };
                        let _ = reply.send(transcript);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })?;

    Ok(EngineHandle { tx, running })
}
