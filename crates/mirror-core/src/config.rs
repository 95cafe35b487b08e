use crate::pipeline::PipelineSettings;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, loaded from environment variables once at startup.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// V4L2 device path (default: /dev/video0, the first system camera).
    pub camera_device: String,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Where each run writes its captured JPEG (overwritten every run).
    pub capture_path: PathBuf,
    /// Path to the CSV emotion log.
    pub log_path: PathBuf,
    /// Address the web front end listens on.
    pub listen_addr: String,
    /// Delay after each countdown step, in milliseconds.
    pub countdown_tick_ms: u64,
}

impl MirrorConfig {
    /// Load configuration from `MIRROR_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            camera_device: std::env::var("MIRROR_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_dir: std::env::var("MIRROR_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_model_dir()),
            capture_path: std::env::var("MIRROR_CAPTURE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("captured.jpg")),
            log_path: std::env::var("MIRROR_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("emotion_log.csv")),
            listen_addr: std::env::var("MIRROR_LISTEN_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8501".to_string()),
            countdown_tick_ms: env_u64("MIRROR_COUNTDOWN_TICK_MS", 1000),
        }
    }

    /// Path to the UltraFace detection model.
    pub fn detector_model_path(&self) -> PathBuf {
        self.model_dir.join("version-RFB-320.onnx")
    }

    /// Path to the FER+ emotion model.
    pub fn emotion_model_path(&self) -> PathBuf {
        self.model_dir.join("emotion-ferplus-8.onnx")
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            capture_path: self.capture_path.clone(),
            log_path: self.log_path.clone(),
            countdown_tick: Duration::from_millis(self.countdown_tick_ms),
        }
    }
}

/// `$XDG_DATA_HOME/mood-mirror/models`, falling back to `~/.local/share`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("mood-mirror")
        .join("models")
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
