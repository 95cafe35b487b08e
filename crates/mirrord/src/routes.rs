use crate::engine::{EngineError, EngineHandle};
use crate::page;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mirror_core::log_store::{LogError, LogRecord};
use mirror_core::{LogStore, MirrorConfig, Transcript};
use std::sync::Arc;
use thiserror::Error;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub config: Arc<MirrorConfig>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("engine: {0}")]
    Engine(#[from] EngineError),
    #[error("log: {0}")]
    Log(#[from] LogError),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// HTTP surface of the daemon.
///
/// `GET /` page, `POST /capture` run + page, `POST /api/capture` run + JSON,
/// `GET /captured.jpg`, `GET /api/log`, `GET /api/status`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/capture", post(capture_page))
        .route("/captured.jpg", get(captured_image))
        .route("/api/capture", post(capture_json))
        .route("/api/log", get(log_rows))
        .route("/api/status", get(status))
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(page::render(None, 0))
}

async fn capture_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    tracing::info!("capture requested");
    let transcript = state.engine.capture().await?;
    let version = chrono::Local::now().timestamp_millis();
    Ok(Html(page::render(Some(&transcript), version)))
}

async fn capture_json(State(state): State<AppState>) -> Result<Json<Transcript>, ApiError> {
    tracing::info!("capture requested (api)");
    Ok(Json(state.engine.capture().await?))
}

async fn captured_image(State(state): State<AppState>) -> Response {
    match tokio::fs::read(&state.config.capture_path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "no image captured yet").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read captured image");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn log_rows(State(state): State<AppState>) -> Result<Json<Vec<LogRecord>>, ApiError> {
    let store = LogStore::new(state.config.log_path.clone());
    let rows = tokio::task::spawn_blocking(move || store.read_all()).await??;
    Ok(Json(rows))
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "state": state.engine.state(),
        "camera": state.config.camera_device,
        "capture_path": state.config.capture_path,
        "log_path": state.config.log_path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use crate::test_support::{settings_in, FixedClassifier, StillSource};
    use chrono::NaiveDateTime;
    use mirror_core::log_store::TIMESTAMP_FORMAT;
    use mirror_core::Pipeline;
    use tempfile::TempDir;

    fn app_state(dir: &TempDir) -> AppState {
        let settings = settings_in(dir.path());
        let config = MirrorConfig {
            camera_device: "/dev/video0".to_string(),
            model_dir: dir.path().join("models"),
            capture_path: settings.capture_path.clone(),
            log_path: settings.log_path.clone(),
            listen_addr: "127.0.0.1:0".to_string(),
            countdown_tick_ms: 0,
        };
        let pipeline = Pipeline::new(StillSource, FixedClassifier("happy"), settings);
        AppState {
            engine: engine::start(pipeline).unwrap(),
            config: Arc::new(config),
        }
    }

    #[tokio::test]
    async fn test_captured_image_missing_then_served() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir);

        let before = captured_image(State(state.clone())).await;
        assert_eq!(before.status(), StatusCode::NOT_FOUND);

        let Json(transcript) = capture_json(State(state.clone())).await.unwrap();
        assert!(!transcript.failed());

        let after = captured_image(State(state.clone())).await;
        assert_eq!(after.status(), StatusCode::OK);
        assert_eq!(after.headers()[header::CONTENT_TYPE], "image/jpeg");
        let body = axum::body::to_bytes(after.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), std::fs::read(&state.config.capture_path).unwrap());
    }

    #[tokio::test]
    async fn test_log_rows_after_capture() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir);

        let Json(empty) = log_rows(State(state.clone())).await.unwrap();
        assert!(empty.is_empty());

        capture_json(State(state.clone())).await.unwrap();
        let Json(rows) = log_rows(State(state.clone())).await.unwrap();
        assert_eq!(rows.len(), 1);

        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["Detected Emotion"], "happy");
        let stamp = json[0]["Timestamp"].as_str().unwrap();
        assert_eq!(stamp.len(), "YYYY-MM-DD HH:MM:SS".len());
        assert!(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn test_status_reports_idle_engine() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir);

        let Json(before) = status(State(state.clone())).await;
        assert_eq!(before["state"], "idle");
        assert_eq!(before["camera"], "/dev/video0");
        assert_eq!(before["version"], env!("CARGO_PKG_VERSION"));

        capture_json(State(state.clone())).await.unwrap();
        let Json(after) = status(State(state)).await;
        assert_eq!(after["state"], "idle");
    }
}
