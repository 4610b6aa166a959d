//! `penguin serve`: the inference HTTP service.
//!
//! One endpoint, `POST /predict`. The axum `Json` extractor performs
//! structural and enum validation against `PenguinFeatures` and rejects bad
//! bodies with 422 before the handler runs; encoding/prediction failures
//! inside the handler map to a generic 400 with the cause logged
//! server-side only.
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use penguin_model::artifact::ArtifactSource;
use penguin_model::predictor::Predictor;
use penguin_model::schema::PenguinFeatures;

#[derive(Clone)]
pub struct AppState {
    predictor: Arc<Predictor>,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        AppState {
            predictor: Arc::new(predictor),
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    prediction: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn predict(
    State(state): State<AppState>,
    Json(features): Json<PenguinFeatures>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let predictor = state.predictor.clone();
    // The ensemble walk is synchronous CPU work with no await points; keep
    // it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || predictor.predict(&features)).await;
    match outcome {
        Ok(Ok(prediction)) => {
            log::info!("prediction success: {}", prediction);
            Ok(Json(PredictResponse { prediction }))
        }
        Ok(Err(err)) => {
            log::error!("prediction error: {}", err);
            Err(bad_request())
        }
        Err(err) => {
            log::error!("prediction task panicked: {}", err);
            Err(bad_request())
        }
    }
}

fn bad_request() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            detail: "Prediction failed. Check input values.".to_string(),
        }),
    )
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub source: ArtifactSource,
    pub port: u16,
}

pub async fn run_server(config: ServeConfig) -> Result<()> {
    log::info!("loading model artifact from {}", config.source);
    let predictor = Predictor::load(&config.source).context("model loading failed")?;
    log::info!(
        "model loaded: {} feature columns, {} classes",
        predictor.schema().len(),
        predictor.n_classes()
    );

    let app = router(AppState::new(predictor));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    log::info!("penguin server listening on http://{}", addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
