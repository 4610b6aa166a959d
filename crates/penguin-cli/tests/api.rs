//! In-process HTTP tests for the /predict endpoint.
//!
//! A small predictor is trained once per test on synthetic observations and
//! the router is exercised directly with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use penguin_cli::serve::{router, AppState};
use penguin_model::artifact::ModelArtifact;
use penguin_model::dataset::{column_schema, design_matrix, label_mapping, Observation};
use penguin_model::ensemble::{SpeciesEnsemble, TrainParams};
use penguin_model::predictor::Predictor;
use penguin_model::schema::{Island, Sex};

fn synthetic_rows() -> Vec<Observation> {
    let mut rows = Vec::new();
    for i in 0..10 {
        let j = i as f64 * 0.3;
        rows.push(Observation {
            species: "Adelie".to_string(),
            island: if i % 2 == 0 { Island::Torgersen } else { Island::Dream },
            sex: if i % 2 == 0 { Sex::Male } else { Sex::Female },
            bill_length_mm: 38.0 + j,
            bill_depth_mm: 18.2 + 0.1 * j,
            flipper_length_mm: 185.0 + i as f64,
            body_mass_g: 3700.0 + 25.0 * i as f64,
            year: 2007 + (i % 3),
        });
        rows.push(Observation {
            species: "Chinstrap".to_string(),
            island: Island::Dream,
            sex: if i % 2 == 0 { Sex::Female } else { Sex::Male },
            bill_length_mm: 48.5 + j,
            bill_depth_mm: 18.4 + 0.1 * j,
            flipper_length_mm: 195.0 + i as f64,
            body_mass_g: 3730.0 + 20.0 * i as f64,
            year: 2007 + (i % 3),
        });
        rows.push(Observation {
            species: "Gentoo".to_string(),
            island: Island::Biscoe,
            sex: if i % 2 == 0 { Sex::Male } else { Sex::Female },
            bill_length_mm: 46.0 + j,
            bill_depth_mm: 14.0 + 0.1 * j,
            flipper_length_mm: 215.0 + i as f64,
            body_mass_g: 5000.0 + 30.0 * i as f64,
            year: 2007 + (i % 3),
        });
    }
    rows
}

fn app() -> axum::Router {
    let rows = synthetic_rows();
    let labels = label_mapping(&rows);
    let schema = column_schema(&rows);
    let (x, y) = design_matrix(&rows, &schema, &labels).unwrap();
    let params = TrainParams {
        max_depth: 3,
        boost_rounds: 15,
        shrinkage: 0.1,
    };
    let ensemble = SpeciesEnsemble::fit(&x, &y, labels.len(), &params).unwrap();
    let artifact = ModelArtifact::from_parts(&ensemble, &schema, labels).unwrap();
    let predictor = Predictor::from_artifact(&artifact).unwrap();
    router(AppState::new(predictor))
}

async fn post_predict(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn sample_body() -> Value {
    json!({
        "bill_length_mm": 39.1,
        "bill_depth_mm": 18.7,
        "flipper_length_mm": 181,
        "body_mass_g": 3750,
        "year": 2009,
        "sex": "male",
        "island": "Torgersen"
    })
}

#[tokio::test]
async fn predict_valid_input_returns_known_species() {
    let (status, body) = post_predict(app(), sample_body()).await;
    assert_eq!(status, StatusCode::OK);
    let prediction = body["prediction"].as_str().unwrap();
    assert!(["Adelie", "Chinstrap", "Gentoo"].contains(&prediction));
}

#[tokio::test]
async fn predict_missing_field_is_422() {
    let body = json!({
        "bill_length_mm": 39.1,
        "bill_depth_mm": 18.7,
        "flipper_length_mm": 181
    });
    let (status, _) = post_predict(app(), body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn predict_invalid_type_is_422() {
    let mut body = sample_body();
    body["bill_length_mm"] = json!("thirty-nine");
    let (status, _) = post_predict(app(), body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn predict_out_of_enumeration_category_is_422() {
    let mut body = sample_body();
    body["island"] = json!("Atlantis");
    let (status, _) = post_predict(app(), body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn predict_extreme_values_still_succeed() {
    let body = json!({
        "bill_length_mm": 9999.9,
        "bill_depth_mm": 0.0,
        "flipper_length_mm": -100,
        "body_mass_g": -5000,
        "year": 2009,
        "sex": "male",
        "island": "Torgersen"
    });
    let (status, body) = post_predict(app(), body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["prediction"].is_string());
    assert_ne!(body["prediction"], "Unknown");
}

#[tokio::test]
async fn identical_inputs_yield_identical_predictions() {
    let app = app();
    let (_, first) = post_predict(app.clone(), sample_body()).await;
    let (_, second) = post_predict(app, sample_body()).await;
    assert_eq!(first["prediction"], second["prediction"]);
}

#[tokio::test]
async fn health_endpoint_responds() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
