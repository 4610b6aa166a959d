//! Model artifact: the JSON document bundling the serialized ensemble, the
//! authoritative column schema, and the label mapping.
//!
//! The `model` key holds the serde_json-encoded ensemble as base64 text, so
//! the whole artifact stays a single human-inspectable JSON document.
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::encode::ColumnSchema;
use crate::ensemble::SpeciesEnsemble;

/// Environment variable naming a local artifact file.
pub const MODEL_PATH_ENV: &str = "PENGUIN_MODEL_PATH";
/// Environment variables naming a remote artifact object.
pub const GCS_BUCKET_ENV: &str = "GCS_BUCKET_NAME";
pub const GCS_BLOB_ENV: &str = "GCS_BLOB_NAME";

/// On-disk / on-wire artifact document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// base64 of the serialized ensemble.
    pub model: String,
    /// Ordered feature columns the ensemble expects.
    pub columns: Vec<String>,
    /// Class name to class index, as learned at training time.
    pub label_mapping: BTreeMap<String, usize>,
}

impl ModelArtifact {
    pub fn from_parts(
        ensemble: &SpeciesEnsemble,
        schema: &ColumnSchema,
        label_mapping: BTreeMap<String, usize>,
    ) -> Result<Self> {
        let raw = serde_json::to_vec(ensemble).context("failed to serialize ensemble")?;
        Ok(ModelArtifact {
            model: BASE64.encode(raw),
            columns: schema.columns().to_vec(),
            label_mapping,
        })
    }

    /// Decode the embedded base64 payload back into an ensemble.
    pub fn decode_model(&self) -> Result<SpeciesEnsemble> {
        let raw = BASE64
            .decode(&self.model)
            .context("artifact model payload is not valid base64")?;
        serde_json::from_slice(&raw).context("artifact model payload is not a valid ensemble")
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("artifact is not a valid JSON document")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).context("failed to serialize artifact")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write artifact to {}", path.display()))
    }
}

/// Where the serving process loads its artifact from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    File(PathBuf),
    Gcs { bucket: String, object: String },
}

impl ArtifactSource {
    /// Resolve the source from the environment. A local path wins over the
    /// bucket/object pair when both are set.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = std::env::var(MODEL_PATH_ENV) {
            return Ok(ArtifactSource::File(PathBuf::from(path)));
        }
        match (std::env::var(GCS_BUCKET_ENV), std::env::var(GCS_BLOB_ENV)) {
            (Ok(bucket), Ok(object)) => Ok(ArtifactSource::Gcs { bucket, object }),
            _ => bail!(
                "no artifact source configured; set {} or both {} and {}",
                MODEL_PATH_ENV,
                GCS_BUCKET_ENV,
                GCS_BLOB_ENV
            ),
        }
    }

    /// Fetch and parse the artifact. Callers treat any failure here as
    /// startup-fatal: there is no valid state to serve from without it.
    pub fn fetch(&self) -> Result<ModelArtifact> {
        let bytes = match self {
            ArtifactSource::File(path) => fs::read(path)
                .with_context(|| format!("failed to read artifact from {}", path.display()))?,
            ArtifactSource::Gcs { bucket, object } => {
                let url = format!("https://storage.googleapis.com/{}/{}", bucket, object);
                fetch_remote(&url)?
            }
        };
        ModelArtifact::parse(&bytes)
    }
}

/// GET `url` and return the full body. Reads through `into_reader` rather
/// than `into_string`, which caps bodies at 10 MB and would truncate a
/// large artifact into a confusing parse error.
fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    use std::io::Read;

    let response = ureq::get(url)
        .call()
        .with_context(|| format!("failed to fetch artifact from {}", url))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .context("failed to read artifact response body")?;
    Ok(bytes)
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArtifactSource::File(path) => write!(f, "file {}", path.display()),
            ArtifactSource::Gcs { bucket, object } => write!(f, "gs://{}/{}", bucket, object),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_document_keeps_expected_keys() {
        let artifact = ModelArtifact {
            model: BASE64.encode(b"{}"),
            columns: vec!["bill_length_mm".to_string(), "sex_male".to_string()],
            label_mapping: BTreeMap::from([
                ("Adelie".to_string(), 0),
                ("Chinstrap".to_string(), 1),
                ("Gentoo".to_string(), 2),
            ]),
        };
        let json = serde_json::to_string(&artifact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("model").is_some());
        assert_eq!(value["columns"][0], "bill_length_mm");
        assert_eq!(value["label_mapping"]["Gentoo"], 2);

        let back = ModelArtifact::parse(json.as_bytes()).unwrap();
        assert_eq!(back.columns, artifact.columns);
        assert_eq!(back.label_mapping, artifact.label_mapping);
    }

    #[test]
    fn garbage_base64_payload_is_rejected() {
        let artifact = ModelArtifact {
            model: "not base64 at all!".to_string(),
            columns: vec![],
            label_mapping: BTreeMap::new(),
        };
        assert!(artifact.decode_model().is_err());
    }

    #[test]
    fn fetch_missing_file_errors() {
        let source = ArtifactSource::File(PathBuf::from("/nonexistent/model.json"));
        assert!(source.fetch().is_err());
    }

    #[test]
    fn fetch_remote_returns_the_full_body() {
        use std::io::Write;

        let body = format!("{{\"padding\":\"{}\"}}", "x".repeat(64 * 1024));
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let expected = body.clone();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // drain the request headers before answering
            let mut buf = [0u8; 1024];
            let _ = std::io::Read::read(&mut stream, &mut buf);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                expected.len(),
                expected
            );
            stream.write_all(response.as_bytes()).unwrap();
        });

        let bytes = fetch_remote(&format!("http://{}/model.json", addr)).unwrap();
        server.join().unwrap();
        assert_eq!(bytes.len(), body.len());
        assert_eq!(bytes, body.as_bytes());
    }

    #[test]
    fn source_resolution_precedence() {
        // Single test: env vars are process-global, so the three scenarios
        // run sequentially here rather than as parallel test functions.
        std::env::remove_var(MODEL_PATH_ENV);
        std::env::remove_var(GCS_BUCKET_ENV);
        std::env::remove_var(GCS_BLOB_ENV);
        assert!(ArtifactSource::from_env().is_err());

        std::env::set_var(GCS_BUCKET_ENV, "models");
        std::env::set_var(GCS_BLOB_ENV, "penguins/model.json");
        assert_eq!(
            ArtifactSource::from_env().unwrap(),
            ArtifactSource::Gcs {
                bucket: "models".to_string(),
                object: "penguins/model.json".to_string(),
            }
        );

        std::env::set_var(MODEL_PATH_ENV, "/tmp/model.json");
        assert_eq!(
            ArtifactSource::from_env().unwrap(),
            ArtifactSource::File(PathBuf::from("/tmp/model.json"))
        );

        std::env::remove_var(MODEL_PATH_ENV);
        std::env::remove_var(GCS_BUCKET_ENV);
        std::env::remove_var(GCS_BLOB_ENV);
    }
}
