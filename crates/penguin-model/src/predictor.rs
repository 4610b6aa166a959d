//! The immutable serving-side predictor.
//!
//! Built once at startup from the artifact and then shared read-only for the
//! process lifetime; prediction takes `&self` and no locks.
use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::artifact::{ArtifactSource, ModelArtifact};
use crate::encode::{encode_features, ColumnSchema};
use crate::ensemble::SpeciesEnsemble;
use crate::error::PredictError;
use crate::schema::PenguinFeatures;

/// Returned when a predicted class index has no label-mapping entry.
pub const UNKNOWN_LABEL: &str = "Unknown";

pub struct Predictor {
    ensemble: SpeciesEnsemble,
    schema: ColumnSchema,
    /// Inverse of the artifact's label mapping: class index to class name.
    labels: HashMap<usize, String>,
}

impl Predictor {
    /// Build from a parsed artifact. The caller treats failure here as
    /// startup-fatal.
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self> {
        let ensemble = artifact.decode_model()?;
        let schema = ColumnSchema::new(artifact.columns.clone());
        let labels = artifact
            .label_mapping
            .iter()
            .map(|(name, &index)| (index, name.clone()))
            .collect();
        Ok(Predictor {
            ensemble,
            schema,
            labels,
        })
    }

    /// Fetch the artifact from `source` and build the predictor.
    pub fn load(source: &ArtifactSource) -> Result<Self> {
        let artifact = source.fetch()?;
        Self::from_artifact(&artifact)
            .with_context(|| format!("invalid artifact from {}", source))
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn n_classes(&self) -> usize {
        self.ensemble.n_classes()
    }

    /// Encode the record against the authoritative schema, run the ensemble,
    /// and resolve the winning class index to its name.
    pub fn predict(&self, record: &PenguinFeatures) -> Result<String, PredictError> {
        let row = encode_features(record, &self.schema);
        let class = self.ensemble.predict(&row)?;
        Ok(self
            .labels
            .get(&class)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string()))
    }

    /// Normalized class probabilities for diagnostics and tests.
    pub fn predict_proba(&self, record: &PenguinFeatures) -> Result<Vec<f32>, PredictError> {
        let row = encode_features(record, &self.schema);
        self.ensemble.predict_proba(&row)
    }
}
