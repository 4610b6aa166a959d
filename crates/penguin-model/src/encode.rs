//! Authoritative column schema and manual one-hot reconstruction.
//!
//! The ordered column list persisted in the model artifact is the single
//! contract between the training and serving flows. At inference time the
//! one-hot columns are re-derived against that list, so the encoder never
//! needs the original encoding step: every column named `<field>_<value>`
//! becomes a binary indicator, every training-time column the record cannot
//! produce is zero-filled, and the output order matches the list exactly.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::PenguinFeatures;

/// Continuous/integer fields, in the order they appear in the training table.
pub const NUMERIC_FIELDS: [&str; 5] = [
    "bill_length_mm",
    "bill_depth_mm",
    "flipper_length_mm",
    "body_mass_g",
    "year",
];

/// Categorical fields that were one-hot encoded at training time, in
/// encoding order. The dummy column convention is `<field>_<value>`.
pub const CATEGORICAL_FIELDS: [&str; 2] = ["sex", "island"];

/// Ordered list of feature columns the ensemble expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<String>) -> Self {
        ColumnSchema { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Encode a feature record into a numeric vector aligned to `schema`.
///
/// A category that is valid for the record but has no matching schema column
/// simply leaves its one-hot block all zero, which the ensemble treats as
/// the baseline category.
pub fn encode_features(record: &PenguinFeatures, schema: &ColumnSchema) -> Vec<f32> {
    let mut values: HashMap<&str, f32> = HashMap::with_capacity(schema.len());
    values.insert("bill_length_mm", record.bill_length_mm as f32);
    values.insert("bill_depth_mm", record.bill_depth_mm as f32);
    values.insert("flipper_length_mm", record.flipper_length_mm as f32);
    values.insert("body_mass_g", record.body_mass_g as f32);
    values.insert("year", record.year as f32);

    // Re-derive the one-hot columns from the authoritative list. The raw
    // categorical values themselves never enter the map, so they cannot leak
    // into the output vector.
    let categoricals = [
        ("sex", record.sex.as_str()),
        ("island", record.island.as_str()),
    ];
    for column in schema.columns() {
        for (field, value) in categoricals {
            if let Some(suffix) = column.strip_prefix(field).and_then(|s| s.strip_prefix('_')) {
                values.insert(column.as_str(), if suffix == value { 1.0 } else { 0.0 });
            }
        }
    }

    // Zero-fill anything the record did not produce and emit in schema order.
    schema
        .columns()
        .iter()
        .map(|column| values.get(column.as_str()).copied().unwrap_or(0.0))
        .collect()
}
