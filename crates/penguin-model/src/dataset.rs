//! Penguins CSV loading and training-matrix construction.
//!
//! Rows with any missing or unparseable field are dropped rather than
//! failing the load, matching the original dataset's `NA` conventions.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use crate::encode::{encode_features, ColumnSchema, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use crate::schema::{Island, PenguinFeatures, Sex};

/// Raw CSV row. Every field stays a string so `NA` placeholders and empty
/// cells drop the row during parsing instead of aborting the whole load.
#[derive(Debug, Deserialize)]
struct RawRow {
    species: Option<String>,
    island: Option<String>,
    bill_length_mm: Option<String>,
    bill_depth_mm: Option<String>,
    flipper_length_mm: Option<String>,
    body_mass_g: Option<String>,
    sex: Option<String>,
    year: Option<String>,
}

/// One complete labeled observation.
#[derive(Debug, Clone)]
pub struct Observation {
    pub species: String,
    pub island: Island,
    pub sex: Sex,
    pub bill_length_mm: f64,
    pub bill_depth_mm: f64,
    pub flipper_length_mm: f64,
    pub body_mass_g: f64,
    pub year: i64,
}

impl Observation {
    pub fn features(&self) -> PenguinFeatures {
        PenguinFeatures {
            bill_length_mm: self.bill_length_mm,
            bill_depth_mm: self.bill_depth_mm,
            flipper_length_mm: self.flipper_length_mm,
            body_mass_g: self.body_mass_g,
            year: self.year,
            sex: self.sex,
            island: self.island,
        }
    }
}

fn parse_field<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value?.parse().ok()
}

fn complete(raw: RawRow) -> Option<Observation> {
    Some(Observation {
        species: raw.species.filter(|s| !s.is_empty() && s != "NA")?,
        island: parse_field(raw.island)?,
        sex: parse_field(raw.sex)?,
        bill_length_mm: parse_field(raw.bill_length_mm)?,
        bill_depth_mm: parse_field(raw.bill_depth_mm)?,
        flipper_length_mm: parse_field(raw.flipper_length_mm)?,
        body_mass_g: parse_field(raw.body_mass_g)?,
        year: parse_field(raw.year)?,
    })
}

/// Load a penguins CSV, dropping incomplete rows.
pub fn load_csv(path: &Path) -> Result<Vec<Observation>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open dataset {}", path.display()))?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in reader.deserialize::<RawRow>() {
        let raw = record.context("malformed CSV record")?;
        match complete(raw) {
            Some(obs) => rows.push(obs),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::info!("dropped {} incomplete rows", dropped);
    }
    ensure!(!rows.is_empty(), "no complete rows in {}", path.display());
    Ok(rows)
}

/// Label encoding: class names sorted lexicographically, then indexed.
pub fn label_mapping(rows: &[Observation]) -> BTreeMap<String, usize> {
    let mut names: Vec<&str> = rows.iter().map(|o| o.species.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| (name.to_string(), index))
        .collect()
}

/// Authoritative training-time column list: numeric fields in declaration
/// order, then one dummy column per observed category value (sorted within
/// each categorical field).
pub fn column_schema(rows: &[Observation]) -> ColumnSchema {
    let mut columns: Vec<String> = NUMERIC_FIELDS.iter().map(|s| s.to_string()).collect();
    for field in CATEGORICAL_FIELDS {
        let mut values: Vec<&str> = rows
            .iter()
            .map(|o| match field {
                "sex" => o.sex.as_str(),
                _ => o.island.as_str(),
            })
            .collect();
        values.sort_unstable();
        values.dedup();
        for value in values {
            columns.push(format!("{}_{}", field, value));
        }
    }
    ColumnSchema::new(columns)
}

/// Encode every row against `schema`, returning the feature matrix and the
/// label-encoded targets. The serving-side encoder is reused here so the
/// training and inference flows share one alignment contract.
pub fn design_matrix(
    rows: &[Observation],
    schema: &ColumnSchema,
    labels: &BTreeMap<String, usize>,
) -> Result<(Vec<Vec<f32>>, Vec<usize>)> {
    let mut x = Vec::with_capacity(rows.len());
    let mut y = Vec::with_capacity(rows.len());
    for row in rows {
        x.push(encode_features(&row.features(), schema));
        let label = labels
            .get(&row.species)
            .with_context(|| format!("species {} missing from label mapping", row.species))?;
        y.push(*label);
    }
    Ok((x, y))
}

/// Deterministic shuffled train/test split. The fraction is clamped to the
/// row count, so out-of-range values degenerate to an empty partition
/// rather than panicking; callers wanting a hard error validate upfront.
pub fn train_test_split(
    rows: &[Observation],
    test_fraction: f64,
    seed: u64,
) -> (Vec<Observation>, Vec<Observation>) {
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let n_test = (((rows.len() as f64) * test_fraction).round() as usize).min(rows.len());
    let test = indices[..n_test].iter().map(|&i| rows[i].clone()).collect();
    let train = indices[n_test..].iter().map(|&i| rows[i].clone()).collect();
    (train, test)
}
