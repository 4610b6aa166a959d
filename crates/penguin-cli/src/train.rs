//! `penguin train`: fit the species classifier and write the model artifact.
use std::path::PathBuf;

use anyhow::{ensure, Result};

use penguin_model::artifact::ModelArtifact;
use penguin_model::dataset;
use penguin_model::ensemble::{SpeciesEnsemble, TrainParams};
use penguin_model::metrics::{accuracy, weighted_f1};

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data: PathBuf,
    pub out: PathBuf,
    pub params: TrainParams,
    pub test_fraction: f64,
    pub seed: u64,
}

pub fn run_training(config: &TrainConfig) -> Result<()> {
    ensure!(
        config.test_fraction > 0.0 && config.test_fraction < 1.0,
        "--test-fraction must be strictly between 0.0 and 1.0, got {}",
        config.test_fraction
    );

    let rows = dataset::load_csv(&config.data)?;
    log::info!("loaded {} complete observations", rows.len());

    let labels = dataset::label_mapping(&rows);
    let schema = dataset::column_schema(&rows);
    log::info!(
        "{} classes, {} feature columns",
        labels.len(),
        schema.len()
    );

    let (train_rows, test_rows) =
        dataset::train_test_split(&rows, config.test_fraction, config.seed);
    ensure!(
        !train_rows.is_empty() && !test_rows.is_empty(),
        "train/test split left an empty partition; adjust --test-fraction"
    );

    let (x_train, y_train) = dataset::design_matrix(&train_rows, &schema, &labels)?;
    let (x_test, y_test) = dataset::design_matrix(&test_rows, &schema, &labels)?;

    let ensemble = SpeciesEnsemble::fit(&x_train, &y_train, labels.len(), &config.params)?;

    for (name, x, y) in [("train", &x_train, &y_train), ("test", &x_test, &y_test)] {
        let pred = x
            .iter()
            .map(|row| ensemble.predict(row))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "{} accuracy: {:.2}, weighted F1: {:.2}",
            name,
            accuracy(y, &pred),
            weighted_f1(y, &pred, labels.len())
        );
    }

    let artifact = ModelArtifact::from_parts(&ensemble, &schema, labels)?;
    artifact.write_to(&config.out)?;
    log::info!("wrote model artifact to {}", config.out.display());
    Ok(())
}
