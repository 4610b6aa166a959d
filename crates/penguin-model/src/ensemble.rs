//! One-vs-rest gradient-boosted tree ensemble built on the `gbdt` crate.
//!
//! `gbdt` trains binary classifiers, so the multi-class species model is one
//! `LogLikelyhood` ensemble per class. Per-class probabilities are
//! normalized into a distribution and the predicted class is the argmax.
use std::cmp::Ordering;

use anyhow::{ensure, Result};
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Hyper-parameters for the boosted ensembles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainParams {
    pub max_depth: u32,
    pub boost_rounds: usize,
    pub shrinkage: f32,
}

impl Default for TrainParams {
    fn default() -> Self {
        TrainParams {
            max_depth: 3,
            boost_rounds: 100,
            shrinkage: 0.1,
        }
    }
}

/// One binary booster per class, trained one-vs-rest.
#[derive(Serialize, Deserialize)]
pub struct SpeciesEnsemble {
    boosters: Vec<GBDT>,
    feature_size: usize,
}

impl SpeciesEnsemble {
    /// Fit `n_classes` one-vs-rest boosters on an encoded feature matrix.
    /// `y` holds class indices in `0..n_classes`.
    pub fn fit(x: &[Vec<f32>], y: &[usize], n_classes: usize, params: &TrainParams) -> Result<Self> {
        ensure!(!x.is_empty(), "training set is empty");
        ensure!(x.len() == y.len(), "feature matrix and labels disagree in length");
        ensure!(n_classes >= 2, "need at least two classes, got {}", n_classes);

        let feature_size = x[0].len();
        let mut boosters = Vec::with_capacity(n_classes);
        for class in 0..n_classes {
            let mut config = Config::new();
            config.set_feature_size(feature_size);
            config.set_max_depth(params.max_depth);
            config.set_iterations(params.boost_rounds);
            config.set_shrinkage(params.shrinkage);
            config.set_loss("LogLikelyhood");
            config.set_debug(false);
            config.set_training_optimization_level(2);

            // LogLikelyhood expects +1/-1 targets.
            let mut train: DataVec = x
                .iter()
                .zip(y)
                .map(|(row, &label)| {
                    let target = if label == class { 1.0 } else { -1.0 };
                    Data::new_training_data(row.clone(), 1.0, target, None)
                })
                .collect();

            let mut booster = GBDT::new(&config);
            booster.fit(&mut train);
            boosters.push(booster);
        }

        Ok(SpeciesEnsemble {
            boosters,
            feature_size,
        })
    }

    pub fn n_classes(&self) -> usize {
        self.boosters.len()
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    /// Probability distribution over classes for one encoded row.
    pub fn predict_proba(&self, row: &[f32]) -> Result<Vec<f32>, PredictError> {
        if self.boosters.is_empty() {
            return Err(PredictError::EmptyEnsemble);
        }
        if row.len() != self.feature_size {
            return Err(PredictError::FeatureSizeMismatch {
                expected: self.feature_size,
                got: row.len(),
            });
        }

        let data: DataVec = vec![Data::new_test_data(row.to_vec(), None)];
        let mut probs: Vec<f32> = self
            .boosters
            .iter()
            .map(|booster| booster.predict(&data)[0])
            .collect();

        let total: f32 = probs.iter().sum();
        if total > 0.0 {
            for p in probs.iter_mut() {
                *p /= total;
            }
        }
        Ok(probs)
    }

    /// Class index with maximum probability.
    pub fn predict(&self, row: &[f32]) -> Result<usize, PredictError> {
        let probs = self.predict_proba(row)?;
        Ok(argmax(&probs))
    }
}

/// Index of the first maximum value.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v.partial_cmp(&values[best]) == Some(Ordering::Greater) {
            best = i;
        }
    }
    best
}
