use std::error::Error;
use std::fmt;

/// Errors surfaced by the prediction path.
///
/// These are per-request failures: the server logs them and answers with a
/// generic client error, it does not terminate.
#[derive(Debug)]
pub enum PredictError {
    /// The ensemble holds no per-class boosters.
    EmptyEnsemble,
    /// Encoded vector length does not match the feature size the ensemble
    /// was trained with.
    FeatureSizeMismatch { expected: usize, got: usize },
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PredictError::EmptyEnsemble => write!(f, "ensemble contains no trained boosters"),
            PredictError::FeatureSizeMismatch { expected, got } => write!(
                f,
                "encoded feature vector has {} values but the ensemble expects {}",
                got, expected
            ),
        }
    }
}

impl Error for PredictError {}
