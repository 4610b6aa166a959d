//! penguin-model: model-side building blocks for the penguin species service.
//!
//! This crate provides the typed feature record, the authoritative column
//! schema with manual one-hot reconstruction, a one-vs-rest GBDT ensemble
//! wrapper, model artifact (de)serialization, penguins dataset loading, and
//! the immutable predictor consumed by the serving layer.
pub mod artifact;
pub mod dataset;
pub mod encode;
pub mod ensemble;
pub mod error;
pub mod metrics;
pub mod predictor;
pub mod schema;
