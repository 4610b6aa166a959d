//! penguin-cli: command-line entry points for the penguin species service.
//!
//! Three subcommands: `train` fits the classifier and writes the model
//! artifact, `serve` exposes the inference endpoint, `bench` load-tests a
//! running server.
pub mod bench;
pub mod serve;
pub mod train;
