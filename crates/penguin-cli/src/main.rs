use anyhow::{Context, Result};
use clap::{Arg, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use penguin_cli::bench::{run_bench, BenchConfig};
use penguin_cli::serve::{run_server, ServeConfig};
use penguin_cli::train::{run_training, TrainConfig};
use penguin_model::artifact::ArtifactSource;
use penguin_model::ensemble::TrainParams;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default()
                .filter_or("PENGUIN_LOG", "error,penguin_cli=info,penguin_model=info"),
        )
        .init();

    let matches = Command::new("penguin")
        .version(clap::crate_version!())
        .about("Penguin species classifier: train the model, serve predictions, run load tests")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Fit the boosted-tree classifier and write the model artifact")
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help("Path to the penguins CSV dataset")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("out")
                        .short('o')
                        .long("out")
                        .help("File path the model artifact will be written to")
                        .default_value("model.json")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("max_depth")
                        .long("max-depth")
                        .help("Maximum tree depth")
                        .default_value("3")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("rounds")
                        .long("rounds")
                        .help("Boosting rounds per class")
                        .default_value("100")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("shrinkage")
                        .long("shrinkage")
                        .help("Learning rate")
                        .default_value("0.1")
                        .value_parser(clap::value_parser!(f32)),
                )
                .arg(
                    Arg::new("test_fraction")
                        .long("test-fraction")
                        .help("Fraction of rows held out for evaluation")
                        .default_value("0.2")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the train/test shuffle")
                        .default_value("42")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve predictions over HTTP")
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .help(
                            "Path to the model artifact. Overrides PENGUIN_MODEL_PATH and the \
                             GCS_BUCKET_NAME/GCS_BLOB_NAME pair.",
                        )
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .help("Listen port. Overrides the PORT environment variable.")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("bench")
                .about("Load-test a running prediction server")
                .arg(
                    Arg::new("url")
                        .long("url")
                        .help("Prediction endpoint to hit")
                        .default_value("http://127.0.0.1:8080/predict")
                        .value_hint(ValueHint::Url),
                )
                .arg(
                    Arg::new("requests")
                        .short('n')
                        .long("requests")
                        .help("Total number of requests to send")
                        .default_value("1000")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("concurrency")
                        .short('c')
                        .long("concurrency")
                        .help("Number of worker threads")
                        .default_value("8")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub)) => {
            let config = TrainConfig {
                data: sub.get_one::<PathBuf>("data").unwrap().clone(),
                out: sub.get_one::<PathBuf>("out").unwrap().clone(),
                params: TrainParams {
                    max_depth: *sub.get_one::<u32>("max_depth").unwrap(),
                    boost_rounds: *sub.get_one::<usize>("rounds").unwrap(),
                    shrinkage: *sub.get_one::<f32>("shrinkage").unwrap(),
                },
                test_fraction: *sub.get_one::<f64>("test_fraction").unwrap(),
                seed: *sub.get_one::<u64>("seed").unwrap(),
            };
            run_training(&config)
        }
        Some(("serve", sub)) => {
            let source = match sub.get_one::<PathBuf>("model") {
                Some(path) => ArtifactSource::File(path.clone()),
                None => ArtifactSource::from_env()?,
            };
            let port = match sub.get_one::<u16>("port") {
                Some(port) => *port,
                None => match std::env::var("PORT") {
                    Ok(value) => value
                        .parse()
                        .with_context(|| format!("invalid PORT value: {}", value))?,
                    Err(_) => 8080,
                },
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(run_server(ServeConfig { source, port }))
        }
        Some(("bench", sub)) => {
            let config = BenchConfig {
                url: sub.get_one::<String>("url").unwrap().clone(),
                requests: *sub.get_one::<u64>("requests").unwrap(),
                concurrency: *sub.get_one::<usize>("concurrency").unwrap(),
            };
            run_bench(&config)
        }
        _ => unreachable!("subcommand_required guarantees a match"),
    }
}
