//! `penguin bench`: closed-loop load generator for the /predict endpoint.
//!
//! Each worker thread posts randomized valid payloads and records
//! end-to-end latency; the summary reports throughput and percentiles.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub url: String,
    pub requests: u64,
    pub concurrency: usize,
}

/// A valid payload with values drawn from plausible measurement ranges.
fn sample_payload(rng: &mut impl Rng) -> serde_json::Value {
    const SEXES: [&str; 2] = ["male", "female"];
    const ISLANDS: [&str; 3] = ["Torgersen", "Biscoe", "Dream"];
    const YEARS: [i32; 3] = [2007, 2008, 2009];
    json!({
        "bill_length_mm": (rng.gen_range(32.0..60.0_f64) * 10.0).round() / 10.0,
        "bill_depth_mm": (rng.gen_range(13.0..22.0_f64) * 10.0).round() / 10.0,
        "flipper_length_mm": rng.gen_range(170..=235),
        "body_mass_g": rng.gen_range(2700..=6300),
        "year": YEARS[rng.gen_range(0..YEARS.len())],
        "sex": SEXES[rng.gen_range(0..SEXES.len())],
        "island": ISLANDS[rng.gen_range(0..ISLANDS.len())],
    })
}

struct WorkerOutcome {
    latencies_us: Vec<u64>,
    errors: u64,
}

pub fn run_bench(config: &BenchConfig) -> Result<()> {
    ensure!(config.requests > 0, "need at least one request");
    ensure!(config.concurrency > 0, "need at least one worker");

    let tickets = AtomicU64::new(0);
    let started = Instant::now();

    let outcomes: Vec<WorkerOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..config.concurrency)
            .map(|worker| {
                let tickets = &tickets;
                let config = &config;
                scope.spawn(move || {
                    let agent = ureq::AgentBuilder::new().build();
                    let mut rng = StdRng::seed_from_u64(worker as u64);
                    let mut outcome = WorkerOutcome {
                        latencies_us: Vec::new(),
                        errors: 0,
                    };
                    while tickets.fetch_add(1, Ordering::Relaxed) < config.requests {
                        let payload = sample_payload(&mut rng);
                        let t0 = Instant::now();
                        match agent.post(&config.url).send_json(payload) {
                            Ok(response) => {
                                let ok = response
                                    .into_json::<serde_json::Value>()
                                    .map(|v| v.get("prediction").is_some())
                                    .unwrap_or(false);
                                if ok {
                                    outcome.latencies_us.push(t0.elapsed().as_micros() as u64);
                                } else {
                                    outcome.errors += 1;
                                }
                            }
                            Err(_) => outcome.errors += 1,
                        }
                    }
                    outcome
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("bench worker panicked"))
            .collect()
    });

    let elapsed = started.elapsed();
    let mut latencies: Vec<u64> = outcomes
        .iter()
        .flat_map(|o| o.latencies_us.iter().copied())
        .collect();
    latencies.sort_unstable();
    let errors: u64 = outcomes.iter().map(|o| o.errors).sum();
    let succeeded = latencies.len() as u64;

    println!("target:      {}", config.url);
    println!("requests:    {} ({} errors)", succeeded + errors, errors);
    println!(
        "throughput:  {:.1} req/s",
        (succeeded + errors) as f64 / elapsed.as_secs_f64()
    );
    if !latencies.is_empty() {
        println!("latency p50: {} us", percentile(&latencies, 0.50));
        println!("latency p90: {} us", percentile(&latencies, 0.90));
        println!("latency p99: {} us", percentile(&latencies, 0.99));
    }
    ensure!(errors == 0, "{} requests failed", errors);
    Ok(())
}

/// Nearest-rank percentile over a sorted slice.
fn percentile(sorted: &[u64], q: f64) -> u64 {
    let rank = ((sorted.len() as f64) * q).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
