//! signal-generator: synthetic telemetry for phoenix-engine
//!
//! Usage:
//!   signal-generator                          # emit forever, one round every 2s
//!   signal-generator --rounds 40 --interval-ms 0
//!   signal-generator --rounds 60 --inject router-edge --inject-after 40 --factor 5
//!
//! Each line is one observation: {"timestamp", "component", "metric", "value"}.
//! Pipe into `phoenix-engine --topology <file>`.

use std::io::{self, Write};
use std::process;
use std::thread;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use clap::Parser;
use rand::Rng;
use serde::Serialize;

/// Components of the sample topology, with the metrics each one emits.
const COMPONENTS: &[(&str, &[&str])] = &[
    ("router-edge", &["latency_ms", "packet_drop_rate"]),
    ("switch-aggregation", &["latency_ms"]),
    ("api-gateway", &["p95_latency_ms", "error_rate"]),
    ("order-service", &["p95_latency_ms", "error_rate"]),
    ("payment-service", &["p95_latency_ms", "error_rate"]),
];

#[derive(Parser)]
#[command(name = "signal-generator", about = "Emit synthetic telemetry as JSON lines")]
struct Cli {
    /// Rounds to emit (every component/metric once per round). Unbounded when omitted.
    #[arg(long)]
    rounds: Option<u64>,

    /// Pause between rounds.
    #[arg(long, default_value_t = 2000)]
    interval_ms: u64,

    /// Component whose values get multiplied after `inject_after` rounds.
    #[arg(long)]
    inject: Option<String>,

    #[arg(long, default_value_t = 30)]
    inject_after: u64,

    #[arg(long, default_value_t = 5.0)]
    factor: f64,
}

#[derive(Serialize)]
struct Signal<'a> {
    timestamp: String,
    component: &'a str,
    metric: &'a str,
    value: f64,
}

/// Normal operating range for a metric.
fn metric_range(metric: &str) -> Option<(f64, f64)> {
    match metric {
        "latency_ms" => Some((10.0, 30.0)),
        "p95_latency_ms" => Some((50.0, 120.0)),
        "packet_drop_rate" => Some((0.0, 0.2)),
        "error_rate" => Some((0.0, 0.01)),
        _ => None,
    }
}

fn generate_value<R: Rng>(rng: &mut R, metric: &str) -> Option<f64> {
    let (lo, hi) = metric_range(metric)?;
    let v: f64 = rng.gen_range(lo..=hi);
    Some((v * 1000.0).round() / 1000.0)
}

fn main() {
    let cli = Cli::parse();

    if let Some(target) = &cli.inject {
        if !COMPONENTS.iter().any(|(c, _)| *c == target.as_str()) {
            eprintln!("signal-generator: unknown component {}", target);
            process::exit(2);
        }
    }

    let mut rng = rand::thread_rng();
    let stdout = io::stdout();
    let mut round = 0u64;

    while cli.rounds.map_or(true, |n| round < n) {
        let faulty = cli.inject.as_deref().filter(|_| round >= cli.inject_after);
        if emit_round(&mut stdout.lock(), &mut rng, faulty, cli.factor).is_err() {
            // Downstream closed the pipe.
            process::exit(0);
        }

        round += 1;
        if cli.interval_ms > 0 {
            thread::sleep(Duration::from_millis(cli.interval_ms));
        }
    }
}

/// Write one observation per component/metric, then flush.
fn emit_round<W: Write, R: Rng>(
    out: &mut W,
    rng: &mut R,
    faulty: Option<&str>,
    factor: f64,
) -> io::Result<()> {
    for (component, metrics) in COMPONENTS {
        for metric in metrics.iter() {
            let Some(mut value) = generate_value(rng, metric) else {
                continue;
            };
            if faulty == Some(*component) {
                value = (value * factor * 1000.0).round() / 1000.0;
            }
            let signal = Signal {
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                component: *component,
                metric: *metric,
                value,
            };
            serde_json::to_writer(&mut *out, &signal)?;
            writeln!(out)?;
        }
    }
    out.flush()
}
