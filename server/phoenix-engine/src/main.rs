//! Binary entrypoint: read observation JSON lines from stdin, write incident JSON lines to stdout.
//!
//! Output lines are either:
//! - An Incident (when a correlation group escalates)
//! - An ErrorOutput (when input validation fails)
//!
//! Observations that raise no incident produce no output line. Logs go to stderr.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use phoenix_engine::types::ErrorOutput;
use phoenix_engine::{Config, Engine, EngineError, Observation, SystemClock, Topology};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phoenix-engine", about = "Topology-aware incident decision engine")]
struct Cli {
  /// Topology JSON file (nodes + directed edges).
  #[arg(long)]
  topology: PathBuf,

  /// Optional TOML file overriding engine thresholds.
  #[arg(long)]
  config: Option<PathBuf>,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  if let Err(e) = run() {
    let _ = writeln!(io::stderr(), "phoenix-engine error: {}", e);
    std::process::exit(1);
  }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
  let cli = Cli::parse();

  let topology = Topology::load(&cli.topology)?;
  let config = match &cli.config {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };
  let mut engine = Engine::new(config, &topology, Arc::new(SystemClock))?;
  info!(
    nodes = topology.nodes.len(),
    edges = topology.edges.len(),
    "learning system behavior"
  );

  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());

  for line in stdin.lock().lines() {
    let line = line?;

    // Skip blank lines.
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    let raw: Observation = match serde_json::from_str(trimmed) {
      Ok(v) => v,
      Err(e) => {
        warn!(error = %e, "unparseable observation");
        emit(&mut out, &ErrorOutput::new(format!("json parse: {}", e)))?;
        continue;
      }
    };

    match engine.process(&raw) {
      Ok(incidents) => {
        for incident in &incidents {
          emit(&mut out, incident)?;
        }
      }
      Err(e) => {
        warn!(error = %e, "rejected observation");
        let err = match &e {
          EngineError::Validation { field, reason } => {
            ErrorOutput::new(reason.clone()).with_field(field.clone())
          }
          _ => ErrorOutput::new(e.to_string()),
        };
        emit(&mut out, &err)?;
      }
    }
  }

  out.flush()?;
  Ok(())
}

/// One JSON value per line, flushed so downstream consumers see it immediately.
fn emit<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> io::Result<()> {
  serde_json::to_writer(&mut *out, value)?;
  writeln!(out)?;
  out.flush()
}
