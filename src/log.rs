use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `verbose`; with a
/// `file` the lines are appended there instead of stdout.
pub fn init(verbose: bool, file: Option<&Path>) -> std::io::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // a second init (tests, embedding) keeps the first subscriber
    match file {
        Some(path) => {
            let log_file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }
    Ok(())
}

/// One metric per line under the `metrics` target: `step=.. metric=.. value=..`.
pub fn scalar(step: u64, name: &str, value: f64) {
    info!(target: "metrics", step, metric = name, value = %format!("{value:.6}"));
}
