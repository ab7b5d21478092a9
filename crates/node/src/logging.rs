//! Tracing subscriber setup for the node binary.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;

use crate::config::LogConfig;

fn filter(verbose: bool, config: &LogConfig) -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| match (&config.filter, verbose) {
		(Some(directives), _) => EnvFilter::new(directives),
		(None, true) => EnvFilter::new("filmreg_node=trace,filmreg_contract=debug,info"),
		(None, false) => EnvFilter::new("filmreg_node=info,warn"),
	})
}

/// Installs the global subscriber.
///
/// Logs go to `filmreg-node.<pid>.log` under `FILMREG_LOG_DIR` (or
/// `[log] dir`) when that directory can be created, else to stderr.
pub fn setup_tracing(verbose: bool, config: &LogConfig) {
	let log_dir = std::env::var("FILMREG_LOG_DIR")
		.ok()
		.map(PathBuf::from)
		.or_else(|| config.dir.clone());

	if let Some(log_dir) = log_dir
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("filmreg-node.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_span_events(FmtSpan::CLOSE)
				.with_target(true);

			tracing_subscriber::registry()
				.with(filter(verbose, config))
				.with(file_layer)
				.init();

			tracing::info!(path = ?log_path, "node tracing initialized");
			return;
		}
	}

	tracing_subscriber::registry()
		.with(filter(verbose, config))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}
