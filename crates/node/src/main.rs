//! Film registry node binary.
//!
//! Hosts one registry deployment and serves it over a Unix socket until
//! interrupted.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use filmreg_contract::ReadMode;
use filmreg_node::{NodeConfig, RegistryService, logging};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// How reads of unassigned positions are answered.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum UnknownPosition {
	/// Reply with an `UnknownPosition` error.
	Error,
	/// Reply with an empty record rated 0.
	Zero,
}

impl From<UnknownPosition> for ReadMode {
	fn from(value: UnknownPosition) -> Self {
		match value {
			UnknownPosition::Error => ReadMode::Strict,
			UnknownPosition::Zero => ReadMode::ZeroDefault,
		}
	}
}

/// Node command line arguments.
#[derive(Parser, Debug)]
#[command(name = "filmreg-node")]
#[command(about = "Hosts a film registry deployment over IPC")]
struct Args {
	/// Config file (defaults to the user config dir's filmreg/node.toml)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Socket path for IPC
	#[arg(short, long, value_name = "PATH")]
	socket: Option<PathBuf>,

	/// Persist the ledger here; without it every start is a fresh deployment
	#[arg(long, value_name = "PATH")]
	state_file: Option<PathBuf>,

	/// Behaviour for reads of unassigned positions
	#[arg(long, value_enum)]
	unknown_position: Option<UnknownPosition>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

impl Args {
	fn apply(&self, config: &mut NodeConfig) {
		if let Some(socket) = &self.socket {
			config.socket = Some(socket.clone());
		}
		if let Some(state_file) = &self.state_file {
			config.state_file = Some(state_file.clone());
		}
		if let Some(mode) = self.unknown_position {
			config.registry.unknown_position = mode.into();
		}
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let mut config = NodeConfig::discover(args.config.as_deref())?;
	args.apply(&mut config);

	logging::setup_tracing(args.verbose, &config.log);
	info!("starting filmreg-node");

	let (service, executor) = RegistryService::from_config(&config).await?;
	let deployment = service.deployment();
	info!(
		deployment = %deployment.id(),
		films = deployment.registry().film_count(),
		persisted = deployment.state_file().is_some(),
		"registry deployed"
	);
	println!("deployment {}", deployment.id());

	let shutdown = CancellationToken::new();
	let on_signal = shutdown.clone();
	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => on_signal.cancel(),
			Err(e) => error!(error = %e, "failed to listen for ctrl-c"),
		}
	});

	filmreg_node::serve(config.socket_path(), service, shutdown).await?;
	executor.abort();
	Ok(())
}
