//! `filmreg` command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use filmreg_client::{FilmDraft, RegistryClient};
use filmreg_types::{Account, DeploymentId, Position, Rating};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "filmreg")]
#[command(about = "Browse and add films in a registry deployment")]
struct Cli {
	/// Node socket (defaults to the runtime dir's filmreg-node.sock)
	#[arg(short, long, global = true, value_name = "PATH", env = "FILMREG_SOCKET")]
	socket: Option<PathBuf>,

	/// Deployment the node must host
	#[arg(short, long, global = true, value_name = "ID", env = "FILMREG_DEPLOYMENT")]
	deployment: Option<DeploymentId>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show the hosted deployment and its size
	Deployment,
	/// Add a film
	Add {
		/// Caller account
		#[arg(short, long, env = "FILMREG_ACCOUNT")]
		account: Option<Account>,
		name: String,
		/// Stars, 1 to 5
		rating: u8,
		#[arg(default_value = "")]
		review: String,
	},
	/// List every film with the average rating
	List,
	/// Show one film
	Get { position: u64 },
	/// Print the number of films
	Count,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let default = if cli.verbose { "debug" } else { "warn" };
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
		.with_writer(std::io::stderr)
		.init();

	let socket = cli.socket.unwrap_or_else(filmreg_proto::paths::default_socket_path);
	let mut client = RegistryClient::connect(&socket, cli.deployment)
		.await
		.with_context(|| format!("connecting to {}", socket.display()))?;

	match cli.command {
		Command::Deployment => {
			let info = client.deployment_info().await?;
			println!("deployment {}", info.deployment);
			println!("films      {}", info.film_count);
		}
		Command::Add {
			account,
			name,
			rating,
			review,
		} => {
			if let Some(account) = account {
				client = client.with_account(account);
			}
			let draft = FilmDraft::new(name, rating, review);
			let (receipt, catalog) = client.add_film(&draft).await?;
			println!("Film added! {} (tx {})", receipt.event.position, receipt.tx.0);
			println!("{} films, average {}", catalog.len(), catalog.average_display());
		}
		Command::List => {
			let catalog = client.films().await?;
			if catalog.is_empty() {
				println!("No films yet");
			}
			for entry in catalog.entries() {
				println!("{entry}");
			}
			println!("{} films, average {}", catalog.len(), catalog.average_display());
		}
		Command::Get { position } => {
			let film = client.film(Position(position)).await?;
			let label = Rating::new(film.rating()).map(Rating::label).unwrap_or("unrated");
			println!("{} ({}/5, {label})", film.name(), film.rating());
			if !film.review().is_empty() {
				println!("{}", film.review());
			}
		}
		Command::Count => println!("{}", client.film_count().await?),
	}
	Ok(())
}
