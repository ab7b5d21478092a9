//! Request handling for one hosted deployment.

use std::sync::Arc;

use filmreg_proto::{CallError, DeploymentInfo, ErrorCode, Event, RequestPayload, ResponsePayload};
use filmreg_types::{Account, DeploymentId};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::config::NodeConfig;
use crate::deployment::Deployment;
use crate::error::Result;
use crate::executor::{AddFilmTx, Executor, ExecutorHandle};

/// Answers requests against one deployment.
///
/// Reads go straight to the registry. `AddFilm` is checked here (deployment
/// id, sender) and then queued on the executor.
pub struct RegistryService {
	deployment: Arc<Deployment>,
	executor: ExecutorHandle,
}

impl RegistryService {
	/// Wraps `deployment` and starts its executor.
	pub fn new(deployment: Deployment, mailbox_capacity: usize) -> (Arc<Self>, JoinHandle<()>) {
		let deployment = Arc::new(deployment);
		let (executor, task) = Executor::spawn(deployment.clone(), mailbox_capacity);
		(
			Arc::new(Self {
				deployment,
				executor,
			}),
			task,
		)
	}

	/// Opens the deployment described by `config` and starts serving it.
	pub async fn from_config(config: &NodeConfig) -> Result<(Arc<Self>, JoinHandle<()>)> {
		let read_mode = config.registry.unknown_position;
		let deployment = match &config.state_file {
			Some(path) => Deployment::open(path, read_mode).await?,
			None => Deployment::ephemeral(read_mode),
		};
		Ok(Self::new(deployment, config.executor.mailbox_capacity))
	}

	pub fn deployment(&self) -> &Deployment {
		&self.deployment
	}

	pub fn info(&self) -> DeploymentInfo {
		DeploymentInfo {
			deployment: self.deployment.id(),
			film_count: self.deployment.registry().film_count(),
		}
	}

	/// Event stream for a subscribing connection.
	pub fn subscribe(&self) -> broadcast::Receiver<Event> {
		self.executor.subscribe()
	}

	/// Handles one request payload.
	///
	/// [`RequestPayload::Subscribe`] only acknowledges here; the connection
	/// attaches the event stream itself.
	pub async fn handle(&self, payload: RequestPayload) -> std::result::Result<ResponsePayload, CallError> {
		let registry = self.deployment.registry();
		match payload {
			RequestPayload::Ping => Ok(ResponsePayload::Pong),
			RequestPayload::Deployment => Ok(ResponsePayload::Deployment(self.info())),
			RequestPayload::AddFilm {
				deployment,
				sender,
				name,
				rating,
				review,
			} => {
				self.check_deployment(deployment)?;
				let sender = Account::new(&sender)
					.map_err(|err| CallError::new(ErrorCode::InvalidSender, err.to_string()))?;
				let receipt = self
					.executor
					.submit(AddFilmTx {
						sender,
						name,
						rating,
						review,
					})
					.await?;
				Ok(ResponsePayload::Receipt(receipt))
			}
			RequestPayload::FilmCount => Ok(ResponsePayload::FilmCount(registry.film_count())),
			RequestPayload::Film { position } => registry
				.film(position)
				.map(ResponsePayload::Film)
				.map_err(|err| CallError::from(&err)),
			RequestPayload::AllFilms => Ok(ResponsePayload::Films(registry.all_films())),
			RequestPayload::Subscribe => Ok(ResponsePayload::Subscribed),
		}
	}

	fn check_deployment(&self, requested: DeploymentId) -> std::result::Result<(), CallError> {
		if requested == self.deployment.id() {
			return Ok(());
		}
		trace!(%requested, hosted = %self.deployment.id(), "wrong deployment");
		Err(CallError::new(
			ErrorCode::WrongDeployment,
			format!("this node hosts deployment {}, not {requested}", self.deployment.id()),
		))
	}
}

#[cfg(test)]
mod tests {
	use filmreg_contract::ReadMode;
	use filmreg_types::{FilmRecord, Position};

	use super::*;

	fn add(deployment: DeploymentId, sender: &str, name: &str, rating: u8) -> RequestPayload {
		RequestPayload::AddFilm {
			deployment,
			sender: sender.into(),
			name: name.into(),
			rating,
			review: String::new(),
		}
	}

	#[tokio::test]
	async fn add_then_read_back() {
		let (service, _task) = RegistryService::new(Deployment::ephemeral(ReadMode::Strict), 4);
		let id = service.deployment().id();

		let ResponsePayload::Receipt(receipt) = service.handle(add(id, "alice", "Heat", 5)).await.unwrap() else {
			panic!("expected receipt");
		};
		assert_eq!(receipt.sender.as_str(), "alice");
		assert_eq!(receipt.event.position, Position(0));

		assert_eq!(
			service.handle(RequestPayload::FilmCount).await,
			Ok(ResponsePayload::FilmCount(1))
		);
		let ResponsePayload::Films(films) = service.handle(RequestPayload::AllFilms).await.unwrap() else {
			panic!("expected films");
		};
		assert_eq!(films.len(), 1);
		assert_eq!(films[0].name(), "Heat");
	}

	#[tokio::test]
	async fn rejects_wrong_deployment_and_blank_sender() {
		let (service, _task) = RegistryService::new(Deployment::ephemeral(ReadMode::Strict), 4);

		let err = service
			.handle(add(DeploymentId::generate(), "alice", "Heat", 5))
			.await
			.unwrap_err();
		assert_eq!(err.code, ErrorCode::WrongDeployment);

		let err = service
			.handle(add(service.deployment().id(), "   ", "Heat", 5))
			.await
			.unwrap_err();
		assert_eq!(err.code, ErrorCode::InvalidSender);
		assert_eq!(service.info().film_count, 0);
	}

	#[tokio::test]
	async fn unknown_position_follows_read_mode() {
		let (strict, _a) = RegistryService::new(Deployment::ephemeral(ReadMode::Strict), 1);
		let err = strict
			.handle(RequestPayload::Film { position: Position(0) })
			.await
			.unwrap_err();
		assert_eq!(err.code, ErrorCode::UnknownPosition);

		let (parity, _b) = RegistryService::new(Deployment::ephemeral(ReadMode::ZeroDefault), 1);
		assert_eq!(
			parity.handle(RequestPayload::Film { position: Position(0) }).await,
			Ok(ResponsePayload::Film(FilmRecord::zeroed()))
		);
	}
}
