//! Serialized execution of mutating calls.
//!
//! Every `AddFilm` goes through one bounded mailbox drained by a single task,
//! so calls from all connections are applied in one definite order. Each
//! call is assigned a [`TxId`] when it is dequeued; rejected calls consume one
//! too. Reads never pass through here.
//!
//! The executor is the only writer of its deployment's registry. A call is
//! written to the state file before it is appended in memory, so a receipt is
//! only ever issued for state that survives a restart.

use std::sync::Arc;

use filmreg_proto::{CallError, ErrorCode, Event, Receipt, TxId};
use filmreg_contract::RegistryError;
use filmreg_types::{Account, FilmRecord, Rating};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::deployment::Deployment;

/// Capacity of the event fan-out channel. Subscribers that fall further
/// behind miss events and are told so via `RecvError::Lagged`.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A mutating call waiting to be applied.
#[derive(Debug)]
pub struct AddFilmTx {
	pub sender: Account,
	pub name: String,
	pub rating: u8,
	pub review: String,
}

struct Envelope {
	tx: AddFilmTx,
	reply: oneshot::Sender<Result<Receipt, CallError>>,
}

/// Cloneable handle for submitting calls and subscribing to events.
#[derive(Clone)]
pub struct ExecutorHandle {
	mailbox: mpsc::Sender<Envelope>,
	events: broadcast::Sender<Event>,
}

impl ExecutorHandle {
	/// Queues `tx` and waits for it to be applied.
	///
	/// # Errors
	///
	/// Returns the registry's rejection as a [`CallError`], or
	/// [`ErrorCode::Unavailable`] if the executor has stopped.
	pub async fn submit(&self, tx: AddFilmTx) -> Result<Receipt, CallError> {
		let (reply, response) = oneshot::channel();
		self.mailbox
			.send(Envelope { tx, reply })
			.await
			.map_err(|_| unavailable())?;
		response.await.map_err(|_| unavailable())?
	}

	/// Receives every `FilmAdded` applied after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<Event> {
		self.events.subscribe()
	}
}

fn unavailable() -> CallError {
	CallError::new(ErrorCode::Unavailable, "executor is not running")
}

/// The single consumer of the mailbox.
pub struct Executor {
	deployment: Arc<Deployment>,
	mailbox: mpsc::Receiver<Envelope>,
	events: broadcast::Sender<Event>,
	next_tx: u64,
}

impl Executor {
	/// Starts the executor task. It stops once every handle is dropped.
	pub fn spawn(deployment: Arc<Deployment>, capacity: usize) -> (ExecutorHandle, JoinHandle<()>) {
		let (mailbox_tx, mailbox) = mpsc::channel(capacity.max(1));
		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
		let handle = ExecutorHandle {
			mailbox: mailbox_tx,
			events: events.clone(),
		};
		let executor = Self {
			deployment,
			mailbox,
			events,
			next_tx: 0,
		};
		(handle, tokio::spawn(executor.run()))
	}

	async fn run(mut self) {
		info!(deployment = %self.deployment.id(), "executor started");
		while let Some(Envelope { tx, reply }) = self.mailbox.recv().await {
			let result = self.apply(tx).await;
			if reply.send(result).is_err() {
				debug!("submitter went away before its receipt");
			}
		}
		info!("executor stopped");
	}

	async fn apply(&mut self, tx: AddFilmTx) -> Result<Receipt, CallError> {
		let id = TxId(self.next_tx);
		self.next_tx += 1;

		let AddFilmTx {
			sender,
			name,
			rating,
			review,
		} = tx;
		let rating = match Rating::new(rating) {
			Ok(rating) => rating,
			Err(err) => {
				warn!(tx = id.0, sender = %sender.short(), "call rejected: {err}");
				return Err(CallError::from(&RegistryError::from(err)));
			}
		};

		let pending = FilmRecord::new(name, rating, review);
		if let Err(err) = self.deployment.persist_with(&pending).await {
			error!(tx = id.0, sender = %sender.short(), "failed to persist state, call not applied: {err}");
			return Err(CallError::new(ErrorCode::Unavailable, "registry state could not be persisted"));
		}

		let registry = self.deployment.registry();
		let expected = registry.film_count();
		let event = registry
			.add_film(pending.name(), rating.get(), pending.review())
			.map_err(|err| CallError::from(&err))?;
		debug_assert_eq!(event.position.0, expected);
		info!(tx = id.0, sender = %sender.short(), position = event.position.0, "film committed");

		// No receivers is fine.
		let _ = self.events.send(Event::FilmAdded {
			tx: id,
			event: event.clone(),
		});

		Ok(Receipt { tx: id, sender, event })
	}
}

#[cfg(test)]
mod tests {
	use filmreg_contract::ReadMode;
	use filmreg_types::Position;

	use super::*;

	fn tx(name: &str, rating: u8) -> AddFilmTx {
		AddFilmTx {
			sender: Account::new("alice").unwrap(),
			name: name.into(),
			rating,
			review: String::new(),
		}
	}

	#[tokio::test]
	async fn tx_ids_increase_across_rejections() {
		let deployment = Arc::new(Deployment::ephemeral(ReadMode::Strict));
		let (handle, _task) = Executor::spawn(deployment.clone(), 4);

		let first = handle.submit(tx("Heat", 5)).await.unwrap();
		let rejected = handle.submit(tx("Nope", 0)).await.unwrap_err();
		let second = handle.submit(tx("Ronin", 4)).await.unwrap();

		assert_eq!(first.tx, TxId(0));
		assert_eq!(first.event.position, Position(0));
		assert_eq!(rejected.code, ErrorCode::Validation);
		assert_eq!(rejected.message, "Rating must be between 1 and 5");
		assert_eq!(second.tx, TxId(2));
		assert_eq!(second.event.position, Position(1));
		assert_eq!(deployment.registry().film_count(), 2);
	}

	#[tokio::test]
	async fn subscribers_see_only_commits() {
		let deployment = Arc::new(Deployment::ephemeral(ReadMode::Strict));
		let (handle, _task) = Executor::spawn(deployment, 4);
		let mut events = handle.subscribe();

		handle.submit(tx("Bad", 6)).await.unwrap_err();
		let receipt = handle.submit(tx("Inception", 5)).await.unwrap();

		let Event::FilmAdded { tx: id, event } = events.recv().await.unwrap();
		assert_eq!(id, receipt.tx);
		assert_eq!(event, receipt.event);
		assert!(events.try_recv().is_err());
	}

	#[tokio::test]
	async fn persists_after_each_commit() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("registry.bin");
		let deployment = Arc::new(Deployment::open(&path, ReadMode::Strict).await.unwrap());
		let (handle, _task) = Executor::spawn(deployment.clone(), 1);

		handle.submit(tx("Alien", 5)).await.unwrap();
		let reopened = Deployment::open(&path, ReadMode::Strict).await.unwrap();
		assert_eq!(reopened.id(), deployment.id());
		assert_eq!(reopened.registry().film_count(), 1);
	}

	#[tokio::test]
	async fn failed_write_is_not_applied_and_position_is_not_reused() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("registry.bin");
		let deployment = Arc::new(Deployment::open(&path, ReadMode::Strict).await.unwrap());
		let (handle, _task) = Executor::spawn(deployment.clone(), 1);
		let mut events = handle.subscribe();

		handle.submit(tx("A", 5)).await.unwrap();
		events.recv().await.unwrap();

		// A directory in the way of the temp file makes the write fail.
		let blocker = path.with_extension("tmp");
		std::fs::create_dir(&blocker).unwrap();
		let err = handle.submit(tx("B", 4)).await.unwrap_err();
		assert_eq!(err.code, ErrorCode::Unavailable);
		assert_eq!(deployment.registry().film_count(), 1);
		assert!(events.try_recv().is_err());

		let reopened = Deployment::open(&path, ReadMode::Strict).await.unwrap();
		assert_eq!(reopened.id(), deployment.id());
		assert_eq!(reopened.registry().film_count(), 1);

		std::fs::remove_dir(&blocker).unwrap();
		let receipt = handle.submit(tx("C", 3)).await.unwrap();
		assert_eq!(receipt.event.position, Position(1));
		assert_eq!(receipt.tx, TxId(2));

		let reopened = Deployment::open(&path, ReadMode::Strict).await.unwrap();
		let names: Vec<String> = reopened.registry().all_films().iter().map(|f| f.name().to_owned()).collect();
		assert_eq!(names, ["A", "C"]);
	}

	#[tokio::test]
	async fn stopped_executor_is_unavailable() {
		let deployment = Arc::new(Deployment::ephemeral(ReadMode::Strict));
		let (handle, task) = Executor::spawn(deployment, 1);
		task.abort();
		let _ = task.await;
		let err = handle.submit(tx("Late", 3)).await.unwrap_err();
		assert_eq!(err.code, ErrorCode::Unavailable);
	}
}
