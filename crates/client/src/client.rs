use std::path::Path;

use filmreg_proto::{
	DeploymentInfo, Frame, Receipt, Request, RequestId, RequestPayload, ResponsePayload, read_frame, write_frame,
};
use filmreg_types::{Account, DeploymentId, FilmRecord, Position};
use tokio::net::UnixStream;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::draft::FilmDraft;
use crate::error::{ClientError, Result};

/// Request/response channel over one socket.
///
/// Requests are issued one at a time; responses are matched by request id.
struct Connection {
	stream: UnixStream,
	next_id: u64,
}

impl Connection {
	async fn call(&mut self, payload: RequestPayload) -> Result<ResponsePayload> {
		self.next_id += 1;
		let id = RequestId(self.next_id);
		write_frame(&mut self.stream, &Frame::Request(Request { id, payload })).await?;

		loop {
			match read_frame(&mut self.stream).await? {
				Some(Frame::Response(response)) if response.request_id == id => {
					return Ok(response.into_result()?);
				}
				Some(Frame::Response(response)) => {
					warn!(expected = id.0, got = response.request_id.0, "dropping stale response");
				}
				Some(Frame::Event(_)) => {}
				Some(Frame::Request(_)) => warn!("node sent a request frame"),
				None => return Err(ClientError::Disconnected),
			}
		}
	}

	async fn deployment_info(&mut self) -> Result<DeploymentInfo> {
		match self.call(RequestPayload::Deployment).await? {
			ResponsePayload::Deployment(info) => Ok(info),
			_ => Err(ClientError::UnexpectedResponse("Deployment")),
		}
	}
}

/// Connection to a node, bound to one deployment.
pub struct RegistryClient {
	conn: Connection,
	deployment: DeploymentId,
	account: Option<Account>,
}

impl RegistryClient {
	/// Connects and binds to the hosted deployment.
	///
	/// When `expected` is set the node must host exactly that deployment.
	///
	/// # Errors
	///
	/// [`ClientError::WrongDeployment`] on a mismatch, I/O errors if the socket
	/// cannot be reached.
	pub async fn connect(socket: &Path, expected: Option<DeploymentId>) -> Result<Self> {
		let mut conn = Connection {
			stream: UnixStream::connect(socket).await?,
			next_id: 0,
		};

		let info = conn.deployment_info().await?;
		if let Some(expected) = expected
			&& expected != info.deployment
		{
			return Err(ClientError::WrongDeployment {
				expected,
				found: info.deployment,
			});
		}
		debug!(socket = %socket.display(), deployment = %info.deployment, "connected to node");
		Ok(Self {
			conn,
			deployment: info.deployment,
			account: None,
		})
	}

	/// Sets the caller identity used for submissions.
	#[must_use]
	pub fn with_account(mut self, account: Account) -> Self {
		self.account = Some(account);
		self
	}

	pub fn deployment(&self) -> DeploymentId {
		self.deployment
	}

	pub fn account(&self) -> Option<&Account> {
		self.account.as_ref()
	}

	/// Re-reads the hosted deployment and its current size.
	pub async fn deployment_info(&mut self) -> Result<DeploymentInfo> {
		self.conn.deployment_info().await
	}

	/// Validates `draft`, submits it, then reloads the whole catalog.
	///
	/// # Errors
	///
	/// Draft validation errors are returned before anything is sent. Registry
	/// rejections arrive as [`ClientError::Call`].
	pub async fn add_film(&mut self, draft: &FilmDraft) -> Result<(Receipt, Catalog)> {
		let sender = self.account.clone().ok_or(ClientError::NoAccount)?;
		let rating = draft.validate()?;

		let payload = RequestPayload::AddFilm {
			deployment: self.deployment,
			sender: sender.as_str().to_owned(),
			name: draft.name.clone(),
			rating,
			review: draft.review.clone(),
		};
		let receipt = match self.conn.call(payload).await {
			Ok(ResponsePayload::Receipt(receipt)) => receipt,
			Ok(_) => return Err(ClientError::UnexpectedResponse("AddFilm")),
			Err(e) => {
				warn!(sender = %sender.short(), error = %e, "add film rejected");
				return Err(e);
			}
		};
		info!(tx = receipt.tx.0, position = %receipt.event.position, "film added");

		let catalog = self.films().await?;
		Ok((receipt, catalog))
	}

	pub async fn films(&mut self) -> Result<Catalog> {
		match self.conn.call(RequestPayload::AllFilms).await? {
			ResponsePayload::Films(films) => Ok(Catalog::from_films(films)),
			_ => Err(ClientError::UnexpectedResponse("AllFilms")),
		}
	}

	pub async fn film(&mut self, position: Position) -> Result<FilmRecord> {
		match self.conn.call(RequestPayload::Film { position }).await? {
			ResponsePayload::Film(film) => Ok(film),
			_ => Err(ClientError::UnexpectedResponse("Film")),
		}
	}

	pub async fn film_count(&mut self) -> Result<u64> {
		match self.conn.call(RequestPayload::FilmCount).await? {
			ResponsePayload::FilmCount(count) => Ok(count),
			_ => Err(ClientError::UnexpectedResponse("FilmCount")),
		}
	}
}
