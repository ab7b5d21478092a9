//! Wire types for the film registry IPC protocol.
//!
//! A client sends [`Request`] frames; the node answers each with exactly one
//! [`Response`] carrying the same [`RequestId`]. Connections that subscribed
//! also receive unsolicited [`Event`] frames.

use filmreg_contract::{FilmAdded, RegistryError};
use filmreg_types::{Account, DeploymentId, FilmRecord, Position};
use serde::{Deserialize, Serialize};

/// Unique identifier for requests and responses on one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Sequence number the node assigns to every mutating call it executes.
///
/// Rejected calls consume a number too, so gaps in successful receipts are
/// expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

/// Classification of frames transmitted over the IPC socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
	/// A request initiated by a client.
	Request(Request),
	/// The node's answer to a request.
	Response(Response),
	/// An asynchronous notification from the node.
	Event(Event),
}

/// A request from a client to the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
	/// Identifier echoed back in the response.
	pub id: RequestId,
	/// The request payload.
	pub payload: RequestPayload,
}

/// Request payload variants, one per registry operation plus housekeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestPayload {
	/// Connectivity check.
	Ping,
	/// Ask which deployment the node hosts.
	Deployment,
	/// Append a film (the only mutating call).
	AddFilm {
		/// Deployment the caller believes it is talking to.
		deployment: DeploymentId,
		/// Caller identity for this invocation; must not be blank.
		sender: String,
		/// Film name; any text.
		name: String,
		/// Star rating; the registry rejects values outside `1..=5`.
		rating: u8,
		/// Review text; may be empty.
		review: String,
	},
	/// Number of stored films.
	FilmCount,
	/// One film by position.
	Film {
		/// Position to read.
		position: Position,
	},
	/// Every film in insertion order.
	AllFilms,
	/// Receive an [`Event`] frame for every later successful append.
	Subscribe,
}

/// A response from the node. Exactly one of `payload` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
	/// The request this answers.
	pub request_id: RequestId,
	/// Result on success.
	pub payload: Option<ResponsePayload>,
	/// Failure description.
	pub error: Option<CallError>,
}

impl Response {
	/// Successful response.
	#[must_use]
	pub fn ok(request_id: RequestId, payload: ResponsePayload) -> Self {
		Self {
			request_id,
			payload: Some(payload),
			error: None,
		}
	}

	/// Failed response.
	#[must_use]
	pub fn err(request_id: RequestId, error: CallError) -> Self {
		Self {
			request_id,
			payload: None,
			error: Some(error),
		}
	}

	/// Splits the response into a `Result`.
	///
	/// A response with neither field set is reported as
	/// [`ErrorCode::Unavailable`].
	pub fn into_result(self) -> Result<ResponsePayload, CallError> {
		match (self.payload, self.error) {
			(_, Some(error)) => Err(error),
			(Some(payload), None) => Ok(payload),
			(None, None) => Err(CallError::new(ErrorCode::Unavailable, "empty response")),
		}
	}
}

/// Response payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponsePayload {
	/// Answer to [`RequestPayload::Ping`].
	Pong,
	/// Answer to [`RequestPayload::Deployment`].
	Deployment(DeploymentInfo),
	/// Answer to a successful [`RequestPayload::AddFilm`].
	Receipt(Receipt),
	/// Answer to [`RequestPayload::FilmCount`].
	FilmCount(u64),
	/// Answer to [`RequestPayload::Film`].
	Film(FilmRecord),
	/// Answer to [`RequestPayload::AllFilms`].
	Films(Vec<FilmRecord>),
	/// Answer to [`RequestPayload::Subscribe`].
	Subscribed,
}

/// Identity and size of the hosted registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInfo {
	/// Deployment the node hosts.
	pub deployment: DeploymentId,
	/// Current number of films.
	pub film_count: u64,
}

/// Proof that an `AddFilm` call was committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
	/// Execution sequence number.
	pub tx: TxId,
	/// Caller that submitted the call.
	pub sender: Account,
	/// Notification emitted by the registry.
	pub event: FilmAdded,
}

/// Asynchronous notifications pushed to subscribed connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
	/// A film was appended.
	FilmAdded {
		/// Transaction that appended it.
		tx: TxId,
		/// The registry notification.
		event: FilmAdded,
	},
}

/// Failure categories reported over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
	/// The registry rejected the input (rating out of range).
	Validation,
	/// A read named an unassigned position.
	UnknownPosition,
	/// The request named a deployment the node does not host.
	WrongDeployment,
	/// The caller account was blank.
	InvalidSender,
	/// The node could not process the request (shutting down, storage failure).
	Unavailable,
}

/// A failed call: category plus human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallError {
	/// Failure category.
	pub code: ErrorCode,
	/// Reason string shown to users.
	pub message: String,
}

impl CallError {
	/// Builds an error from a code and message.
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}
}

impl std::fmt::Display for CallError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}: {}", self.code, self.message)
	}
}

impl std::error::Error for CallError {}

impl From<&RegistryError> for CallError {
	fn from(err: &RegistryError) -> Self {
		let code = match err {
			RegistryError::Validation(_) => ErrorCode::Validation,
			RegistryError::UnknownPosition { .. } => ErrorCode::UnknownPosition,
		};
		Self::new(code, err.to_string())
	}
}
