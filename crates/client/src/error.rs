use filmreg_proto::CallError;
use filmreg_types::DeploymentId;

/// Errors surfaced by the client binding.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
	/// Submitting needs a caller account.
	#[error("Connect wallet first")]
	NoAccount,
	/// The draft has no film name.
	#[error("Enter film name")]
	EmptyName,
	/// The draft has no rating selected.
	#[error("Select rating")]
	MissingRating,
	/// The node hosts a different deployment than the client was configured for.
	#[error("node hosts deployment {found}, expected {expected}")]
	WrongDeployment {
		expected: DeploymentId,
		found: DeploymentId,
	},
	/// The node rejected the call.
	#[error("{}", .0.message)]
	Call(#[from] CallError),
	/// The node answered with a payload that does not fit the request.
	#[error("unexpected response to {0}")]
	UnexpectedResponse(&'static str),
	#[error("node closed the connection")]
	Disconnected,
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
