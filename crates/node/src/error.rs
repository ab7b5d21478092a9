use std::path::PathBuf;

use filmreg_contract::RegistryError;

/// Errors raised while starting or running a node.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
	#[error("failed to read config {path}: {source}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse config: {0}")]
	ConfigParse(#[from] toml::de::Error),
	#[error("state file {path}: {source}")]
	StateIo {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("state file {path} is corrupt: {source}")]
	StateDecode {
		path: PathBuf,
		#[source]
		source: postcard::Error,
	},
	#[error("failed to encode state: {0}")]
	StateEncode(#[source] postcard::Error),
	#[error("stored registry is invalid: {0}")]
	Registry(#[from] RegistryError),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
