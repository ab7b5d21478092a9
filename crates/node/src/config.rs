//! Node configuration loaded from `node.toml`.
//!
//! Every section is optional; missing keys fall back to [`Default`]. Command
//! line flags in the binary override what the file says.
//!
//! ```toml
//! socket = "/run/user/1000/filmreg-node.sock"
//! state_file = "/var/lib/filmreg/registry.bin"
//!
//! [registry]
//! unknown_position = "zero"
//!
//! [executor]
//! mailbox_capacity = 64
//!
//! [log]
//! filter = "filmreg_node=debug,info"
//! ```

use std::path::{Path, PathBuf};

use filmreg_contract::ReadMode;
use serde::Deserialize;

use crate::error::{NodeError, Result};

/// File name looked up under the user config directory.
pub const CONFIG_FILE_NAME: &str = "node.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
	/// IPC socket; [`filmreg_proto::paths::default_socket_path`] when unset.
	pub socket: Option<PathBuf>,
	/// Where the ledger is persisted. Without it every start is a fresh
	/// deployment.
	pub state_file: Option<PathBuf>,
	pub registry: RegistryConfig,
	pub executor: ExecutorConfig,
	pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	/// `"error"` (default) or `"zero"`.
	pub unknown_position: ReadMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
	/// Pending mutating calls queued before submitters wait.
	pub mailbox_capacity: usize,
}

impl Default for ExecutorConfig {
	fn default() -> Self {
		Self { mailbox_capacity: 64 }
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
	/// `EnvFilter` directives; `RUST_LOG` wins when set.
	pub filter: Option<String>,
	/// Directory for a per-process log file instead of stderr.
	pub dir: Option<PathBuf>,
}

impl NodeConfig {
	pub fn from_toml_str(source: &str) -> Result<Self> {
		let config: Self = toml::from_str(source)?;
		Ok(config.normalized())
	}

	/// Reads and parses `path`.
	pub fn load(path: &Path) -> Result<Self> {
		let source = std::fs::read_to_string(path).map_err(|source| NodeError::ConfigRead {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&source)
	}

	/// Loads `path` if given, else the user config file if it exists, else
	/// defaults.
	pub fn discover(path: Option<&Path>) -> Result<Self> {
		if let Some(path) = path {
			return Self::load(path);
		}
		match default_config_path() {
			Some(path) if path.is_file() => Self::load(&path),
			_ => Ok(Self::default()),
		}
	}

	pub fn socket_path(&self) -> PathBuf {
		self.socket
			.clone()
			.unwrap_or_else(filmreg_proto::paths::default_socket_path)
	}

	fn normalized(mut self) -> Self {
		if self.executor.mailbox_capacity == 0 {
			tracing::warn!("executor.mailbox_capacity = 0 is not allowed, using 1");
			self.executor.mailbox_capacity = 1;
		}
		self
	}
}

/// `$XDG_CONFIG_HOME/filmreg/node.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("filmreg").join(CONFIG_FILE_NAME))
}
