//! Where the node socket lives when nobody says otherwise.

use std::ffi::OsString;
use std::path::PathBuf;

/// File name of the node socket inside the runtime directory.
pub const SOCKET_FILE_NAME: &str = "filmreg-node.sock";

/// Environment variable that overrides the socket location.
pub const SOCKET_ENV: &str = "FILMREG_SOCKET";

/// Socket path shared by `filmreg-node` and its clients.
///
/// `FILMREG_SOCKET` wins when set and non-empty. Otherwise the socket goes in
/// the user's runtime directory, or the temp directory if there is none or it
/// cannot be created.
#[must_use]
pub fn default_socket_path() -> PathBuf {
	resolve(std::env::var_os(SOCKET_ENV), dirs::runtime_dir())
}

fn resolve(explicit: Option<OsString>, runtime_dir: Option<PathBuf>) -> PathBuf {
	if let Some(path) = explicit.filter(|p| !p.is_empty()) {
		return PathBuf::from(path);
	}
	let dir = runtime_dir
		.filter(|dir| std::fs::create_dir_all(dir).is_ok())
		.unwrap_or_else(std::env::temp_dir);
	dir.join(SOCKET_FILE_NAME)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn explicit_path_is_used_verbatim() {
		let path = resolve(Some("/srv/films/node.sock".into()), None);
		assert_eq!(path, PathBuf::from("/srv/films/node.sock"));
	}

	#[test]
	fn empty_override_is_ignored() {
		assert_eq!(
			resolve(Some(OsString::new()), None),
			std::env::temp_dir().join(SOCKET_FILE_NAME)
		);
	}

	#[test]
	fn runtime_dir_is_created_and_preferred() {
		let dir = std::env::temp_dir().join(format!("filmreg-runtime-{}", std::process::id()));
		let path = resolve(None, Some(dir.clone()));
		assert_eq!(path, dir.join(SOCKET_FILE_NAME));
		assert!(dir.is_dir());
		let _ = std::fs::remove_dir(&dir);
	}
}
