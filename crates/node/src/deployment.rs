//! One hosted registry instance and its on-disk state.

use std::path::{Path, PathBuf};

use filmreg_contract::{FilmRegistry, ReadMode, RegistrySnapshot};
use filmreg_types::{DeploymentId, FilmRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{NodeError, Result};

/// Persisted form of a deployment.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
	deployment: DeploymentId,
	snapshot: RegistrySnapshot,
}

/// A deployed registry: its id, the contract, and where it is persisted.
#[derive(Debug)]
pub struct Deployment {
	id: DeploymentId,
	registry: FilmRegistry,
	state_file: Option<PathBuf>,
}

impl Deployment {
	/// Fresh deployment with a new id and empty storage, never persisted.
	pub fn ephemeral(read_mode: ReadMode) -> Self {
		let id = DeploymentId::generate();
		info!(deployment = %id, "deployed fresh registry");
		Self {
			id,
			registry: FilmRegistry::new().with_read_mode(read_mode),
			state_file: None,
		}
	}

	/// Restores the deployment stored at `state_file`, or deploys a fresh one
	/// there if the file does not exist yet.
	///
	/// A fresh deployment is written out immediately so its id survives a
	/// restart that happens before the first commit.
	///
	/// # Errors
	///
	/// Fails if the file exists but cannot be read or decoded, if a stored
	/// record violates the rating range, or if a fresh file cannot be written.
	pub async fn open(state_file: &Path, read_mode: ReadMode) -> Result<Self> {
		let bytes = match tokio::fs::read(state_file).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				let mut deployment = Self::ephemeral(read_mode);
				deployment.state_file = Some(state_file.to_path_buf());
				deployment.persist().await?;
				return Ok(deployment);
			}
			Err(source) => {
				return Err(NodeError::StateIo {
					path: state_file.to_path_buf(),
					source,
				});
			}
		};

		let stored: StateFile = postcard::from_bytes(&bytes).map_err(|source| NodeError::StateDecode {
			path: state_file.to_path_buf(),
			source,
		})?;
		let registry = FilmRegistry::restore(stored.snapshot, read_mode)?;
		info!(
			deployment = %stored.deployment,
			films = registry.film_count(),
			path = %state_file.display(),
			"restored registry"
		);
		Ok(Self {
			id: stored.deployment,
			registry,
			state_file: Some(state_file.to_path_buf()),
		})
	}

	pub fn id(&self) -> DeploymentId {
		self.id
	}

	pub fn registry(&self) -> &FilmRegistry {
		&self.registry
	}

	pub fn state_file(&self) -> Option<&Path> {
		self.state_file.as_deref()
	}

	/// Writes the current registry contents to the state file, if any.
	pub async fn persist(&self) -> Result<()> {
		if self.state_file.is_none() {
			return Ok(());
		}
		self.write_state(self.registry.snapshot()).await
	}

	/// Writes the current contents followed by `pending`, which is not in the
	/// registry yet.
	///
	/// The caller appends `pending` only once this returns `Ok`, and nothing
	/// else may append to the registry in between.
	pub async fn persist_with(&self, pending: &FilmRecord) -> Result<()> {
		if self.state_file.is_none() {
			return Ok(());
		}
		let mut snapshot = self.registry.snapshot();
		snapshot.films.push(pending.clone());
		self.write_state(snapshot).await
	}

	/// The file is replaced atomically: the new state goes to a sibling
	/// `.tmp` file that is then renamed over the old one. On failure the old
	/// file is left as it was.
	async fn write_state(&self, snapshot: RegistrySnapshot) -> Result<()> {
		let Some(path) = &self.state_file else {
			return Ok(());
		};
		let state = StateFile {
			deployment: self.id,
			snapshot,
		};
		let bytes = postcard::to_allocvec(&state).map_err(NodeError::StateEncode)?;

		let io_err = |source| NodeError::StateIo {
			path: path.clone(),
			source,
		};
		if let Some(parent) = path.parent()
			&& !parent.as_os_str().is_empty()
		{
			tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
		}
		let tmp = path.with_extension("tmp");
		tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
		tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
		debug!(path = %path.display(), bytes = bytes.len(), films = state.snapshot.films.len(), "state persisted");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use filmreg_contract::RegistryError;
	use filmreg_types::Position;

	use super::*;

	#[tokio::test]
	async fn missing_file_deploys_fresh_then_restores() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("registry.bin");

		let first = Deployment::open(&path, ReadMode::Strict).await.unwrap();
		assert_eq!(first.registry().film_count(), 0);
		first.registry().add_film("Heat", 5, "Diner scene").unwrap();
		first.persist().await.unwrap();

		let second = Deployment::open(&path, ReadMode::Strict).await.unwrap();
		assert_eq!(second.id(), first.id());
		assert_eq!(second.registry().all_films(), first.registry().all_films());
		assert_eq!(second.registry().film(Position(0)).unwrap().review(), "Diner scene");
	}

	#[tokio::test]
	async fn ephemeral_deployments_are_distinct_and_not_persisted() {
		let a = Deployment::ephemeral(ReadMode::Strict);
		let b = Deployment::ephemeral(ReadMode::Strict);
		assert_ne!(a.id(), b.id());
		assert!(a.state_file().is_none());
		a.persist().await.unwrap();
	}

	#[tokio::test]
	async fn fresh_deployment_id_is_written_on_open() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("registry.bin");

		let first = Deployment::open(&path, ReadMode::Strict).await.unwrap();
		assert!(path.exists());

		let second = Deployment::open(&path, ReadMode::Strict).await.unwrap();
		assert_eq!(second.id(), first.id());
		assert_eq!(second.registry().film_count(), 0);
	}

	#[tokio::test]
	async fn persist_with_includes_pending_record() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("registry.bin");
		let deployment = Deployment::open(&path, ReadMode::Strict).await.unwrap();

		let pending = FilmRecord::new("Alien", filmreg_types::Rating::new(5).unwrap(), "");
		deployment.persist_with(&pending).await.unwrap();
		assert_eq!(deployment.registry().film_count(), 0);

		let reopened = Deployment::open(&path, ReadMode::Strict).await.unwrap();
		assert_eq!(reopened.registry().all_films(), vec![pending]);
	}

	#[tokio::test]
	async fn corrupt_file_is_reported() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("registry.bin");
		std::fs::write(&path, [0xffu8; 3]).unwrap();
		assert!(matches!(
			Deployment::open(&path, ReadMode::Strict).await,
			Err(NodeError::StateDecode { .. })
		));
	}

	#[tokio::test]
	async fn invalid_stored_rating_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("registry.bin");
		let state = StateFile {
			deployment: DeploymentId::generate(),
			snapshot: RegistrySnapshot {
				films: vec![FilmRecord::zeroed()],
			},
		};
		std::fs::write(&path, postcard::to_allocvec(&state).unwrap()).unwrap();
		assert!(matches!(
			Deployment::open(&path, ReadMode::Strict).await,
			Err(NodeError::Registry(RegistryError::Validation(_)))
		));
	}
}
