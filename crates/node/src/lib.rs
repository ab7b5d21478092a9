//! Execution environment for the film registry.
//!
//! A node hosts exactly one [`Deployment`] of the registry contract and
//! exposes it over a Unix socket:
//! * [`config`]: `node.toml` loading
//! * [`deployment`]: deployment id, contract instance, state file
//! * [`executor`]: single-task serializer for mutating calls
//! * [`service`]: request dispatch
//! * [`server`]: socket accept loop and per-connection framing

pub mod config;
pub mod deployment;
pub mod error;
pub mod executor;
pub mod logging;
pub mod server;
pub mod service;

pub use config::NodeConfig;
pub use deployment::Deployment;
pub use error::{NodeError, Result};
pub use executor::{AddFilmTx, Executor, ExecutorHandle};
pub use server::{handle_connection, serve};
pub use service::RegistryService;
