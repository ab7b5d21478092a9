//! Client side of the film registry.
//!
//! [`RegistryClient`] talks to a `filmreg-node` over its Unix socket. Drafts
//! are checked locally for presence of a name and a rating; range checks stay
//! with the registry. After a successful submission the full collection is
//! reloaded into a [`Catalog`].

mod catalog;
mod client;
mod draft;
mod error;

pub use catalog::{Catalog, CatalogEntry};
pub use client::RegistryClient;
pub use draft::FilmDraft;
pub use error::{ClientError, Result};
