//! Shared wire types for film registry IPC.
//!
//! This crate defines the messages exchanged between clients and a
//! `filmreg-node` over Unix domain sockets. Frames are postcard-encoded and
//! prefixed with their length as a little-endian `u32`.

#![warn(missing_docs)]

pub mod codec;
pub mod paths;
pub mod types;

pub use codec::{MAX_FRAME_LEN, read_frame, write_frame};
pub use types::*;
