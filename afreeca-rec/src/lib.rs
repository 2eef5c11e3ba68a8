//! afreeca-rec library crate.
//!
//! Watches a single AfreecaTV (SOOP) channel and records each broadcast by
//! supervising a streamlink child process. The binary in `main.rs` wires
//! these modules together; everything here is exposed for integration tests.

pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod recorder;
pub mod session;
pub mod status;
pub mod supervisor;
pub mod utils;

pub use channel::ChannelId;
pub use error::{Error, Result};
