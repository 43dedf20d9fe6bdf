//! Command-line client for the Broken Divinity content runtime.
//!
//! The binary is a thin composition root: [`config`] reads the environment,
//! [`logging`] installs tracing, and [`demo`] drives the runtime crate through
//! a content inventory, a round of variant rolls, and one scripted encounter.

pub mod config;
pub mod demo;
pub mod logging;

pub use config::{Backend, ClientConfig};
