//! Shell Fanout - run one shell script on many hosts over SSH
//!
//! This crate loads a list of targets and a script, then runs the script in an
//! interactive shell on every target concurrently. Each target is an
//! independent task whose failure is reported but never affects the others.

pub mod auth;
pub mod cli;
pub mod deploy;
pub mod inventory;
pub mod transport;
pub mod types;

pub use deploy::DeploymentOrchestrator;
pub use inventory::*;
pub use types::*;
