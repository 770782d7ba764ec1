//! c8run Core - Platform-independent abstractions and configurations
//!
//! This crate provides the data model, configuration, error types and the
//! platform capability trait that the Unix and Windows launchers implement.

pub mod config;
pub mod error;
pub mod java;
pub mod pidfile;
pub mod platform;
pub mod process;
pub mod tree;

pub use config::*;
pub use error::*;
pub use pidfile::PidFile;
pub use platform::*;
pub use process::*;
