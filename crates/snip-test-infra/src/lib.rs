//! Disposable MySQL and Redis containers for integration tests.
//!
//! Every fixture needs a reachable Docker daemon.

pub mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};
