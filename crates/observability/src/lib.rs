//! Tracing/logging setup shared by the server binary and tests.

pub mod tracing;

pub use crate::tracing::{LogFormat, init};
