#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for policy construction and validation.
pub const TRACING_TARGET_POLICY: &str = "credhash_core::policy";

/// Tracing target for algorithm registration.
pub const TRACING_TARGET_REGISTRY: &str = "credhash_core::registry";

/// Tracing target for hashing and verification.
pub const TRACING_TARGET_HASHER: &str = "credhash_core::hasher";

/// Tracing target for configuration resolution.
pub const TRACING_TARGET_FACTORY: &str = "credhash_core::factory";

/// Tracing target for calibration and benchmarking.
pub const TRACING_TARGET_CALIBRATE: &str = "credhash_core::calibrate";

mod error;

pub mod algorithm;
pub mod calibrate;
pub mod config;
pub mod factory;
pub mod hasher;
pub mod policy;
pub mod prelude;
pub mod registry;

// Re-export key types for convenience
pub use error::{BoxedError, Error, ErrorKind, Result};
