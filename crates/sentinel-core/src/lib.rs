//! # sentinel-core
//!
//! Core crate for the Sentinel live-update client. Contains the
//! configuration schemas and the unified error system shared by the
//! realtime client and the binaries.
//!
//! This crate has **no** internal dependencies on other Sentinel crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
