//! # Feedloop Common Library
//!
//! Shared code for all feedloop services including:
//! - Stream definition records
//! - Observer wire messages and the bus message envelope
//! - Configuration resolution
//! - Database initialization
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
pub use models::StreamDefinition;
