//! Credit Core Library
//!
//! Shared types, error taxonomy, configuration, and the UnleashNFTs
//! analytics API client for the wallet credit scoring system.

pub mod api;
pub mod config;
pub mod error;
pub mod types;

pub use error::{Error, Result};
