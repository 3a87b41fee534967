//! Shared types and configuration for walletd.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LedgerConfig, ServerConfig};
pub use types::WalletId;
