//! Core types and shared functionality for spielplan.
//!
//! This crate provides:
//! - Cache entry types, the bounded entry map, and the on-disk content store
//! - Snapshot persistence across restarts
//! - Domain models for clubs, teams, games, and tables
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod model;

pub use cache::{CacheEntry, ContentStore, EntryCache, Validators, url_hash};
pub use config::{AppConfig, TtlConfig};
pub use error::Error;
