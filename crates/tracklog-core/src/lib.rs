//! Core types and trait definitions for the tracklog ingestion pipeline.
//!
//! This crate knows nothing about HTTP or SQL. The Spotify client and the
//! SQLite store implement the traits defined here, and the binary wires them
//! into an [`ingest::Ingestor`].

pub mod error;
pub mod ingest;
pub mod record;
pub mod session;
pub mod source;
pub mod store;
pub mod summary;

pub use error::{BoxError, Error, Result};
