//! Multi-tenant, authenticated, TLS-terminated in-memory key/value cache.
//!
//! [`cache`] holds the concurrent store and its value containers,
//! [`protocol`] parses and dispatches commands and renders responses,
//! [`auth`] hashes and verifies credentials, [`session`] drives one
//! connection through its state machine, and [`server`] wires TLS and the
//! accept loop around all of the above.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;

pub use error::{CacheError, Result};
