//! Credential hashing and the startup-loaded credential table.

pub mod credentials;

pub use credentials::{hash_password, CredentialTable, UserRecord};
