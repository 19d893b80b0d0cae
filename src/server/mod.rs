//! Transport and process-wide server state: TLS loading, the accept loop,
//! and the context shared by every session.

pub mod context;
pub mod listener;
pub mod tls;

pub use context::ServerContext;
