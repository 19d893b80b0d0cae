//! Crate-wide error type.
//!
//! Every fallible operation in the cache core, protocol layer, and session
//! state machine returns this single enum. Dispatch-level variants
//! ([`CacheError::BadArity`] through [`CacheError::TypeMismatch`]) are
//! reported back to the client and do not end the session; [`CacheError::Auth`]
//! and [`CacheError::Transport`] end the session; [`CacheError::Startup`]
//! aborts the process before it accepts connections.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Wrong params count")]
    BadArity,

    #[error("Invalid argument: {0}")]
    BadArgument(String),

    #[error("Index out of bound")]
    OutOfBounds,

    #[error("The value for the key [{key}] is not a {expected}.")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("User/password pair is incorrect")]
    Auth,

    #[error("Invalid command")]
    InvalidCommand,

    #[error("Unknown command")]
    UnknownCommand,

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("startup failure: {0}")]
    Startup(String),
}

impl CacheError {
    /// Whether this error should terminate the owning session rather than
    /// simply being reported to the client and continuing the command loop.
    pub fn terminates_session(&self) -> bool {
        matches!(self, CacheError::Auth | CacheError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_arity_message() {
        assert_eq!(CacheError::BadArity.to_string(), "Wrong params count");
    }

    #[test]
    fn type_mismatch_message_matches_reference_wording() {
        let err = CacheError::TypeMismatch {
            key: "K".into(),
            expected: "dictionary",
        };
        assert_eq!(
            err.to_string(),
            "The value for the key [K] is not a dictionary."
        );
    }

    #[test]
    fn auth_and_transport_terminate_session() {
        assert!(CacheError::Auth.terminates_session());
        assert!(CacheError::Transport(std::io::Error::other("x")).terminates_session());
        assert!(!CacheError::BadArity.terminates_session());
    }
}
