//! Credential hashing and the process-wide credential table.

use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::error::{CacheError, Result};

/// Hashes a plaintext password the way the reference client does before it
/// ever leaves the client: SHA-512 followed by standard base64.
///
/// This is a wire-compatibility requirement, not a recommendation — SHA-512
/// is a fast general-purpose digest, not a password KDF, and offers no
/// protection against offline brute-force if the credential file leaks.
pub fn hash_password(password: &str) -> String {
    let digest = Sha512::digest(password.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(digest)
}

/// One row of the on-disk credential file: a username, its password hash,
/// and whether it identifies a machine (structured-mode) client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Pass")]
    pub pass_hash: String,
    #[serde(rename = "IsMachine")]
    pub is_machine: bool,
}

/// Immutable, process-wide `username -> password hash` mapping, loaded once
/// at startup. Missing or unparseable files are treated as a fatal startup
/// error by the caller.
pub struct CredentialTable {
    hashes: HashMap<String, String>,
}

impl CredentialTable {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| CacheError::Startup(format!("cannot read credential file: {e}")))?;
        let records: Vec<UserRecord> = serde_json::from_str(&data)
            .map_err(|e| CacheError::Startup(format!("malformed credential file: {e}")))?;
        let hashes = records.into_iter().map(|r| (r.name, r.pass_hash)).collect();
        Ok(Self { hashes })
    }

    pub fn from_records(records: Vec<UserRecord>) -> Self {
        let hashes = records.into_iter().map(|r| (r.name, r.pass_hash)).collect();
        Self { hashes }
    }

    /// Verifies `name`/`pass_hash` against the table. Comparison is
    /// constant-time over the byte length of the stored hash to avoid
    /// leaking how many leading bytes matched.
    pub fn verify(&self, name: &str, pass_hash: &str) -> bool {
        match self.hashes.get(name) {
            Some(expected) => {
                expected.as_bytes().len() == pass_hash.as_bytes().len()
                    && bool::from(expected.as_bytes().ct_eq(pass_hash.as_bytes()))
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_password_is_deterministic_and_base64() {
        let a = hash_password("secret");
        let b = hash_password("secret");
        assert_eq!(a, b);
        assert!(base64::engine::general_purpose::STANDARD.decode(&a).is_ok());
    }

    #[test]
    fn different_passwords_hash_differently() {
        assert_ne!(hash_password("a"), hash_password("b"));
    }

    #[test]
    fn verify_succeeds_for_known_user_and_matching_hash() {
        let hash = hash_password("secret");
        let table = CredentialTable::from_records(vec![UserRecord {
            name: "alice".into(),
            pass_hash: hash.clone(),
            is_machine: true,
        }]);
        assert!(table.verify("alice", &hash));
        assert!(!table.verify("alice", "wrong"));
        assert!(!table.verify("bob", &hash));
    }

    #[test]
    fn load_rejects_missing_file() {
        let result = CredentialTable::load(Path::new("/nonexistent/users"));
        assert!(result.is_err());
    }

    #[test]
    fn load_parses_well_formed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users");
        std::fs::write(
            &path,
            r#"[{"Name":"alice","Pass":"h1","IsMachine":true},{"Name":"bob","Pass":"h2","IsMachine":false}]"#,
        )
        .unwrap();
        let table = CredentialTable::load(&path).unwrap();
        assert!(table.verify("alice", "h1"));
        assert!(table.verify("bob", "h2"));
    }
}
