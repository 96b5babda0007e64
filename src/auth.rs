//! Pluggable credential check and the per-session authenticated flag.

use crate::config::AuthConfig;
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Something that can decide whether a username/password pair is valid.
pub trait CredentialVerifier {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Lowercase hex SHA-256 of `password`.
pub fn digest_hex(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verifier backed by a username -> SHA-256 hex digest table.
#[derive(Debug, Clone, Default)]
pub struct DigestCredentials {
    users: BTreeMap<String, String>,
}

impl DigestCredentials {
    pub fn new(users: BTreeMap<String, String>) -> Self {
        let users = users
            .into_iter()
            .map(|(u, d)| (u, d.trim().to_ascii_lowercase()))
            .collect();
        Self { users }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(cfg.users.clone())
    }
}

impl CredentialVerifier for DigestCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        let Some(expected) = self.users.get(username) else {
            return false;
        };
        let got = digest_hex(password);
        // length is fixed for hex SHA-256; compare without early exit
        expected.len() == got.len()
            && expected
                .bytes()
                .zip(got.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

/// Per-session login state; starts unauthenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Try to log in; a failed attempt leaves the session unchanged.
    pub fn login(
        &mut self,
        verifier: &dyn CredentialVerifier,
        username: &str,
        password: &str,
    ) -> bool {
        if self.is_authenticated() {
            return true;
        }
        if verifier.verify(username, password) {
            info!("user `{username}` authenticated");
            self.user = Some(username.to_string());
            true
        } else {
            warn!("incorrect username or password for `{username}`");
            false
        }
    }

    pub fn logout(&mut self) {
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            digest_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
