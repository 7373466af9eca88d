//! Name verification.
//!
//! Classic verification: the list server hands the client
//! md5(salt + name) as its verification key, and the server checks the
//! same digest against its own salt.

use md5::{Digest, Md5};
use rand::Rng;

/// Decides whether a client-supplied name and verification key pair is
/// acceptable.
pub trait Authenticator: Send + Sync {
    fn verify(&self, username: &str, key: &str) -> bool;
}

/// Accepts everyone. Used when name verification is disabled.
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn verify(&self, _username: &str, _key: &str) -> bool {
        true
    }
}

/// Checks the key against md5(salt + name), hex, case-insensitive.
pub struct ClassicAuthenticator {
    salt: String,
}

const SALT_LEN: usize = 16;
const SALT_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

impl ClassicAuthenticator {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// Fresh random salt, regenerated each server start.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let salt = (0..SALT_LEN)
            .map(|_| SALT_CHARS[rng.gen_range(0..SALT_CHARS.len())] as char)
            .collect();
        Self { salt }
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    fn expected_key(&self, username: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(username.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl Authenticator for ClassicAuthenticator {
    fn verify(&self, username: &str, key: &str) -> bool {
        key.eq_ignore_ascii_case(&self.expected_key(username))
    }
}
