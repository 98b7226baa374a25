//! Port for password hashing.
//!
//! Hashing is CPU bound and synchronous; services move calls onto a blocking
//! thread.

use crate::domain::Password;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hasher adapters.
    pub enum PasswordHasherError {
        /// Producing a hash failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// A stored hash could not be parsed.
        MalformedHash { message: String } => "stored password hash is malformed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a password into a self-describing PHC string.
    fn hash(&self, password: &Password) -> Result<String, PasswordHasherError>;

    /// Check `password` against a stored PHC string.
    fn verify(&self, password: &Password, hash: &str) -> Result<bool, PasswordHasherError>;
}
