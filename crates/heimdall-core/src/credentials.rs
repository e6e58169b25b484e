//! Password verification capability.
//!
//! Hashing is owned by the caller; the pipeline only asks whether a password
//! matches a stored hash. Implementations may be slow (memory-hard hashes), so
//! the pipeline runs them on the blocking pool.

/// Checks a plaintext password against a stored hash.
pub trait PasswordVerifier: Send + Sync + 'static {
    /// `false` for a wrong password and for a hash that cannot be parsed.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

impl<F> PasswordVerifier for F
where
    F: Fn(&str, &str) -> bool + Send + Sync + 'static,
{
    fn verify(&self, password: &str, hash: &str) -> bool {
        self(password, hash)
    }
}
