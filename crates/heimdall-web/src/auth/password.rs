use argon2::{
    password_hash::{PasswordHash, PasswordVerifier as _},
    Argon2,
};
use heimdall_core::PasswordVerifier;

/// Verifies PHC-format argon2 hashes, as produced by the `hash_password` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Verifier;

impl PasswordVerifier for Argon2Verifier {
    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is not valid PHC: {e}");
                return false;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
