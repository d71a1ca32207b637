//! Argon2id password hashing. Only PHC strings ever reach storage.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub const MIN_PASSWORD_CHARS: usize = 8;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(plain.as_bytes(), &salt) {
        Ok(phc) => Ok(phc.to_string()),
        Err(e) => {
            error!(error = %e, "password hashing failed");
            Err(anyhow::anyhow!("password hashing failed: {e}"))
        }
    }
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!("malformed password hash: {e}")
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("password verification failed: {e}")),
    }
}

/// Spends about as long as a real check, for logins against unknown emails.
pub fn burn_verification(plain: &str) {
    let _ = hash_password(plain);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_accepts_only_its_password() {
        let stored = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &stored).unwrap());
        assert!(!verify_password("hunter2hunter3", &stored).unwrap());
        assert!(!verify_password("", &stored).unwrap());
    }

    #[test]
    fn stored_hash_is_salted_phc_without_plaintext() {
        let first = hash_password("password1").unwrap();
        let second = hash_password("password1").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("password1"));
        assert_ne!(first, second);
    }

    #[test]
    fn unreadable_stored_hash_is_an_error() {
        assert!(verify_password("password1", "plaintext-password1").is_err());
    }
}
