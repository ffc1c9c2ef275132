use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ErrorMessage;

/// Longest password accepted for hashing or verification, in bytes.
const MAX_PASSWORD_LENGTH: usize = 64;

fn check_length(password: &str) -> Result<(), ErrorMessage> {
    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

/// Hash a local account password with Argon2id.
///
/// Returns the PHC string (`$argon2id$v=19$m=..$<salt>$<hash>`), which holds
/// everything `compare` needs. A fresh salt is drawn on every call.
pub fn hash(password: impl Into<String>) -> Result<String, ErrorMessage> {
    let password = password.into();
    check_length(&password)?;

    let salt = SaltString::generate(&mut OsRng);
    let hashed_password = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| ErrorMessage::HashingError)?
        .to_string();

    Ok(hashed_password)
}

/// Check a candidate password against a stored PHC string.
///
/// An empty stored hash belongs to an account created through Google
/// sign-in and is reported as `MismatchLogin`, before any hashing happens.
pub fn compare(password: &str, hashed_password: &str) -> Result<bool, ErrorMessage> {
    if hashed_password.is_empty() {
        return Err(ErrorMessage::MismatchLogin);
    }
    check_length(password)?;

    let parsed_hash =
        PasswordHash::new(hashed_password).map_err(|_| ErrorMessage::InvalidHashFormat)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_compare() {
        let hashed = hash("secret").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(compare("secret", &hashed).unwrap());
        assert!(!compare("secreT", &hashed).unwrap());
    }

    #[test]
    fn salts_differ_between_calls() {
        assert_ne!(hash("secret").unwrap(), hash("secret").unwrap());
    }

    #[test]
    fn rejects_empty_and_oversized_passwords() {
        assert_eq!(hash(""), Err(ErrorMessage::EmptyPassword));
        assert_eq!(
            hash("x".repeat(65)),
            Err(ErrorMessage::ExceededMaxPasswordLength(64))
        );
    }

    #[test]
    fn empty_stored_hash_means_oauth_account() {
        assert_eq!(compare("secret", ""), Err(ErrorMessage::MismatchLogin));
    }

    #[test]
    fn garbage_hash_is_a_format_error() {
        assert_eq!(
            compare("secret", "not-a-phc-string"),
            Err(ErrorMessage::InvalidHashFormat)
        );
    }
}
