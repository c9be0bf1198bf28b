use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Deterministic fallback password for non-admin accounts created without
/// one: first 4 letters of the name (lowercased, padded by repeating the
/// first letter, `'a'` for an empty name) followed by the last 4 digits of
/// the phone number (left-padded with `'0'`). Always 8 characters.
///
/// The plaintext is surfaced once in the creation response for out-of-band
/// distribution; only the hash is stored.
pub fn derive_default_password(full_name: &str, mobile_no: &str) -> String {
    let lowered = full_name.to_lowercase();
    let mut name_part: String = lowered.chars().take(4).collect();
    let pad = name_part.chars().next().unwrap_or('a');
    while name_part.chars().count() < 4 {
        name_part.push(pad);
    }

    let digits: Vec<char> = mobile_no.chars().filter(|c| c.is_ascii_digit()).collect();
    let tail_start = digits.len().saturating_sub(4);
    let tail: String = digits[tail_start..].iter().collect();
    let phone_part = format!("{:0>4}", tail);

    format!("{name_part}{phone_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn derived_password_pads_short_name_and_phone() {
        assert_eq!(derive_default_password("Al", "12"), "alaa0012");
    }

    #[test]
    fn derived_password_handles_empty_inputs() {
        assert_eq!(derive_default_password("", ""), "aaaa0000");
    }

    #[test]
    fn derived_password_truncates_and_lowercases() {
        assert_eq!(derive_default_password("Priya Sharma", "9876543210"), "priy3210");
    }

    #[test]
    fn derived_password_strips_non_digits() {
        assert_eq!(derive_default_password("Ravi", "(+91) 98765-4321"), "ravi4321");
    }

    #[test]
    fn derived_password_is_always_length_8_and_verifiable() {
        let plain = derive_default_password("Jo", "7");
        assert_eq!(plain.chars().count(), 8);
        let hash = hash_password(&plain).unwrap();
        assert!(verify_password(&plain, &hash).unwrap());
    }
}
