use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use rand::Rng;

pub const GENERATED_PASSWORD_LEN: usize = 16;

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_=+";

pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(plain.as_bytes(), &salt)?.to_string();
    Ok(password_hash)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hashed)?;
    let ok = Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(ok)
}

/// One-time password for inline-provisioned accounts. Sampled from the OS
/// CSPRNG and resampled until the complexity policy holds.
pub fn generate_password() -> String {
    let charset: Vec<u8> = [LOWER, UPPER, DIGITS, SYMBOLS].concat();
    loop {
        let candidate: String = (0..GENERATED_PASSWORD_LEN)
            .map(|_| charset[OsRng.gen_range(0..charset.len())] as char)
            .collect();
        if meets_complexity(&candidate) {
            return candidate;
        }
    }
}

pub fn meets_complexity(password: &str) -> bool {
    password.len() >= 12
        && password.bytes().any(|b| LOWER.contains(&b))
        && password.bytes().any(|b| UPPER.contains(&b))
        && password.bytes().any(|b| DIGITS.contains(&b))
        && password.bytes().any(|b| SYMBOLS.contains(&b))
}
