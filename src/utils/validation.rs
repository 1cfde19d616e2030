use crate::error::{Error, Result};
use validator::ValidateEmail;

/// Reserved domain for synthesized addresses; `.invalid` never resolves, so a
/// placeholder can always be told apart from a real address.
pub const PLACEHOLDER_EMAIL_DOMAIN: &str = "placeholder.invalid";

/// Synthesized phones carry this prefix; the leading zeros also fail the
/// normal phone check, so they can never be messaged by accident.
pub const PLACEHOLDER_PHONE_PREFIX: &str = "+000000";

pub fn validate_email(email: &str) -> Result<()> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid email address: {}", email)))
    }
}

/// Strip separators and check the result looks like a dialable number:
/// optional leading `+`, 7 to 15 digits, first digit non-zero.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let mut normalized = String::with_capacity(raw.len());
    for (i, ch) in raw.trim().chars().enumerate() {
        match ch {
            '+' if i == 0 => normalized.push('+'),
            '0'..='9' => normalized.push(ch),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => {
                return Err(Error::Validation(format!(
                    "Invalid phone number: {}",
                    raw
                )))
            }
        }
    }

    let digits = normalized.strip_prefix('+').unwrap_or(&normalized);
    if digits.len() < 7 || digits.len() > 15 {
        return Err(Error::Validation(format!("Invalid phone number: {}", raw)));
    }
    if !digits.starts_with(|c: char| ('1'..='9').contains(&c)) {
        return Err(Error::Validation(format!("Invalid phone number: {}", raw)));
    }
    Ok(normalized)
}

pub fn placeholder_email(nanos: i64) -> String {
    format!("applicant-{}@{}", nanos, PLACEHOLDER_EMAIL_DOMAIN)
}

pub fn placeholder_phone(nanos: i64) -> String {
    format!("{}{}", PLACEHOLDER_PHONE_PREFIX, nanos.rem_euclid(1_000_000_000))
}

pub fn is_placeholder_email(email: &str) -> bool {
    email.ends_with(&format!("@{}", PLACEHOLDER_EMAIL_DOMAIN))
}

pub fn is_placeholder_phone(phone: &str) -> bool {
    phone.starts_with(PLACEHOLDER_PHONE_PREFIX)
}

/// A contact pair good enough to message: present, not synthesized, dialable.
pub fn is_usable_phone(phone: Option<&str>) -> bool {
    match phone {
        Some(p) => !is_placeholder_phone(p) && normalize_phone(p).is_ok(),
        None => false,
    }
}
