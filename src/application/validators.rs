use url::Url;
use validator::ValidateEmail;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_KEY_NAME_LEN: usize = 100;
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Only absolute http(s) URLs with a host are accepted.
pub fn is_valid_website(website: &str) -> bool {
    match Url::parse(website.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub fn is_valid_key_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.chars().count() <= MAX_KEY_NAME_LEN
}

/// Chain identifiers are short lowercase slugs such as `ethereum` or `base-sepolia`.
pub fn is_valid_chain(chain: &str) -> bool {
    !chain.is_empty()
        && chain.len() <= 32
        && chain
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

pub fn is_valid_idempotency_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_IDEMPOTENCY_KEY_LEN
        && key.chars().all(|c| c.is_ascii_graphic())
}

/// Trims optional free text; an empty result means "clear the field".
pub fn normalize_optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
