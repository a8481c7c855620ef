//! Phone number extraction from free text.
//!
//! Used by the free-text trigger: the first token of 10 to 13 digits (with an
//! optional leading `+`) is taken as the number to dial.

use regex::Regex;
use std::sync::OnceLock;

static PHONE_TOKEN: OnceLock<Regex> = OnceLock::new();

fn phone_token() -> &'static Regex {
    PHONE_TOKEN.get_or_init(|| Regex::new(r"\+?\d{10,13}").expect("phone token pattern is valid"))
}

/// Find the first phone-number-like token in `text` and normalize it.
///
/// Returns `None` when the text holds no run of 10 to 13 digits.
pub fn extract_phone_number(text: &str, default_country_code: &str) -> Option<String> {
    let token = phone_token().find(text)?;
    Some(normalize_token(token.as_str(), default_country_code))
}

/// Normalize an extracted token to a `+`-prefixed digit string.
///
/// - `+` tokens are kept as they are
/// - exactly 10 bare digits get `+<default_country_code>`
/// - 11 to 13 bare digits are assumed to carry a country code and get `+`
pub fn normalize_token(token: &str, default_country_code: &str) -> String {
    if token.starts_with('+') {
        return token.to_string();
    }
    if token.len() == 10 {
        format!("+{default_country_code}{token}")
    } else {
        format!("+{token}")
    }
}
