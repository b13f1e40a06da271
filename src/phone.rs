//! Kenyan phone number normalization.
//!
//! Accepted inputs: local `07XXXXXXXX` / `01XXXXXXXX`, bare `254XXXXXXXXX`,
//! or an already-normalized `+254XXXXXXXXX`. Everything else is rejected.

use crate::error::AppError;

const PREFIX: &str = "+254";
const NATIONAL_DIGITS: usize = 9;

/// Normalize a raw phone number to `+254XXXXXXXXX`.
///
/// Spaces, dashes, brackets and any other non-digit characters are stripped
/// first, so `"+254 712 345-678"` is fine. Normalization is idempotent.
pub fn normalize_phone(raw: &str) -> Result<String, AppError> {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();

    let phone = if cleaned.starts_with("07") || cleaned.starts_with("01") {
        format!("{PREFIX}{}", &cleaned[1..])
    } else if cleaned.starts_with("254") {
        format!("+{cleaned}")
    } else if cleaned.starts_with(PREFIX) {
        cleaned
    } else {
        return Err(AppError::InvalidPhone(raw.to_string()));
    };

    let rest = &phone[PREFIX.len()..];
    if rest.len() != NATIONAL_DIGITS || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidPhone(raw.to_string()));
    }

    Ok(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mobile_prefix_is_rewritten() {
        assert_eq!(normalize_phone("0712345678").unwrap(), "+254712345678");
    }

    #[test]
    fn local_landline_prefix_is_rewritten() {
        assert_eq!(normalize_phone("0112345678").unwrap(), "+254112345678");
    }

    #[test]
    fn bare_country_code_gets_plus() {
        assert_eq!(normalize_phone("254712345678").unwrap(), "+254712345678");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_phone("0712345678").unwrap();
        assert_eq!(normalize_phone(&once).unwrap(), once);
    }

    #[test]
    fn formatting_characters_are_stripped() {
        assert_eq!(normalize_phone("+254 712 345-678").unwrap(), "+254712345678");
        assert_eq!(normalize_phone("07 (123) 456 78").unwrap(), "+254712345678");
    }

    #[test]
    fn short_numbers_are_rejected() {
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("07123").is_err());
    }

    #[test]
    fn wrong_country_code_is_rejected() {
        assert!(normalize_phone("+255712345678").is_err());
    }

    #[test]
    fn too_many_digits_rejected() {
        assert!(normalize_phone("+2547123456789").is_err());
    }

    #[test]
    fn empty_input_rejected() {
        assert!(normalize_phone("").is_err());
    }
}
