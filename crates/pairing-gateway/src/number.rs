//! Phone-number normalization.

/// Example shown to callers who send an unparseable number.
pub const EXAMPLE_NUMBER: &str = "15551234567";

/// Normalize a phone number to its canonical form: E.164 digits with no
/// separators and no leading `+`. The canonical number doubles as the
/// session storage key and the correspondence address.
pub fn normalize_number(number: &str) -> Result<String, String> {
    let has_plus = number.trim_start().starts_with('+');
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err("Phone number must contain at least one digit".into());
    }

    if digits.len() < 7 {
        return Err("Phone number too short".into());
    }

    if digits.len() > 15 {
        return Err("Phone number too long".into());
    }

    // Without an explicit +, require enough digits to plausibly carry a
    // country code.
    if has_plus || digits.len() >= 10 {
        Ok(digits)
    } else {
        Err("Phone number must include country code".into())
    }
}
