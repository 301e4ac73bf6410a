//! Pairing-code formatting.

/// Normalize a raw pairing code into groups of four characters joined by
/// `-`. A code that does not cleanly segment (it already carries
/// separators, or any other non-alphanumeric character) is returned as-is.
pub fn format_pair_code(raw: &str) -> String {
    if raw.chars().any(|c| !c.is_ascii_alphanumeric()) {
        return raw.to_string();
    }

    raw.as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}
