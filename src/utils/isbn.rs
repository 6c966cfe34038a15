// src/utils/isbn.rs

//! ISBN normalization and checksum validation.
//!
//! All functions are total: malformed input yields `false`, never a panic.

/// Strip everything except digits and `X`, then uppercase.
///
/// # Examples
/// ```
/// use bookrank::utils::isbn::normalize;
///
/// assert_eq!(normalize("ISBN 4-87311-x"), "487311X");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == 'x' || *c == 'X')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Validate an ISBN-10 (weights 10..=2, check digit may be `X`).
pub fn is_valid_isbn10(raw: &str) -> bool {
    let v = normalize(raw);
    let bytes = v.as_bytes();
    if bytes.len() != 10 {
        return false;
    }

    let mut sum = 0u32;
    for (i, b) in bytes[..9].iter().enumerate() {
        if !b.is_ascii_digit() {
            return false;
        }
        sum += (10 - i as u32) * u32::from(b - b'0');
    }

    let check = match bytes[9] {
        b'X' => 10,
        b if b.is_ascii_digit() => u32::from(b - b'0'),
        _ => return false,
    };

    (sum + check) % 11 == 0
}

/// Validate an ISBN-13 with a 978/979 prefix.
pub fn is_valid_isbn13(raw: &str) -> bool {
    let v = normalize(raw);
    let bytes = v.as_bytes();
    if bytes.len() != 13 || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }
    if !(v.starts_with("978") || v.starts_with("979")) {
        return false;
    }

    let sum: u32 = bytes[..12]
        .iter()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    let check = (10 - sum % 10) % 10;

    check == u32::from(bytes[12] - b'0')
}

/// Either a valid ISBN-13 or a valid ISBN-10.
pub fn is_valid_isbn(raw: &str) -> bool {
    is_valid_isbn13(raw) || is_valid_isbn10(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn10_known_values() {
        assert!(is_valid_isbn10("0306406152"));
        assert!(!is_valid_isbn10("0306406153"));
        assert!(is_valid_isbn10("0-306-40615-2"));
    }

    #[test]
    fn test_isbn10_check_x() {
        // 080442957X is a well-known ISBN-10 with an X check digit
        assert!(is_valid_isbn10("080442957X"));
        assert!(is_valid_isbn10("080442957x"));
        assert_eq!(normalize("080442957x"), "080442957X");
    }

    #[test]
    fn test_isbn10_rejects_x_inside_body() {
        assert!(!is_valid_isbn10("03064X6152"));
    }

    #[test]
    fn test_isbn10_wrong_length() {
        assert!(!is_valid_isbn10("030640615"));
        assert!(!is_valid_isbn10(""));
    }

    #[test]
    fn test_isbn13_known_values() {
        assert!(is_valid_isbn13("9780306406157"));
        assert!(is_valid_isbn13("978-0-306-40615-7"));
        assert!(!is_valid_isbn13("9780306406158"));
    }

    #[test]
    fn test_isbn13_requires_book_prefix() {
        // Checksum of this number is valid, the prefix is not.
        assert!(!is_valid_isbn13("1234567890128"));
    }

    #[test]
    fn test_isbn13_rejects_x() {
        assert!(!is_valid_isbn13("978030640615X"));
    }

    #[test]
    fn test_normalize_strips_junk() {
        assert_eq!(normalize("978-4-87311-abc"), "978487311");
        assert_eq!(normalize("ISBN：978 4 87311 565 8"), "9784873115658");
    }

    #[test]
    fn test_is_valid_isbn_either_form() {
        assert!(is_valid_isbn("9784873115658"));
        assert!(is_valid_isbn("0306406152"));
        assert!(!is_valid_isbn("12345"));
    }
}
