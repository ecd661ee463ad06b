//! Position-derived labels.

/// Base-26 label for a 0-based position: 0 → "A", 25 → "Z", 26 → "AA".
pub fn slot_key(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Inverse of [`slot_key`]. Returns `None` for anything but uppercase letters.
pub fn key_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let mut n: usize = 0;
    for b in key.bytes() {
        n = n.checked_mul(26)?.checked_add((b - b'A') as usize + 1)?;
    }
    Some(n - 1)
}

/// English ordinal for a 1-based run number: 1st, 2nd, 3rd, 11th, 22nd.
pub fn run_ordinal(number: usize) -> String {
    let suffix = match (number % 10, number % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", number, suffix)
}
