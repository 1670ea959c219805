/// Canonical form of a product code for loose comparison.
///
/// Uppercases, then keeps only ASCII letters and digits. Whitespace and
/// punctuation disappear, so `"ab-12 X"` and `"AB12x"` compare equal.
pub fn normalize_code(code: &str) -> String {
    code.to_uppercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
