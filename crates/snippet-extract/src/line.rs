/// Splits a listing into lines after dropping a single trailing newline.
///
/// Only `\n` separates lines; a `\r` stays part of the line text so the
/// cleaned output reproduces the input byte for byte.
pub fn canonical_lines(text: &str) -> Vec<&str> {
    text.strip_suffix('\n').unwrap_or(text).split('\n').collect()
}
