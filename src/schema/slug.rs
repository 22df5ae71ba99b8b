//! Header and column-name slugs.
//!
//! Two flavours exist: the compact slug drops every non-alphanumeric
//! character and is used for fuzzy header matching, while the key slug maps
//! them to `_` and is used for custom-column keys.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lower-case and strip diacritics ("Região" -> "regiao")
fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

/// Slug used to match CSV headers against keyword sets
pub fn compact_slug(text: &str) -> String {
    fold(text.trim()).chars().filter(|c| is_slug_char(*c)).collect()
}

/// Slug used as a custom-column key ("Data de Corte" -> "data_de_corte")
pub fn key_slug(text: &str) -> String {
    fold(text.trim())
        .chars()
        .map(|c| if is_slug_char(c) { c } else { '_' })
        .collect()
}
