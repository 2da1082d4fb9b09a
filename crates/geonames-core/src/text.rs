// crates/geonames-core/src/text.rs

//! Text helpers shared by the schemas: transliteration and folding.

/// Transliterate a Unicode name into plain ASCII.
///
/// Uses `deunicode` for a best-effort mapping, so `Москва` becomes `Moskva`
/// and `Łódź` becomes `Lodz`. Surrounding whitespace is trimmed.
///
/// # Examples
///
/// ```rust
/// use geonames_core::text::transliterate;
///
/// assert_eq!(transliterate("Москва"), "Moskva");
/// assert_eq!(transliterate("Zürich"), "Zurich");
/// ```
pub fn transliterate(s: &str) -> String {
    deunicode::deunicode(s).trim().to_owned()
}

/// Convert a string into a folded key suitable for comparison.
///
/// 1\) Transliterate Unicode → ASCII
/// 2\) Normalize to lowercase
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(s).to_lowercase()
}

/// Compares two strings for equality after Unicode folding.
pub fn equals_folded(a: &str, b: &str) -> bool {
    fold_key(a) == fold_key(b)
}

/// Returns `None` for empty (or whitespace-only) input.
///
/// GeoNames dumps encode "no value" as an empty column; every schema treats
/// that uniformly as absent before validation.
#[inline]
pub fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|v| !v.is_empty())
}

/// Split a comma separated list column, dropping empty items.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(str::to_owned)
        .collect()
}
