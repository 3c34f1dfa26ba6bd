//! Shared text normalization utilities

use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Turn a title or name into a URL-safe slug.
///
/// Lowercases, folds common Latin accents to ASCII and joins the remaining
/// alphanumeric runs with `-`.
///
/// # Example
/// ```ignore
/// assert_eq!(slugify("The Hitchhiker's Guide"), "the-hitchhiker-s-guide");
/// ```
pub fn slugify(s: &str) -> String {
    let folded: String = s.to_lowercase().chars().map(fold_accent).collect();

    NON_SLUG_CHARS
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ř' => 'r',
        'š' | 'ś' => 's',
        'ù' | 'ú' | 'û' | 'ü' | 'ů' => 'u',
        'ý' | 'ÿ' => 'y',
        'ž' | 'ź' | 'ż' => 'z',
        other => other,
    }
}

/// Key stored next to a title or name for case-insensitive substring search.
///
/// Uses Unicode lowercasing; SQLite's `lower()` only folds ASCII.
pub fn search_key(s: &str) -> String {
    s.to_lowercase()
}

/// Normalize an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// True if the string is empty or only whitespace
#[inline]
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
