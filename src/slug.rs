//! Title slugification.
//!
//! Manifest keys and output filenames are derived from human document titles,
//! which in practice carry diacritics, mixed case, and free-form punctuation
//! (`"Úvod do Fyziky"`, `"Cvičení 3 - řešení"`). [`slugify`] maps those to a
//! stable, filesystem- and URL-safe form.
//!
//! The transformation is deterministic and total, but not injective: two
//! distinct titles can normalize to the same slug, in which case they share a
//! manifest key and the later build overwrites the earlier one's record and
//! artifacts. Known limitation; there is no collision detection.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Convert an arbitrary title into a slug containing only `[a-z0-9._-]`.
///
/// Steps: NFD-decompose, drop combining marks, lowercase, trim, collapse
/// whitespace runs into single hyphens, drop anything outside word chars /
/// dot / hyphen, collapse hyphen runs.
///
/// ```
/// use lectern::slug::slugify;
/// assert_eq!(slugify("Úvod do Fyziky"), "uvod-do-fyziky");
/// assert_eq!(slugify("  Cvičení   3  "), "cviceni-3");
/// ```
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.trim().nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        for lower in ch.to_lowercase() {
            if lower.is_whitespace() {
                pending_hyphen = true;
            } else if lower.is_ascii_alphanumeric()
                || lower == '_'
                || lower == '.'
                || lower == '-'
            {
                if pending_hyphen {
                    // Collapse runs of separators into one hyphen
                    if !out.is_empty() && !out.ends_with('-') {
                        out.push('-');
                    }
                    pending_hyphen = false;
                }
                if lower == '-' && out.ends_with('-') {
                    continue;
                }
                out.push(lower);
            }
            // Everything else (punctuation, symbols, non-ASCII leftovers) is dropped
        }
    }

    out
}
