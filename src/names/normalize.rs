use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalizes an author name into a key for case-, accent- and
/// punctuation-insensitive matching.
///
/// Accents are removed by compatibility decomposition (NFKD) followed by
/// dropping every non-ASCII character, so letters with no ASCII
/// decomposition (`ø`, `æ`, `ß`) disappear entirely. The result only
/// contains `[a-z0-9_]` and single inner spaces.
pub fn normalize_name(name: &str) -> String {
    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let stripped = NON_WORD.replace_all(lowered.trim(), "");
    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}
