//! Label canonicalization shared by the resolver, the tree builder and the
//! sidebar regrouper.
//!
//! Asset labels arrive in whatever shape the modelling tool exported them:
//! `Turbo_hose.002`, `Motör-Halter #3`, `Exhaust filter`.  Everything that
//! needs to compare labels goes through `normalize_key` first, which folds all
//! of those spellings into lowercase ASCII words separated by single spaces.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref INSTANCE_COUNTER: Regex = Regex::new(r"\s#\d+$").unwrap();
    static ref EXPORT_SUFFIX: Regex = Regex::new(r"(_\d+|\.\d+)$").unwrap();
    static ref SEPARATOR_RUN: Regex = Regex::new(r"[_\-./\\]+").unwrap();
    static ref UI_SEPARATOR_RUN: Regex = Regex::new(r"[_\-]+").unwrap();
    // Deliberately ASCII; `\w` would keep non-Latin letters around.
    static ref NON_WORD: Regex = Regex::new(r"[^A-Za-z0-9_\s]+").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref ARTICLE: Regex = Regex::new(r"(?i)\b(the|a|an)\b").unwrap();
    static ref PATH_UNSAFE: Regex = Regex::new(r"[^a-z0-9\-]").unwrap();
}

/// Combining Diacritical Marks block, U+0300..=U+036F.
fn is_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_diacritic(*c)).collect()
}

/// Drop a trailing `" #<digits>"` instance counter as produced by the tree
/// builder's sibling disambiguation.
pub fn strip_instance_counter(s: &str) -> &str {
    match INSTANCE_COUNTER.find(s) {
        Some(m) => &s[..m.start()],
        None => s,
    }
}

/// Drop a trailing `_<digits>` or `.<digits>` duplicate suffix as added by
/// exporters (`Turbo_hose_01`, `Fuel drain.001`).
pub fn strip_export_suffix(s: &str) -> &str {
    match EXPORT_SUFFIX.find(s) {
        Some(m) => &s[..m.start()],
        None => s,
    }
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").trim().to_string()
}

/// Canonical comparison key for a free-form label.
///
/// Idempotent, total, and the empty string for empty input.
pub fn normalize_key(raw: &str) -> String {
    let folded = strip_diacritics(raw.trim());
    let uncounted = strip_instance_counter(&folded);
    let spaced = SEPARATOR_RUN.replace_all(uncounted, " ");
    let worded = NON_WORD.replace_all(&spaced, "");
    collapse_whitespace(&worded).to_lowercase()
}

/// Readable rendition of a raw label, used when nothing in the catalog
/// matches.  Case is preserved.
pub fn humanize_label(raw: &str) -> String {
    let uncounted = strip_instance_counter(raw.trim());
    let spaced = SEPARATOR_RUN.replace_all(uncounted, " ");
    collapse_whitespace(&spaced)
}

/// Cleanup applied to path segments before they are shown in the tree.  Only
/// `_` and `-` count as separators here so that `Cube.002` keeps its dot and
/// is still recognised as an auto-generated name.
pub fn ui_clean(raw: &str) -> String {
    let uncounted = strip_instance_counter(raw.trim());
    let spaced = UI_SEPARATOR_RUN.replace_all(uncounted, " ");
    collapse_whitespace(&spaced)
}

/// Remove standalone English articles.
pub fn strip_articles(raw: &str) -> String {
    collapse_whitespace(&ARTICLE.replace_all(raw, ""))
}

/// Lowercase, dash-separated, `[a-z0-9-]` only.
pub fn make_path_safe(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let dashed = WHITESPACE_RUN.replace_all(&lowered, "-");
    PATH_UNSAFE.replace_all(&dashed, "").into_owned()
}
