// src/utils/text.rs

//! Small text helpers shared by the filter and the capability strategies.

/// Case-insensitive check that `term` occurs in `haystack` as a whole term,
/// i.e. not glued to a letter or digit on either side.
///
/// `haystack` and `term` are expected to be lowercase already.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Lowercase and trim a keyword list, dropping blanks.
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Decode the HTML entities the search endpoint leaves in snippets.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
