use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Anything that is not a letter, number or whitespace, in any script.
    static ref NON_WORD: Regex = Regex::new(r"[^\p{Alphabetic}\p{N}\s]").expect("valid regex");
}

/// Tokenize text into lowercase terms in document order.
///
/// Punctuation is removed rather than treated as a separator, so
/// `"don't"` becomes `"dont"` and `"well-known"` becomes `"wellknown"`.
/// The position of a term is its index in the returned vector.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD
        .replace_all(&lowered, "")
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}
