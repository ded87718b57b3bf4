use tiersearch_core::tokenizer::tokenize;

#[test]
fn it_lowercases_and_strips_punctuation() {
    let words = tokenize("“It is our choices, Harry, that show what we truly are.”");
    assert_eq!(words, vec!["it", "is", "our", "choices", "harry", "that", "show", "what", "we", "truly", "are"]);
}

#[test]
fn it_keeps_letters_and_digits_of_any_script() {
    let words = tokenize("Café 42 — Ελληνικά, 日本語! naïve_user");
    assert_eq!(words, vec!["café", "42", "ελληνικά", "日本語", "naïveuser"]);
}

#[test]
fn it_does_not_split_on_punctuation() {
    assert_eq!(tokenize("don't well-known e.g."), vec!["dont", "wellknown", "eg"]);
}
