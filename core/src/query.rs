//! Tiered phrase search over an [`InvertedIndex`].
//!
//! A query is answered in three tiers. Pages holding every query term
//! with the words adjacent and in order are `ExactPhrase` hits. Pages holding
//! some, but not all, of the terms with at least two of them adjacent in query
//! order are `Subphrase` hits. Every other page that holds any query term is
//! a `General` hit. Within a tier, pages with more distinct query terms come
//! first, then pages with more total occurrences.

use crate::index::{InvertedIndex, Page, Position, PostingList};
use crate::tokenizer::tokenize;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    ExactPhrase,
    Subphrase,
    General,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::ExactPhrase => "exact phrase",
            Tier::Subphrase => "subphrase",
            Tier::General => "general",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    /// Distinct query terms present on the page.
    pub match_count: usize,
    /// Occurrences of those terms on the page, summed.
    pub total_freq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit {
    pub page: Page,
    pub tier: Tier,
    #[serde(flatten)]
    pub stats: QueryStats,
    /// Matching subphrases, sorted; empty outside the `Subphrase` tier.
    pub subphrases: Vec<String>,
}

impl Hit {
    fn rank(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then_with(|| other.stats.match_count.cmp(&self.stats.match_count))
            .then_with(|| other.stats.total_freq.cmp(&self.stats.total_freq))
            .then_with(|| self.page.cmp(&other.page))
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] terms={} occurrences={}",
            self.page, self.tier, self.stats.match_count, self.stats.total_freq
        )?;
        if !self.subphrases.is_empty() {
            let quoted: Vec<String> = self.subphrases.iter().map(|s| format!("\"{s}\"")).collect();
            write!(f, " matched {}", quoted.join(", "))?;
        }
        Ok(())
    }
}

/// Return the candidates on which `phrase` occurs as consecutive tokens.
///
/// A page matches when some position `p` of the first word has word `k` at
/// `p + k` for every later word. Candidate order is preserved. Pages missing
/// any word, or holding only frequency counts, never match.
pub fn phrase_match<'p, I>(index: &InvertedIndex, phrase: &str, candidates: I) -> Vec<&'p str>
where
    I: IntoIterator<Item = &'p str>,
{
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let Some((first, rest)) = words.split_first() else {
        return Vec::new();
    };
    let Some(first_postings) = index.postings(first) else {
        return Vec::new();
    };
    let Some(rest_postings) = rest.iter().map(|w| index.postings(w)).collect::<Option<Vec<&PostingList>>>() else {
        return Vec::new();
    };

    candidates
        .into_iter()
        .filter(|page| {
            let Some(starts) = first_postings.get(*page) else {
                return false;
            };
            let Some(following) = rest_postings
                .iter()
                .map(|pl| pl.get(*page).map(|p| p.positions().iter().copied().collect::<HashSet<Position>>()))
                .collect::<Option<Vec<_>>>()
            else {
                return false;
            };
            starts.positions().iter().any(|&p| {
                following
                    .iter()
                    .zip(1..)
                    .all(|(set, k)| p.checked_add(k).is_some_and(|pos| set.contains(&pos)))
            })
        })
        .collect()
}

/// Contiguous runs of `words` with length from 2 up to `max_len`, shortest
/// first, without duplicates. Runs are always shorter than `words`.
pub fn subphrases<S: AsRef<str>>(words: &[S], max_len: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for len in 2..=max_len.min(words.len().saturating_sub(1)) {
        for window in words.windows(len) {
            let phrase = window.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
            if seen.insert(phrase.clone()) {
                out.push(phrase);
            }
        }
    }
    out
}

/// Read-only view that answers queries against one index.
pub struct QueryEngine<'a> {
    index: &'a InvertedIndex,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self { index }
    }

    /// Per-page statistics for the given distinct terms.
    ///
    /// Only pages with at least one term appear. Terms missing from the
    /// index contribute nothing.
    pub fn stats<S: AsRef<str>>(&self, terms: &[S]) -> HashMap<&'a str, QueryStats> {
        let mut stats: HashMap<&'a str, QueryStats> = HashMap::new();
        for term in terms {
            let Some(pl) = self.index.postings(term.as_ref()) else {
                continue;
            };
            for (page, postings) in pl {
                let s = stats.entry(page.as_str()).or_default();
                s.match_count += 1;
                s.total_freq += u64::from(postings.frequency());
            }
        }
        stats
    }

    pub fn query(&self, query: &str) -> Vec<Hit> {
        let words = tokenize(query);
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = words.iter().map(String::as_str).filter(|w| seen.insert(*w)).collect();

        let stats = self.stats(&distinct);
        if stats.is_empty() {
            tracing::debug!(query, "no matching terms");
            return Vec::new();
        }
        let num_terms = distinct.len();

        let mut full_coverage: Vec<&str> = stats
            .iter()
            .filter(|(_, s)| s.match_count == num_terms)
            .map(|(page, _)| *page)
            .collect();
        full_coverage.sort_unstable();
        let exact: HashSet<&str> = phrase_match(self.index, &words.join(" "), full_coverage).into_iter().collect();

        let mut partial: Vec<&str> = stats
            .iter()
            .filter(|(page, s)| s.match_count > 1 && s.match_count < num_terms && !exact.contains(*page))
            .map(|(page, _)| *page)
            .collect();
        partial.sort_unstable();
        let mut matched: HashMap<&str, BTreeSet<String>> = HashMap::new();
        if !partial.is_empty() {
            for phrase in subphrases(&words, num_terms - 1) {
                for page in phrase_match(self.index, &phrase, partial.iter().copied()) {
                    matched.entry(page).or_default().insert(phrase.clone());
                }
            }
        }

        let mut hits: Vec<Hit> = stats
            .into_iter()
            .map(|(page, stats)| {
                let (tier, subphrases) = if exact.contains(page) {
                    (Tier::ExactPhrase, Vec::new())
                } else if let Some(found) = matched.remove(page) {
                    (Tier::Subphrase, found.into_iter().collect())
                } else {
                    (Tier::General, Vec::new())
                };
                Hit { page: page.to_owned(), tier, stats, subphrases }
            })
            .collect();
        hits.sort_by(Hit::rank);
        tracing::debug!(query, hits = hits.len(), exact = exact.len(), "query answered");
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Postings;

    fn index_of(pages: &[(&str, &str)]) -> InvertedIndex {
        let mut ix = InvertedIndex::new();
        for (page, text) in pages {
            ix.add_page(page, &tokenize(text));
        }
        ix
    }

    fn tiers(hits: &[Hit]) -> Vec<(&str, Tier)> {
        hits.iter().map(|h| (h.page.as_str(), h.tier)).collect()
    }

    #[test]
    fn phrase_match_uses_positions() {
        let mut terms = HashMap::new();
        terms.insert("quote".to_string(), HashMap::from([("X".to_string(), Postings::Positions(vec![5]))]));
        terms.insert("by".to_string(), HashMap::from([("X".to_string(), Postings::Positions(vec![6]))]));
        let ix = InvertedIndex::from_terms(terms);

        assert_eq!(phrase_match(&ix, "quote by", ["X"]), vec!["X"]);
        assert!(phrase_match(&ix, "by quote", ["X"]).is_empty());
    }

    #[test]
    fn phrase_match_tries_every_start() {
        let ix = index_of(&[("P", "a x a b")]);
        assert_eq!(phrase_match(&ix, "a b", ["P"]), vec!["P"]);
        assert!(phrase_match(&ix, "x b", ["P"]).is_empty());
    }

    #[test]
    fn phrase_match_needs_every_word_on_the_page() {
        let ix = index_of(&[("P", "red fish"), ("Q", "blue fish red")]);
        assert_eq!(phrase_match(&ix, "red fish", ["P", "Q"]), vec!["P"]);
        assert!(phrase_match(&ix, "red herring", ["P", "Q"]).is_empty());
        assert!(phrase_match(&ix, "", ["P"]).is_empty());
    }

    #[test]
    fn count_postings_never_phrase_match() {
        let mut terms = HashMap::new();
        terms.insert("a".to_string(), HashMap::from([("P".to_string(), Postings::Count(2))]));
        terms.insert("b".to_string(), HashMap::from([("P".to_string(), Postings::Count(1))]));
        let ix = InvertedIndex::from_terms(terms);
        assert!(phrase_match(&ix, "a b", ["P"]).is_empty());

        let hits = QueryEngine::new(&ix).query("a b");
        assert_eq!(tiers(&hits), vec![("P", Tier::General)]);
        assert_eq!(hits[0].stats, QueryStats { match_count: 2, total_freq: 3 });
    }

    #[test]
    fn subphrase_generation() {
        assert!(subphrases(&["a"], 0).is_empty());
        assert!(subphrases(&["a", "b"], 1).is_empty());
        assert_eq!(subphrases(&["a", "b", "c"], 2), vec!["a b", "b c"]);
        assert_eq!(subphrases(&["a", "b", "c", "d"], 3), vec!["a b", "b c", "c d", "a b c", "b c d"]);
        assert_eq!(subphrases(&["a", "b", "a", "b"], 3), vec!["a b", "b a", "a b a", "b a b"]);
        assert_eq!(subphrases(&["a", "b", "a", "b"], 1), Vec::<String>::new());
        assert_eq!(subphrases(&["a", "b", "c"], 5), vec!["a b", "b c"]);
    }

    #[test]
    fn quick_brown_fox() {
        let ix = index_of(&[("A", "the quick brown fox"), ("B", "the slow fox")]);
        let hits = QueryEngine::new(&ix).query("quick brown fox");
        assert_eq!(tiers(&hits), vec![("A", Tier::ExactPhrase), ("B", Tier::General)]);
        assert_eq!(hits[1].stats, QueryStats { match_count: 1, total_freq: 1 });
    }

    #[test]
    fn subphrase_tier_records_matches() {
        let ix = index_of(&[
            ("full", "a quote by albert einstein"),
            ("part", "a quote by someone else entirely"),
            ("loose", "by the way, a quote"),
        ]);
        let hits = QueryEngine::new(&ix).query("quote by einstein");
        assert_eq!(
            tiers(&hits),
            vec![("part", Tier::Subphrase), ("full", Tier::General), ("loose", Tier::General)]
        );
        assert_eq!(hits[0].subphrases, vec!["quote by"]);
        assert!(hits[0].to_string().contains("matched \"quote by\""));
    }

    #[test]
    fn full_coverage_without_phrase_is_general() {
        let ix = index_of(&[("P", "fox brown quick")]);
        let hits = QueryEngine::new(&ix).query("quick brown fox");
        assert_eq!(tiers(&hits), vec![("P", Tier::General)]);
        assert!(hits[0].subphrases.is_empty());
    }

    #[test]
    fn orders_by_terms_then_occurrences() {
        let ix = index_of(&[
            ("few", "cat dog"),
            ("many", "dog cat cat cat dog dog cat cat cat cat"),
            ("one", "cat cat cat cat cat cat cat cat cat cat cat"),
        ]);
        let hits = QueryEngine::new(&ix).query("bird cat dog");
        assert_eq!(
            tiers(&hits),
            vec![("many", Tier::Subphrase), ("few", Tier::Subphrase), ("one", Tier::General)]
        );
        assert_eq!(hits[0].stats, QueryStats { match_count: 2, total_freq: 10 });
        assert_eq!(hits[1].stats, QueryStats { match_count: 2, total_freq: 2 });
    }

    #[test]
    fn ties_break_on_page() {
        let ix = index_of(&[("b", "word"), ("c", "word"), ("a", "word")]);
        let pages: Vec<_> = QueryEngine::new(&ix).query("word").into_iter().map(|h| h.page).collect();
        assert_eq!(pages, vec!["a", "b", "c"]);
    }

    #[test]
    fn single_and_two_word_queries_have_no_subphrase_tier() {
        let ix = index_of(&[("A", "life is what happens"), ("B", "what is life"), ("C", "life")]);
        let engine = QueryEngine::new(&ix);
        for q in ["life", "life is", "is life"] {
            assert!(engine.query(q).iter().all(|h| h.tier != Tier::Subphrase), "{q}");
        }
        assert_eq!(
            tiers(&engine.query("life is")),
            vec![("A", Tier::ExactPhrase), ("B", Tier::General), ("C", Tier::General)]
        );
    }

    #[test]
    fn subphrase_length_counts_distinct_terms() {
        // Three distinct terms: subphrases stop at two words even though the
        // query itself has four.
        let ix = index_of(&[("P", "a b a")]);
        let hits = QueryEngine::new(&ix).query("a b a c");
        assert_eq!(tiers(&hits), vec![("P", Tier::Subphrase)]);
        assert_eq!(hits[0].subphrases, vec!["a b", "b a"]);
    }

    #[test]
    fn unknown_and_empty_queries() {
        let ix = index_of(&[("A", "hello world")]);
        let engine = QueryEngine::new(&ix);
        assert!(engine.query("").is_empty());
        assert!(engine.query("  ?! ").is_empty());
        assert!(engine.query("goodbye moon").is_empty());
        assert_eq!(tiers(&engine.query("goodbye world")), vec![("A", Tier::General)]);
    }

    #[test]
    fn query_is_normalized_like_text() {
        let ix = index_of(&[("A", "Quote by Einstein.")]);
        let hits = QueryEngine::new(&ix).query("QUOTE, by");
        assert_eq!(tiers(&hits), vec![("A", Tier::ExactPhrase)]);
    }

    #[test]
    fn repeated_query_words_count_once() {
        let ix = index_of(&[("A", "very very good"), ("B", "very good")]);
        let hits = QueryEngine::new(&ix).query("very very good");
        assert_eq!(tiers(&hits), vec![("A", Tier::ExactPhrase), ("B", Tier::General)]);
        assert_eq!(hits[0].stats, QueryStats { match_count: 2, total_freq: 3 });
    }
}
