use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type Term = String;
/// Fully-qualified page URL.
pub type Page = String;
/// Zero-based token offset within one page's token stream.
pub type Position = u32;

/// Occurrences of one term on one page.
///
/// Indexes built by this crate always carry positions. `Count` only comes from
/// loading an older frequency-only document; such entries still contribute to
/// term statistics but can never take part in a phrase match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Postings {
    Positions(Vec<Position>),
    Count(u32),
}

impl Postings {
    pub fn frequency(&self) -> u32 {
        match self {
            Postings::Positions(p) => p.len() as u32,
            Postings::Count(n) => *n,
        }
    }

    pub fn positions(&self) -> &[Position] {
        match self {
            Postings::Positions(p) => p,
            Postings::Count(_) => &[],
        }
    }
}

pub type PostingList = HashMap<Page, Postings>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    terms: HashMap<Term, PostingList>,
    pages: HashSet<Page>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Build an index from already-validated postings.
    pub(crate) fn from_terms(terms: HashMap<Term, PostingList>) -> Self {
        let pages = terms.values().flat_map(|pl| pl.keys().cloned()).collect();
        Self { terms, pages }
    }

    /// Record the token stream of one page.
    ///
    /// Position `i` is appended to `index[token][page]` for each token in
    /// order, so position lists come out ascending. Adding a page that is
    /// already present replaces its earlier postings.
    pub fn add_page<S: AsRef<str>>(&mut self, page: &str, tokens: &[S]) {
        if self.pages.contains(page) {
            self.remove_page(page);
        }
        if tokens.is_empty() {
            return;
        }
        for (i, token) in tokens.iter().enumerate() {
            let entry = self
                .terms
                .entry(token.as_ref().to_owned())
                .or_default()
                .entry(page.to_owned())
                .or_insert_with(|| Postings::Positions(Vec::new()));
            if let Postings::Positions(p) = entry {
                p.push(i as Position);
            }
        }
        self.pages.insert(page.to_owned());
    }

    pub fn remove_page(&mut self, page: &str) {
        if !self.pages.remove(page) {
            return;
        }
        self.terms.retain(|_, pl| {
            pl.remove(page);
            !pl.is_empty()
        });
    }

    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.terms.get(term)
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn terms(&self) -> &HashMap<Term, PostingList> {
        &self.terms
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn num_pages(&self) -> usize { self.pages.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}
