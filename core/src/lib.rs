pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;

pub use error::{Error, Result};
pub use index::{InvertedIndex, Page, Position, PostingList, Postings, Term};
pub use query::{phrase_match, Hit, QueryEngine, QueryStats, Tier};
