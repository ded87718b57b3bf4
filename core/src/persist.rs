use crate::{Error, InvertedIndex, PostingList, Postings, Result, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub num_pages: usize,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
}

impl IndexMeta {
    pub fn describe(index: &InvertedIndex) -> Self {
        Self {
            num_pages: index.num_pages(),
            num_terms: index.num_terms(),
            created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            version: FORMAT_VERSION,
        }
    }
}

/// Sidecar path holding [`IndexMeta`], e.g. `index.json` -> `index.meta.json`.
pub fn meta_path(index_path: &Path) -> PathBuf {
    index_path.with_extension("meta.json")
}

/// Render the index as `{ term: { page: [positions] } }`.
pub fn serialize(index: &InvertedIndex) -> Result<String> {
    Ok(serde_json::to_string_pretty(index.terms())?)
}

/// Parse a document produced by [`serialize`].
///
/// Frequency-only documents (`{ term: { page: count } }`) are accepted as a
/// degraded form; their entries load as [`Postings::Count`].
pub fn deserialize(doc: &str) -> Result<InvertedIndex> {
    let terms: HashMap<Term, PostingList> =
        serde_json::from_str(doc).map_err(|e| Error::deserialize(e.to_string()))?;
    for (term, pl) in &terms {
        for (page, postings) in pl {
            validate(term, page, postings)?;
        }
    }
    Ok(InvertedIndex::from_terms(terms))
}

fn validate(term: &str, page: &str, postings: &Postings) -> Result<()> {
    match postings {
        Postings::Positions(p) if p.is_empty() => {
            Err(Error::deserialize(format!("term '{term}' has an empty position list for {page}")))
        }
        Postings::Positions(p) if p.windows(2).any(|w| w[0] >= w[1]) => {
            Err(Error::deserialize(format!("term '{term}' has unordered positions for {page}")))
        }
        Postings::Count(0) => {
            Err(Error::deserialize(format!("term '{term}' has a zero count for {page}")))
        }
        _ => Ok(()),
    }
}

/// Write the index document and its metadata sidecar.
///
/// The document is written to a temporary file and renamed into place, so an
/// interrupted save leaves any previous index untouched.
pub fn save_index(path: &Path, index: &InvertedIndex) -> Result<IndexMeta> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let doc = serialize(index)?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    {
        let mut f = File::create(&tmp)?;
        f.write_all(doc.as_bytes())?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    let meta = IndexMeta::describe(index);
    let mut f = File::create(meta_path(path))?;
    f.write_all(serde_json::to_string_pretty(&meta)?.as_bytes())?;
    tracing::info!(path = %path.display(), pages = meta.num_pages, terms = meta.num_terms, "index saved");
    Ok(meta)
}

pub fn load_index(path: &Path) -> Result<InvertedIndex> {
    let mut f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::IndexNotFound(path.to_path_buf())),
        Err(e) => return Err(e.into()),
    };
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let index = deserialize(&buf)?;
    tracing::debug!(path = %path.display(), pages = index.num_pages(), terms = index.num_terms(), "index loaded");
    Ok(index)
}

/// Read the sidecar written by [`save_index`]; `None` if there is none.
pub fn load_meta(index_path: &Path) -> Result<Option<IndexMeta>> {
    let buf = match fs::read_to_string(meta_path(index_path)) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let meta = serde_json::from_str(&buf).map_err(|e| Error::deserialize(e.to_string()))?;
    Ok(Some(meta))
}
