use anyhow::{anyhow, Result};
use crawler::{crawl_site, CrawlConfig, CrawlOutput};
use std::io::Write;
use std::path::PathBuf;
use tiersearch_core::persist::{load_index, load_meta, save_index, IndexMeta};
use tiersearch_core::tokenizer::tokenize;
use tiersearch_core::{Error as IndexError, InvertedIndex, Postings, QueryEngine};

pub const PROMPT: &str = "Enter command (build, load, print [word], find [phrase], exit): ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// One operator session: where the index lives, how to crawl, and the index
/// currently loaded, if any.
pub struct Session {
    index_path: PathBuf,
    crawl: CrawlConfig,
    index: Option<InvertedIndex>,
}

impl Session {
    pub fn new(index_path: PathBuf, crawl: CrawlConfig) -> Self {
        Self { index_path, crawl, index: None }
    }

    #[cfg(test)]
    pub fn index(&self) -> Option<&InvertedIndex> {
        self.index.as_ref()
    }

    /// Crawl the configured site, persist the result and load it.
    pub async fn build(&mut self) -> Result<IndexMeta> {
        tracing::info!(base_url = %self.crawl.base_url, root = %self.crawl.root, "building index");
        let output = crawl_site(&self.crawl).await?;
        self.commit(output)
    }

    /// Persist a finished crawl and make it the loaded index.
    pub fn commit(&mut self, output: CrawlOutput) -> Result<IndexMeta> {
        let index = output.into_index();
        let meta = save_index(&self.index_path, &index)?;
        self.index = Some(index);
        Ok(meta)
    }

    /// Load the index file. On failure the session has no index.
    pub fn load(&mut self) -> std::result::Result<&InvertedIndex, IndexError> {
        self.index = None;
        let index = load_index(&self.index_path)?;
        Ok(&*self.index.insert(index))
    }

    fn loaded(&self) -> Result<&InvertedIndex> {
        self.index.as_ref().ok_or_else(|| anyhow!("Please load or build the index first."))
    }

    pub fn print_term<W: Write>(&self, word: &str, out: &mut W) -> Result<()> {
        let index = self.loaded()?;
        let term = tokenize(word).concat();
        let Some(postings) = index.postings(&term) else {
            writeln!(out, "No entry found for '{term}'.")?;
            return Ok(());
        };
        writeln!(out, "Inverted index for '{term}':")?;
        let mut pages: Vec<_> = postings.iter().collect();
        pages.sort_by(|a, b| a.0.cmp(b.0));
        for (page, p) in pages {
            match p {
                Postings::Positions(positions) => writeln!(out, "  {page}: {positions:?}")?,
                Postings::Count(n) => writeln!(out, "  {page}: {n} occurrences")?,
            }
        }
        Ok(())
    }

    pub fn find<W: Write>(&self, query: &str, out: &mut W) -> Result<()> {
        let index = self.loaded()?;
        let hits = QueryEngine::new(index).query(query);
        if hits.is_empty() {
            writeln!(out, "No results.")?;
            return Ok(());
        }
        for (i, hit) in hits.iter().enumerate() {
            writeln!(out, "{:>3}. {hit}", i + 1)?;
        }
        writeln!(out, "{} results", hits.len())?;
        Ok(())
    }

    /// Run one line of the interactive command loop.
    ///
    /// Command errors are reported to `out`; only failures writing to `out`
    /// are returned.
    pub async fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> std::io::Result<Flow> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = parts.first() else {
            return Ok(Flow::Continue);
        };

        let result = match command.to_lowercase().as_str() {
            "exit" => return Ok(Flow::Exit),
            "build" => match self.build().await {
                Ok(meta) => writeln!(
                    out,
                    "Indexed {} pages ({} terms) into {}",
                    meta.num_pages,
                    meta.num_terms,
                    self.index_path.display()
                )
                .map_err(Into::into),
                Err(e) => writeln!(out, "Build failed: {e:#}").map_err(Into::into),
            },
            "load" => self.execute_load(out),
            "print" if parts.len() != 2 => writeln!(out, "Usage: print [word]").map_err(Into::into),
            "print" => self.print_term(parts[1], out),
            "find" if parts.len() < 2 => writeln!(out, "Usage: find [word or phrase]").map_err(Into::into),
            "find" => self.find(&parts[1..].join(" "), out),
            _ => writeln!(out, "Unknown command.").map_err(Into::into),
        };
        if let Err(e) = result {
            match e.downcast::<std::io::Error>() {
                Ok(io) => return Err(io),
                Err(e) => writeln!(out, "{e}")?,
            }
        }
        Ok(Flow::Continue)
    }

    fn execute_load<W: Write>(&mut self, out: &mut W) -> Result<()> {
        match self.load() {
            Ok(index) => {
                let (pages, terms) = (index.num_pages(), index.num_terms());
                write!(out, "Loaded index: {pages} pages, {terms} terms")?;
                if let Ok(Some(meta)) = load_meta(&self.index_path) {
                    write!(out, " (built {})", meta.created_at)?;
                }
                writeln!(out)?;
            }
            Err(IndexError::IndexNotFound(_)) => {
                writeln!(out, "Index file not found. Please run the 'build' command first.")?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load index");
                writeln!(out, "Failed to load index: {e}")?;
            }
        }
        Ok(())
    }
}
