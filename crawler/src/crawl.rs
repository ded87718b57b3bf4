use crate::{Extracted, Extractor, FetchError, PageSource};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tiersearch_core::tokenizer::tokenize;
use tiersearch_core::{InvertedIndex, Page};
use tokio::task::{JoinError, JoinSet};

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("crawl worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// Same-site path for `href`, fragment removed. Only root-relative links
/// qualify; absolute and protocol-relative (`//host/...`) ones do not.
pub fn same_site_path(href: &str) -> Option<&str> {
    let path = href.split('#').next().unwrap_or_default();
    (path.starts_with('/') && !path.starts_with("//")).then_some(path)
}

/// Pending paths in FIFO order plus every path already handed out.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new(root: &str) -> Self {
        let mut frontier = Self::default();
        frontier.queued.insert(root.to_string());
        frontier.queue.push_back(root.to_string());
        frontier
    }

    /// Pop the next unvisited path and mark it visited.
    pub fn next_path(&mut self) -> Option<String> {
        while let Some(path) = self.queue.pop_front() {
            self.queued.remove(&path);
            if self.visited.insert(path.clone()) {
                return Some(path);
            }
        }
        None
    }

    /// Queue `href` if it is a same-site path not yet visited or queued.
    pub fn offer(&mut self, href: &str) -> bool {
        let Some(path) = same_site_path(href) else {
            return false;
        };
        if self.visited.contains(path) || self.queued.contains(path) {
            return false;
        }
        self.queued.insert(path.to_string());
        self.queue.push_back(path.to_string());
        true
    }

    pub fn visited(&self) -> usize { self.visited.len() }

    pub fn pending(&self) -> usize { self.queue.len() }
}

/// Token streams of every crawled page, keyed by full URL.
#[derive(Debug, Default)]
pub struct CrawlOutput {
    pub pages: HashMap<Page, Vec<String>>,
}

impl CrawlOutput {
    pub fn len(&self) -> usize { self.pages.len() }

    pub fn is_empty(&self) -> bool { self.pages.is_empty() }

    pub fn into_index(self) -> InvertedIndex {
        let mut index = InvertedIndex::new();
        for (page, tokens) in self.pages {
            index.add_page(&page, &tokens);
        }
        index
    }
}

type PageResult = (String, Result<(Vec<String>, Vec<String>), FetchError>);

/// Breadth-first crawler over one site.
///
/// The frontier is owned by the loop in [`Crawler::run`]; fetch tasks only
/// report back through the join set, so a path is handed out at most once no
/// matter how many fetches are in flight.
pub struct Crawler<S, E> {
    base_url: String,
    source: Arc<S>,
    extractor: Arc<E>,
    max_pages: Option<usize>,
    concurrency: usize,
}

impl<S: PageSource, E: Extractor> Crawler<S, E> {
    pub fn new(base_url: &str, source: S, extractor: E) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            source: Arc::new(source),
            extractor: Arc::new(extractor),
            max_pages: None,
            concurrency: 1,
        }
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Crawl everything reachable from `root`.
    ///
    /// The first failed fetch aborts the crawl: in-flight fetches are
    /// cancelled and nothing collected so far is returned.
    pub async fn run(&self, root: &str) -> Result<CrawlOutput, CrawlError> {
        let mut frontier = Frontier::new(root);
        let mut inflight: JoinSet<PageResult> = JoinSet::new();
        let mut pages: HashMap<Page, Vec<String>> = HashMap::new();
        let mut started = 0usize;

        loop {
            while inflight.len() < self.concurrency && self.max_pages.map_or(true, |max| started < max) {
                let Some(path) = frontier.next_path() else { break };
                started += 1;
                let url = self.url_for(&path);
                tracing::info!(%url, "crawling");

                let source = Arc::clone(&self.source);
                let extractor = Arc::clone(&self.extractor);
                inflight.spawn(async move {
                    let result = source.fetch(&url).await.map(|raw| {
                        let Extracted { text, hrefs } = extractor.extract(&raw);
                        (tokenize(&text), hrefs)
                    });
                    (url, result)
                });
            }

            let Some(joined) = inflight.join_next().await else { break };
            let (url, result) = joined?;
            let (tokens, hrefs) = result.map_err(|source| CrawlError::Fetch { url: url.clone(), source })?;
            for href in &hrefs {
                frontier.offer(href);
            }
            pages.insert(url, tokens);
            if pages.len() % 100 == 0 {
                tracing::info!(pages = pages.len(), pending = frontier.pending(), "progress");
            }
        }

        tracing::info!(pages = pages.len(), visited = frontier.visited(), pending = frontier.pending(), "crawl complete");
        Ok(CrawlOutput { pages })
    }
}
