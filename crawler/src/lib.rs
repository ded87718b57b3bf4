pub mod config;
pub mod crawl;
pub mod extract;
pub mod fetch;

pub use config::CrawlConfig;
pub use crawl::{CrawlError, CrawlOutput, Crawler, Frontier};
pub use extract::{Extracted, Extractor, HtmlExtractor};
pub use fetch::{FetchError, HttpSource, PageSource};

/// Crawl the site described by `config` over HTTP.
pub async fn crawl_site(config: &CrawlConfig) -> Result<CrawlOutput, CrawlError> {
    let source = HttpSource::new(config).map_err(CrawlError::Client)?;
    Crawler::new(&config.base_url, source, HtmlExtractor::new())
        .with_max_pages(config.max_pages)
        .with_concurrency(config.concurrency)
        .run(&config.root)
        .await
}
