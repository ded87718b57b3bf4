use clap::{Args, Command, FromArgMatches};

pub const DEFAULT_BASE_URL: &str = "https://quotes.toscrape.com";

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Site to crawl; only root-relative links on it are followed
    #[arg(long, env = "TIERSEARCH_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    /// Path the crawl starts from
    #[arg(long, default_value = "/")]
    pub root: String,
    /// Stop after this many pages (default: the whole reachable site)
    #[arg(long)]
    pub max_pages: Option<usize>,
    /// Number of fetches in flight
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    pub timeout_secs: u64,
    /// Pause before each request, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,
    /// User-Agent string sent with every request
    #[arg(long, default_value = "tiersearch-bot/0.1")]
    pub user_agent: String,
}

impl CrawlConfig {
    /// Defaults with environment overrides applied, as if parsed from an
    /// empty command line.
    pub fn from_env() -> clap::error::Result<Self> {
        let matches = Self::augment_args(Command::new("crawl")).try_get_matches_from(["crawl"])?;
        Self::from_arg_matches(&matches)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            root: "/".to_string(),
            max_pages: None,
            concurrency: 1,
            timeout_secs: 12,
            delay_ms: 0,
            user_agent: "tiersearch-bot/0.1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_reads_base_url_override() {
        std::env::remove_var("TIERSEARCH_BASE_URL");
        assert_eq!(CrawlConfig::from_env().unwrap(), CrawlConfig::default());

        std::env::set_var("TIERSEARCH_BASE_URL", "https://mirror.test");
        let config = CrawlConfig::from_env();
        std::env::remove_var("TIERSEARCH_BASE_URL");
        let config = config.unwrap();
        assert_eq!(config.base_url, "https://mirror.test");
        assert_eq!(config.root, "/");
        assert_eq!(config.max_pages, None);
    }
}
