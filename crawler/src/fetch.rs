use crate::CrawlConfig;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(StatusCode),
}

/// Where page content comes from.
pub trait PageSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

pub struct HttpSource {
    client: Client,
    delay: Duration,
}

impl HttpSource {
    pub fn new(config: &CrawlConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, delay: Duration::from_millis(config.delay_ms) })
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        let request = self.client.get(url);
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status(status));
            }
            Ok(resp.text().await?)
        }
    }
}
