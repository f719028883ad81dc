//! HTTP adapter for archive scraping.
//!
//! Implements the `ccbot-core` `PageFetcher` port over `reqwest`.

use async_trait::async_trait;

use ccbot_core::{config::ArchiveConfig, errors::Error, ports::PageFetcher, Result};

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    http: reqwest::Client,
    cfg: ArchiveConfig,
}

impl HttpFetcher {
    pub fn new(cfg: ArchiveConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.page_timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self { http, cfg })
    }

    fn map_err(url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(format!("request to {url}"))
        } else {
            Error::External(format!("http error for {url}: {e}"))
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Self::map_err(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::External(format!("GET {url} returned {status}")));
        }

        // Pages are decoded lossily; a broken byte must not lose the whole page.
        let bytes = resp.bytes().await.map_err(|e| Self::map_err(url, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn fetch_head(&self, url: &str) -> Result<u16> {
        let resp = self
            .http
            .head(url)
            .timeout(self.cfg.head_timeout)
            .send()
            .await
            .map_err(|e| Self::map_err(url, e))?;
        tracing::debug!(url, status = resp.status().as_u16(), "HEAD");
        Ok(resp.status().as_u16())
    }
}
