//! archive.org search-and-resolve.
//!
//! One listing fetch, then for each item detail page up to three strategies,
//! cheapest first:
//! 1. an absolute `http(s)://...<.ext>` link on the page,
//! 2. a relative `/download/...<.ext>` link on the page,
//! 3. a HEAD probe of `/download/<id>/<id>.<ext>`.
//!
//! The first hit wins. Individual fetch failures only eliminate the current
//! item; the caller never sees an error, only `Resolution::NotFound`.

pub mod extract;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::{
    config::ArchiveConfig,
    domain::{MediaCandidate, Resolution},
    errors::Error,
    ports::{MediaResolver, PageFetcher},
    utils::bounded,
    Result,
};

use extract::{Extractor, QualifyingLink};

/// Outcome of inspecting one item.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Probe {
    Found(MediaCandidate),
    Miss,
}

pub struct ArchiveResolver {
    cfg: ArchiveConfig,
    root: String,
    search_base: Url,
    fetcher: Arc<dyn PageFetcher>,
    extract: Extractor,
}

impl ArchiveResolver {
    pub fn new(cfg: ArchiveConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let root = cfg.base_url.trim_end_matches('/').to_string();
        let search_base = Url::parse(&format!("{root}/search.php"))
            .map_err(|e| Error::Config(format!("invalid archive base url {root:?}: {e}")))?;
        let extract = Extractor::new(&cfg.extension)?;

        Ok(Self {
            cfg,
            root,
            search_base,
            fetcher,
            extract,
        })
    }

    /// Listing URL for `query`, restricted to the configured media type.
    ///
    /// Form-encoded, e.g. `search.php?query=Beethoven+Symphony+5+AND+mediatype%3Aaudio`.
    pub fn search_url(&self, query: &str) -> String {
        let mut url = self.search_base.clone();
        url.query_pairs_mut().append_pair(
            "query",
            &format!("{query} AND mediatype:{}", self.cfg.mediatype),
        );
        url.into()
    }

    async fn get_page(&self, url: &str) -> Result<String> {
        bounded(
            self.cfg.page_timeout,
            &format!("GET {url}"),
            self.fetcher.fetch_page(url),
        )
        .await
    }

    async fn probe_item(&self, detail_link: &str) -> Result<Probe> {
        let page = self
            .get_page(&format!("{}{detail_link}", self.root))
            .await?;

        match self.extract.qualifying_link(&page) {
            Some(QualifyingLink::Absolute(url)) => {
                return Ok(Probe::Found(MediaCandidate(url.to_string())));
            }
            Some(QualifyingLink::Relative(path)) => {
                return Ok(Probe::Found(MediaCandidate(format!("{}{path}", self.root))));
            }
            None => {}
        }

        let Some(id) = self.extract.item_id(detail_link) else {
            return Ok(Probe::Miss);
        };
        let candidate = format!("{}/download/{id}/{id}.{}", self.root, self.cfg.extension);
        let head = bounded(
            self.cfg.head_timeout,
            &format!("HEAD {candidate}"),
            self.fetcher.fetch_head(&candidate),
        )
        .await;

        match head {
            Ok(200) => Ok(Probe::Found(MediaCandidate(candidate))),
            Ok(status) => {
                debug!(%candidate, status, "download probe missed");
                Ok(Probe::Miss)
            }
            Err(e) => {
                debug!(%candidate, error = %e, "download probe failed");
                Ok(Probe::Miss)
            }
        }
    }
}

#[async_trait]
impl MediaResolver for ArchiveResolver {
    async fn resolve(&self, query: &str) -> Resolution {
        let listing_url = self.search_url(query);
        let listing = match self.get_page(&listing_url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(query, error = %e, "archive search failed");
                return Resolution::NotFound;
            }
        };

        let details = self.extract.detail_links(&listing);
        debug!(query, items = details.len(), "archive search listing");

        for link in details {
            match self.probe_item(link).await {
                Ok(Probe::Found(candidate)) => {
                    info!(query, item = link, url = candidate.as_str(), "resolved audio");
                    return Resolution::Found(candidate);
                }
                Ok(Probe::Miss) => {}
                Err(e) => debug!(item = link, error = %e, "skipping item"),
            }
        }

        info!(query, "no direct audio found");
        Resolution::NotFound
    }

    fn search_page_url(&self, query: &str) -> String {
        self.search_url(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    const ROOT: &str = "https://archive.example";

    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        heads: HashMap<String, u16>,
        slow: HashMap<String, Duration>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn head(mut self, url: &str, status: u16) -> Self {
            self.heads.insert(url.to_string(), status);
            self
        }

        fn slow(mut self, url: &str, delay: Duration) -> Self {
            self.slow.insert(url.to_string(), delay);
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_page(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(format!("GET {url}"));
            if let Some(delay) = self.slow.get(url) {
                tokio::time::sleep(*delay).await;
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Error::External(format!("404 {url}")))
        }

        async fn fetch_head(&self, url: &str) -> Result<u16> {
            self.requests.lock().unwrap().push(format!("HEAD {url}"));
            self.heads
                .get(url)
                .copied()
                .ok_or_else(|| Error::External(format!("connection reset {url}")))
        }
    }

    fn cfg() -> ArchiveConfig {
        ArchiveConfig {
            base_url: ROOT.to_string(),
            ..ArchiveConfig::default()
        }
    }

    fn resolver(fetcher: &Arc<FakeFetcher>) -> ArchiveResolver {
        ArchiveResolver::new(cfg(), fetcher.clone()).unwrap()
    }

    fn listing_url(query: &str) -> String {
        let fetcher = Arc::new(FakeFetcher::default());
        resolver(&fetcher).search_url(query)
    }

    fn listing(items: &[&str]) -> String {
        items
            .iter()
            .map(|id| format!(r#"<a href="/details/{id}">{id}</a>"#))
            .collect()
    }

    #[test]
    fn search_url_is_form_encoded_with_mediatype_filter() {
        assert_eq!(
            listing_url("Beethoven Symphony 5"),
            "https://archive.example/search.php?query=Beethoven+Symphony+5+AND+mediatype%3Aaudio"
        );
        assert!(listing_url("AC/DC & co").contains("query=AC%2FDC+%26+co+AND+mediatype%3Aaudio"));
        // Form encoding escapes `~`; the archive decodes it back the same way.
        assert!(listing_url("dj ~ remix").contains("query=dj+%7E+remix+AND+mediatype%3Aaudio"));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(FakeFetcher::default());
        let bad = ArchiveConfig {
            base_url: "not a url".to_string(),
            ..ArchiveConfig::default()
        };
        assert!(ArchiveResolver::new(bad, fetcher).is_err());
    }

    #[tokio::test]
    async fn absolute_link_beats_relative_link() {
        let q = "beethoven";
        let fetcher = Arc::new(
            FakeFetcher::default()
                .page(&listing_url(q), &listing(&["b5"]))
                .page(
                    &format!("{ROOT}/details/b5"),
                    r#"<a href="/download/b5/rel.mp3"></a><a href="https://cdn.example/b5/abs.mp3"></a>"#,
                ),
        );
        let out = resolver(&fetcher).resolve(q).await;
        assert_eq!(
            out,
            Resolution::Found(MediaCandidate("https://cdn.example/b5/abs.mp3".to_string()))
        );
    }

    #[tokio::test]
    async fn relative_link_is_qualified_with_root() {
        let q = "mozart";
        let fetcher = Arc::new(
            FakeFetcher::default()
                .page(&listing_url(q), &listing(&["m41"]))
                .page(
                    &format!("{ROOT}/details/m41"),
                    r#"<a href="/download/m41/Jupiter.mp3">mp3</a>"#,
                ),
        );
        let out = resolver(&fetcher).resolve(q).await;
        assert_eq!(
            out,
            Resolution::Found(MediaCandidate(format!("{ROOT}/download/m41/Jupiter.mp3")))
        );
    }

    #[tokio::test]
    async fn falls_back_to_probing_the_conventional_path() {
        let q = "bach";
        let probe = format!("{ROOT}/download/bwv1007/bwv1007.mp3");
        let fetcher = Arc::new(
            FakeFetcher::default()
                .page(&listing_url(q), &listing(&["bwv1007"]))
                .page(&format!("{ROOT}/details/bwv1007"), "<p>no links here</p>")
                .head(&probe, 200),
        );
        let out = resolver(&fetcher).resolve(q).await;
        assert_eq!(out, Resolution::Found(MediaCandidate(probe)));
    }

    #[tokio::test]
    async fn failed_probe_moves_on_to_next_item() {
        let q = "chopin";
        let fetcher = Arc::new(
            FakeFetcher::default()
                .page(&listing_url(q), &listing(&["a", "b", "c"]))
                .page(&format!("{ROOT}/details/a"), "nothing")
                .head(&format!("{ROOT}/download/a/a.mp3"), 404)
                // b: detail page fetch fails outright.
                .page(&format!("{ROOT}/details/c"), "nothing")
                .head(&format!("{ROOT}/download/c/c.mp3"), 200),
        );
        let out = resolver(&fetcher).resolve(q).await;
        assert_eq!(
            out,
            Resolution::Found(MediaCandidate(format!("{ROOT}/download/c/c.mp3")))
        );

        let reqs = fetcher.requests();
        assert!(reqs.contains(&format!("GET {ROOT}/details/b")));
        // b never got far enough to be probed.
        assert!(!reqs.contains(&format!("HEAD {ROOT}/download/b/b.mp3")));
    }

    #[tokio::test]
    async fn listing_failure_is_not_found_without_further_requests() {
        let fetcher = Arc::new(FakeFetcher::default());
        let out = resolver(&fetcher).resolve("anything").await;
        assert_eq!(out, Resolution::NotFound);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn exhausting_all_items_is_not_found() {
        let q = "silence";
        let fetcher = Arc::new(
            FakeFetcher::default()
                .page(&listing_url(q), &listing(&["x"]))
                .page(&format!("{ROOT}/details/x"), "nothing"),
        );
        assert_eq!(resolver(&fetcher).resolve(q).await, Resolution::NotFound);
        assert_eq!(resolver(&fetcher).resolve("nothing listed").await, Resolution::NotFound);
    }

    #[tokio::test]
    async fn duplicate_detail_links_are_visited_once() {
        let q = "dup";
        let fetcher = Arc::new(
            FakeFetcher::default()
                .page(&listing_url(q), &listing(&["d", "d", "d"]))
                .page(&format!("{ROOT}/details/d"), "nothing"),
        );
        assert_eq!(resolver(&fetcher).resolve(q).await, Resolution::NotFound);

        let detail_gets = fetcher
            .requests()
            .iter()
            .filter(|r| *r == &format!("GET {ROOT}/details/d"))
            .count();
        assert_eq!(detail_gets, 1);
    }

    #[tokio::test]
    async fn slow_page_counts_as_failure() {
        let q = "slow";
        let fetcher = Arc::new(
            FakeFetcher::default()
                .page(&listing_url(q), &listing(&["slow", "fast"]))
                .page(
                    &format!("{ROOT}/details/slow"),
                    r#"<a href="https://cdn.example/slow.mp3"></a>"#,
                )
                .slow(&format!("{ROOT}/details/slow"), Duration::from_secs(30))
                .page(
                    &format!("{ROOT}/details/fast"),
                    r#"<a href="https://cdn.example/fast.mp3"></a>"#,
                ),
        );
        let r = ArchiveResolver::new(
            ArchiveConfig {
                page_timeout: Duration::from_millis(50),
                ..cfg()
            },
            fetcher.clone(),
        )
        .unwrap();

        assert_eq!(
            r.resolve(q).await,
            Resolution::Found(MediaCandidate("https://cdn.example/fast.mp3".to_string()))
        );
    }

    #[tokio::test]
    async fn same_query_resolves_to_same_candidate() {
        let q = "repeat";
        let fetcher = Arc::new(
            FakeFetcher::default()
                .page(&listing_url(q), &listing(&["r1", "r2"]))
                .page(&format!("{ROOT}/details/r1"), r#"<a href="/download/r1/one.mp3"></a>"#)
                .page(&format!("{ROOT}/details/r2"), r#"<a href="/download/r2/two.mp3"></a>"#),
        );
        let r = resolver(&fetcher);
        let first = r.resolve(q).await;
        let second = r.resolve(q).await;
        assert_eq!(first, second);
        assert_eq!(
            first,
            Resolution::Found(MediaCandidate(format!("{ROOT}/download/r1/one.mp3")))
        );
    }
}
