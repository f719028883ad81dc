use std::time::Duration;

use async_trait::async_trait;

use crate::{
    domain::{InboundMessage, Resolution, Update, UpdateId},
    Result,
};

/// Hexagonal port for pulling updates from the messaging platform.
///
/// `offset` is the first update id the caller still wants (`None` on the very
/// first poll). `wait` is the server-side long-poll timeout. A response the
/// platform marks as not-ok must surface as `Err`.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch_updates(&self, offset: Option<UpdateId>, wait: Duration) -> Result<Vec<Update>>;
}

/// Consumer of inbound messages, driven by the update loop one at a time.
#[async_trait]
pub trait UpdateHandler: Send {
    async fn handle(&mut self, msg: InboundMessage) -> Result<()>;
}

/// Raw page transport used by the archive resolver.
///
/// Implementations must fail explicitly (not return an empty body) on network
/// errors and on non-success HTTP statuses.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;

    /// Header-only request; returns the final status code.
    async fn fetch_head(&self, url: &str) -> Result<u16>;
}

/// Turns a free-text query into a playable media URL.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Resolution;

    /// Human-facing search page for `query`, offered when nothing was resolved.
    fn search_page_url(&self, query: &str) -> String;
}
