use std::sync::Arc;

use ccbot_core::{archive::ArchiveResolver, config::Config, ports::PageFetcher};
use ccbot_http::HttpFetcher;

mod liveness;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ccbot_core::logging::init("ccbot")?;

    let cfg = Arc::new(Config::load()?);

    // Binding is the only startup step allowed to kill the process.
    let listener = liveness::bind(cfg.port).await?;
    tokio::spawn(async move {
        if let Err(e) = liveness::serve(listener).await {
            tracing::error!(error = %e, "liveness server stopped");
        }
    });

    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(cfg.archive.clone())?);
    let resolver = Arc::new(ArchiveResolver::new(cfg.archive.clone(), fetcher)?);

    ccbot_telegram::router::run_polling(cfg, resolver)
        .await
        .map_err(|e| anyhow::anyhow!("telegram bot failed: {e}"))?;

    Ok(())
}
