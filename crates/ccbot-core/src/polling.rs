use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
    config::PollConfig,
    domain::UpdateId,
    ports::{UpdateHandler, UpdateSource},
    utils::bounded,
};

/// Result of one poll round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The fetch succeeded and this many updates were handed out (or skipped).
    Batch(usize),
    /// The fetch failed, timed out or came back not-ok; the cursor is unchanged.
    FetchFailed,
}

impl PollOutcome {
    /// Pause before the next poll.
    pub fn delay(self, cfg: &PollConfig) -> std::time::Duration {
        match self {
            PollOutcome::Batch(_) => cfg.batch_delay,
            PollOutcome::FetchFailed => cfg.retry_delay,
        }
    }
}

/// Long-polling loop feeding updates to a handler strictly one at a time.
///
/// The cursor is advanced to the running maximum of seen update ids *before*
/// an update is handled, so a failure while handling drops that update
/// instead of re-delivering it on the next poll.
pub struct UpdateLoop<H> {
    source: Arc<dyn UpdateSource>,
    handler: H,
    cfg: PollConfig,
    cursor: Option<UpdateId>,
}

impl<H: UpdateHandler> UpdateLoop<H> {
    pub fn new(source: Arc<dyn UpdateSource>, handler: H, cfg: PollConfig) -> Self {
        Self {
            source,
            handler,
            cfg,
            cursor: None,
        }
    }

    /// Highest update id seen so far.
    pub fn cursor(&self) -> Option<UpdateId> {
        self.cursor
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Offset for the next fetch: everything after the cursor.
    fn offset(&self) -> Option<UpdateId> {
        self.cursor.map(UpdateId::next)
    }

    fn advance(&mut self, id: UpdateId) {
        self.cursor = Some(self.cursor.map_or(id, |c| c.max(id)));
    }

    /// Fetch one batch and handle every update in it, in arrival order.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let offset = self.offset();
        let fetched = bounded(
            self.cfg.request_timeout(),
            "getUpdates",
            self.source.fetch_updates(offset, self.cfg.wait),
        )
        .await;

        let updates = match fetched {
            Ok(updates) => updates,
            Err(e) => {
                warn!(offset = offset.map(|o| o.0), error = %e, "poll failed");
                return PollOutcome::FetchFailed;
            }
        };

        let count = updates.len();
        for update in updates {
            self.advance(update.id);

            let Some(msg) = update.message else {
                debug!(update_id = update.id.0, "skipping update without a message");
                continue;
            };
            let chat_id = msg.chat_id.0;
            if let Err(e) = self.handler.handle(msg).await {
                error!(update_id = update.id.0, chat_id, error = %e, "update handling failed");
            }
        }
        PollOutcome::Batch(count)
    }

    /// Poll forever. Only process termination stops this loop.
    pub async fn run(mut self) {
        info!(wait_secs = self.cfg.wait.as_secs(), "polling for updates");
        loop {
            let outcome = self.poll_once().await;
            sleep(outcome.delay(&self.cfg)).await;
        }
    }
}
