use std::{future::Future, time::Duration};

use crate::{errors::Error, Result};

// ============== Timeouts ==============

/// Run `fut` with a hard deadline; an elapsed deadline becomes `Error::Timeout`
/// so callers handle it exactly like any other failed call.
pub async fn bounded<T>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(Error::Timeout(format!("{what} after {}ms", limit.as_millis()))),
    }
}

// ============== Log Helpers ==============

/// Shorten user-provided text before it goes into a log line.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().nth(max_chars).is_some() {
        out.push_str("...");
    }
    out
}
