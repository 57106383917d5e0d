//! Deadline wrapper for whole-batch operations.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use metrics::counter;

use crate::error::{FetchError, FetchResult};

/// Race `op` against `deadline`.
///
/// If `op` settles first its outcome is returned unchanged. Otherwise `op` is
/// dropped, `on_timeout` runs exactly once (a panic inside it is logged and
/// swallowed) and the call fails with [`FetchError::Timeout`]. No retries.
pub async fn run_with_timeout<T, F, C>(
    label: &str,
    deadline: Duration,
    op: F,
    on_timeout: C,
) -> FetchResult<T>
where
    F: Future<Output = FetchResult<T>>,
    C: FnOnce(),
{
    match tokio::time::timeout(deadline, op).await {
        Ok(outcome) => outcome,
        Err(_) => {
            let deadline_ms = deadline.as_millis() as u64;
            tracing::warn!(label, deadline_ms, "operation timed out");
            counter!("events_fetch_timeouts_total").increment(1);

            if catch_unwind(AssertUnwindSafe(on_timeout)).is_err() {
                tracing::error!(label, "timeout callback panicked");
            }
            Err(FetchError::Timeout {
                label: label.to_string(),
                deadline_ms,
            })
        }
    }
}
