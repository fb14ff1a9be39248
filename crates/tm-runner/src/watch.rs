//! Poll a Testrun until a condition holds
//!
//! The watcher fetches the resource at a fixed interval and hands each fresh
//! snapshot to a predicate. Fetch failures are absorbed so a flaky API server
//! cannot fail a test that runs for an hour; only the timeout ends the loop
//! in that case. A resource that no longer exists fails the watch at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{trace, warn};

use tm_common::crd::Testrun;
use tm_common::Error;

use crate::client::TestrunClient;
use crate::config::RunnerConfig;
use crate::error::WatchError;

/// Default polling interval for testrun watches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Polls Testruns through a shared client
#[derive(Clone)]
pub struct Watcher {
    client: Arc<dyn TestrunClient>,
    poll_interval: Duration,
}

impl Watcher {
    /// Create a watcher with a fixed poll interval
    pub fn new(client: Arc<dyn TestrunClient>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Create a watcher polling at the configured interval
    pub fn from_config(client: Arc<dyn TestrunClient>, config: &RunnerConfig) -> Self {
        Self::new(client, config.poll_interval)
    }

    /// The client used for polling
    pub fn client(&self) -> &dyn TestrunClient {
        self.client.as_ref()
    }

    /// Interval between two polls
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `namespace/name` until `predicate` returns `Ok(true)`
    ///
    /// Returns the snapshot that satisfied the predicate. A predicate error
    /// aborts immediately without further polls. When the budget runs out a
    /// [`WatchError::Timeout`] carrying the last fetched snapshot is returned,
    /// no earlier than `timeout` and no later than one poll interval after it.
    pub async fn watch_until<F>(
        &self,
        timeout: Duration,
        namespace: &str,
        name: &str,
        mut predicate: F,
    ) -> Result<Testrun, WatchError>
    where
        F: FnMut(&Testrun) -> Result<bool, Error>,
    {
        let start = Instant::now();
        let mut last: Option<Testrun> = None;

        loop {
            match self.client.get(namespace, name).await {
                Ok(testrun) => {
                    let done = predicate(&testrun).map_err(|source| WatchError::Predicate {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                        source,
                    })?;
                    if done {
                        return Ok(testrun);
                    }
                    trace!(testrun = %name, "condition not yet met");
                    last = Some(testrun);
                }
                Err(e) if e.is_not_found() => {
                    return Err(WatchError::Deleted {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                    });
                }
                Err(e) => {
                    warn!(testrun = %name, error = %e, "unable to fetch testrun, retrying");
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(WatchError::Timeout {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    timeout,
                    last: last.map(Box::new),
                });
            }

            // Never sleep past the deadline
            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::client::MockTestrunClient;
    use crate::testing::testrun_in_phase;
    use tm_common::crd::TestrunPhase;

    const POLL: Duration = Duration::from_secs(20);

    fn watcher(mock: MockTestrunClient) -> Watcher {
        Watcher::new(Arc::new(mock), POLL)
    }

    fn until_completed(tr: &Testrun) -> Result<bool, Error> {
        Ok(tr.phase().is_completed())
    }

    #[tokio::test(start_paused = true)]
    async fn never_terminal_times_out_within_one_interval_of_budget() {
        for timeout_secs in [60u64, 75, 1] {
            let timeout = Duration::from_secs(timeout_secs);
            let mut mock = MockTestrunClient::new();
            mock.expect_get()
                .returning(|_, name| Ok(testrun_in_phase(name, TestrunPhase::Running, "step 1")));

            let start = Instant::now();
            let err = watcher(mock)
                .watch_until(timeout, "default", "it-abc", until_completed)
                .await
                .unwrap_err();
            let elapsed = start.elapsed();

            assert!(err.is_timeout());
            assert!(elapsed >= timeout, "returned early after {elapsed:?}");
            assert!(elapsed <= timeout + POLL, "returned late after {elapsed:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_carries_last_snapshot() {
        let mut mock = MockTestrunClient::new();
        mock.expect_get()
            .returning(|_, name| Ok(testrun_in_phase(name, TestrunPhase::Running, "tests running")));

        let err = watcher(mock)
            .watch_until(Duration::from_secs(40), "default", "it-abc", until_completed)
            .await
            .unwrap_err();

        match err {
            WatchError::Timeout { last: Some(last), .. } => {
                assert_eq!(last.state(), "tests running");
            }
            other => panic!("expected timeout with snapshot, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_returns_exact_last_polled_status() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut mock = MockTestrunClient::new();
        mock.expect_get().times(3).returning(move |_, name| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Ok(testrun_in_phase(name, TestrunPhase::Running, "running"))
            } else {
                let mut tr = testrun_in_phase(name, TestrunPhase::Success, "finished");
                if let Some(status) = tr.status.as_mut() {
                    status.duration = Some(123);
                }
                Ok(tr)
            }
        });

        let tr = watcher(mock)
            .watch_until(Duration::from_secs(600), "default", "it-abc", until_completed)
            .await
            .unwrap();

        assert_eq!(tr.phase(), TestrunPhase::Success);
        assert_eq!(tr.state(), "finished");
        assert_eq!(tr.status.as_ref().and_then(|s| s.duration), Some(123));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_error_stops_after_first_poll() {
        let mut mock = MockTestrunClient::new();
        mock.expect_get()
            .times(1)
            .returning(|_, name| Ok(testrun_in_phase(name, TestrunPhase::Running, "")));

        let err = watcher(mock)
            .watch_until(Duration::from_secs(600), "default", "it-abc", |_| {
                Err(Error::validation("malformed status"))
            })
            .await
            .unwrap_err();

        match err {
            WatchError::Predicate { source, .. } => {
                assert!(source.to_string().contains("malformed status"));
            }
            other => panic!("expected predicate error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_fetch_errors_are_absorbed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut mock = MockTestrunClient::new();
        mock.expect_get().returning(move |_, name| {
            if counter.fetch_add(1, Ordering::SeqCst) < 3 {
                Err(Error::internal("connection reset"))
            } else {
                Ok(testrun_in_phase(name, TestrunPhase::Failed, "step failed"))
            }
        });

        let tr = watcher(mock)
            .watch_until(Duration::from_secs(600), "default", "it-abc", until_completed)
            .await
            .unwrap();

        assert_eq!(tr.phase(), TestrunPhase::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn only_fetch_errors_end_in_timeout_without_snapshot() {
        let mut mock = MockTestrunClient::new();
        mock.expect_get()
            .returning(|_, _| Err(Error::internal("connection refused")));

        let err = watcher(mock)
            .watch_until(Duration::from_secs(60), "default", "it-abc", until_completed)
            .await
            .unwrap_err();

        assert!(matches!(err, WatchError::Timeout { last: None, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn deleted_resource_fails_fast() {
        let mut mock = MockTestrunClient::new();
        mock.expect_get()
            .times(1)
            .returning(|_, name| Err(Error::not_found("Testrun", name)));

        let start = Instant::now();
        let err = watcher(mock)
            .watch_until(Duration::from_secs(600), "default", "it-abc", until_completed)
            .await
            .unwrap_err();

        assert!(matches!(err, WatchError::Deleted { .. }));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn poll_interval_comes_from_config() {
        let config = RunnerConfig {
            poll_interval: Duration::from_secs(7),
            ..Default::default()
        };
        let watcher = Watcher::from_config(Arc::new(MockTestrunClient::new()), &config);
        assert_eq!(watcher.poll_interval(), Duration::from_secs(7));
    }
}
