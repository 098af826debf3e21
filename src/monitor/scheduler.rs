// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll scheduling: fetch, diff, report, reschedule.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::{Error, Result};
use crate::protocol::LightFetcher;
use crate::report::{ChangeReport, ChangeReporter};
use crate::state::{LightState, Snapshot};
use crate::types::LightId;

use super::config::{FetchFailurePolicy, MonitorConfig};
use super::session::{MonitorEvent, MonitorOutcome, MonitorSession, SessionId, StopReason};

/// Polls a bridge for light changes until the lights go quiet.
///
/// Each poll fetches every tracked light concurrently, reports the fields
/// that changed since the previous poll, and decides whether to poll again.
/// Monitoring stops once no change has been seen for the configured quiet
/// timeout; any detected change pushes that deadline back.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use huewatch::monitor::{Monitor, MonitorConfig};
/// use huewatch::protocol::BridgeConfig;
/// use huewatch::report::{ChangeReporter, StdoutSink};
///
/// # async fn example() -> huewatch::Result<()> {
/// let client = BridgeConfig::new("localhost:80")
///     .with_username("d9f8c1")
///     .into_client()?;
///
/// let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(60));
/// let monitor = Monitor::new(client, config).with_reporter(ChangeReporter::new(StdoutSink));
///
/// let initial = monitor.discover().await?;
/// let session = monitor.monitor(initial);
/// let outcome = session.wait().await?;
/// println!("stopped after {} polls: {}", outcome.cycles, outcome.reason);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Monitor<F> {
    fetcher: Arc<F>,
    reporter: ChangeReporter,
    config: MonitorConfig,
}

impl<F: LightFetcher + 'static> Monitor<F> {
    /// Creates a monitor polling `fetcher`.
    ///
    /// Reports go to the default [`ChangeReporter`] until
    /// [`with_reporter`](Self::with_reporter) is called.
    #[must_use]
    pub fn new(fetcher: F, config: MonitorConfig) -> Self {
        Self::from_shared(Arc::new(fetcher), config)
    }

    /// Creates a monitor polling a shared fetcher.
    #[must_use]
    pub fn from_shared(fetcher: Arc<F>, config: MonitorConfig) -> Self {
        Self {
            fetcher,
            reporter: ChangeReporter::default(),
            config,
        }
    }

    /// Sets the reporter used for change reports and snapshot dumps.
    #[must_use]
    pub fn with_reporter(mut self, reporter: ChangeReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Returns the reporter.
    #[must_use]
    pub fn reporter(&self) -> &ChangeReporter {
        &self.reporter
    }

    /// Fetches every light on the bridge into an initial snapshot.
    ///
    /// Lights whose state cannot be fetched are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns error if the list of lights cannot be fetched.
    pub async fn discover(&self) -> Result<Snapshot> {
        let ids = self.fetcher.fetch_ids().await?;
        tracing::debug!(lights = ids.len(), "Discovered lights");

        let mut snapshot = Snapshot::with_capacity(ids.len());
        for (id, result) in fetch_all(&self.fetcher, ids).await {
            match result {
                Ok(state) => {
                    snapshot.insert(id, state);
                }
                Err(e) => {
                    tracing::warn!(light_id = %id, error = %e, "Failed to fetch light, skipping");
                }
            }
        }

        Ok(snapshot)
    }

    /// Discovers the lights, dumps them to the reporter and starts
    /// monitoring them.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if discovery or the initial dump fails.
    pub async fn start(&self) -> Result<MonitorSession> {
        let snapshot = self.discover().await?;
        self.reporter.report_all(&snapshot)?;
        Ok(self.monitor(snapshot))
    }

    /// Starts monitoring the lights of `initial`.
    ///
    /// The first poll starts immediately. The set of lights tracked is the
    /// set in `initial`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn monitor(&self, initial: Snapshot) -> MonitorSession {
        let session_id = SessionId::new();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (events, _) = broadcast::channel(self.config.event_capacity());

        let task = SessionTask {
            session_id,
            fetcher: Arc::clone(&self.fetcher),
            reporter: self.reporter.clone(),
            config: self.config.clone(),
            events: events.clone(),
        };
        let span = tracing::info_span!("monitor", session_id = %session_id);
        let handle = tokio::spawn(task.run(initial, stop_rx).instrument(span));

        MonitorSession::new(session_id, stop_tx, events, handle)
    }
}

/// State owned by one running session.
struct SessionTask<F> {
    session_id: SessionId,
    fetcher: Arc<F>,
    reporter: ChangeReporter,
    config: MonitorConfig,
    events: broadcast::Sender<MonitorEvent>,
}

impl<F: LightFetcher + 'static> SessionTask<F> {
    async fn run(self, mut snapshot: Snapshot, mut stop_rx: watch::Receiver<bool>) -> MonitorOutcome {
        let quiet_timeout = self.config.quiet_timeout();
        let mut deadline = Instant::now() + quiet_timeout;
        let mut cycles = 0;

        tracing::info!(
            lights = snapshot.len(),
            poll_interval_secs = self.config.poll_interval().as_secs_f64(),
            quiet_timeout_secs = quiet_timeout.as_secs_f64(),
            "Monitoring started"
        );

        let reason = loop {
            cycles += 1;

            let report = match self.poll(&snapshot).await {
                Ok((next, report)) => {
                    snapshot = next;
                    report
                }
                Err(e) => {
                    tracing::error!(cycle = cycles, error = %e, "Poll failed, stopping");
                    break StopReason::Failed(e.to_string());
                }
            };

            let now = Instant::now();
            if report.changed {
                deadline = now + quiet_timeout;
            }
            self.publish(MonitorEvent::CycleCompleted {
                session_id: self.session_id,
                cycle: cycles,
                changed: report.changed,
            });

            if now >= deadline {
                tracing::info!(
                    "Stopping; no changes detected in {} seconds",
                    quiet_timeout.as_secs_f64()
                );
                break StopReason::Quiet;
            }

            // Resolves only on an actual stop request, not when the handle is dropped
            let stop_requested = async { stop_rx.wait_for(|stop| *stop).await.is_ok() };
            tokio::select! {
                () = tokio::time::sleep(self.config.poll_interval()) => {}
                true = stop_requested => {
                    tracing::info!(cycle = cycles, "Stop requested");
                    break StopReason::Cancelled;
                }
            }
        };

        self.publish(MonitorEvent::Stopped {
            session_id: self.session_id,
            reason: reason.clone(),
        });

        MonitorOutcome {
            session_id: self.session_id,
            cycles,
            reason,
            snapshot,
        }
    }

    /// Runs one poll against `prev` and returns the new snapshot.
    async fn poll(&self, prev: &Snapshot) -> Result<(Snapshot, ChangeReport)> {
        let ids: Vec<LightId> = prev.ids().cloned().collect();
        let mut next = Snapshot::with_capacity(ids.len());
        let mut dropped = Vec::new();

        for (id, result) in fetch_all(&self.fetcher, ids).await {
            match result {
                Ok(state) => {
                    next.insert(id, state);
                }
                Err(e) => match self.config.failure_policy() {
                    FetchFailurePolicy::RetainLastKnown => {
                        tracing::warn!(light_id = %id, error = %e, "Failed to fetch light, keeping last known state");
                        if let Some(last) = prev.get(&id) {
                            next.insert(id, last.clone());
                        }
                    }
                    FetchFailurePolicy::DropLight => {
                        tracing::warn!(light_id = %id, error = %e, "Failed to fetch light, no longer tracking it");
                        dropped.push(id);
                    }
                },
            }
        }

        if dropped.is_empty() {
            let report = self.reporter.report_changes(prev, &next)?;
            return Ok((next, report));
        }

        let mut baseline = prev.clone();
        for id in dropped {
            baseline.remove(&id);
            self.publish(MonitorEvent::LightDropped {
                session_id: self.session_id,
                light_id: id,
            });
        }
        let report = self.reporter.report_changes(&baseline, &next)?;
        Ok((next, report))
    }

    fn publish(&self, event: MonitorEvent) {
        // Ignore errors (no subscribers)
        let _ = self.events.send(event);
    }
}

/// Fetches every light in `ids` concurrently, one task per light.
///
/// Results come back in the order of `ids`. A task that panics yields an
/// error for its light without affecting the others.
async fn fetch_all<F: LightFetcher + 'static>(
    fetcher: &Arc<F>,
    ids: Vec<LightId>,
) -> Vec<(LightId, Result<LightState>)> {
    let mut tasks = JoinSet::new();
    let mut task_index = HashMap::with_capacity(ids.len());
    for (index, id) in ids.iter().cloned().enumerate() {
        let fetcher = Arc::clone(fetcher);
        let handle = tasks.spawn(async move {
            let result = fetcher.fetch_state(&id).await;
            (index, result)
        });
        task_index.insert(handle.id(), index);
    }

    let mut results: Vec<Option<Result<LightState>>> = ids.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => {
                let Some(&index) = task_index.get(&e.id()) else {
                    tracing::warn!(error = %e, "Unknown light fetch task failed");
                    continue;
                };
                let id = ids[index].clone();
                tracing::warn!(light_id = %id, error = %e, "Light fetch task failed");
                results[index] = Some(Err(Error::TaskFailed(e.to_string()).for_light(id)));
            }
        }
    }

    ids.into_iter()
        .zip(results)
        .map(|(id, result)| {
            let result = result.unwrap_or_else(|| {
                Err(Error::TaskFailed("no result".to_string()).for_light(id.clone()))
            });
            (id, result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::ProtocolError;
    use crate::report::{CHANGES_BANNER, MemorySink};
    use crate::types::Brightness;

    type Behavior = dyn Fn(&LightId, usize) -> Result<LightState> + Send + Sync;

    /// Answers each fetch from a closure given the light and how many times
    /// that light was fetched before.
    struct ScriptedFetcher {
        ids: Vec<LightId>,
        calls: Mutex<HashMap<LightId, usize>>,
        delay: Duration,
        behavior: Box<Behavior>,
    }

    impl ScriptedFetcher {
        fn new(
            ids: &[&str],
            behavior: impl Fn(&LightId, usize) -> Result<LightState> + Send + Sync + 'static,
        ) -> Self {
            Self {
                ids: ids.iter().map(|id| LightId::from(*id)).collect(),
                calls: Mutex::new(HashMap::new()),
                delay: Duration::ZERO,
                behavior: Box::new(behavior),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self, id: &str) -> usize {
            self.calls
                .lock()
                .get(&LightId::from(id))
                .copied()
                .unwrap_or(0)
        }
    }

    impl LightFetcher for ScriptedFetcher {
        async fn fetch_ids(&self) -> Result<Vec<LightId>> {
            Ok(self.ids.clone())
        }

        async fn fetch_state(&self, id: &LightId) -> Result<LightState> {
            let call = {
                let mut calls = self.calls.lock();
                let count = calls.entry(id.clone()).or_insert(0);
                *count += 1;
                *count - 1
            };
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.behavior)(id, call)
        }
    }

    fn lamp(id: &LightId, on: bool) -> LightState {
        LightState::new(id.clone(), format!("Lamp {id}"), on, Brightness::MIN)
    }

    fn initial(ids: &[&str]) -> Snapshot {
        ids.iter()
            .map(|id| lamp(&LightId::from(*id), false))
            .collect()
    }

    fn unreachable(id: &LightId) -> Error {
        Error::from(ProtocolError::EmptyResponse).for_light(id.clone())
    }

    fn harness(
        fetcher: ScriptedFetcher,
        config: MonitorConfig,
    ) -> (Monitor<ScriptedFetcher>, Arc<ScriptedFetcher>, MemorySink) {
        let fetcher = Arc::new(fetcher);
        let sink = MemorySink::new();
        let monitor = Monitor::from_shared(Arc::clone(&fetcher), config)
            .with_reporter(ChangeReporter::new(sink.clone()));
        (monitor, fetcher, sink)
    }

    fn drain(rx: &mut broadcast::Receiver<MonitorEvent>) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_lights_stop_after_quiet_timeout() {
        let fetcher = ScriptedFetcher::new(&["1", "2"], |id, _| Ok(lamp(id, false)));
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(60));
        let (monitor, fetcher, sink) = harness(fetcher, config);

        let start = Instant::now();
        let session = monitor.monitor(initial(&["1", "2"]));
        let mut events = session.subscribe();
        let outcome = session.wait().await.unwrap();

        assert_eq!(outcome.reason, StopReason::Quiet);
        assert_eq!(outcome.cycles, 31);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(fetcher.calls("1"), 31);
        assert!(sink.is_empty());

        let events = drain(&mut events);
        let stops = events
            .iter()
            .filter(|e| matches!(e, MonitorEvent::Stopped { .. }))
            .count();
        assert_eq!(stops, 1);
        assert!(matches!(events.last(), Some(MonitorEvent::Stopped { .. })));
        assert!(
            events
                .iter()
                .all(|e| !matches!(e, MonitorEvent::CycleCompleted { changed: true, .. }))
        );

        // no polls after the session ended
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fetcher.calls("1"), 31);
    }

    #[tokio::test(start_paused = true)]
    async fn change_pushes_deadline_back() {
        // light 1 switches on at its fourth fetch (t = 6s) and stays on
        let fetcher = ScriptedFetcher::new(&["1"], |id, call| Ok(lamp(id, call >= 3)));
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(10));
        let (monitor, _fetcher, sink) = harness(fetcher, config);

        let start = Instant::now();
        let outcome = monitor.monitor(initial(&["1"])).wait().await.unwrap();

        assert_eq!(outcome.reason, StopReason::Quiet);
        assert_eq!(start.elapsed(), Duration::from_secs(16));
        assert_eq!(outcome.cycles, 9);
        assert!(outcome.snapshot.get(&LightId::from("1")).unwrap().on);
        assert_eq!(
            sink.entries(),
            vec![
                CHANGES_BANNER.to_string(),
                "{\n  \"id\": \"1\",\n  \"on\": true\n}\n".to_string()
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_request_ends_session() {
        let fetcher = ScriptedFetcher::new(&["1"], |id, _| Ok(lamp(id, false)));
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(60));
        let (monitor, _fetcher, _sink) = harness(fetcher, config);

        let session = monitor.monitor(initial(&["1"]));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!session.is_finished());
        session.stop();

        let outcome = session.wait().await.unwrap();
        assert_eq!(outcome.reason, StopReason::Cancelled);
        assert_eq!(outcome.cycles, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_last_known_state() {
        let fetcher = ScriptedFetcher::new(&["1", "2"], |id, call| {
            if id.as_str() == "2" && call == 1 {
                return Err(unreachable(id));
            }
            Ok(lamp(id, false))
        });
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(4));
        let (monitor, fetcher, sink) = harness(fetcher, config);

        let outcome = monitor.monitor(initial(&["1", "2"])).wait().await.unwrap();

        assert_eq!(outcome.reason, StopReason::Quiet);
        assert_eq!(outcome.cycles, 3);
        assert_eq!(outcome.snapshot, initial(&["1", "2"]));
        assert_eq!(fetcher.calls("2"), 3);
        assert!(sink.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_fetch_is_isolated() {
        let fetcher = ScriptedFetcher::new(&["1", "2"], |id, call| {
            assert!(!(id.as_str() == "2" && call == 0), "bridge exploded");
            Ok(lamp(id, id.as_str() == "1"))
        });
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::ZERO);
        let (monitor, _fetcher, _sink) = harness(fetcher, config);

        let outcome = monitor.monitor(initial(&["1", "2"])).wait().await.unwrap();

        // light 1 changed, light 2 kept its last known state
        assert_eq!(outcome.cycles, 1);
        assert!(outcome.snapshot.get(&LightId::from("1")).unwrap().on);
        assert!(!outcome.snapshot.get(&LightId::from("2")).unwrap().on);
    }

    #[tokio::test]
    async fn panicked_fetch_is_reported_for_its_light() {
        let fetcher = Arc::new(ScriptedFetcher::new(&["1", "2", "3"], |id, _| {
            assert!(id.as_str() != "2", "bridge exploded");
            Ok(lamp(id, false))
        }));
        let ids = vec![LightId::from("1"), LightId::from("2"), LightId::from("3")];

        let results = fetch_all(&fetcher, ids).await;

        let order: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, ["1", "2", "3"]);
        assert!(results[0].1.is_ok());
        assert!(results[2].1.is_ok());

        let Err(Error::Fetch { id, source }) = &results[1].1 else {
            panic!("expected a fetch error for light 2");
        };
        assert_eq!(id.as_str(), "2");
        let Error::TaskFailed(message) = source.as_ref() else {
            panic!("expected a task failure");
        };
        assert!(message.contains("panic"), "{message}");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_drops_light_under_drop_policy() {
        let fetcher = ScriptedFetcher::new(&["1", "2"], |id, _| {
            if id.as_str() == "2" {
                return Err(unreachable(id));
            }
            Ok(lamp(id, false))
        });
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(4))
            .with_failure_policy(FetchFailurePolicy::DropLight);
        let (monitor, fetcher, _sink) = harness(fetcher, config);

        let session = monitor.monitor(initial(&["1", "2"]));
        let mut events = session.subscribe();
        let outcome = session.wait().await.unwrap();

        assert_eq!(outcome.reason, StopReason::Quiet);
        assert_eq!(outcome.snapshot, initial(&["1"]));
        assert_eq!(fetcher.calls("2"), 1);

        let dropped: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                MonitorEvent::LightDropped { light_id, .. } => Some(light_id),
                _ => None,
            })
            .collect();
        assert_eq!(dropped, vec![LightId::from("2")]);
    }

    #[tokio::test(start_paused = true)]
    async fn structural_error_fails_session() {
        // the bridge answers for light 1 with the state of light 7
        let fetcher = ScriptedFetcher::new(&["1"], |_, _| Ok(lamp(&LightId::from("7"), false)));
        let config = MonitorConfig::default();
        let (monitor, fetcher, sink) = harness(fetcher, config);

        let outcome = monitor.monitor(initial(&["1"])).wait().await.unwrap();

        assert!(matches!(outcome.reason, StopReason::Failed(_)));
        assert_eq!(outcome.cycles, 1);
        assert_eq!(outcome.snapshot, initial(&["1"]));
        assert_eq!(fetcher.calls("1"), 1);
        assert!(sink.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_run_concurrently() {
        let fetcher = ScriptedFetcher::new(&["1", "2", "3"], |id, _| Ok(lamp(id, false)))
            .with_delay(Duration::from_secs(1));
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::ZERO);
        let (monitor, _fetcher, _sink) = harness(fetcher, config);

        let start = Instant::now();
        let outcome = monitor.monitor(initial(&["1", "2", "3"])).wait().await.unwrap();

        assert_eq!(outcome.cycles, 1);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn discover_skips_failed_lights() {
        let fetcher = ScriptedFetcher::new(&["1", "2", "3"], |id, _| {
            if id.as_str() == "2" {
                return Err(unreachable(id));
            }
            Ok(lamp(id, true))
        });
        let (monitor, _fetcher, _sink) = harness(fetcher, MonitorConfig::default());

        let snapshot = monitor.discover().await.unwrap();
        let ids: Vec<&str> = snapshot.ids().map(LightId::as_str).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn start_dumps_lights_then_monitors() {
        let fetcher = ScriptedFetcher::new(&["1"], |id, _| Ok(lamp(id, true)));
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(2));
        let (monitor, fetcher, sink) = harness(fetcher, config);

        let session = monitor.start().await.unwrap();
        let dump = sink.take();
        assert_eq!(dump.len(), 1);
        assert!(dump[0].contains("\"name\": \"Lamp 1\""));

        let outcome = session.wait().await.unwrap();
        assert_eq!(outcome.reason, StopReason::Quiet);
        assert_eq!(outcome.cycles, 2);
        // one fetch for discovery, two for the polls
        assert_eq!(fetcher.calls("1"), 3);
        assert!(sink.is_empty());
    }
}
