/// Poll/retry state machine
use futures_util::future::BoxFuture;
use log::{debug, error, info, warn};
use std::future;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};

use super::backoff::retry_delay;
use super::handle::{Command, PollState, SchedulerHandle, Snapshot};
use super::sinks::Sinks;
use super::timer::Timer;
use crate::config::{Config, ExhaustedDisplay};
use crate::history::HistoryRing;
use crate::models::{ConnectionStatus, HistoryEntry, Reading};
use crate::nightscout::{Fetch, FetchError, FetchRequest};
use crate::trend;

const NOTIFICATION_TITLE: &str = "NightWatcher";

type FetchResult = Result<[Reading; 2], FetchError>;

enum Event {
    Command(Option<Command>),
    ConfigChanged(bool),
    Fetched(FetchResult),
    RetryDue,
    TickDue,
}

/// Drives periodic fetches, retries failures with exponential backoff and
/// keeps the reading history.
///
/// All state lives in this value and is only touched from [`Scheduler::run`],
/// so nothing here needs a lock. At most one fetch is in flight, and at most
/// one periodic and one retry timer are armed.
pub struct Scheduler<F> {
    fetcher: F,
    config: watch::Receiver<Config>,
    config_open: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshot: watch::Sender<Snapshot>,
    sinks: Sinks,
    history: HistoryRing,
    last_reading: Option<Reading>,
    status: ConnectionStatus,
    state: PollState,
    retry_count: u32,
    poll_interval: Duration,
    periodic: Timer,
    retry: Timer,
    in_flight: Option<BoxFuture<'static, FetchResult>>,
}

impl<F: Fetch> Scheduler<F> {
    pub fn new(fetcher: F, mut config: watch::Receiver<Config>, sinks: Sinks) -> (Self, SchedulerHandle) {
        let current = config.borrow_and_update().clone();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::initial(current.max_retries));

        let scheduler = Scheduler {
            fetcher,
            config,
            config_open: true,
            commands: command_rx,
            snapshot: snapshot_tx,
            sinks,
            history: HistoryRing::new(current.history_capacity),
            last_reading: None,
            status: ConnectionStatus::Unknown,
            state: PollState::Idle,
            retry_count: 0,
            poll_interval: current.poll_interval,
            periodic: Timer::new("periodic"),
            retry: Timer::new("retry"),
            in_flight: None,
        };

        (scheduler, SchedulerHandle::new(command_tx, snapshot_rx))
    }

    /// Fetch immediately, then keep polling until destroyed.
    ///
    /// Returns after [`SchedulerHandle::destroy`] or once every handle has
    /// been dropped.
    pub async fn run(mut self) {
        info!(
            "Starting glucose monitoring, polling every {}s and keeping {} readings",
            self.poll_interval.as_secs(),
            self.history.capacity()
        );
        self.start_fetch();
        self.publish();

        while self.state != PollState::Destroyed {
            // Commands and settings first, so a cancellation that lands on
            // a timer deadline still wins
            let event = tokio::select! {
                biased;
                command = self.commands.recv() => Event::Command(command),
                changed = self.config.changed(), if self.config_open => Event::ConfigChanged(changed.is_ok()),
                result = settle(&mut self.in_flight) => Event::Fetched(result),
                _ = self.retry.expired() => Event::RetryDue,
                _ = self.periodic.expired() => Event::TickDue,
            };
            self.handle(event);
            self.publish();
        }

        info!("Glucose monitoring stopped");
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Command(Some(Command::Refresh)) => self.refresh(),
            Event::Command(Some(Command::Recent(n, reply))) => {
                let _ = reply.send(self.history.recent(n));
            }
            Event::Command(Some(Command::Destroy)) => self.teardown(),
            Event::Command(None) => {
                debug!("All scheduler handles dropped");
                self.teardown();
            }
            Event::ConfigChanged(true) => self.reconfigure(),
            Event::ConfigChanged(false) => {
                debug!("Configuration provider closed");
                self.config_open = false;
            }
            Event::Fetched(Ok(pair)) => self.on_success(pair),
            Event::Fetched(Err(e)) => self.on_failure(e),
            Event::RetryDue => {
                debug!("Retry {} due", self.retry_count);
                self.start_fetch();
            }
            Event::TickDue => self.start_fetch(),
        }
    }

    fn start_fetch(&mut self) {
        if self.state == PollState::Destroyed {
            return;
        }
        if self.in_flight.is_some() {
            debug!("Fetch already in flight, skipping");
            return;
        }

        let request = FetchRequest::from(&*self.config.borrow());
        self.state = PollState::Fetching;
        self.in_flight = Some(self.fetcher.fetch(request));
    }

    fn on_success(&mut self, [current, previous]: [Reading; 2]) {
        let config = self.config.borrow().clone();
        let reading = trend::annotate(current, &previous);
        info!(
            "Glucose {} mg/dL {} (delta {})",
            reading.glucose_value,
            reading.trend.arrow(),
            reading.delta.unwrap_or_default()
        );

        self.retry.cancel();
        self.retry_count = 0;
        self.status = ConnectionStatus::Connected;
        self.sinks
            .display
            .on_connection_status(self.status, 0, config.max_retries);

        self.history
            .append(HistoryEntry::from_reading(&reading, OffsetDateTime::now_utc()));
        self.sinks.display.on_reading_updated(&reading);

        if config.alerts.enabled {
            if let Some(kind) = config.thresholds.classify(reading.glucose_value) {
                self.sinks
                    .alerts
                    .on_threshold_crossed(reading.glucose_value, kind);
            }
        }

        self.last_reading = Some(reading);
        self.arm_next_tick(config.poll_interval);
    }

    fn on_failure(&mut self, err: FetchError) {
        let config = self.config.borrow().clone();
        self.status = ConnectionStatus::Error;

        if !err.is_retryable() {
            error!("Cannot fetch glucose data: {}", err);
            self.retry.cancel();
            self.periodic.cancel();
            self.retry_count = 0;
            self.state = PollState::AwaitingConfig;
            self.sinks
                .display
                .on_connection_status(self.status, 0, config.max_retries);
            self.sinks.display.on_error(&err.to_string());
            return;
        }

        if self.retry_count < config.max_retries {
            self.retry_count += 1;
            let delay = retry_delay(config.retry_base_delay, self.retry_count);
            warn!(
                "Fetch failed: {}. Retry {}/{} in {}s",
                err,
                self.retry_count,
                config.max_retries,
                delay.as_secs()
            );
            self.sinks
                .display
                .on_connection_status(self.status, self.retry_count, config.max_retries);
            self.periodic.cancel();
            self.retry.arm(delay);
            self.state = PollState::RetryPending;
            return;
        }

        error!(
            "Fetch failed after {} retries: {}",
            config.max_retries, err
        );
        self.sinks
            .display
            .on_connection_status(self.status, self.retry_count, config.max_retries);
        match (config.exhausted_display, &self.last_reading) {
            (ExhaustedDisplay::ShowCached, Some(reading)) => {
                info!("Showing cached reading");
                self.sinks.display.on_reading_updated(reading);
            }
            _ => self
                .sinks
                .display
                .on_error(&format!("{} {}", err.label(), err)),
        }
        if config.notifications_enabled {
            let message = format!(
                "Connection failed after {} retries: {}",
                config.max_retries, err
            );
            self.sinks
                .notifier
                .on_connection_exhausted(NOTIFICATION_TITLE, &message);
        }

        self.retry_count = 0;
        self.arm_next_tick(config.poll_interval);
    }

    fn reconfigure(&mut self) {
        let config = self.config.borrow_and_update().clone();
        if self.state == PollState::Destroyed {
            return;
        }

        if self.state == PollState::AwaitingConfig {
            info!("Configuration changed, fetching again");
            self.start_fetch();
            return;
        }

        if config.poll_interval == self.poll_interval {
            return;
        }

        info!(
            "Polling interval changed from {}s to {}s",
            self.poll_interval.as_secs(),
            config.poll_interval.as_secs()
        );
        self.poll_interval = config.poll_interval;
        self.retry.cancel();
        self.periodic.cancel();
        self.retry_count = 0;

        // An in-flight fetch arms the next tick when it completes
        if self.in_flight.is_none() {
            self.arm_next_tick(config.poll_interval);
        }
    }

    fn refresh(&mut self) {
        if self.in_flight.is_some() {
            debug!("Refresh requested while fetching, ignoring");
            return;
        }
        info!("Manual refresh");
        self.retry.cancel();
        self.periodic.cancel();
        self.start_fetch();
    }

    fn arm_next_tick(&mut self, interval: Duration) {
        debug_assert!(!self.retry.is_armed(), "periodic tick armed during backoff");
        self.poll_interval = interval;
        self.periodic.arm(interval);
        self.state = PollState::Idle;
    }

    fn teardown(&mut self) {
        if self.state == PollState::Destroyed {
            return;
        }
        info!("Stopping glucose monitoring");

        self.periodic.cancel();
        self.retry.cancel();
        if self.in_flight.take().is_some() {
            debug!("Discarding in-flight fetch");
        }
        if !self.history.is_empty() {
            debug!("Dropping {} history entries", self.history.len());
        }
        self.history.clear();
        self.last_reading = None;
        self.state = PollState::Destroyed;
    }

    fn publish(&self) {
        let max_retries = self.config.borrow().max_retries;
        self.snapshot.send_replace(Snapshot {
            state: self.state,
            status: self.status,
            retry_count: self.retry_count,
            max_retries,
            last_reading: self.last_reading.clone(),
            stats: self.history.stats(),
        });
    }
}

/// Resolves with the in-flight fetch's result and clears it; pending forever
/// when nothing is in flight.
async fn settle(in_flight: &mut Option<BoxFuture<'static, FetchResult>>) -> FetchResult {
    let result = match in_flight.as_mut() {
        Some(fetch) => fetch.await,
        None => future::pending().await,
    };
    *in_flight = None;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThresholdKind;
    use crate::scheduler::sinks::{AlertSink, DisplaySink, NotificationSink};
    use crate::trend::Trend;
    use futures_util::future::{self as futures, FutureExt};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use time::macros::datetime;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;
    use tokio::time::{sleep, Instant};

    enum Outcome {
        Ready(FetchResult),
        Pending(oneshot::Receiver<FetchResult>),
    }

    /// Plays back scripted outcomes and records when each fetch started.
    /// Once the script runs out every fetch times out.
    #[derive(Clone, Default)]
    struct Scripted {
        outcomes: Arc<Mutex<VecDeque<Outcome>>>,
        calls: Arc<Mutex<Vec<Instant>>>,
    }

    impl Fetch for Scripted {
        fn fetch(&self, _request: FetchRequest) -> BoxFuture<'static, FetchResult> {
            self.calls.lock().unwrap().push(Instant::now());
            match self.outcomes.lock().unwrap().pop_front() {
                Some(Outcome::Ready(result)) => futures::ready(result).boxed(),
                Some(Outcome::Pending(rx)) => {
                    async move { rx.await.unwrap_or(Err(FetchError::Timeout)) }.boxed()
                }
                None => futures::ready(Err(FetchError::Timeout)).boxed(),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Reading(i32),
        Status(ConnectionStatus, u32),
        Error(String),
        Alert(i32, ThresholdKind),
        Exhausted,
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Seen>>>);

    impl Recorder {
        fn push(&self, seen: Seen) {
            self.0.lock().unwrap().push(seen);
        }
    }

    impl DisplaySink for Recorder {
        fn on_reading_updated(&mut self, reading: &Reading) {
            self.push(Seen::Reading(reading.glucose_value));
        }

        fn on_connection_status(&mut self, status: ConnectionStatus, retry_count: u32, _max: u32) {
            self.push(Seen::Status(status, retry_count));
        }

        fn on_error(&mut self, message: &str) {
            self.push(Seen::Error(message.to_string()));
        }
    }

    impl AlertSink for Recorder {
        fn on_threshold_crossed(&mut self, glucose_value: i32, kind: ThresholdKind) {
            self.push(Seen::Alert(glucose_value, kind));
        }
    }

    impl NotificationSink for Recorder {
        fn on_connection_exhausted(&mut self, _title: &str, _message: &str) {
            self.push(Seen::Exhausted);
        }
    }

    struct Harness {
        handle: SchedulerHandle,
        config: watch::Sender<Config>,
        fetcher: Scripted,
        recorder: Recorder,
        task: JoinHandle<()>,
        start: Instant,
    }

    impl Harness {
        fn start(config: Config, outcomes: Vec<Outcome>) -> Self {
            let fetcher = Scripted::default();
            fetcher.outcomes.lock().unwrap().extend(outcomes);
            let recorder = Recorder::default();
            let sinks = Sinks {
                display: Box::new(recorder.clone()),
                alerts: Box::new(recorder.clone()),
                notifier: Box::new(recorder.clone()),
            };
            let (config_tx, config_rx) = watch::channel(config);
            let (scheduler, handle) = Scheduler::new(fetcher.clone(), config_rx, sinks);
            let start = Instant::now();
            let task = tokio::spawn(scheduler.run());

            Harness {
                handle,
                config: config_tx,
                fetcher,
                recorder,
                task,
                start,
            }
        }

        /// Seconds after start at which each fetch began
        fn fetch_times(&self) -> Vec<u64> {
            self.fetcher
                .calls
                .lock()
                .unwrap()
                .iter()
                .map(|t| t.duration_since(self.start).as_secs())
                .collect()
        }

        fn seen(&self) -> Vec<Seen> {
            self.recorder.0.lock().unwrap().clone()
        }

        async fn join(&mut self) {
            (&mut self.task).await.unwrap();
        }

        async fn until(&self, secs: u64) {
            let target = self.start + Duration::from_secs(secs);
            tokio::time::sleep_until(target).await;
        }
    }

    fn pair(current: i32, previous: i32) -> FetchResult {
        let t = datetime!(2024-03-01 12:00 UTC);
        Ok([
            Reading::new(current, Some(t)),
            Reading::new(previous, Some(t - time::Duration::minutes(5))),
        ])
    }

    fn config(poll: u64, max_retries: u32, base: u64) -> Config {
        Config {
            poll_interval: Duration::from_secs(poll),
            max_retries,
            retry_base_delay: Duration::from_secs(base),
            ..Config::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_records_reading_and_polls_on_interval() {
        let h = Harness::start(
            config(60, 3, 10),
            vec![Outcome::Ready(pair(150, 140)), Outcome::Ready(pair(155, 150))],
        );

        h.until(1).await;
        let snapshot = h.handle.snapshot();
        assert_eq!(snapshot.state, PollState::Idle);
        assert_eq!(snapshot.status, ConnectionStatus::Connected);
        let reading = snapshot.last_reading.unwrap();
        assert_eq!(reading.delta, Some(10));
        assert_eq!(reading.trend, Trend::SingleUp);
        assert_eq!(snapshot.stats.count, 1);

        h.until(61).await;
        assert_eq!(h.fetch_times(), vec![0, 60]);
        assert_eq!(h.handle.snapshot().stats.count, 2);

        let recent: Vec<i32> = h
            .handle
            .recent(5)
            .await
            .iter()
            .map(|e| e.glucose_value)
            .collect();
        assert_eq!(recent, vec![155, 150]);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_back_off_exponentially_until_exhausted() {
        let h = Harness::start(config(300, 3, 10), vec![]);

        h.until(5).await;
        assert_eq!(h.handle.snapshot().state, PollState::RetryPending);
        assert_eq!(h.handle.snapshot().retry_count, 1);

        h.until(75).await;
        assert_eq!(h.fetch_times(), vec![0, 10, 30, 70]);
        let snapshot = h.handle.snapshot();
        assert_eq!(snapshot.state, PollState::Idle);
        assert_eq!(snapshot.status, ConnectionStatus::Error);
        assert_eq!(snapshot.retry_count, 0);

        let seen = h.seen();
        assert_eq!(seen.iter().filter(|s| **s == Seen::Exhausted).count(), 1);
        assert!(seen.contains(&Seen::Status(ConnectionStatus::Error, 3)));
        assert!(seen.iter().any(|s| matches!(s, Seen::Error(_))));

        // Next periodic tick starts a fresh cycle from the base delay
        h.until(385).await;
        assert_eq!(h.fetch_times(), vec![0, 10, 30, 70, 370, 380]);
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_backoff() {
        let h = Harness::start(
            config(60, 5, 10),
            vec![
                Outcome::Ready(Err(FetchError::HttpStatus(502))),
                Outcome::Ready(Err(FetchError::Timeout)),
                Outcome::Ready(pair(120, 118)),
            ],
        );

        h.until(101).await;
        assert_eq!(h.fetch_times(), vec![0, 10, 30, 90, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_cancels_pending_retry() {
        let h = Harness::start(config(60, 3, 10), vec![]);

        h.until(5).await;
        assert_eq!(h.handle.snapshot().state, PollState::RetryPending);
        h.config
            .send_modify(|c| c.poll_interval = Duration::from_secs(30));

        h.until(40).await;
        assert_eq!(h.fetch_times(), vec![0, 35]);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_at_retry_deadline_wins() {
        let h = Harness::start(config(60, 3, 10), vec![]);

        h.until(5).await;
        assert_eq!(h.handle.snapshot().state, PollState::RetryPending);

        // Queue the change, then jump straight onto the retry deadline so
        // both are ready when the scheduler next runs
        h.config
            .send_modify(|c| c.poll_interval = Duration::from_secs(30));
        tokio::time::advance(Duration::from_secs(5)).await;

        h.until(11).await;
        assert_eq!(h.fetch_times(), vec![0]);
        let snapshot = h.handle.snapshot();
        assert_eq!(snapshot.state, PollState::Idle);
        assert_eq!(snapshot.retry_count, 0);

        h.until(41).await;
        assert_eq!(h.fetch_times(), vec![0, 40]);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_interval_keeps_schedule() {
        let h = Harness::start(config(60, 3, 10), vec![]);

        h.until(5).await;
        h.config.send_modify(|c| c.notifications_enabled = false);

        h.until(11).await;
        assert_eq!(h.fetch_times(), vec![0, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_credentials_wait_for_new_settings() {
        let h = Harness::start(
            config(60, 3, 10),
            vec![
                Outcome::Ready(Err(FetchError::MissingCredentials)),
                Outcome::Ready(pair(110, 112)),
            ],
        );

        h.until(1000).await;
        assert_eq!(h.fetch_times(), vec![0]);
        assert_eq!(h.handle.snapshot().state, PollState::AwaitingConfig);
        assert!(h.seen().contains(&Seen::Error(
            FetchError::MissingCredentials.to_string()
        )));

        h.config.send_modify(|c| c.credential = "reader-abc".to_string());
        h.until(1001).await;
        assert_eq!(h.fetch_times(), vec![0, 1000]);
        assert_eq!(h.handle.snapshot().status, ConnectionStatus::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_cycle_shows_cached_reading() {
        let h = Harness::start(config(60, 1, 10), vec![Outcome::Ready(pair(150, 140))]);

        h.until(75).await;
        assert_eq!(h.fetch_times(), vec![0, 60, 70]);
        let seen = h.seen();
        assert_eq!(
            seen.iter().filter(|s| **s == Seen::Reading(150)).count(),
            2
        );
        assert!(!seen.iter().any(|s| matches!(s, Seen::Error(_))));
        assert!(h.handle.snapshot().last_reading.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_cycle_can_show_error_instead() {
        let mut cfg = config(60, 1, 10);
        cfg.exhausted_display = ExhaustedDisplay::ShowError;
        cfg.notifications_enabled = false;
        let h = Harness::start(cfg, vec![Outcome::Ready(pair(150, 140))]);

        h.until(75).await;
        let seen = h.seen();
        assert_eq!(seen.iter().filter(|s| **s == Seen::Reading(150)).count(), 1);
        assert!(seen.iter().any(|s| matches!(s, Seen::Error(_))));
        assert!(!seen.contains(&Seen::Exhausted));
    }

    #[tokio::test(start_paused = true)]
    async fn alerts_only_when_enabled() {
        let mut cfg = config(60, 3, 10);
        cfg.alerts.enabled = true;
        let h = Harness::start(
            cfg,
            vec![Outcome::Ready(pair(260, 250)), Outcome::Ready(pair(120, 130))],
        );
        h.until(61).await;
        assert_eq!(
            h.seen()
                .into_iter()
                .filter(|s| matches!(s, Seen::Alert(..)))
                .collect::<Vec<_>>(),
            vec![Seen::Alert(260, ThresholdKind::UrgentHigh)]
        );

        let quiet = Harness::start(config(60, 3, 10), vec![Outcome::Ready(pair(40, 45))]);
        sleep(Duration::from_secs(1)).await;
        assert!(!quiet.seen().iter().any(|s| matches!(s, Seen::Alert(..))));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_fetches_now_and_reschedules() {
        let h = Harness::start(
            config(60, 3, 10),
            vec![Outcome::Ready(pair(150, 140)), Outcome::Ready(pair(152, 150))],
        );

        h.until(10).await;
        h.handle.refresh();
        h.until(71).await;
        assert_eq!(h.fetch_times(), vec![0, 10, 70]);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_during_fetch_does_not_start_another() {
        let (tx, rx) = oneshot::channel();
        let h = Harness::start(config(60, 3, 10), vec![Outcome::Pending(rx)]);

        h.until(1).await;
        assert_eq!(h.handle.snapshot().state, PollState::Fetching);
        h.handle.refresh();
        h.handle.refresh();
        h.until(2).await;
        assert_eq!(h.fetch_times(), vec![0]);

        tx.send(pair(100, 100)).unwrap();
        h.until(3).await;
        assert_eq!(h.handle.snapshot().status, ConnectionStatus::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_is_idempotent_and_stops_polling() {
        let mut h = Harness::start(config(60, 3, 10), vec![Outcome::Ready(pair(150, 140))]);

        h.until(1).await;
        h.handle.destroy();
        h.handle.destroy();
        h.join().await;

        assert!(h.handle.is_destroyed());
        let snapshot = h.handle.snapshot();
        assert_eq!(snapshot.stats.count, 0);
        assert!(snapshot.last_reading.is_none());

        h.handle.destroy();
        h.handle.refresh();
        assert!(h.handle.recent(10).await.is_empty());

        sleep(Duration::from_secs(600)).await;
        assert_eq!(h.fetch_times(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_discards_in_flight_result() {
        let (tx, rx) = oneshot::channel();
        let mut h = Harness::start(config(60, 3, 10), vec![Outcome::Pending(rx)]);

        h.until(1).await;
        h.handle.destroy();
        h.join().await;

        // Receiver is gone along with the discarded fetch
        assert!(tx.send(pair(150, 140)).is_err());
        assert!(!h.seen().iter().any(|s| matches!(s, Seen::Reading(_))));
        assert_eq!(h.handle.snapshot().status, ConnectionStatus::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_handle_tears_down() {
        let h = Harness::start(config(60, 3, 10), vec![Outcome::Ready(pair(150, 140))]);
        let Harness { handle, task, .. } = h;

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn schedulers_are_independent() {
        let mut a = Harness::start(config(60, 3, 10), vec![Outcome::Ready(pair(150, 140))]);
        let b = Harness::start(config(60, 3, 10), vec![Outcome::Ready(pair(90, 95))]);

        a.until(1).await;
        a.handle.destroy();
        a.join().await;

        b.until(61).await;
        assert_eq!(b.fetch_times(), vec![0, 60]);
        assert!(!b.handle.is_destroyed());
    }
}
