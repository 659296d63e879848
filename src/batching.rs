//! The batching sink: a bounded in-memory queue drained by one background
//! task that ships batches to a [`LogSink`].
//!
//! `emit` only takes a short lock on the queue and returns. The background
//! task is the single consumer, so at most one flush runs at any time: timer
//! ticks that fall due during a flush are skipped and size triggers collapse
//! into a single pending wake-up.

use crate::config::SinkConfig;
use crate::error::DeliveryError;
use crate::queue::{BoundedQueue, OverflowPolicy, Push};
use crate::record::LogRecord;
use crate::selflog::{SelfLog, StderrSelfLog};
use crate::sink::LogSink;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};

/// Lifecycle of a [`BatchingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Idle,
    Flushing,
    ShuttingDown,
    /// Terminal.
    Stopped,
}

impl SinkState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SinkState::Idle,
            1 => SinkState::Flushing,
            2 => SinkState::ShuttingDown,
            _ => SinkState::Stopped,
        }
    }
}

/// Point-in-time copy of the sink's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Every record handed to `emit`.
    pub received: u64,
    /// Below the configured minimum level.
    pub rejected_level: u64,
    /// Arrived after shutdown began.
    pub rejected_after_shutdown: u64,
    /// Discarded because the queue was full.
    pub dropped_overflow: u64,
    /// Stored in the queue, including records that evicted an older one.
    pub enqueued: u64,
    pub delivered: u64,
    pub failed_batches: u64,
    /// Records lost to failed batches or an expired shutdown grace period.
    pub dropped_records: u64,
    pub ticks: u64,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    rejected_level: AtomicU64,
    rejected_after_shutdown: AtomicU64,
    dropped_overflow: AtomicU64,
    enqueued: AtomicU64,
    delivered: AtomicU64,
    failed_batches: AtomicU64,
    dropped_records: AtomicU64,
    ticks: AtomicU64,
}

fn bump(counter: &AtomicU64, n: u64) {
    counter.fetch_add(n, Ordering::Relaxed);
}

fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

struct Shared {
    config: SinkConfig,
    stream: String,
    queue: BoundedQueue<LogRecord>,
    state: AtomicU8,
    wake: Notify,
    in_flight: AtomicUsize,
    self_log: Arc<dyn SelfLog>,
    counters: Counters,
}

impl Shared {
    fn diag(&self, message: impl AsRef<str>) {
        self.self_log.write_line(message.as_ref());
    }

    fn transition(&self, from: SinkState, to: SinkState) {
        let _ = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire);
    }

    fn begin_shutdown(&self) {
        self.queue.close();
        if self.state() != SinkState::Stopped {
            self.state.store(SinkState::ShuttingDown as u8, Ordering::Release);
        }
    }

    fn state(&self) -> SinkState {
        SinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// ShuttingDown -> Stopped. Only the first caller wins.
    fn finish(&self) -> bool {
        self.state
            .compare_exchange(
                SinkState::ShuttingDown as u8,
                SinkState::Stopped as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Give up on the final flush: whatever is in flight or still queued is
    /// dropped.
    fn abandon(&self, grace: Duration) {
        if !self.finish() {
            return;
        }
        let in_flight = self.in_flight.swap(0, Ordering::AcqRel);
        let queued = self.queue.clear();
        bump(&self.counters.dropped_records, (in_flight + queued) as u64);
        self.diag(format!(
            "shutdown timed out after {grace:?}, abandoned batch of {in_flight} in-flight records and {queued} queued records"
        ));
        self.diag("sink stopped");
    }
}

enum Control {
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Explicitly constructed log-shipping sink.
///
/// Cloning is cheap and every clone feeds the same queue and worker. Hand a
/// clone to whatever produces records (e.g. [`crate::layer::BatchingLayer`])
/// and call [`BatchingSink::shutdown`] once when the process is done.
#[derive(Clone)]
pub struct BatchingSink {
    shared: Arc<Shared>,
    control: mpsc::UnboundedSender<Control>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl BatchingSink {
    /// Start a sink that reports its own health on stderr.
    ///
    /// Must be called from within a Tokio runtime: the worker task is
    /// spawned immediately.
    pub fn new(sink: Arc<dyn LogSink>, config: SinkConfig) -> Self {
        Self::with_self_log(sink, config, Arc::new(StderrSelfLog))
    }

    /// Start a sink with a caller-provided diagnostic channel.
    pub fn with_self_log(sink: Arc<dyn LogSink>, config: SinkConfig, self_log: Arc<dyn SelfLog>) -> Self {
        let config = config.normalized();
        let stream = config.stream_name_provider.stream_name();
        let queue = BoundedQueue::new(config.queue_size_limit, config.overflow_policy);

        let shared = Arc::new(Shared {
            config,
            stream,
            queue,
            state: AtomicU8::new(SinkState::Idle as u8),
            wake: Notify::new(),
            in_flight: AtomicUsize::new(0),
            self_log,
            counters: Counters::default(),
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            shared: Arc::clone(&shared),
            sink,
            control: rx,
        };
        let handle = tokio::spawn(worker.run());

        BatchingSink {
            shared,
            control: tx,
            worker: Arc::new(Mutex::new(Some(handle))),
        }
    }

    /// Queue one record for delivery. Never blocks and never fails.
    pub fn emit(&self, record: LogRecord) {
        let shared = &*self.shared;
        bump(&shared.counters.received, 1);

        if !shared.config.accepts(record.level) {
            bump(&shared.counters.rejected_level, 1);
            return;
        }

        let batch_size = shared.config.batch_size_limit;
        match shared.queue.push(record) {
            Push::Accepted(len) => {
                bump(&shared.counters.enqueued, 1);
                if len >= batch_size {
                    shared.wake.notify_one();
                }
            }
            Push::Overflowed(len) => {
                bump(&shared.counters.dropped_overflow, 1);
                let which = match shared.config.overflow_policy {
                    OverflowPolicy::DropNewest => "newest",
                    OverflowPolicy::DropOldest => {
                        // the incoming record took the evicted one's place
                        bump(&shared.counters.enqueued, 1);
                        "oldest"
                    }
                };
                shared.diag(format!(
                    "queue full ({} records), dropped {which} record",
                    shared.queue.capacity()
                ));
                if len >= batch_size {
                    shared.wake.notify_one();
                }
            }
            Push::Closed => {
                bump(&shared.counters.rejected_after_shutdown, 1);
                shared.diag("record rejected after shutdown");
            }
        }
    }

    /// Ship everything queued so far and wait for it.
    ///
    /// Runs on the worker like any other flush. Call it at the end of a
    /// function invocation; a frozen process never gets its timer ticks.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.control.send(Control::Flush(tx)).is_err() {
            return;
        }
        let _ = rx.await;
    }

    /// Stop accepting records, run the final flush and stop the timer.
    ///
    /// The whole wait, including a flush that was already running, is
    /// bounded by `shutdown_timeout`; past it the in-flight batch and the
    /// rest of the queue are dropped. Later calls return at once.
    pub async fn shutdown(&self) {
        let handle = self.worker.lock().take();
        let Some(mut handle) = handle else {
            return;
        };

        self.shared.begin_shutdown();
        let _ = self.control.send(Control::Shutdown);

        // bounds a flush that was already running when shutdown began, too
        let grace = self.shared.config.shutdown_timeout;
        match timeout(grace, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.shared.diag(format!("sink worker ended abnormally: {e}"));
                self.shared.state.store(SinkState::Stopped as u8, Ordering::Release);
            }
            Err(_) => {
                handle.abort();
                self.shared.abandon(grace);
            }
        }
    }

    pub fn state(&self) -> SinkState {
        self.shared.state()
    }

    pub fn stats(&self) -> StatsSnapshot {
        let c = &self.shared.counters;
        let load = |a: &AtomicU64| a.load(Ordering::Relaxed);
        StatsSnapshot {
            received: load(&c.received),
            rejected_level: load(&c.rejected_level),
            rejected_after_shutdown: load(&c.rejected_after_shutdown),
            dropped_overflow: load(&c.dropped_overflow),
            enqueued: load(&c.enqueued),
            delivered: load(&c.delivered),
            failed_batches: load(&c.failed_batches),
            dropped_records: load(&c.dropped_records),
            ticks: load(&c.ticks),
        }
    }

    /// Records currently waiting in the queue.
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    /// Stream name resolved when the sink started.
    pub fn stream_name(&self) -> &str {
        &self.shared.stream
    }

    pub fn config(&self) -> &SinkConfig {
        &self.shared.config
    }
}

impl fmt::Debug for BatchingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchingSink")
            .field("log_group", &self.shared.config.log_group)
            .field("stream", &self.shared.stream)
            .field("state", &self.state())
            .field("queued", &self.queued())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Timer,
    Size,
    Explicit,
    Shutdown,
}

impl Trigger {
    /// How many records this flush may take off the queue, given the
    /// backlog when it starts. `None` means no bound.
    ///
    /// An explicit flush ships what was queued when it was asked for, so a
    /// steady producer cannot keep it running. The final flush empties the
    /// queue, which is closed by then.
    fn budget(self, backlog: usize) -> Option<usize> {
        match self {
            Trigger::Explicit => Some(backlog),
            Trigger::Timer | Trigger::Size | Trigger::Shutdown => None,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trigger::Timer => "timer",
            Trigger::Size => "size",
            Trigger::Explicit => "explicit",
            Trigger::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

struct Worker {
    shared: Arc<Shared>,
    sink: Arc<dyn LogSink>,
    control: mpsc::UnboundedReceiver<Control>,
}

impl Worker {
    async fn run(mut self) {
        let period = self.shared.config.period;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.shared.diag(format!(
            "sink started: group {}, stream {}, period {:?}",
            self.shared.config.log_group, self.shared.stream, period
        ));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    bump(&self.shared.counters.ticks, 1);
                    self.flush(Trigger::Timer).await;
                }
                _ = self.shared.wake.notified() => {
                    // stale wake-ups from triggers already served are no-ops
                    if self.shared.queue.len() >= self.shared.config.batch_size_limit {
                        self.flush(Trigger::Size).await;
                    }
                }
                msg = self.control.recv() => match msg {
                    Some(Control::Flush(ack)) => {
                        self.flush(Trigger::Explicit).await;
                        let _ = ack.send(());
                    }
                    Some(Control::Shutdown) | None => break,
                },
            }
        }

        self.shutdown().await;
    }

    async fn flush(&self, trigger: Trigger) {
        let shared = &*self.shared;
        let batch_size = shared.config.batch_size_limit;
        shared.transition(SinkState::Idle, SinkState::Flushing);

        let mut budget = trigger.budget(shared.queue.len());
        loop {
            let take = budget.map_or(batch_size, |left| left.min(batch_size));
            let batch = shared.queue.drain(take);
            if batch.is_empty() {
                shared.diag(format!("empty batch ({trigger})"));
                break;
            }
            if let Some(left) = budget.as_mut() {
                *left -= batch.len();
            }
            shared.diag(format!("emitting batch of {} records ({trigger})", batch.len()));
            self.deliver_with_retry(batch).await;

            let remaining = shared.queue.len();
            let again = match (trigger, budget) {
                (_, Some(left)) => left > 0 && remaining > 0,
                (Trigger::Shutdown, None) => remaining > 0,
                (_, None) => remaining >= batch_size,
            };
            if !again {
                break;
            }
        }

        shared.transition(SinkState::Flushing, SinkState::Idle);
    }

    async fn deliver_with_retry(&self, batch: Vec<LogRecord>) {
        let shared = &*self.shared;
        let config = &shared.config;
        let n = batch.len();
        let attempts = config.retry_attempts;
        let mut backoff = config.retry_backoff;
        let mut attempt = 1;
        shared.in_flight.store(n, Ordering::Release);

        let outcome = loop {
            let result = match timeout(config.delivery_timeout, self.deliver_once(&batch)).await {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::Timeout(config.delivery_timeout)),
            };
            match result {
                Ok(()) => break Ok(()),
                Err(e) => {
                    shared.diag(format!("delivery attempt {attempt}/{attempts} failed: {e}"));
                    if !e.is_retryable() || attempt >= attempts {
                        break Err(e);
                    }
                    sleep(backoff).await;
                    backoff = next_backoff(backoff, config.max_backoff);
                    attempt += 1;
                }
            }
        };

        shared.in_flight.store(0, Ordering::Release);
        match outcome {
            Ok(()) => bump(&shared.counters.delivered, n as u64),
            Err(e) => {
                bump(&shared.counters.failed_batches, 1);
                bump(&shared.counters.dropped_records, n as u64);
                if e.is_retryable() {
                    shared.diag(format!(
                        "giving up after {attempt} attempts, dropped batch of {n} records"
                    ));
                } else {
                    shared.diag(format!("not retrying, dropped batch of {n} records"));
                }
            }
        }
    }

    async fn deliver_once(&self, batch: &[LogRecord]) -> Result<(), DeliveryError> {
        let group = self.shared.config.log_group.as_str();
        let stream = self.shared.stream.as_str();

        match self.sink.deliver(group, stream, batch).await {
            Err(DeliveryError::DestinationMissing(detail)) => {
                if !self.shared.config.create_destination {
                    return Err(DeliveryError::Permanent(format!(
                        "{detail} (auto-create disabled)"
                    )));
                }
                self.sink.create_destination(group, stream).await?;
                self.shared.diag(format!("created log stream {group}/{stream}"));
                self.sink.deliver(group, stream, batch).await
            }
            other => other,
        }
    }

    async fn shutdown(&self) {
        let shared = &*self.shared;
        shared.begin_shutdown();

        let grace = shared.config.shutdown_timeout;
        match timeout(grace, self.flush(Trigger::Shutdown)).await {
            Ok(()) => {
                if shared.finish() {
                    shared.diag("final flush complete");
                    shared.diag("sink stopped");
                }
            }
            Err(_) => shared.abandon(grace),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let max = Duration::from_secs(10);
        assert_eq!(next_backoff(Duration::from_millis(100), max), Duration::from_millis(200));
        assert_eq!(next_backoff(Duration::from_secs(8), max), max);
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        assert_eq!(next_backoff(Duration::MAX, Duration::MAX), Duration::MAX);
    }

    #[test]
    fn only_explicit_flushes_are_bounded_by_the_backlog() {
        assert_eq!(Trigger::Explicit.budget(42), Some(42));
        assert_eq!(Trigger::Shutdown.budget(42), None);
        assert_eq!(Trigger::Timer.budget(42), None);
    }
}
