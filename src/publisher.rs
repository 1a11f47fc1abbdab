// Live publisher: one repeating aggregation timer per subscriber

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::models::AggregatedSnapshot;

/// Produces the snapshot pushed on every tick.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self, owner: Option<&str>) -> anyhow::Result<AggregatedSnapshot>;
}

/// Decrements the active subscription count on drop, whichever way the tick task exits.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

pub struct LivePublisher {
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    buffer: usize,
    shutdown: CancellationToken,
    active: Arc<AtomicUsize>,
}

impl LivePublisher {
    /// Every subscription is cancelled when `shutdown` is.
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        interval: Duration,
        buffer: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            source,
            interval,
            buffer: buffer.max(1),
            shutdown,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Cancels every live subscription.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Starts a tick task for `owner`. The first snapshot is produced immediately.
    pub fn subscribe(&self, owner: Option<String>) -> Subscription {
        let token = self.shutdown.child_token();
        let (tx, rx) = mpsc::channel(self.buffer);

        let active = self.active.fetch_add(1, Ordering::Relaxed) + 1;
        let guard = ActiveGuard(self.active.clone());
        tracing::info!(
            owner = owner.as_deref().unwrap_or("*"),
            active_subscriptions = active,
            "live subscription started"
        );

        let handle = tokio::spawn(run_ticks(
            self.source.clone(),
            owner,
            self.interval,
            tx,
            token.clone(),
            guard,
        ));

        Subscription {
            rx,
            token,
            handle: Some(handle),
        }
    }
}

async fn run_ticks(
    source: Arc<dyn SnapshotSource>,
    owner: Option<String>,
    period: Duration,
    tx: mpsc::Sender<AggregatedSnapshot>,
    token: CancellationToken,
    _guard: ActiveGuard,
) {
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tx.closed() => break,
            _ = tick.tick() => {}
        }
        ticks += 1;

        // An in-flight pass is allowed to finish; its result is dropped if we were cancelled meanwhile.
        let result = source.snapshot(owner.as_deref()).await;
        if token.is_cancelled() {
            break;
        }
        match result {
            Ok(snapshot) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    sent = tx.send(snapshot) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    operation = "live_tick",
                    tick = ticks,
                    "snapshot failed; skipping tick"
                );
            }
        }
    }

    token.cancel();
    tracing::info!(
        owner = owner.as_deref().unwrap_or("*"),
        ticks,
        "live subscription ended"
    );
}

/// Receiving end of one live subscription. Dropping it cancels the timer.
pub struct Subscription {
    rx: mpsc::Receiver<AggregatedSnapshot>,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Next snapshot, or `None` once the subscription has ended and the queue is drained.
    pub async fn recv(&mut self) -> Option<AggregatedSnapshot> {
        self.rx.recv().await
    }

    /// Stops the timer. Safe to call any number of times.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits for the tick task to exit. Returns at once if already joined.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "live subscription task failed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
