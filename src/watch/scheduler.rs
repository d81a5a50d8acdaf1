//! Timer-driven polling loop.
//!
//! A scheduler owns one feed and one registry. Each cycle fetches a batch of
//! observations, upserts them in feed order and forwards every host whose
//! change set is non-empty to the event channel.

use crate::feed::FeedProvider;
use crate::state::{Entity, Registry};
use crate::watch::delivery::{Delivery, DeliveryPolicy, EventSender};
use crate::watch::interval::clamp_interval;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Lifecycle of a scheduler. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Poll bookkeeping, readable while the scheduler runs.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PollStatus {
    /// Last successful poll timestamp
    pub last_poll: Option<DateTime<Utc>>,
    /// Error of the most recent poll, cleared by the next successful one
    pub last_error: Option<String>,
    /// Successful polls
    pub poll_count: u64,
    /// Failed polls
    pub error_count: u64,
    /// Events handed to the consumer
    pub events_emitted: u64,
    /// Events discarded because the channel was full
    pub events_dropped: u64,
}

/// Per-feed polling scheduler.
///
/// The interval lives in a `watch` channel: [`set_interval`](Self::set_interval)
/// publishes a new value and the running loop, which owns the timer, rebuilds
/// it. Rebuilding restarts the countdown at the full new interval.
pub struct Scheduler {
    feed: Arc<dyn FeedProvider>,
    registry: Arc<Registry>,
    interval_tx: watch::Sender<Duration>,
    delivery: DeliveryPolicy,
    state: std::sync::Mutex<SchedulerState>,
    status: tokio::sync::Mutex<PollStatus>,
}

impl Scheduler {
    /// Creates a scheduler polling `feed` into `registry` every `interval`
    /// (clamped to the minimum interval).
    pub fn new(feed: Arc<dyn FeedProvider>, registry: Arc<Registry>, interval: Duration) -> Self {
        let (interval_tx, _) = watch::channel(clamp_interval(interval));
        Self {
            feed,
            registry,
            interval_tx,
            delivery: DeliveryPolicy::default(),
            state: std::sync::Mutex::new(SchedulerState::Idle),
            status: tokio::sync::Mutex::new(PollStatus::default()),
        }
    }

    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn delivery(&self) -> DeliveryPolicy {
        self.delivery
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn status(&self) -> PollStatus {
        self.status.lock().await.clone()
    }

    /// Current polling interval
    pub fn interval(&self) -> Duration {
        *self.interval_tx.borrow()
    }

    /// Request a new polling interval and return the effective one.
    ///
    /// Values below the minimum interval are raised to it and values above
    /// [`MAXIMUM_INTERVAL`](crate::watch::MAXIMUM_INTERVAL) lowered. Requesting the
    /// interval already in effect does nothing; any other value restarts a
    /// running timer from zero.
    pub fn set_interval(&self, requested: Duration) -> Duration {
        let interval = clamp_interval(requested);
        let changed = self.interval_tx.send_if_modified(|current| {
            if *current == interval {
                false
            } else {
                *current = interval;
                true
            }
        });

        if changed {
            info!(
                feed = %self.feed.name(),
                interval_secs = interval.as_secs(),
                "Polling interval changed"
            );
        }

        interval
    }

    /// Poll once without emitting events and return the full registry.
    ///
    /// Used to prime state before [`watch`](Self::watch), so that the first
    /// watched cycle only reports real changes.
    pub async fn fetch(&self) -> HashMap<u64, Arc<Entity>> {
        self.poll_cycle(None).await;
        self.registry.all()
    }

    /// Run the polling loop until `stop` fires (or its sender is dropped).
    ///
    /// With `start_delayed == false` one cycle runs immediately, before the
    /// first timer tick. Cancellation stops the timer at once but does not
    /// interrupt a cycle blocked on event delivery.
    ///
    /// # Errors
    /// The scheduler has already been started.
    pub async fn watch(
        &self,
        events: EventSender,
        mut stop: oneshot::Receiver<()>,
        start_delayed: bool,
    ) -> Result<()> {
        self.start()?;

        let mut interval_rx = self.interval_tx.subscribe();

        info!(
            feed = %self.feed.name(),
            interval_secs = self.interval().as_secs(),
            start_delayed = start_delayed,
            "Starting watch loop"
        );

        if !start_delayed {
            self.poll_cycle(Some(&events)).await;
        }

        // The floor may have been raised since the interval was set
        self.set_interval(self.interval());
        let mut period = *interval_rx.borrow_and_update();
        let mut ticker = new_ticker(period);

        loop {
            tokio::select! {
                biased;

                _ = &mut stop => break,

                Ok(()) = interval_rx.changed() => {
                    let requested = *interval_rx.borrow_and_update();
                    if requested != period {
                        period = requested;
                        ticker = new_ticker(period);
                        debug!(
                            feed = %self.feed.name(),
                            interval_secs = period.as_secs(),
                            "Timer restarted"
                        );
                    }
                }

                _ = ticker.tick() => {
                    self.poll_cycle(Some(&events)).await;
                }
            }
        }

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = SchedulerState::Stopped;
        info!(feed = %self.feed.name(), "Watch loop stopped");

        Ok(())
    }

    fn start(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != SchedulerState::Idle {
            anyhow::bail!("Scheduler is {}, watch can only be started once", *state);
        }
        *state = SchedulerState::Running;
        Ok(())
    }

    /// One fetch + upsert pass. Provider failures are logged and counted,
    /// never propagated.
    async fn poll_cycle(&self, events: Option<&EventSender>) {
        debug!(feed = %self.feed.name(), "Polling feed");

        let snapshots = match self.feed.fetch_observations().await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!(
                    feed = %self.feed.name(),
                    error = %e,
                    "Feed fetch failed, treating poll as empty"
                );
                let mut status = self.status.lock().await;
                status.last_error = Some(format!("{:#}", e));
                status.error_count += 1;
                return;
            }
        };

        let observations = snapshots.len();
        let mut changed = 0u64;
        let mut emitted = 0u64;
        let mut dropped = 0u64;

        for snapshot in snapshots {
            let (entity, changes) = self.registry.upsert(snapshot);
            if changes.is_empty() {
                continue;
            }
            changed += 1;

            let Some(events) = events else {
                continue;
            };

            let host_id = entity.host_id();
            match self.delivery.deliver(events, entity).await {
                Delivery::Sent => emitted += 1,
                Delivery::Dropped => {
                    dropped += 1;
                    warn!(host_id = host_id, "Event channel full, dropping event");
                }
                Delivery::Closed => {
                    debug!(host_id = host_id, "Event receiver closed, discarding event");
                }
            }
        }

        if changed > 0 {
            info!(
                feed = %self.feed.name(),
                observations = observations,
                changed = changed,
                "Poll complete"
            );
        } else {
            debug!(
                feed = %self.feed.name(),
                observations = observations,
                "Poll complete, no changes"
            );
        }

        let mut status = self.status.lock().await;
        status.last_poll = Some(Utc::now());
        status.last_error = None;
        status.poll_count += 1;
        status.events_emitted += emitted;
        status.events_dropped += dropped;
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
