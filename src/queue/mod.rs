//! Bounded-concurrency FIFO work queue
//!
//! Items are dispatched head-first to a consumer with at most `limit`
//! invocations in flight. Every invocation owns a slot guard: the slot is
//! released and the next dispatch attempted when the guard drops, whether the
//! consumer succeeded, failed or panicked.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, warn};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;

use crate::error::{CrawlError, CrawlResult};

/// Work performed for each dequeued item
///
/// `remaining` is the number of items still pending after this one was taken.
/// Failures are isolated to the item; the queue never retries.
#[async_trait]
pub trait QueueConsumer<T: Send + 'static>: Send + Sync + 'static {
    async fn consume(&self, item: T, remaining: usize) -> anyhow::Result<()>;
}

#[async_trait]
impl<T, F, Fut> QueueConsumer<T> for F
where
    T: Send + 'static,
    F: Fn(T, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn consume(&self, item: T, remaining: usize) -> anyhow::Result<()> {
        (self)(item, remaining).await
    }
}

/// Result of one consumer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOutcome {
    Completed,
    Failed(String),
}

/// Observable state of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Running with nothing pending and nothing in flight
    Idle,
    Running,
    /// No new dispatch until `start`
    Stopped,
}

/// Counters since the queue was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub dispatched: u64,
    pub completed: u64,
    pub failed: u64,
}

struct State<T> {
    items: VecDeque<T>,
    active: usize,
    running: bool,
}

#[derive(Default)]
struct Counters {
    dispatched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

struct Inner<T: Send + 'static> {
    state: Mutex<State<T>>,
    limit: usize,
    consumer: Arc<dyn QueueConsumer<T>>,
    idle: Notify,
    counters: Counters,
    runtime: Handle,
}

/// FIFO queue processing items with bounded parallelism
///
/// Cloning yields another handle to the same queue.
pub struct Queue<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Queue<T> {
    /// Create a running, empty queue
    ///
    /// Must be called from within a tokio runtime; consumer invocations are
    /// spawned onto it.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Config` for a zero limit and `CrawlError::Other`
    /// outside a runtime.
    pub fn new(limit: usize, consumer: impl QueueConsumer<T>) -> CrawlResult<Self> {
        if limit == 0 {
            return Err(CrawlError::Config(
                "queue concurrency limit must be at least 1".to_string(),
            ));
        }
        let runtime = Handle::try_current()
            .map_err(|e| CrawlError::Other(format!("queue needs a tokio runtime: {e}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    items: VecDeque::new(),
                    active: 0,
                    running: true,
                }),
                limit,
                consumer: Arc::new(consumer),
                idle: Notify::new(),
                counters: Counters::default(),
                runtime,
            }),
        })
    }

    /// Append one item and dispatch if capacity allows
    pub fn add_item(&self, item: T) {
        self.inner.state.lock().items.push_back(item);
        dispatch(&self.inner);
    }

    /// Append items in order and dispatch if capacity allows
    pub fn add_items(&self, items: impl IntoIterator<Item = T>) {
        self.inner.state.lock().items.extend(items);
        dispatch(&self.inner);
    }

    /// Resume dispatching, draining the backlog up to the limit immediately
    pub fn start(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.running {
                return;
            }
            state.running = true;
        }
        debug!("queue started");
        dispatch(&self.inner);
    }

    /// Halt new dispatch; in-flight work runs to completion
    pub fn stop(&self) {
        self.inner.state.lock().running = false;
        debug!("queue stopped");
        self.inner.idle.notify_waiters();
    }

    /// Number of pending items
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of consumer invocations in flight
    #[must_use]
    pub fn active(&self) -> usize {
        self.inner.state.lock().active
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    #[must_use]
    pub fn state(&self) -> QueueState {
        let state = self.inner.state.lock();
        if !state.running {
            QueueState::Stopped
        } else if state.active == 0 && state.items.is_empty() {
            QueueState::Idle
        } else {
            QueueState::Running
        }
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let counters = &self.inner.counters;
        QueueStats {
            dispatched: counters.dispatched.load(Ordering::Acquire),
            completed: counters.completed.load(Ordering::Acquire),
            failed: counters.failed.load(Ordering::Acquire),
        }
    }

    /// Wait until nothing is in flight and nothing more will be dispatched
    ///
    /// A stopped queue with a backlog counts as idle once its in-flight work
    /// has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_settled() {
                return;
            }
            notified.await;
        }
    }

    fn is_settled(&self) -> bool {
        let state = self.inner.state.lock();
        state.active == 0 && (state.items.is_empty() || !state.running)
    }
}

/// Start as many pending items as the limit allows
fn dispatch<T: Send + 'static>(inner: &Arc<Inner<T>>) {
    loop {
        let (item, remaining) = {
            let mut state = inner.state.lock();
            if !state.running || state.active >= inner.limit {
                return;
            }
            let Some(item) = state.items.pop_front() else {
                return;
            };
            state.active += 1;
            (item, state.items.len())
        };
        inner.counters.dispatched.fetch_add(1, Ordering::AcqRel);

        let slot = SlotGuard {
            inner: Arc::clone(inner),
            outcome: None,
        };
        let consumer = Arc::clone(&inner.consumer);

        inner.runtime.spawn(async move {
            let outcome = match AssertUnwindSafe(consumer.consume(item, remaining))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => WorkOutcome::Completed,
                Ok(Err(e)) => WorkOutcome::Failed(format!("{e:#}")),
                Err(_) => WorkOutcome::Failed("consumer panicked".to_string()),
            };
            slot.finish(outcome);
        });
    }
}

/// One occupied concurrency slot
///
/// Dropping it records the outcome, frees the slot and re-runs dispatch. A
/// guard dropped without an outcome belongs to a task that was cancelled
/// (aborted, or dropped by a runtime shutting down): its slot is freed but
/// nothing new is dispatched.
struct SlotGuard<T: Send + 'static> {
    inner: Arc<Inner<T>>,
    outcome: Option<WorkOutcome>,
}

impl<T: Send + 'static> SlotGuard<T> {
    fn finish(mut self, outcome: WorkOutcome) {
        self.outcome = Some(outcome);
    }
}

impl<T: Send + 'static> Drop for SlotGuard<T> {
    fn drop(&mut self) {
        let counters = &self.inner.counters;
        let finished = match self.outcome.take() {
            Some(WorkOutcome::Completed) => {
                counters.completed.fetch_add(1, Ordering::AcqRel);
                true
            }
            Some(WorkOutcome::Failed(reason)) => {
                warn!("queue item failed: {reason}");
                counters.failed.fetch_add(1, Ordering::AcqRel);
                true
            }
            None => {
                warn!("queue item cancelled before completion");
                counters.failed.fetch_add(1, Ordering::AcqRel);
                false
            }
        };

        {
            let mut state = self.inner.state.lock();
            state.active = state.active.saturating_sub(1);
        }
        if finished {
            dispatch(&self.inner);
        }
        self.inner.idle.notify_waiters();
    }
}
