//! Deferred delivery of synthesized envelopes.
//!
//! Synthesis is synchronous; only delivery is deferred, by the configured
//! base delay plus the process-wide accumulated slowdown. Deliveries are
//! independent tasks: a later message with a shorter effective delay may
//! arrive first, and once scheduled a delivery cannot be cancelled.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::message::BotMessage;

/// Process-wide slowdown accumulator in milliseconds.
///
/// Zero at process start, monotonically non-decreasing, never reset
/// between sessions. Handles are cheap clones of the same counter;
/// `Slowdown::new` gives an isolated one for embedders that want
/// per-context isolation instead of the shared default.
#[derive(Debug, Clone, Default)]
pub struct Slowdown(Arc<AtomicU64>);

impl Slowdown {
    /// A fresh, isolated accumulator.
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    /// The accumulator shared by every connector in this process.
    pub fn global() -> Slowdown {
        static GLOBAL: OnceLock<Slowdown> = OnceLock::new();
        GLOBAL.get_or_init(Slowdown::new).clone()
    }

    pub fn current_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Atomically add `step_ms`; returns the new total.
    pub fn advance_ms(&self, step_ms: u64) -> u64 {
        self.0.fetch_add(step_ms, Ordering::SeqCst) + step_ms
    }
}

/// Sink the harness provides for outbound envelopes. Called at most once
/// per inbound message (or once per welcome entry at session start).
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, msg: BotMessage) -> Result<(), String>;
}

/// Sink backed by a tokio mpsc sender (used by the CLI and tests).
#[derive(Clone)]
pub struct QueueSink {
    tx: mpsc::Sender<BotMessage>,
}

impl QueueSink {
    pub fn new(tx: mpsc::Sender<BotMessage>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl DeliverySink for QueueSink {
    async fn deliver(&self, msg: BotMessage) -> Result<(), String> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| "delivery queue closed".to_string())
    }
}

/// Schedules deferred deliveries and advances the slowdown.
#[derive(Debug, Clone)]
pub struct DelayScheduler {
    base_delay_ms: u64,
    delay_increase_ms: u64,
    slowdown: Slowdown,
}

impl DelayScheduler {
    /// Scheduler on the process-wide slowdown.
    pub fn new(base_delay_ms: u64, delay_increase_ms: u64) -> Self {
        Self::with_slowdown(base_delay_ms, delay_increase_ms, Slowdown::global())
    }

    /// Scheduler on an explicit accumulator.
    pub fn with_slowdown(base_delay_ms: u64, delay_increase_ms: u64, slowdown: Slowdown) -> Self {
        Self {
            base_delay_ms,
            delay_increase_ms,
            slowdown,
        }
    }

    /// Delay the next scheduled delivery would get.
    pub fn effective_delay_ms(&self) -> u64 {
        self.base_delay_ms + self.slowdown.current_ms()
    }

    /// Defer delivery of `msg`, then advance the slowdown when a
    /// per-message increase is configured. Never blocks the caller.
    pub fn schedule(&self, msg: BotMessage, sink: Arc<dyn DeliverySink>) {
        let delay = Duration::from_millis(self.effective_delay_ms());
        log::debug!("scheduling delivery in {:?}", delay);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Err(e) = sink.deliver(msg).await {
                log::warn!("delivery failed: {}", e);
            }
        });
        if self.delay_increase_ms > 0 {
            let total = self.slowdown.advance_ms(self.delay_increase_ms);
            log::debug!("global slowdown now {}ms", total);
        }
    }

    /// Deliver with zero delay, without reading or advancing the slowdown.
    /// Used for welcome messages at session start.
    pub fn schedule_immediate(&self, msg: BotMessage, sink: Arc<dyn DeliverySink>) {
        tokio::spawn(async move {
            if let Err(e) = sink.deliver(msg).await {
                log::warn!("delivery failed: {}", e);
            }
        });
    }
}
