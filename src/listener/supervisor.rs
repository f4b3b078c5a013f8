//! Owns the OS hook: install after the permission check, liveness polling,
//! reinstall with backoff, teardown at exit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use super::{Backoff, BackoffConfig, EventTap, KeyFilter, PermissionGate};
use crate::error::{OverlayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Not installed (before start, after stop, or permission missing).
    Stopped,
    Running,
    /// The hook died; the next install attempt is due at `retry_at`.
    Recovering { retry_at: Instant },
    /// Retry budget spent. Needs a user-driven retry.
    Degraded,
}

/// Explicitly owned handle on the global keyboard hook.
pub struct GlobalListener {
    tap: Box<dyn EventTap>,
    gate: Box<dyn PermissionGate>,
    filter: Arc<KeyFilter>,
    backoff: Backoff,
    state: ListenerState,
    liveness_interval: Duration,
    last_check: Option<Instant>,
}

impl GlobalListener {
    pub fn new(
        tap: Box<dyn EventTap>,
        gate: Box<dyn PermissionGate>,
        filter: Arc<KeyFilter>,
        backoff: BackoffConfig,
        liveness_interval: Duration,
    ) -> Self {
        Self {
            tap,
            gate,
            filter,
            backoff: Backoff::new(backoff),
            state: ListenerState::Stopped,
            liveness_interval,
            last_check: None,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ListenerState::Running
    }

    pub fn filter(&self) -> &Arc<KeyFilter> {
        &self.filter
    }

    /// Install the hook. Fails with `PermissionDenied` when the process is
    /// not trusted; the caller surfaces a retry and the process keeps going.
    pub fn start(&mut self, prompt: bool, now: Instant) -> Result<()> {
        if !self.gate.is_trusted(prompt) {
            warn!("Accessibility permission missing; global shortcuts disabled");
            self.state = ListenerState::Stopped;
            return Err(OverlayError::PermissionDenied);
        }
        if let Err(e) = self.tap.install(Arc::clone(&self.filter)) {
            self.state = ListenerState::Stopped;
            return Err(e);
        }
        self.backoff.reset();
        self.backoff.mark_healthy(now);
        self.state = ListenerState::Running;
        self.last_check = Some(now);
        info!("Global listener installed");
        Ok(())
    }

    /// User-driven retry after the listener was stopped or degraded.
    pub fn retry(&mut self, now: Instant) -> Result<()> {
        self.tap.uninstall();
        self.start(true, now)
    }

    pub fn stop(&mut self) {
        self.tap.uninstall();
        self.state = ListenerState::Stopped;
        info!("Global listener stopped");
    }

    /// Reinstall a live hook (wake, session or space change). Does not
    /// count against the retry budget.
    pub fn reinstall(&mut self, now: Instant) -> Result<()> {
        match self.state {
            ListenerState::Running | ListenerState::Recovering { .. } => {
                let was_running = self.is_running();
                self.tap.uninstall();
                match self.tap.install(Arc::clone(&self.filter)) {
                    Ok(()) => {
                        if !was_running {
                            self.backoff.mark_healthy(now);
                        }
                        self.state = ListenerState::Running;
                        self.last_check = Some(now);
                        info!("Global listener reinstalled");
                        Ok(())
                    }
                    Err(e) => {
                        warn!("Reinstall failed: {}", e);
                        self.note_deactivated(now)
                    }
                }
            }
            ListenerState::Stopped | ListenerState::Degraded => Ok(()),
        }
    }

    /// Main-loop hook: picks up deactivation notices from the callback,
    /// polls liveness and runs due reinstall attempts.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        if self.filter.take_deactivated() {
            self.note_deactivated(now)?;
        }
        match self.state {
            ListenerState::Running => {
                let due = self
                    .last_check
                    .map_or(true, |t| now.saturating_duration_since(t) >= self.liveness_interval);
                if due {
                    self.last_check = Some(now);
                    if !self.tap.is_enabled() {
                        warn!("Global listener found disabled during liveness check");
                        return self.note_deactivated(now);
                    }
                }
                Ok(())
            }
            ListenerState::Recovering { retry_at } if now >= retry_at => self.attempt(now),
            _ => Ok(()),
        }
    }

    /// Record that the OS killed the hook and schedule a reinstall.
    ///
    /// Repeated notices while a retry is already pending are coalesced.
    /// Returns `ListenerDeactivated` once the retry budget is spent.
    pub fn note_deactivated(&mut self, now: Instant) -> Result<()> {
        if self.state != ListenerState::Running {
            return Ok(());
        }
        self.tap.uninstall();
        self.schedule_retry(now)
    }

    fn attempt(&mut self, now: Instant) -> Result<()> {
        if !self.gate.is_trusted(false) {
            warn!("Accessibility permission revoked; reinstall postponed");
            return self.schedule_retry(now);
        }
        match self.tap.install(Arc::clone(&self.filter)) {
            Ok(()) => {
                info!(
                    "Global listener recovered after {} failure(s)",
                    self.backoff.failures()
                );
                self.backoff.mark_healthy(now);
                self.state = ListenerState::Running;
                self.last_check = Some(now);
                Ok(())
            }
            Err(e) => {
                warn!("Reinstall attempt failed: {}", e);
                self.schedule_retry(now)
            }
        }
    }

    fn schedule_retry(&mut self, now: Instant) -> Result<()> {
        match self.backoff.next_delay(now) {
            Some(delay) => {
                warn!("Global listener down; retrying in {:?}", delay);
                self.state = ListenerState::Recovering {
                    retry_at: now + delay,
                };
                Ok(())
            }
            None => {
                let attempts = self.backoff.failures();
                error!(
                    "Global listener gave up after {} attempts; waiting for user retry",
                    attempts
                );
                self.state = ListenerState::Degraded;
                Err(OverlayError::ListenerDeactivated { attempts })
            }
        }
    }
}

impl Drop for GlobalListener {
    fn drop(&mut self) {
        self.tap.uninstall();
    }
}
