//! Resource watchdog: bounds the worst-case cost of one lookup.
//!
//! Two independent mechanisms. The hard path is a wall-clock deadline: a
//! timer cancels a token the lookup driver races against, so expiry aborts
//! the in-flight step without relying on OS signal delivery. The soft path
//! is a resident-memory ceiling sampled on demand; a breach asks the driver
//! to recreate the browser session, never to kill the process.

use std::sync::Mutex;
use std::time::Duration;

use sysinfo::{ProcessesToUpdate, System};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct Watchdog {
    token: CancellationToken,
    timer: Mutex<Option<JoinHandle<()>>>,
    sampler: Box<dyn Fn() -> Option<u64> + Send + Sync>,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::with_sampler(resident_memory_sampler())
    }

    /// Substitute the memory probe. Lookup tests inject scripted samples
    /// here, the same way fake sessions stand in for the browser.
    pub fn with_sampler(sampler: impl Fn() -> Option<u64> + Send + Sync + 'static) -> Self {
        Self {
            token: CancellationToken::new(),
            timer: Mutex::new(None),
            sampler: Box::new(sampler),
        }
    }

    /// Schedule a hard abort once `deadline` elapses. Re-arming replaces the
    /// previous timer.
    pub fn arm(&self, deadline: Duration) {
        let token = self.token.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            token.cancel();
        });
        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = timer.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the pending abort. Idempotent; called on every exit path.
    pub fn disarm(&self) {
        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }

    /// Resolves when the deadline has expired.
    pub async fn expired(&self) {
        self.token.cancelled().await;
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Point-in-time resident memory of the current process, in bytes.
    pub fn sample_memory(&self) -> Option<u64> {
        let bytes = (self.sampler)();
        if let Some(bytes) = bytes {
            debug!(stage = "watchdog", resident_bytes = bytes, "memory sample");
        }
        bytes
    }

    /// Returns the resident byte count when it exceeds `ceiling`; `None`
    /// when within budget or unsampleable. The driver answers a breach by
    /// recreating the browser session.
    pub fn memory_exceeded(&self, ceiling: u64) -> Option<u64> {
        self.sample_memory().filter(|used| *used > ceiling)
    }
}

/// Default probe: this process's resident memory via sysinfo, refreshing
/// only our own pid rather than the whole process table.
fn resident_memory_sampler() -> impl Fn() -> Option<u64> + Send + Sync {
    let pid = sysinfo::get_current_pid().ok();
    let system = Mutex::new(System::new());
    move || {
        let pid = pid?;
        let mut system = system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).map(|p| p.memory())
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn armed_watchdog_expires_after_deadline() {
        let watchdog = Watchdog::new();
        watchdog.arm(Duration::from_millis(50));
        assert!(!watchdog.is_expired());
        watchdog.expired().await;
        assert!(watchdog.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_prevents_expiry() {
        let watchdog = Watchdog::new();
        watchdog.arm(Duration::from_millis(50));
        watchdog.disarm();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!watchdog.is_expired());
    }

    #[tokio::test]
    async fn disarm_is_idempotent() {
        let watchdog = Watchdog::new();
        watchdog.arm(Duration::from_secs(60));
        watchdog.disarm();
        watchdog.disarm();
        watchdog.disarm();
        assert!(!watchdog.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_previous_timer() {
        let watchdog = Watchdog::new();
        watchdog.arm(Duration::from_secs(60));
        watchdog.arm(Duration::from_millis(10));
        watchdog.expired().await;
        assert!(watchdog.is_expired());
    }

    #[test]
    fn memory_sample_reports_nonzero_resident_bytes() {
        let watchdog = Watchdog::new();
        let sample = watchdog.sample_memory();
        assert!(sample.is_some_and(|bytes| bytes > 0));
    }

    #[test]
    fn memory_ceiling_comparison() {
        let watchdog = Watchdog::new();
        // A 1-byte ceiling is always exceeded; u64::MAX never is.
        assert!(watchdog.memory_exceeded(1).is_some());
        assert!(watchdog.memory_exceeded(u64::MAX).is_none());
    }

    #[test]
    fn injected_sampler_drives_the_ceiling_check() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let watchdog = Watchdog::with_sampler(move || {
            // First sample over a 400-byte ceiling, later ones under it.
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Some(500),
                _ => Some(100),
            }
        });
        assert_eq!(watchdog.memory_exceeded(400), Some(500));
        assert_eq!(watchdog.memory_exceeded(400), None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsampleable_memory_never_breaches() {
        let watchdog = Watchdog::with_sampler(|| None);
        assert!(watchdog.sample_memory().is_none());
        assert!(watchdog.memory_exceeded(1).is_none());
    }
}
