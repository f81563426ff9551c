//! Lookup driver: one end-to-end run from class identifier to terminal
//! outcome.
//!
//! The pipeline races the watchdog deadline. The session lives on the run
//! struct, not inside the raced future, so a deadline abort still tears the
//! browser down afterwards: close runs exactly once per open on every path.

use tracing::{info, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::extract;
use crate::record::LookupOutcome;
use crate::selectors::CONTRACT;
use crate::session::{PageSession, SessionFactory};
use crate::watchdog::Watchdog;

/// Run one lookup to completion. Always returns an outcome; failure modes
/// are values, never panics or early exits.
pub async fn run_lookup(
    number: &str,
    config: &FetchConfig,
    factory: &dyn SessionFactory,
) -> LookupOutcome {
    run_with_watchdog(number, config, factory, &Watchdog::new()).await
}

/// Seam for the watchdog: tests drive the memory path through
/// [`Watchdog::with_sampler`] the same way fakes drive the session path.
async fn run_with_watchdog(
    number: &str,
    config: &FetchConfig,
    factory: &dyn SessionFactory,
    watchdog: &Watchdog,
) -> LookupOutcome {
    watchdog.arm(config.timeouts.deadline);

    let mut run = LookupRun {
        number,
        config,
        factory,
        watchdog,
        session: None,
    };

    let outcome = tokio::select! {
        outcome = run.execute() => outcome,
        () = watchdog.expired() => {
            warn!(stage = "watchdog", deadline = ?config.timeouts.deadline, "deadline expired, aborting lookup");
            LookupOutcome::Failed(FetchError::Deadline(config.timeouts.deadline))
        }
    };

    run.teardown().await;
    watchdog.disarm();
    outcome
}

struct LookupRun<'a> {
    number: &'a str,
    config: &'a FetchConfig,
    factory: &'a dyn SessionFactory,
    watchdog: &'a Watchdog,
    session: Option<Box<dyn PageSession>>,
}

impl LookupRun<'_> {
    async fn execute(&mut self) -> LookupOutcome {
        let url = match self.config.class_url(self.number) {
            Ok(url) => url,
            Err(err) => return LookupOutcome::Failed(err),
        };

        if let Err(err) = self.open_session().await {
            return LookupOutcome::Failed(err);
        }
        if let Err(err) = self.navigate(&url).await {
            return LookupOutcome::Failed(err);
        }

        // A memory breach after page load buys one (configurable) fresh
        // session; a second breach fails the lookup.
        let mut recoveries = 0u32;
        while let Some(used) = self.watchdog.memory_exceeded(self.config.memory_ceiling_bytes) {
            if recoveries >= self.config.memory_retry_budget {
                return LookupOutcome::Failed(FetchError::MemoryLimit {
                    used,
                    ceiling: self.config.memory_ceiling_bytes,
                });
            }
            recoveries += 1;
            warn!(
                stage = "watchdog",
                used,
                ceiling = self.config.memory_ceiling_bytes,
                recovery = recoveries,
                "memory ceiling exceeded, recreating session"
            );
            self.close_session().await;
            if let Err(err) = self.open_session().await {
                return LookupOutcome::Failed(err);
            }
            if let Err(err) = self.navigate(&url).await {
                return LookupOutcome::Failed(err);
            }
        }

        let markup = {
            let session = match self.session.as_mut() {
                Some(session) => session,
                None => {
                    return LookupOutcome::Failed(FetchError::Extraction(
                        "no live session to snapshot".into(),
                    ))
                }
            };

            if let Err(err) = session
                .await_content_ready(CONTRACT.readiness, self.config.timeouts.content_wait)
                .await
            {
                // Proceed with whatever rendered; extraction degrades
                // field-by-field.
                warn!(stage = "wait", error = %err, "content wait did not complete");
            }

            match session.snapshot().await {
                Ok(markup) => markup,
                Err(err) => return LookupOutcome::Failed(err),
            }
        };

        info!(stage = "extract", bytes = markup.len(), "parsing snapshot");
        extract::parse(&markup, self.number, &CONTRACT)
    }

    async fn open_session(&mut self) -> crate::error::Result<()> {
        let open = self.factory.open(self.config);
        match tokio::time::timeout(self.config.timeouts.launch, open).await {
            Ok(Ok(session)) => {
                self.session = Some(session);
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(FetchError::DriverInit(format!(
                "browser launch exceeded {:?}",
                self.config.timeouts.launch
            ))),
        }
    }

    /// Degradable navigation errors (timeouts, hard load failures) are
    /// swallowed with a warning: the page may still have rendered enough for
    /// extraction, and NotFound beats Failed. Anything else ends the lookup.
    async fn navigate(&mut self, url: &url::Url) -> crate::error::Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        match session.navigate(url, self.config.timeouts.navigation).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_degradable() => {
                warn!(stage = "navigate", error = %err, "navigation incomplete, continuing");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            let close = session.close();
            if tokio::time::timeout(self.config.timeouts.close, close)
                .await
                .is_err()
            {
                warn!(stage = "close", "session teardown exceeded its budget");
            }
        }
    }

    async fn teardown(&mut self) {
        self.close_session().await;
    }
}
