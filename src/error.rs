use std::time::Duration;

use thiserror::Error;

/// Everything that can end a lookup early.
///
/// Field-level absence never appears here; it is absorbed by the `"N/A"`
/// sentinel inside the extraction pipeline. Only structural failures (no
/// session, unparsable snapshot, deadline expiry) surface as errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The headless rendering engine could not be launched, even after the
    /// reduced-configuration fallback attempt. Fatal.
    #[error("failed to initialize browser driver: {0}")]
    DriverInit(String),

    /// Navigation did not complete within its per-step budget. The caller
    /// degrades to a best-effort extraction rather than failing the lookup.
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    /// Navigation failed outright (connection refused, bad TLS, tab crash).
    /// Degraded the same way as a navigation timeout.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The readiness marker never appeared. Logged as a warning; extraction
    /// proceeds from whatever markup exists.
    #[error("timed out waiting for page content after {0:?}")]
    ContentWaitTimeout(Duration),

    /// The snapshot was not well-formed markup at all. Distinct from the
    /// semantic "no such class" result. Fatal.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Resident memory stayed above the ceiling after exhausting the
    /// session-recreation budget. Fatal.
    #[error("memory ceiling exceeded: {used} bytes resident > {ceiling} bytes allowed")]
    MemoryLimit { used: u64, ceiling: u64 },

    /// The watchdog deadline expired and aborted the lookup. Fatal.
    #[error("lookup aborted: watchdog deadline of {0:?} expired")]
    Deadline(Duration),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// Whether the lookup may still attempt extraction after this error.
    ///
    /// Pages sometimes finish rendering after the explicit wait resolves
    /// late, so timed-out navigation and content waits are degradable; the
    /// driver logs them and continues. Every other error ends the lookup.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            FetchError::NavigationTimeout(_)
                | FetchError::Navigation(_)
                | FetchError::ContentWaitTimeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_degradable() {
        assert!(FetchError::NavigationTimeout(Duration::from_secs(15)).is_degradable());
        assert!(FetchError::ContentWaitTimeout(Duration::from_secs(10)).is_degradable());
        assert!(FetchError::Navigation("net::ERR_CONNECTION_REFUSED".into()).is_degradable());
    }

    #[test]
    fn structural_failures_are_not_degradable() {
        assert!(!FetchError::DriverInit("no chrome binary".into()).is_degradable());
        assert!(!FetchError::Extraction("empty snapshot".into()).is_degradable());
        assert!(!FetchError::Deadline(Duration::from_secs(25)).is_degradable());
        assert!(!FetchError::MemoryLimit {
            used: 500,
            ceiling: 400
        }
        .is_degradable());
    }

    #[test]
    fn display_messages_name_the_stage() {
        let msg = FetchError::Deadline(Duration::from_secs(25)).to_string();
        assert!(msg.contains("watchdog deadline"));

        let msg = FetchError::MemoryLimit {
            used: 500_000_000,
            ceiling: 400_000_000,
        }
        .to_string();
        assert!(msg.contains("500000000") && msg.contains("400000000"));
    }
}
