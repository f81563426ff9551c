use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{FetchError, Result};

/// Catalog search endpoint for the fixed academic term. The class identifier
/// is interpolated into the query string; no other endpoint is contacted.
const CATALOG_ENDPOINT: &str = "https://catalog.apps.campus.edu/catalog/classes/classlist";

/// Term code the lookup is pinned to.
pub const DEFAULT_TERM: &str = "2261";

/// Default resident-memory ceiling (400 MiB, sized for small containers).
pub const DEFAULT_MEMORY_CEILING_BYTES: u64 = 400 * 1024 * 1024;

/// All knobs for one lookup, passed once into the session manager.
///
/// This replaces the ad-hoc browser flags the deployment scripts used to
/// scatter across variants: every recognized option is enumerated here.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Run the rendering engine without a display.
    pub headless: bool,
    /// Keep the Chromium sandbox. Off by default for container deployments.
    pub sandbox: bool,
    /// Skip image loading; the pipeline only reads text.
    pub block_images: bool,
    /// Academic term code interpolated into the catalog URL.
    pub term: String,
    pub timeouts: Timeouts,
    /// Resident-memory ceiling before the session is recreated.
    pub memory_ceiling_bytes: u64,
    /// How many session recreations a single lookup may spend on memory
    /// recovery before failing.
    pub memory_retry_budget: u32,
}

/// Per-step budgets. Each suspension point is bounded on its own, in addition
/// to the overall watchdog deadline.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Overall watchdog deadline. Must stay strictly under the invoking
    /// process's own budget (assumed 30s) so failure is observable rather
    /// than a forced kill.
    pub deadline: Duration,
    /// Browser launch, including the fallback attempt.
    pub launch: Duration,
    pub navigation: Duration,
    /// Wait for the readiness marker. Elapsing is a warning, not an error.
    pub content_wait: Duration,
    /// Best-effort session teardown bound; never blocks outcome emission.
    pub close: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(25),
            launch: Duration::from_secs(10),
            navigation: Duration::from_secs(15),
            content_wait: Duration::from_secs(10),
            close: Duration::from_secs(3),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            block_images: true,
            term: DEFAULT_TERM.to_string(),
            timeouts: Timeouts::default(),
            memory_ceiling_bytes: DEFAULT_MEMORY_CEILING_BYTES,
            memory_retry_budget: 1,
        }
    }
}

/// Optional TOML overlay. Any subset of fields may be present; durations
/// accept humantime strings ("15s", "500ms").
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub headless: Option<bool>,
    pub sandbox: Option<bool>,
    pub block_images: Option<bool>,
    pub term: Option<String>,
    pub memory_ceiling_mb: Option<u64>,
    pub memory_retry_budget: Option<u32>,
    #[serde(default, with = "humantime_serde")]
    pub deadline: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub launch_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub nav_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub content_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub close_timeout: Option<Duration>,
}

impl FetchConfig {
    /// Load defaults, then overlay a TOML file when a path is given.
    /// CLI flags are applied on top by the invocation shell.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = FetchConfig::default();
        if let Some(path) = path {
            let raw = fs::read_to_string(path).map_err(|e| {
                FetchError::Config(format!("failed to read config {}: {e}", path.display()))
            })?;
            let file: ConfigFile = toml::from_str(&raw).map_err(|e| {
                FetchError::Config(format!("invalid config {}: {e}", path.display()))
            })?;
            config.apply_file(file);
        }
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.headless {
            self.headless = v;
        }
        if let Some(v) = file.sandbox {
            self.sandbox = v;
        }
        if let Some(v) = file.block_images {
            self.block_images = v;
        }
        if let Some(v) = file.term {
            self.term = v;
        }
        if let Some(v) = file.memory_ceiling_mb {
            self.memory_ceiling_bytes = v * 1024 * 1024;
        }
        if let Some(v) = file.memory_retry_budget {
            self.memory_retry_budget = v;
        }
        if let Some(v) = file.deadline {
            self.timeouts.deadline = v;
        }
        if let Some(v) = file.launch_timeout {
            self.timeouts.launch = v;
        }
        if let Some(v) = file.nav_timeout {
            self.timeouts.navigation = v;
        }
        if let Some(v) = file.content_timeout {
            self.timeouts.content_wait = v;
        }
        if let Some(v) = file.close_timeout {
            self.timeouts.close = v;
        }
    }

    /// Reject configurations whose step budgets cannot fit inside the
    /// watchdog deadline.
    pub fn validate(&self) -> Result<()> {
        if self.term.trim().is_empty() {
            return Err(FetchError::Config("term must not be empty".into()));
        }
        if self.timeouts.deadline.is_zero() {
            return Err(FetchError::Config("deadline must be non-zero".into()));
        }
        if self.timeouts.navigation >= self.timeouts.deadline {
            return Err(FetchError::Config(
                "nav timeout must be shorter than the watchdog deadline".into(),
            ));
        }
        if self.timeouts.content_wait >= self.timeouts.deadline {
            return Err(FetchError::Config(
                "content-wait timeout must be shorter than the watchdog deadline".into(),
            ));
        }
        if self.memory_ceiling_bytes == 0 {
            return Err(FetchError::Config("memory ceiling must be non-zero".into()));
        }
        Ok(())
    }

    /// Build the catalog URL for a class identifier.
    pub fn class_url(&self, number: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            CATALOG_ENDPOINT,
            &[
                ("searchType", "all"),
                ("term", self.term.as_str()),
                ("keywords", number),
            ],
        )?;
        Ok(url)
    }
}
