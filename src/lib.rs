//! Class Catalog Fetcher Library
//!
//! Single-shot lookup of one class section in the university catalog: render
//! the catalog's client-side search in a headless browser, extract the
//! section's fields from the settled markup, and report the result as one
//! JSON line. Built to run inside a request/response cycle, so every step is
//! deadline- and memory-bounded.
//!
//! # Module Overview
//!
//! - [`lookup`] - End-to-end lookup driver racing the watchdog
//! - [`session`] - Headless browser session lifecycle
//! - [`watchdog`] - Wall-clock deadline and resident-memory ceiling
//! - [`extract`] - Markup snapshot to [`record::ClassRecord`]
//! - [`selectors`] - The catalog page's CSS anchor contract
//! - [`record`] - Data model and outcome types
//! - [`config`] - Defaults plus TOML overlay
//! - [`output`] - stdout line and exit-code mapping
//!
//! # Example
//!
//! ```no_run
//! use classfetch_lib::{run_lookup, ChromiumFactory, FetchConfig, LookupOutcome};
//!
//! # async fn example() {
//! let config = FetchConfig::default();
//! match run_lookup("12345", &config, &ChromiumFactory).await {
//!     LookupOutcome::Found(record) => println!("{}", record.course),
//!     LookupOutcome::NotFound => println!("no such class"),
//!     LookupOutcome::Failed(err) => eprintln!("lookup failed: {err}"),
//! }
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod lookup;
pub mod output;
pub mod record;
pub mod selectors;
pub mod session;
pub mod watchdog;

pub use config::{FetchConfig, Timeouts, DEFAULT_MEMORY_CEILING_BYTES, DEFAULT_TERM};
pub use error::{FetchError, Result};
pub use extract::{classify_seats, parse};
pub use lookup::run_lookup;
pub use output::{emit, exit_code_for, outcome_line, NOT_FOUND_MESSAGE};
pub use record::{derive_time, ClassRecord, LookupOutcome, SeatStatus, SENTINEL};
pub use selectors::{MarkupContract, CONTRACT, CONTRACT_VERSION};
pub use session::{ChromiumFactory, ChromiumSession, PageSession, SessionFactory, SessionState};
pub use watchdog::Watchdog;
