use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "classfetch")]
#[command(
    version,
    about = "Look up one class section in the university catalog",
    long_about = "Class Catalog Fetcher\n\nRenders the catalog's client-side search for a single class number in a\nheadless browser and prints the section's details as one JSON line on\nstdout. Exit code 0 means the lookup completed (found or not found);\nexit code 1 means the lookup machinery failed."
)]
pub struct Cli {
    /// Class number to look up (e.g. 12345)
    pub number: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Optional config file (TOML) overriding defaults; CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose diagnostics on stderr")]
    pub verbose: bool,

    #[arg(long, value_name = "SECS", help = "Overall watchdog deadline in seconds")]
    pub deadline: Option<u64>,

    #[arg(long, value_name = "SECS", help = "Page navigation timeout in seconds")]
    pub nav_timeout: Option<u64>,

    #[arg(
        long,
        value_name = "SECS",
        help = "Readiness-marker wait timeout in seconds"
    )]
    pub content_timeout: Option<u64>,

    #[arg(
        long,
        value_name = "MB",
        help = "Resident-memory ceiling in mebibytes before the session is recreated"
    )]
    pub memory_ceiling_mb: Option<u64>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
