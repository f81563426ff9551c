mod cli;

use std::process::ExitCode;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use classfetch_lib::{output, run_lookup, ChromiumFactory, FetchConfig, FetchError, LookupOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    let number = match args.number.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() => number.to_string(),
        _ => {
            return output::emit(&LookupOutcome::Failed(FetchError::Config(
                "missing class number argument".into(),
            )));
        }
    };

    let mut config = match FetchConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return output::emit(&LookupOutcome::Failed(err)),
    };
    apply_cli_overrides(&mut config, &args);
    if let Err(err) = config.validate() {
        return output::emit(&LookupOutcome::Failed(err));
    }

    let outcome = run_lookup(&number, &config, &ChromiumFactory).await;
    output::emit(&outcome)
}

fn apply_cli_overrides(config: &mut FetchConfig, args: &cli::Cli) {
    if let Some(secs) = args.deadline {
        config.timeouts.deadline = Duration::from_secs(secs);
    }
    if let Some(secs) = args.nav_timeout {
        config.timeouts.navigation = Duration::from_secs(secs);
    }
    if let Some(secs) = args.content_timeout {
        config.timeouts.content_wait = Duration::from_secs(secs);
    }
    if let Some(mb) = args.memory_ceiling_mb {
        config.memory_ceiling_bytes = mb * 1024 * 1024;
    }
}

/// Diagnostics go to stderr only; stdout carries exactly the outcome line.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
