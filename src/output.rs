//! Invocation-shell output: exactly one JSON line on stdout, and an exit
//! code that distinguishes "the lookup ran" from "the lookup broke".
//!
//! NotFound is a successful run (exit 0) with an error-shaped body, matching
//! what the consuming service expects to relay verbatim.

use std::process::ExitCode;

use serde::Serialize;

use crate::record::LookupOutcome;

/// Body relayed to callers when the class does not exist.
pub const NOT_FOUND_MESSAGE: &str = "Class not found";

#[derive(Debug, Serialize)]
struct ErrorLine {
    error: String,
}

/// The single stdout line for an outcome.
pub fn outcome_line(outcome: &LookupOutcome) -> String {
    let serialized = match outcome {
        LookupOutcome::Found(record) => serde_json::to_string(record),
        LookupOutcome::NotFound => serde_json::to_string(&ErrorLine {
            error: NOT_FOUND_MESSAGE.to_string(),
        }),
        LookupOutcome::Failed(err) => serde_json::to_string(&ErrorLine {
            error: err.to_string(),
        }),
    };
    serialized.unwrap_or_else(|_| r#"{"error":"failed to serialize lookup outcome"}"#.to_string())
}

/// Exit 0 when the lookup completed (found or not); exit 1 only when the
/// machinery itself failed.
pub fn exit_code_for(outcome: &LookupOutcome) -> ExitCode {
    ExitCode::from(exit_status(outcome))
}

fn exit_status(outcome: &LookupOutcome) -> u8 {
    match outcome {
        LookupOutcome::Failed(_) => 1,
        _ => 0,
    }
}

/// Print the outcome line and return the matching exit code.
pub fn emit(outcome: &LookupOutcome) -> ExitCode {
    println!("{}", outcome_line(outcome));
    exit_code_for(outcome)
}
