use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Placeholder emitted for any field whose markup anchor is missing.
pub const SENTINEL: &str = "N/A";

/// Seat availability as shown in the catalog's seat-count cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatStatus {
    Open,
    Closed,
}

/// The structured result of one class lookup.
///
/// Built once, atomically, from a single markup snapshot; immutable afterwards.
/// Field names follow the JSON contract the consuming backend expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub course: String,
    pub title: String,
    /// The input class identifier, echoed verbatim. Never empty.
    pub number: String,
    /// Instructor names in document order. May be empty.
    pub instructors: Vec<String>,
    pub days: String,
    pub start_time: String,
    pub end_time: String,
    /// Derived: `"{startTime} - {endTime}"` iff both parts are non-sentinel.
    pub time: String,
    pub location: String,
    pub dates: String,
    pub units: String,
    pub seat_status: SeatStatus,
}

/// Combine start and end times into the display range.
///
/// Returns the sentinel unless both parts are non-sentinel, so
/// `time != "N/A"` implies both `start_time` and `end_time` are real values.
pub fn derive_time(start: &str, end: &str) -> String {
    if start != SENTINEL && end != SENTINEL {
        format!("{start} - {end}")
    } else {
        SENTINEL.to_string()
    }
}

/// The single terminal result of one invocation.
#[derive(Debug)]
pub enum LookupOutcome {
    /// The class page was found and a record extracted.
    Found(ClassRecord),
    /// The catalog reported no matching class. Not an error.
    NotFound,
    /// A structural failure ended the lookup.
    Failed(FetchError),
}
