//! The catalog page's markup contract.
//!
//! The target site's selector strings are an externally-versioned, opaque
//! contract: the extraction pipeline depends on them but assigns them no
//! semantics beyond "this is where the field lives". When the site ships a
//! redesign, bump [`CONTRACT_VERSION`] and update the anchors here — nothing
//! else in the crate should need to change.

/// Version tag for the anchor set below, bumped whenever the site's markup
/// changes shape.
pub const CONTRACT_VERSION: &str = "classlist-2026-spring.1";

/// CSS anchors for every field the pipeline extracts.
#[derive(Debug, Clone, Copy)]
pub struct MarkupContract {
    /// Appears once results have rendered; used as the readiness marker.
    pub readiness: &'static str,
    /// Explicit "no classes found" marker; short-circuits to NotFound.
    pub no_results: &'static str,
    /// Primary bold anchors: first is the course code, second the title.
    pub primary_bold: &'static str,
    pub instructors: &'static str,
    pub days: &'static str,
    pub start_time: &'static str,
    pub end_time: &'static str,
    pub location: &'static str,
    pub dates: &'static str,
    pub units: &'static str,
    /// Seat-count cells, e.g. "5 of 30".
    pub seats: &'static str,
}

pub const CONTRACT: MarkupContract = MarkupContract {
    readiness: "div.class-results",
    no_results: "div.class-results .no-classes-found",
    primary_bold: "div.class-results .class-accordion span.bold-hyperlink",
    instructors: "div.class-results .class-accordion .class-results-cell.instructor a",
    days: "div.class-results .class-accordion .class-results-cell.days p",
    start_time: "div.class-results .class-accordion .class-results-cell.start p",
    end_time: "div.class-results .class-accordion .class-results-cell.end p",
    location: "div.class-results .class-accordion .class-results-cell.location p",
    dates: "div.class-results .class-accordion .class-results-cell.dates p",
    units: "div.class-results .class-accordion .class-results-cell.units p",
    seats: "div.class-results .class-accordion .class-results-cell.seats .text-nowrap",
};

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn every_contract_anchor_is_valid_css() {
        let anchors = [
            CONTRACT.readiness,
            CONTRACT.no_results,
            CONTRACT.primary_bold,
            CONTRACT.instructors,
            CONTRACT.days,
            CONTRACT.start_time,
            CONTRACT.end_time,
            CONTRACT.location,
            CONTRACT.dates,
            CONTRACT.units,
            CONTRACT.seats,
        ];
        for anchor in anchors {
            assert!(
                Selector::parse(anchor).is_ok(),
                "contract anchor failed to parse: {anchor}"
            );
        }
    }
}
