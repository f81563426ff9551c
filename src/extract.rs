//! Extraction pipeline: a pure function from one markup snapshot to a
//! [`LookupOutcome`].
//!
//! Field-level absence degrades to the `"N/A"` sentinel; only the complete
//! absence of both identity fields (course and title) means the class does
//! not exist. An explicit no-results marker short-circuits before any field
//! work.

use scraper::{ElementRef, Html, Selector};

use crate::error::FetchError;
use crate::record::{derive_time, ClassRecord, LookupOutcome, SeatStatus, SENTINEL};
use crate::selectors::MarkupContract;

/// Parse a rendered snapshot into the terminal outcome for `number`.
pub fn parse(markup: &str, number: &str, contract: &MarkupContract) -> LookupOutcome {
    if markup.trim().is_empty() {
        return LookupOutcome::Failed(FetchError::Extraction(
            "snapshot was empty, nothing to parse".into(),
        ));
    }

    let doc = Html::parse_document(markup);

    if select_first(&doc, contract.no_results).is_some() {
        return LookupOutcome::NotFound;
    }

    // First bold anchor is the course code, second the title.
    let bold_texts = select_texts(&doc, contract.primary_bold);
    if bold_texts.is_empty() {
        return LookupOutcome::NotFound;
    }

    let course = bold_texts
        .first()
        .cloned()
        .unwrap_or_else(|| SENTINEL.to_string());
    let title = bold_texts
        .get(1)
        .cloned()
        .unwrap_or_else(|| SENTINEL.to_string());

    let start_time = field(&doc, contract.start_time);
    let end_time = field(&doc, contract.end_time);
    let time = derive_time(&start_time, &end_time);

    let seat_cells = select_texts(&doc, contract.seats);
    let seat_status = classify_seats(seat_cells.iter().map(String::as_str));

    LookupOutcome::Found(ClassRecord {
        course,
        title,
        number: number.to_string(),
        instructors: select_texts(&doc, contract.instructors),
        days: field(&doc, contract.days),
        start_time,
        end_time,
        time,
        location: field(&doc, contract.location),
        dates: field(&doc, contract.dates),
        units: field(&doc, contract.units),
        seat_status,
    })
}

/// A class is open iff at least one seat cell's leading character is a digit
/// greater than zero. Non-numeric or empty cells are skipped, never errors.
pub fn classify_seats<'a, I>(cells: I) -> SeatStatus
where
    I: IntoIterator<Item = &'a str>,
{
    for cell in cells {
        if let Some(first) = cell.trim().chars().next() {
            if let Some(digit) = first.to_digit(10) {
                if digit > 0 {
                    return SeatStatus::Open;
                }
            }
        }
    }
    SeatStatus::Closed
}

fn select_first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector).next()
}

/// Cleaned text of every match, document order; empty texts are dropped.
fn select_texts(doc: &Html, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };
    doc.select(&selector)
        .map(|el| clean_text(&el))
        .filter(|text| !text.is_empty())
        .collect()
}

/// First match's cleaned text, or the sentinel when the anchor is missing.
fn field(doc: &Html, css: &str) -> String {
    match select_first(doc, css).map(|el| clean_text(&el)) {
        Some(text) if !text.is_empty() => text,
        _ => SENTINEL.to_string(),
    }
}

/// Join an element's text nodes and collapse interior whitespace.
fn clean_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}
