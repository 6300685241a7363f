//! Extraction of typed records from station and directory pages.
//!
//! Pages are loosely structured HTML with no stable ids or classes, so tables
//! are located by caption text and cells are read by position. A missing
//! caption is an [`ImdError::Extraction`](crate::ImdError::Extraction); a
//! malformed row is skipped.

use scraper::{ElementRef, Html, Selector};

mod directory;
mod forecast;
mod header;
mod observation;

pub use directory::extract_station_directory;
pub use forecast::{FORECAST_CAPTION, extract_forecast};
pub use header::{PageHeader, extract_station_and_date};
pub use observation::{OBSERVATION_CAPTION, extract_current_observation};

/// Station name used when the page header carries none.
pub const UNKNOWN_STATION: &str = "Unknown";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("CSS selector should be valid")
}

/// First table in document order whose flattened text contains `caption`.
///
/// Layout tables enclosing the captioned one come first in document order
/// and therefore win, together with all rows nested inside them.
fn find_captioned_table<'a>(doc: &'a Html, caption: &str) -> Option<ElementRef<'a>> {
    doc.select(&selector("table"))
        .find(|table| table.text().collect::<String>().contains(caption))
}

fn rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    table.select(&selector("tr")).collect()
}

fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.select(&selector("td, th")).collect()
}

/// Trimmed text fragments of an element joined by single spaces.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain text of a snippet captured by regex from raw markup, entities decoded.
fn decode_entities(text: &str) -> String {
    Html::parse_fragment(text)
        .root_element()
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
}
