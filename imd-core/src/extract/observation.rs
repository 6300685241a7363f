use scraper::{ElementRef, Html};
use tracing::debug;

use super::{
    UNKNOWN_STATION, cells, element_text, extract_station_and_date, find_captioned_table, rows,
};
use crate::error::{ImdError, Result};
use crate::model::{CurrentObservation, ObservationParameter};
use crate::normalize::canonical_label;

pub const OBSERVATION_CAPTION: &str = "Past 24 Hours Weather Data";

/// Read the "Past 24 Hours Weather Data" table of a station page.
pub fn extract_current_observation(html: &str) -> Result<CurrentObservation> {
    let header = extract_station_and_date(html);

    let doc = Html::parse_document(html);
    let table = find_captioned_table(&doc, OBSERVATION_CAPTION).ok_or_else(|| {
        ImdError::Extraction(format!("{OBSERVATION_CAPTION} table not found"))
    })?;

    let parameters: Vec<ObservationParameter> =
        rows(table).into_iter().filter_map(observation_row).collect();
    debug!(parameters = parameters.len(), "extracted current observation");

    Ok(CurrentObservation {
        station_id: None,
        station_name: header
            .station_name
            .unwrap_or_else(|| UNKNOWN_STATION.to_string()),
        report_date: header.report_date.unwrap_or_default(),
        raw_station_text: header.raw_station_text,
        raw_date_text: header.raw_date_text,
        parameters,
    })
}

/// Label/value rows have exactly two cells, both non-empty.
fn observation_row(row: ElementRef<'_>) -> Option<ObservationParameter> {
    let cells = cells(row);
    let [label_cell, value_cell] = cells.as_slice() else {
        return None;
    };

    let raw_label = element_text(*label_cell);
    let value = element_text(*value_cell);
    if raw_label.is_empty() || value.is_empty() || raw_label.contains(OBSERVATION_CAPTION) {
        return None;
    }

    Some(ObservationParameter {
        label: canonical_label(&raw_label),
        raw_label,
        value,
    })
}
