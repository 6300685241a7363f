use std::sync::LazyLock;

use regex::Regex;

use super::decode_entities;
use crate::normalize::{clean_station_name, collapse_whitespace, normalize_date};

static STATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)Local Weather Report and Forecast For:\s*(?:</(?:b|strong)>)?\s*<(?:font|span|b|strong|em|i)\b[^>]*>([^<]+)<",
    )
    .expect("valid station marker regex")
});

static DATED_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<b>\s*Dated\s*:\s*([^<]+)</b>").expect("valid dated marker regex")
});

/// Station name and report date from the top of a station page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHeader {
    pub station_name: Option<String>,
    /// `YYYY-MM-DD` when the raw date text could be normalized.
    pub report_date: Option<String>,
    pub raw_station_text: Option<String>,
    pub raw_date_text: Option<String>,
}

/// Best-effort header extraction; missing markers leave fields empty.
pub fn extract_station_and_date(html: &str) -> PageHeader {
    let mut header = PageHeader::default();

    if let Some(caps) = STATION_MARKER.captures(html) {
        let raw = collapse_whitespace(&decode_entities(&caps[1]));
        if !raw.is_empty() {
            header.station_name = clean_station_name(&raw);
            header.raw_station_text = Some(raw);
        }
    }

    if let Some(caps) = DATED_MARKER.captures(html) {
        let raw = collapse_whitespace(&decode_entities(&caps[1]));
        if !raw.is_empty() {
            header.report_date = normalize_date(&raw);
            header.raw_date_text = Some(raw);
        }
    }

    header
}
