use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::decode_entities;
use crate::error::{ImdError, Result};
use crate::model::Station;
use crate::normalize::{clean_station_name, collapse_whitespace, station_id_from_token};

static OPTION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<option\s+value='(\d+)([^']*)'\s*>(.*?)</option>")
        .expect("valid option regex")
});

/// Parse the station `<option>` list of the directory page, sorted by id.
///
/// Options whose value does not start with a 4–6 digit id are placeholders
/// and are skipped.
pub fn extract_station_directory(html: &str) -> Result<Vec<Station>> {
    let mut options = 0usize;
    let mut stations: Vec<Station> = OPTION_TAG
        .captures_iter(html)
        .inspect(|_| options += 1)
        .filter_map(|caps| station_from_option(&caps[1], &caps[2], &caps[3]))
        .collect();

    if stations.is_empty() {
        return Err(ImdError::Extraction(format!(
            "no stations found in directory page ({options} option tags matched)"
        )));
    }

    stations.sort_by_key(|s| s.id);
    debug!(options, stations = stations.len(), "extracted station directory");
    Ok(stations)
}

fn station_from_option(digits: &str, suffix: &str, text: &str) -> Option<Station> {
    let token = format!("{digits}{suffix}");
    let id = station_id_from_token(&token)?;
    let display_name = collapse_whitespace(&decode_entities(text));
    let cleaned_name = clean_station_name(&display_name).unwrap_or_default();

    Some(Station {
        id,
        display_name,
        cleaned_name,
        raw_directory_token: token,
    })
}
