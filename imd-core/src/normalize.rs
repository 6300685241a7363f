//! Pure text normalization: dates, station names, parameter labels and
//! directory tokens.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

/// Free-text date layouts seen in page headers, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y", // May 27, 2025
    "%b %d, %Y", // May 27, 2025
    "%d %B %Y",  // 27 May 2025
    "%d %b %Y",  // 27 May 2025
    "%d-%m-%Y",  // 27-05-2025
    "%d/%m/%Y",  // 27/05/2025
    "%m/%d/%Y",  // 05/27/2025
    "%Y-%m-%d",  // 2025-05-27
    "%d-%m-%y",  // 27-05-25
    "%d/%m/%y",  // 27/05/25
    "%d %b %y",  // 27 May 25
    "%b %d %Y",  // May 27 2025
];

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static DATE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s/\-,:]").expect("valid date noise regex"));

static NAME_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(for|weather|report|forecast):\s*").expect("valid name prefix regex")
});

static NAME_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(weather|report|forecast|station|airport|city)$")
        .expect("valid name suffix regex")
});

static DISPLAY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-[A-Za-z]{3}$").expect("valid display date regex"));

/// Normalize a free-text date to `YYYY-MM-DD`.
///
/// Returns `None` when no known layout matches the whole text; callers keep
/// the raw text in that case.
pub fn normalize_date(text: &str) -> Option<String> {
    let cleaned = DATE_NOISE.replace_all(text.trim(), "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    DATE_FORMATS.iter().find_map(|fmt| {
        let mut date = NaiveDate::parse_from_str(cleaned, fmt).ok()?;
        // chrono accepts short years for %Y; only %y may produce them.
        if fmt.contains("%Y") && !(1000..=9999).contains(&date.year()) {
            return None;
        }
        // Two-digit years pivot at 69: 00-68 are 20xx, 69-99 are 19xx.
        if fmt.contains("%y") && date.year() >= 2069 {
            date = date.with_year(date.year() - 100)?;
        }
        Some(date.format("%Y-%m-%d").to_string())
    })
}

/// Tidy a station name taken from a page header or the station directory.
pub fn clean_station_name(text: &str) -> Option<String> {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return None;
    }

    let name = NAME_PREFIX.replace(&collapsed, "");
    let name = NAME_SUFFIX.replace(&name, "");
    let name: String = name.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let name = title_case(name.trim());

    (!name.is_empty()).then_some(name)
}

/// True for the forecast table's `DD-Mon` day labels, e.g. `27-May`.
pub fn is_display_date(text: &str) -> bool {
    DISPLAY_DATE.is_match(text.trim())
}

/// Month number for a name or abbreviation; only the first three letters count.
pub fn month_number(name: &str) -> Option<u32> {
    let key: String = name.chars().take(3).collect::<String>().to_lowercase();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == key)
        .map(|idx| idx as u32 + 1)
}

/// Turn a yearless `DD-Mon` label into `YYYY-MM-DD` using `year`.
pub fn display_date_to_iso(text: &str, year: i32) -> Option<String> {
    let parts: Vec<&str> = text
        .trim()
        .split(['-', ' '])
        .filter(|p| !p.is_empty())
        .collect();
    let [day, month] = parts.as_slice() else {
        return None;
    };
    let month = month_number(month)?;

    Some(format!("{year}-{month:02}-{day:0>2}"))
}

/// [`display_date_to_iso`] against the current local calendar year.
///
/// A late-December page listing early-January days gets the old year.
pub fn display_date_to_iso_current_year(text: &str) -> Option<String> {
    display_date_to_iso(text, Local::now().year())
}

enum LabelMatch {
    Contains(&'static str),
    ContainsAny(&'static [&'static str]),
    /// Needle must be present and the hint must appear in the lowercased label.
    ContainsWithHint(&'static str, &'static str),
}

impl LabelMatch {
    fn matches(&self, label: &str) -> bool {
        match self {
            LabelMatch::Contains(needle) => label.contains(needle),
            LabelMatch::ContainsAny(needles) => needles.iter().any(|n| label.contains(n)),
            LabelMatch::ContainsWithHint(needle, hint) => {
                label.contains(needle) && label.to_lowercase().contains(hint)
            }
        }
    }
}

/// Evaluated top to bottom, first match wins.
const LABEL_RULES: &[(LabelMatch, &str)] = &[
    (LabelMatch::Contains("Maximum Temp"), "Maximum Temperature (°C)"),
    (LabelMatch::Contains("Minimum Temp"), "Minimum Temperature (°C)"),
    (
        LabelMatch::ContainsWithHint("Departure from Normal", "max"),
        "Max Temp Departure from Normal (°C)",
    ),
    (
        LabelMatch::ContainsWithHint("Departure from Normal", "min"),
        "Min Temp Departure from Normal (°C)",
    ),
    (
        LabelMatch::Contains("Departure from Normal"),
        "Temperature Departure from Normal (°C)",
    ),
    (LabelMatch::Contains("24 Hours Rainfall"), "24 Hours Rainfall (mm)"),
    (
        LabelMatch::ContainsAny(&["Relative Humidity at 0830", "Relative Humidity at 08:30"]),
        "Relative Humidity at 08:30 (%)",
    ),
    (
        LabelMatch::ContainsAny(&["Relative Humidity at 1730", "Relative Humidity at 17:30"]),
        "Relative Humidity at 17:30 (%)",
    ),
    (LabelMatch::Contains("Sunset"), "Today's Sunset (IST)"),
    (LabelMatch::Contains("Sunrise"), "Tomorrow's Sunrise (IST)"),
    (LabelMatch::Contains("Moonset"), "Moonset (IST)"),
    (LabelMatch::Contains("Moonrise"), "Moonrise (IST)"),
];

/// Map a raw observation label onto the canonical vocabulary.
///
/// Labels no rule knows about pass through with parentheses dropped and
/// whitespace collapsed.
pub fn canonical_label(raw: &str) -> String {
    let cleaned = collapse_whitespace(&raw.replace(['(', ')'], ""));

    LABEL_RULES
        .iter()
        .find(|(rule, _)| rule.matches(&cleaned))
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(cleaned)
}

/// The run of ASCII digits a directory token starts with (possibly empty).
pub fn leading_digits(token: &str) -> &str {
    let end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    &token[..end]
}

/// Station id encoded at the start of a directory token.
///
/// Only leading runs of 4 to 6 digits are ids.
pub fn station_id_from_token(token: &str) -> Option<u32> {
    let digits = leading_digits(token);
    if !(4..=6).contains(&digits.len()) {
        return None;
    }
    digits.parse().ok()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if prev_alpha {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        prev_alpha = ch.is_alphabetic();
    }
    out
}
