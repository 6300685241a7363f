use scraper::{ElementRef, Html};
use tracing::debug;

use super::{
    UNKNOWN_STATION, cells, element_text, extract_station_and_date, find_captioned_table, rows,
};
use crate::error::{ImdError, Result};
use crate::model::{Forecast, ForecastDay};
use crate::normalize::{display_date_to_iso_current_year, is_display_date};

pub const FORECAST_CAPTION: &str = "7 Day's Forecast";

/// Date, min, max, image, summary, warning image, warnings, RH 08:30, RH 17:30.
const FORECAST_CELLS: usize = 9;

/// Read the "7 Day's Forecast" table of a station page.
pub fn extract_forecast(html: &str) -> Result<Forecast> {
    let header = extract_station_and_date(html);

    let doc = Html::parse_document(html);
    let table = find_captioned_table(&doc, FORECAST_CAPTION)
        .ok_or_else(|| ImdError::Extraction("7-day forecast table not found".into()))?;

    let rows = rows(table);
    let header_row = rows
        .iter()
        .position(|row| is_header_row(*row))
        .ok_or_else(|| ImdError::Extraction("header row not found in forecast table".into()))?;

    let days: Vec<ForecastDay> = rows[header_row + 1..]
        .iter()
        .filter_map(|row| {
            let texts: Vec<String> = cells(*row).into_iter().map(element_text).collect();
            forecast_day(&texts)
        })
        .collect();
    debug!(days = days.len(), "extracted forecast");

    Ok(Forecast {
        station_id: None,
        station_name: header
            .station_name
            .unwrap_or_else(|| UNKNOWN_STATION.to_string()),
        issued_date: header.report_date.unwrap_or_default(),
        days,
    })
}

fn is_header_row(row: ElementRef<'_>) -> bool {
    let text: String = row.text().collect();
    text.contains("Date") && (text.contains("Min Temp") || text.contains("Max Temp"))
}

/// A data row, read positionally; anything whose first cell is not a
/// `DD-Mon` date is a spacer or repeated header.
fn forecast_day(cells: &[String]) -> Option<ForecastDay> {
    if cells.len() < FORECAST_CELLS {
        return None;
    }

    let display_date = cells[0].trim();
    if !is_display_date(display_date) {
        return None;
    }

    Some(ForecastDay {
        display_date: display_date.to_string(),
        iso_date: display_date_to_iso_current_year(display_date),
        min_temp: cells[1].clone(),
        max_temp: cells[2].clone(),
        summary: cells[4].clone(),
        warnings: non_empty(&cells[6]),
        humidity_0830: non_empty(&cells[7]),
        humidity_1730: non_empty(&cells[8]),
    })
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Local};

    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    const PAGE: &str = r#"
        <html><body>
        <b>Local Weather Report and Forecast For:</b> <font color="blue">PUNE</font>
        <b>Dated : May 27, 2025</b>
        <table>
          <tr><td colspan="9">7 Day's Forecast</td></tr>
          <tr><th>Date</th><th>Min Temp</th><th>Max Temp</th><th></th><th>Weather</th>
              <th></th><th>Warnings</th><th>RH 0830</th><th>RH 1730</th></tr>
          <tr><td>27-May</td><td>24</td><td>34</td><td><img src="a.gif"></td><td>Partly cloudy</td>
              <td><img src="w.gif"></td><td></td><td>65</td><td>40</td></tr>
          <tr><td colspan="9">&nbsp;</td></tr>
          <tr><td>28-May</td><td>25</td><td>35</td><td><img src="b.gif"></td><td>Thunderstorm with rain</td>
              <td><img src="w.gif"></td><td>Thunderstorm</td><td>70</td><td></td></tr>
          <tr><td>Total</td><td>-</td><td>-</td><td></td><td></td><td></td><td></td><td></td><td></td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn reads_accepted_rows_positionally() {
        let forecast = extract_forecast(PAGE).unwrap();
        let year = Local::now().year();

        assert_eq!(forecast.station_name, "Pune");
        assert_eq!(forecast.issued_date, "2025-05-27");
        assert_eq!(forecast.days.len(), 2);

        let second = &forecast.days[1];
        assert_eq!(second.display_date, "28-May");
        assert_eq!(second.iso_date, Some(format!("{year}-05-28")));
        assert_eq!(second.summary, "Thunderstorm with rain");
        assert_eq!(second.warnings.as_deref(), Some("Thunderstorm"));
        assert_eq!(second.humidity_0830.as_deref(), Some("70"));
        assert_eq!(second.humidity_1730, None);
    }

    #[test]
    fn row_with_empty_optionals_maps_to_none() {
        let day = forecast_day(&strings(&[
            "27-May", "24", "34", "", "Partly cloudy", "", "", "65", "40",
        ]))
        .unwrap();

        assert_eq!(day.display_date, "27-May");
        assert_eq!(day.min_temp, "24");
        assert_eq!(day.max_temp, "34");
        assert_eq!(day.summary, "Partly cloudy");
        assert_eq!(day.warnings, None);
        assert_eq!(day.humidity_0830.as_deref(), Some("65"));
        assert_eq!(day.humidity_1730.as_deref(), Some("40"));
    }

    #[test]
    fn short_or_undated_rows_are_rejected() {
        assert!(forecast_day(&strings(&["27-May", "24", "34"])).is_none());
        assert!(forecast_day(&strings(&["Date", "Min", "Max", "", "", "", "", "", ""])).is_none());
        assert!(forecast_day(&strings(&["7-May", "24", "34", "", "", "", "", "", ""])).is_none());
    }

    #[test]
    fn unknown_month_keeps_row_without_iso_date() {
        let day =
            forecast_day(&strings(&["27-Xyz", "24", "34", "", "Haze", "", "", "", ""])).unwrap();
        assert_eq!(day.iso_date, None);
    }

    #[test]
    fn table_without_days_is_empty_forecast() {
        let html = "<table><tr><td>7 Day's Forecast</td></tr>\
                    <tr><td>Date</td><td>Min Temp</td><td>Max Temp</td></tr></table>";
        let forecast = extract_forecast(html).unwrap();

        assert!(forecast.days.is_empty());
        assert_eq!(forecast.station_name, UNKNOWN_STATION);
    }

    #[test]
    fn missing_table_or_header_is_extraction_failure() {
        let err = extract_forecast("<table><tr><td>Nothing</td></tr></table>").unwrap_err();
        assert!(matches!(err, ImdError::Extraction(_)));

        let err =
            extract_forecast("<table><tr><td>7 Day's Forecast</td></tr></table>").unwrap_err();
        assert!(matches!(err, ImdError::Extraction(msg) if msg.contains("header row")));
    }
}
