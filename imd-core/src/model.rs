use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// A reporting location from the station directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: u32,
    pub display_name: String,
    pub cleaned_name: String,
    /// The option value the directory page carried, e.g. `42182_xx`.
    pub raw_directory_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationParameter {
    pub label: String,
    pub raw_label: String,
    pub value: String,
}

/// The "Past 24 Hours Weather Data" table of a station page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentObservation {
    pub station_id: Option<u32>,
    pub station_name: String,
    /// `YYYY-MM-DD`, or empty when the header date was missing or unreadable.
    pub report_date: String,
    pub raw_station_text: Option<String>,
    pub raw_date_text: Option<String>,
    pub parameters: Vec<ObservationParameter>,
}

impl CurrentObservation {
    /// Value of the first parameter whose label contains `name`, ignoring case.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        let needle = name.to_lowercase();
        self.parameters
            .iter()
            .find(|p| p.label.to_lowercase().contains(&needle))
            .map(|p| p.value.as_str())
    }

    /// Label → value pairs in published order.
    pub fn parameter_values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|p| (p.label.as_str(), p.value.as_str()))
    }
}

struct ParameterValues<'a>(&'a CurrentObservation);

impl Serialize for ParameterValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.parameter_values())
    }
}

impl Serialize for CurrentObservation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CurrentObservation", 7)?;
        state.serialize_field("stationId", &self.station_id)?;
        state.serialize_field("stationName", &self.station_name)?;
        state.serialize_field("reportDate", &self.report_date)?;
        state.serialize_field("rawStationText", &self.raw_station_text)?;
        state.serialize_field("rawDateText", &self.raw_date_text)?;
        state.serialize_field("parameters", &self.parameters)?;
        state.serialize_field("parameterValues", &ParameterValues(self))?;
        state.end()
    }
}

/// One row of the "7 Day's Forecast" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    /// `DD-Mon` as published, e.g. `27-May`.
    pub display_date: String,
    pub iso_date: Option<String>,
    pub min_temp: String,
    pub max_temp: String,
    pub summary: String,
    pub warnings: Option<String>,
    pub humidity_0830: Option<String>,
    pub humidity_1730: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub station_id: Option<u32>,
    pub station_name: String,
    pub issued_date: String,
    pub days: Vec<ForecastDay>,
}

impl Forecast {
    /// First day whose display or ISO date equals `date`.
    pub fn day(&self, date: &str) -> Option<&ForecastDay> {
        self.days
            .iter()
            .find(|d| d.display_date == date || d.iso_date.as_deref() == Some(date))
    }

    pub fn first_days(&self, count: usize) -> &[ForecastDay] {
        &self.days[..count.min(self.days.len())]
    }
}
