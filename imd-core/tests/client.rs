use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use imd_core::config::{DIRECTORY_URL, STANDARD_PAGE_URL_PREFIX, WARNINGS_PAGE_URL_PREFIX};
use imd_core::{Config, ImdClient, ImdError, StationPage, StationQuery, Transport, TransportError};

const DIRECTORY_PAGE: &str = r#"
<html><body>
<select name="station" onchange="showStation(this.value)">
  <option value='0'>--Select Station--</option>
  <option value='43063_pune'>PUNE</option>
  <option value='42182'>NEW DELHI (SAFDARJUNG)</option>
  <option value='42181'>NEW DELHI (PALAM)</option>
  <option value='43279_mad'>Chennai&nbsp;Airport</option>
</select>
</body></html>"#;

const PUNE_PAGE: &str = r##"
<html><body>
<table><tr><td>
  <b>Local Weather Report and Forecast For:</b> <font color="#0000ff">PUNE</font>
  <b>Dated : May 27, 2025</b>
</td></tr></table>
<table border="1">
  <tr><td colspan="2"><b>Past 24 Hours Weather Data</b></td></tr>
  <tr><td>Maximum Temp(&deg;C)</td><td>34.5</td></tr>
  <tr><td>24 Hours Rainfall(mm)</td><td>0.0</td></tr>
  <tr><td>Todays Sunset (IST)</td><td></td></tr>
</table>
<table border="1">
  <tr><td colspan="9"><b>7 Day's Forecast</b></td></tr>
  <tr><td>Date</td><td>Min Temp</td><td>Max Temp</td><td></td><td>Forecast</td><td></td>
      <td>Warnings</td><td>RH 0830</td><td>RH 1730</td></tr>
  <tr><td>27-May</td><td>24</td><td>34</td><td><img src="a.gif"></td><td>Partly cloudy</td>
      <td><img src="w.gif"></td><td></td><td>65</td><td>40</td></tr>
  <tr><td>28-May</td><td>23</td><td>33</td><td></td><td>Thunderstorm with rain</td>
      <td></td><td>Thunderstorm</td><td>70</td><td>45</td></tr>
  <tr><td colspan="9">&nbsp;</td></tr>
</table>
</body></html>"##;

/// Serves fixed pages by URL and counts requests.
#[derive(Debug, Default)]
struct FixtureTransport {
    pages: HashMap<String, &'static str>,
    requests: Mutex<HashMap<String, usize>>,
}

impl FixtureTransport {
    fn new(pages: &[(String, &'static str)]) -> Self {
        Self {
            pages: pages.iter().cloned().collect(),
            ..Self::default()
        }
    }

    fn requests_to(&self, url: &str) -> usize {
        self.requests.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get(&self, url: &str, _verify_certificates: bool) -> Result<Vec<u8>, TransportError> {
        *self.requests.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.pages
            .get(url)
            .map(|body| body.as_bytes().to_vec())
            .ok_or(TransportError::Status(404))
    }
}

fn standard_client() -> ImdClient<FixtureTransport> {
    let mut config = Config::default();
    config.set_station_page(StationPage::Standard);
    config.fetch.max_retries = 0;

    let transport = FixtureTransport::new(&[
        (DIRECTORY_URL.to_string(), DIRECTORY_PAGE),
        (format!("{STANDARD_PAGE_URL_PREFIX}43063"), PUNE_PAGE),
    ]);
    ImdClient::with_transport(transport, &config).unwrap()
}

#[tokio::test]
async fn current_observation_by_name() {
    let client = standard_client();

    let observation = client.current_observation("Pune").await.unwrap();

    assert_eq!(observation.station_id, Some(43063));
    assert_eq!(observation.station_name, "Pune");
    assert_eq!(observation.report_date, "2025-05-27");

    let labels: Vec<(&str, &str)> = observation
        .parameters
        .iter()
        .map(|p| (p.label.as_str(), p.value.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("Maximum Temperature (°C)", "34.5"),
            ("24 Hours Rainfall (mm)", "0.0"),
        ]
    );
    assert_eq!(observation.parameter("rainfall"), Some("0.0"));
}

#[tokio::test]
async fn forecast_by_numeric_identifier() {
    let client = standard_client();

    let forecast = client.forecast(StationQuery::parse("43063")).await.unwrap();

    assert_eq!(forecast.station_id, Some(43063));
    assert_eq!(forecast.issued_date, "2025-05-27");
    assert_eq!(forecast.days.len(), 2);

    let first = &forecast.days[0];
    assert_eq!(first.display_date, "27-May");
    assert_eq!(first.min_temp, "24");
    assert_eq!(first.max_temp, "34");
    assert_eq!(first.summary, "Partly cloudy");
    assert_eq!(first.warnings, None);
    assert_eq!(first.humidity_0830.as_deref(), Some("65"));
    assert_eq!(first.humidity_1730.as_deref(), Some("40"));
    assert!(first.iso_date.as_deref().is_some_and(|d| d.ends_with("-05-27")));

    assert_eq!(forecast.days[1].warnings.as_deref(), Some("Thunderstorm"));
}

#[tokio::test]
async fn report_serializes_to_camel_case_json() {
    let client = standard_client();

    let (observation, forecast) = client.report("pune").await.unwrap();
    let observation = serde_json::to_value(&observation).unwrap();
    let forecast = serde_json::to_value(&forecast).unwrap();

    assert_eq!(observation["stationId"], 43063);
    assert_eq!(
        observation["parameterValues"]["Maximum Temperature (°C)"],
        "34.5"
    );
    assert_eq!(forecast["days"][0]["displayDate"], "27-May");
    assert_eq!(forecast["days"][0]["humidity0830"], "65");
    assert_eq!(
        client
            .transport()
            .requests_to(&format!("{STANDARD_PAGE_URL_PREFIX}43063")),
        1
    );
}

#[tokio::test]
async fn ambiguous_and_unknown_stations() {
    let client = standard_client();

    let err = client.forecast("new delhi").await.unwrap_err();
    assert!(err.is_station_not_found());
    let message = err.to_string();
    assert!(message.contains("NEW DELHI (PALAM)"), "{message}");

    let err = client.forecast(99999_u32).await.unwrap_err();
    assert!(matches!(err, ImdError::StationNotFound(_)));

    assert_eq!(client.transport().requests_to(DIRECTORY_URL), 1);
}

#[tokio::test]
async fn directory_listing_and_search() {
    let client = standard_client();

    let stations = client.list_stations(false).await.unwrap();
    let ids: Vec<u32> = stations.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![42181, 42182, 43063, 43279]);
    assert_eq!(stations[3].display_name, "Chennai Airport");
    assert_eq!(stations[3].cleaned_name, "Chennai");

    let found = client.find_stations("delhi", false).await.unwrap();
    assert_eq!(found.len(), 2);
    assert!(client.find_stations("delhi", true).await.unwrap().is_empty());
}

#[tokio::test]
async fn default_config_targets_warnings_page() {
    let transport = FixtureTransport::new(&[
        (DIRECTORY_URL.to_string(), DIRECTORY_PAGE),
        (format!("{WARNINGS_PAGE_URL_PREFIX}43063"), PUNE_PAGE),
    ]);
    let client = ImdClient::with_transport(transport, &Config::default()).unwrap();

    assert_eq!(client.station_url(43063), format!("{WARNINGS_PAGE_URL_PREFIX}43063"));
    let forecast = client.forecast("pune").await.unwrap();
    assert_eq!(forecast.days.len(), 2);
}

#[tokio::test]
async fn missing_station_page_is_a_network_error() {
    let client = standard_client();

    let err = client.current_observation(42182_u32).await.unwrap_err();

    match err {
        ImdError::Network { url, attempts, .. } => {
            assert_eq!(url, format!("{STANDARD_PAGE_URL_PREFIX}42182"));
            assert_eq!(attempts, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
