//! Client facade: resolve a station, fetch its page, extract records.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::Config;
use crate::directory::{StationDirectory, StationQuery};
use crate::error::{ImdError, Result};
use crate::extract::{extract_current_observation, extract_forecast};
use crate::fetch::{Fetcher, ReqwestTransport, Transport};
use crate::model::{CurrentObservation, Forecast, Station};

/// Entry point for station lookups and weather queries.
///
/// One station page holds both the observation and forecast tables; use
/// [`ImdClient::report`] to get both from a single fetch.
#[derive(Debug)]
pub struct ImdClient<T = ReqwestTransport> {
    fetcher: Arc<Fetcher<T>>,
    directory: StationDirectory<T>,
    station_url_prefix: String,
}

impl ImdClient<ReqwestTransport> {
    pub fn new(config: &Config) -> Result<Self> {
        let transport =
            ReqwestTransport::new(config.fetch_options()).map_err(|e| ImdError::Wrapped {
                context: "failed to build HTTP client",
                message: e.to_string(),
            })?;
        Self::with_transport(transport, config)
    }
}

impl<T: Transport> ImdClient<T> {
    pub fn with_transport(transport: T, config: &Config) -> Result<Self> {
        let station_url_prefix = config
            .station_url_prefix()
            .map_err(|e| ImdError::Wrapped {
                context: "invalid configuration",
                message: e.to_string(),
            })?
            .to_string();

        let fetcher = Arc::new(Fetcher::new(transport, config.fetch_options().clone()));
        let directory = StationDirectory::new(Arc::clone(&fetcher), config.directory_url());

        Ok(Self {
            fetcher,
            directory,
            station_url_prefix,
        })
    }

    pub fn transport(&self) -> &T {
        self.fetcher.transport()
    }

    pub fn station_url(&self, id: u32) -> String {
        format!("{}{}", self.station_url_prefix, id)
    }

    /// All stations, sorted by id; `refresh` forces a new directory fetch.
    pub async fn list_stations(&self, refresh: bool) -> Result<Vec<Station>> {
        let stations = self
            .directory
            .stations(refresh)
            .await
            .map_err(|e| e.wrap("failed to fetch stations"))?;
        Ok(stations.to_vec())
    }

    pub async fn find_stations(&self, query: &str, exact: bool) -> Result<Vec<Station>> {
        self.directory
            .find(query, exact)
            .await
            .map_err(|e| e.wrap("failed to search stations"))
    }

    pub async fn station(&self, id: u32) -> Result<Option<Station>> {
        self.directory
            .station(id)
            .await
            .map_err(|e| e.wrap("failed to fetch stations"))
    }

    #[instrument(skip(self, identifier))]
    pub async fn current_observation(
        &self,
        identifier: impl Into<StationQuery>,
    ) -> Result<CurrentObservation> {
        let (id, html) = self.station_page(identifier.into()).await?;

        let mut observation = extract_current_observation(&html)
            .map_err(|e| e.wrap("failed to get current weather"))?;
        observation.station_id = Some(id);
        Ok(observation)
    }

    #[instrument(skip(self, identifier))]
    pub async fn forecast(&self, identifier: impl Into<StationQuery>) -> Result<Forecast> {
        let (id, html) = self.station_page(identifier.into()).await?;

        let mut forecast =
            extract_forecast(&html).map_err(|e| e.wrap("failed to get forecast"))?;
        forecast.station_id = Some(id);
        Ok(forecast)
    }

    /// Current observation and forecast from one page fetch.
    #[instrument(skip(self, identifier))]
    pub async fn report(
        &self,
        identifier: impl Into<StationQuery>,
    ) -> Result<(CurrentObservation, Forecast)> {
        let (id, html) = self.station_page(identifier.into()).await?;

        let extract = || -> Result<(CurrentObservation, Forecast)> {
            let mut observation = extract_current_observation(&html)?;
            observation.station_id = Some(id);
            let mut forecast = extract_forecast(&html)?;
            forecast.station_id = Some(id);
            Ok((observation, forecast))
        };
        extract().map_err(|e| e.wrap("failed to get complete weather data"))
    }

    async fn station_page(&self, query: StationQuery) -> Result<(u32, String)> {
        let id = self
            .directory
            .resolve(&query)
            .await
            .map_err(|e| e.wrap("failed to resolve station"))?;

        let url = self.station_url(id);
        let body = self.fetcher.fetch(&url).await?;
        info!(station_id = id, bytes = body.len(), "fetched station page");

        Ok((id, String::from_utf8_lossy(&body).into_owned()))
    }
}
