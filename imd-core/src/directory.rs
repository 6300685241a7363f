//! Station directory snapshot and identifier resolution.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::error::{ImdError, Result};
use crate::extract::extract_station_directory;
use crate::fetch::{Fetcher, Transport};
use crate::model::Station;

/// How many candidate names an ambiguity error lists.
const MAX_SUGGESTIONS: usize = 5;

/// A station id, or a (partial) station name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationQuery {
    Id(u32),
    Name(String),
}

impl StationQuery {
    /// All-digit text is an id, anything else a name.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = text.parse() {
                return StationQuery::Id(id);
            }
        }
        StationQuery::Name(text.to_string())
    }
}

impl From<u32> for StationQuery {
    fn from(id: u32) -> Self {
        StationQuery::Id(id)
    }
}

impl From<&str> for StationQuery {
    fn from(name: &str) -> Self {
        StationQuery::Name(name.to_string())
    }
}

impl From<String> for StationQuery {
    fn from(name: String) -> Self {
        StationQuery::Name(name)
    }
}

impl FromStr for StationQuery {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(StationQuery::parse(s))
    }
}

impl fmt::Display for StationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationQuery::Id(id) => write!(f, "{id}"),
            StationQuery::Name(name) => f.write_str(name),
        }
    }
}

/// Stations whose display or cleaned name contains `term` (or equals it,
/// when `exact`), ignoring case and surrounding whitespace.
pub fn find_matches<'a>(stations: &'a [Station], term: &str, exact: bool) -> Vec<&'a Station> {
    let term = term.trim().to_lowercase();
    stations
        .iter()
        .filter(|s| {
            let display = s.display_name.to_lowercase();
            let cleaned = s.cleaned_name.to_lowercase();
            if exact {
                term == display || term == cleaned
            } else {
                display.contains(&term) || cleaned.contains(&term)
            }
        })
        .collect()
}

/// Resolve `query` against a directory snapshot to exactly one station id.
pub fn resolve_in(stations: &[Station], query: &StationQuery) -> Result<u32> {
    let term = match query {
        StationQuery::Id(id) => {
            return stations
                .iter()
                .any(|s| s.id == *id)
                .then_some(*id)
                .ok_or_else(|| {
                    ImdError::StationNotFound(format!("station with id {id} not found"))
                });
        }
        StationQuery::Name(name) => name.trim(),
    };

    if term.is_empty() {
        return Err(ImdError::StationNotFound("station name is empty".into()));
    }

    let matches = find_matches(stations, term, false);
    match matches.as_slice() {
        [] => Err(ImdError::StationNotFound(format!(
            "no stations found matching '{term}'"
        ))),
        [only] => Ok(only.id),
        _ => {
            if let [only] = find_matches(stations, term, true).as_slice() {
                return Ok(only.id);
            }

            let names = matches
                .iter()
                .take(MAX_SUGGESTIONS)
                .map(|s| s.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Err(ImdError::StationNotFound(format!(
                "multiple stations found matching '{term}', please be more specific. Matches: {names}"
            )))
        }
    }
}

#[derive(Debug)]
enum Snapshot {
    Empty,
    Populated(Arc<[Station]>),
}

/// Lazily loaded station directory.
///
/// The list is fetched on first use and kept until a forced refresh, which
/// swaps in a complete new list; readers holding the previous list keep it.
/// A failed refresh leaves the previous list in place.
#[derive(Debug)]
pub struct StationDirectory<T> {
    fetcher: Arc<Fetcher<T>>,
    url: String,
    snapshot: RwLock<Snapshot>,
}

impl<T: Transport> StationDirectory<T> {
    pub fn new(fetcher: Arc<Fetcher<T>>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
            snapshot: RwLock::new(Snapshot::Empty),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn is_loaded(&self) -> bool {
        matches!(*self.snapshot.read().await, Snapshot::Populated(_))
    }

    /// The current snapshot, fetching it first if empty or when `refresh`.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn stations(&self, refresh: bool) -> Result<Arc<[Station]>> {
        if !refresh {
            if let Snapshot::Populated(stations) = &*self.snapshot.read().await {
                return Ok(Arc::clone(stations));
            }
        }

        let body = self.fetcher.fetch(&self.url).await?;
        let stations: Arc<[Station]> =
            extract_station_directory(&String::from_utf8_lossy(&body))?.into();
        info!(stations = stations.len(), refresh, "loaded station directory");

        *self.snapshot.write().await = Snapshot::Populated(Arc::clone(&stations));
        Ok(stations)
    }

    pub async fn find(&self, query: &str, exact: bool) -> Result<Vec<Station>> {
        let stations = self.stations(false).await?;
        Ok(find_matches(&stations, query, exact)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn station(&self, id: u32) -> Result<Option<Station>> {
        let stations = self.stations(false).await?;
        Ok(stations.iter().find(|s| s.id == id).cloned())
    }

    pub async fn resolve(&self, query: &StationQuery) -> Result<u32> {
        let stations = self.stations(false).await?;
        let id = resolve_in(&stations, query)?;
        debug!(%query, id, "resolved station");
        Ok(id)
    }
}
