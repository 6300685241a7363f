use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use imd_core::{Config, ImdClient, StationPage, StationQuery};
use inquire::{CustomType, Select, Text};
use serde::Serialize;
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "imd", version, about = "IMD city weather CLI")]
pub struct Cli {
    /// Log fetch and extraction details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the station page, default station and retry policy.
    Configure,

    /// List every station in the directory.
    Stations {
        /// Fetch the directory again instead of reusing the loaded one.
        #[arg(long)]
        refresh: bool,
    },

    /// Find stations by name.
    Search {
        query: String,

        /// Require the whole name to match.
        #[arg(long)]
        exact: bool,
    },

    /// Past 24 hours observation for a station.
    Current {
        /// Station name or numeric id; defaults to the configured station.
        station: Option<String>,
    },

    /// Multi-day forecast for a station.
    Forecast {
        /// Station name or numeric id; defaults to the configured station.
        station: Option<String>,

        /// Only print the first N days.
        #[arg(long, conflicts_with = "date")]
        days: Option<usize>,

        /// Only print the day matching this date, as `27-May` or `2025-05-27`.
        #[arg(long)]
        date: Option<String>,
    },

    /// Observation and forecast from a single page fetch.
    Report {
        /// Station name or numeric id; defaults to the configured station.
        station: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    current: &'a imd_core::CurrentObservation,
    forecast: &'a imd_core::Forecast,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;
        let client = || ImdClient::new(&config);

        match self.command {
            Command::Configure => configure(config.clone())?,
            Command::Stations { refresh } => {
                print_json(&client()?.list_stations(refresh).await?)?;
            }
            Command::Search { query, exact } => {
                print_json(&client()?.find_stations(&query, exact).await?)?;
            }
            Command::Current { station } => {
                let query = station_query(station, &config)?;
                print_json(&client()?.current_observation(query).await?)?;
            }
            Command::Forecast {
                station,
                days,
                date,
            } => {
                let query = station_query(station, &config)?;
                let mut forecast = client()?.forecast(query).await?;

                if let Some(date) = date {
                    let day = forecast.day(&date).ok_or_else(|| {
                        anyhow!("No forecast for '{date}' at {}", forecast.station_name)
                    })?;
                    print_json(day)?;
                } else {
                    if let Some(days) = days {
                        forecast.days = forecast.first_days(days).to_vec();
                    }
                    print_json(&forecast)?;
                }
            }
            Command::Report { station } => {
                let query = station_query(station, &config)?;
                let (current, forecast) = client()?.report(query).await?;
                print_json(&Report {
                    current: &current,
                    forecast: &forecast,
                })?;
            }
        }

        Ok(())
    }
}

/// Explicit argument first, then `default_station` from the config file.
fn station_query(station: Option<String>, config: &Config) -> Result<StationQuery> {
    let text = station
        .or_else(|| config.default_station.clone())
        .ok_or_else(|| {
            anyhow!(
                "No station given and no default station configured. \
                 Run `imd configure` or pass a station."
            )
        })?;

    let query = StationQuery::parse(&text);
    debug!(%query, "station query");
    Ok(query)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn configure(mut config: Config) -> Result<()> {
    let current_page = config.station_page()?;
    let pages = StationPage::all().to_vec();
    let cursor = pages.iter().position(|p| *p == current_page).unwrap_or(0);

    let page = Select::new("Station page:", pages)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Failed to read station page")?;
    config.set_station_page(page);

    let default_station = Text::new("Default station (name or id, empty for none):")
        .with_initial_value(config.default_station.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read default station")?;
    let default_station = default_station.trim();
    config.default_station = (!default_station.is_empty()).then(|| default_station.to_string());

    config.fetch.max_retries = CustomType::<u32>::new("Retries after a failed request:")
        .with_default(config.fetch.max_retries)
        .with_error_message("Please enter a whole number")
        .prompt()
        .context("Failed to read retry count")?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
