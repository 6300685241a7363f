//! Core library for the `imd` CLI.
//!
//! This crate defines:
//! - A resilient fetch layer (retries, backoff, certificate fallback)
//! - Extraction of observations, forecasts and the station directory from
//!   IMD city weather pages
//! - Station directory caching and name/id resolution
//! - Configuration and shared domain models
//!
//! It is used by `imd-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod normalize;

pub use client::ImdClient;
pub use config::{Config, StationPage};
pub use directory::{StationDirectory, StationQuery};
pub use error::{ImdError, Result};
pub use fetch::{FetchOptions, Fetcher, ReqwestTransport, Transport, TransportError};
pub use model::{CurrentObservation, Forecast, ForecastDay, ObservationParameter, Station};
