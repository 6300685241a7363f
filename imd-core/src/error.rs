//! Error family shared by every layer of the core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImdError>;

#[derive(Debug, Error)]
pub enum ImdError {
    /// The fetch layer ran out of attempts.
    #[error("failed to fetch {url} after {attempts} attempts: {last_error}")]
    Network {
        url: String,
        attempts: u32,
        last_error: String,
    },

    /// A structural marker (table caption, header row, directory options)
    /// is missing from otherwise valid HTML.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The identifier did not resolve to exactly one station.
    #[error("{0}")]
    StationNotFound(String),

    /// Anything else the client facade surfaces, carrying the original message.
    #[error("{context}: {message}")]
    Wrapped {
        context: &'static str,
        message: String,
    },
}

impl ImdError {
    pub fn is_network(&self) -> bool {
        matches!(self, ImdError::Network { .. })
    }

    pub fn is_station_not_found(&self) -> bool {
        matches!(self, ImdError::StationNotFound(_))
    }

    /// Keep `Network` and `StationNotFound` as they are, wrap everything else.
    pub(crate) fn wrap(self, context: &'static str) -> Self {
        match self {
            ImdError::Network { .. } | ImdError::StationNotFound(_) => self,
            other => ImdError::Wrapped {
                context,
                message: other.to_string(),
            },
        }
    }
}
