use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("request to {endpoint} returned status {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("response from {endpoint} has no result set named {name}")]
    MissingResultSet { endpoint: String, name: String },

    #[error("row {row} has {actual} values but the header has {expected} columns")]
    ShapeMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("game {0} is not in the game index")]
    MissingGame(String),

    #[error("player {0} is not in the roster index")]
    MissingPlayer(i64),

    #[error("game {game_id} has an unparseable date {value:?}")]
    DateFormat { game_id: String, value: String },

    #[error("zone area {0:?} is not of the form name(abbreviation)")]
    ZoneParse(String),

    #[error("record is missing column {0}")]
    MissingField(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

impl FetchError {
    /// Upstream failures: the call itself failed or answered with something unusable.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::Transport { .. } | FetchError::Status { .. } | FetchError::MissingResultSet { .. }
        )
    }
}
