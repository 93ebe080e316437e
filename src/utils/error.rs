use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({endpoint}): {status}, {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Missing '{field}' (or '{alias}') field in data from endpoint '{endpoint}'")]
    Schema {
        endpoint: String,
        field: String,
        alias: String,
    },

    #[error("Fetching '{endpoint}' failed on page {page}: {source}")]
    FetchFailure {
        endpoint: String,
        page: u64,
        #[source]
        source: Box<ReportError>,
    },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Data processing error: {message}")]
    Processing { message: String },
}

impl ReportError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether a caller could reasonably try again. The fetch engine itself never does.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::FetchFailure { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidConfig { message } => format!("Configuration problem: {}", message),
            Self::MissingConfig { field } => {
                format!("Missing setting '{}'. Check your environment or .env file.", field)
            }
            Self::Transport(e) if e.is_timeout() => {
                "The API did not answer in time. Try again later.".to_string()
            }
            Self::Transport(_) => "Could not reach the API. Check your network connection.".to_string(),
            Self::Api { status: 401, .. } | Self::Api { status: 403, .. } => {
                "The API rejected the credentials. Check API_LOGIN and API_PASSWORD.".to_string()
            }
            Self::Api {
                endpoint, status, ..
            } => format!("The API returned status {} for '{}'.", status, endpoint),
            Self::Schema {
                endpoint, field, ..
            } => format!("Data from '{}' has no '{}' column.", endpoint, field),
            Self::FetchFailure { endpoint, source, .. } => format!(
                "Downloading '{}' failed: {}",
                endpoint,
                source.user_friendly_message()
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
