use thiserror::Error;

pub const INVALID_ARGUMENTS: &str = "INVALID_ARGUMENTS";
pub const FILE_NOT_FOUND: &str = "FILE_NOT_FOUND";
pub const UPLOAD_FAILED: &str = "UPLOAD_FAILED";

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("Missing required parameters")]
    InvalidArguments,

    #[error("File not found: {0}")]
    ResourceNotFound(String),

    #[error("Error creating file: {0}")]
    Staging(#[source] std::io::Error),

    #[error("{0}")]
    Network(#[source] reqwest::Error),

    #[error("Telegram API error: {status}")]
    RemoteRejection { status: u16, body: String },

    #[error("Forward task aborted: {0}")]
    Worker(String),
}

/// Terminal result of one forward request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success,
    FileNotFound,
    UploadFailed(String),
}

impl From<ForwardError> for UploadOutcome {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::ResourceNotFound(_) => UploadOutcome::FileNotFound,
            // Staging, transport and remote failures share one reply code.
            other => UploadOutcome::UploadFailed(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ForwardError {
    /// The request URL carries the bot token, so it never reaches the message.
    fn from(err: reqwest::Error) -> Self {
        ForwardError::Network(err.without_url())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
