use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Parameters rejected before any simulation state is created
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A timer was requested to go back in time, which is a logic defect in the model
    #[error("invalid timer duration {0}")]
    InvalidDuration(f64),
    #[error("sweep results have no group `{0}`")]
    MissingGroup(String),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Others(#[from] anyhow::Error),
}

/// A type alias that forces the usage of the custom error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<tracing_subscriber::util::TryInitError> for Error {
    fn from(err: tracing_subscriber::util::TryInitError) -> Self {
        Self::Others(anyhow::Error::from(err))
    }
}

impl From<rand_distr::ExpError> for Error {
    fn from(err: rand_distr::ExpError) -> Self {
        Self::InvalidConfig(format!("arrival distribution: {}", err))
    }
}
