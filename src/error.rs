use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepoLensError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid repository key: {0}")]
    InvalidKey(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("error checking {check}: {source}")]
    EligibilityCheck {
        check: &'static str,
        #[source]
        source: Box<RepoLensError>,
    },

    #[error("all {0} contributor detail requests failed")]
    AllProfilesFailed(usize),

    #[error("worker pool is shut down")]
    PoolClosed,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepoLensError {
    pub fn check(check: &'static str, source: RepoLensError) -> Self {
        Self::EligibilityCheck {
            check,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, RepoLensError>;
