use thiserror::Error;

/// Failure of the fetch collaborator. Never reaches the extraction engine.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status} for url: {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("could not build HTTP client: {0}")]
    Client(String),
}

/// Process-level outcomes that replace a product record in the output.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] FetchError),

    #[error("No parser matched")]
    NoParserMatch,
}
