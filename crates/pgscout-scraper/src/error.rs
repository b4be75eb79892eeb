use thiserror::Error;

/// Why a single browser step failed.
///
/// Callers pick a policy per variant: extractors degrade to an empty result,
/// the navigator moves to its next candidate, the orchestrator skips a term.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("{step} timed out after {secs}s")]
    Timeout { step: &'static str, secs: u64 },

    #[error("no element matches {0}")]
    SelectorNotFound(String),

    #[error("page evaluation failed: {0}")]
    Evaluation(String),

    #[error("browsing surface already closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("cannot reach results page for \"{query}\"")]
    NavigationExhausted { query: String },

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("failed to read patterns file {path}: {source}")]
    PatternsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse patterns file: {0}")]
    PatternsFileParse(#[from] serde_yaml::Error),
}
