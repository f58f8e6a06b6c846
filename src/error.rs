use std::path::PathBuf;

/// Errors that stop a run before or while it produces a report.
///
/// Per-file failures (a file vanishing mid-scan, a file that cannot be read
/// while hashing) are not represented here; they are logged and recovered
/// where they happen.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no directories to search were given")]
    NoRoots,

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("minimum size {min} is larger than maximum size {max}")]
    InvalidSizeRange { min: u64, max: u64 },

    #[error("worker thread count must be at least 1")]
    InvalidThreads,

    #[error("failed to read config file '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to start hash worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to initialize logging: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
