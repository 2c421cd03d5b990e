use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("config validation failed: {0}")]
    Validation(String),

    #[error("failed to read target file {path}: {source}")]
    InputFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no profile or company URLs found in {path}")]
    NoTargets { path: String },
}

/// A target string from which no public identifier could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no profile or company identifier found in \"{raw}\"")]
pub struct TargetError {
    pub raw: String,
}
