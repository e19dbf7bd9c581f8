use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid config value {key}={value:?}: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot read symbols file {path}: {source}")]
    SymbolsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed symbols file {path}: {source}")]
    SymbolsJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("http server failed: {0}")]
    Server(#[from] std::io::Error),
}
