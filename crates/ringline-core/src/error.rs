/// Core error type for the ringline system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} is not set")]
    MissingConfig(&'static str),

    #[error("CSV parse error: {0}")]
    Csv(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Failure reported by a [`ProviderGateway`](crate::traits::ProviderGateway).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("failed to read private key {path}: {reason}")]
    KeyMaterial { path: String, reason: String },

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("{0}")]
    Transport(String),
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}
