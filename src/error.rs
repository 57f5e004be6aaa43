/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Invalid argument supplied by the caller. Never reaches the network.
    #[error("invalid argument: {0}")]
    Validation(String),
    /// The adapter answered with `success: false`.
    #[error("remote error from {host}:{port}: {status}")]
    Remote {
        /// Status text reported by the adapter.
        status: String,
        host: String,
        port: u16,
    },
    /// Transport or envelope fault while talking to the adapter.
    #[error("connection error to {host}:{port}: {source}")]
    Connection {
        #[source]
        source: TransportError,
        host: String,
        port: u16,
    },
    /// Operation attempted on a closed cursor, statement or connection.
    #[error("{0} is closed")]
    Closed(&'static str),
    /// Unknown column name or index.
    #[error("invalid column: {0}")]
    InvalidColumn(String),
    /// Cell holds a different kind of value than the typed accessor reads.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Column access while the cursor is not positioned on a row.
    #[error("cursor is not positioned on a row")]
    NoCurrentRow,
    /// Operation the driver deliberately does not implement.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),
}

impl DriverError {
    /// Returns the adapter host and port for errors raised while talking to it.
    pub fn endpoint(&self) -> Option<(&str, u16)> {
        match self {
            Self::Remote { host, port, .. } | Self::Connection { host, port, .. } => {
                Some((host.as_str(), *port))
            }
            _ => None,
        }
    }
}

/// Underlying cause of a [`DriverError::Connection`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network or request execution error from `reqwest`.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    /// Envelope could not be encoded, or the response body was not an envelope.
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
    /// I/O fault raised by a custom transport.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
