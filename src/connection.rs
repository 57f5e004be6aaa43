use std::{fmt, sync::Arc};

use crate::{
    ConnectOptions, DriverError, HttpTransport, PreparedStatement, Result, Statement, Transport,
};

/// Open session with a CovenantSQL adapter.
///
/// The connection holds no network state of its own: it shares one transport
/// with every statement it opens.
pub struct Connection {
    transport: Arc<dyn Transport>,
    options: Arc<ConnectOptions>,
    closed: bool,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Opens a connection using the default HTTP transport.
    pub fn open(options: ConnectOptions) -> Result<Self> {
        let transport = HttpTransport::new(options.timeout_ms).map_err(|source| {
            DriverError::Connection {
                source,
                host: options.host.clone(),
                port: options.port,
            }
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            base_url = %options.base_url(),
            database = %options.database,
            "opened connection"
        );

        Ok(Self::with_transport(options, Arc::new(transport)))
    }

    /// Opens a connection over a caller-provided transport.
    pub fn with_transport(options: ConnectOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            options: Arc::new(options),
            closed: false,
        }
    }

    pub fn create_statement(&self) -> Result<Statement> {
        self.ensure_open()?;
        Ok(Statement::new(self.transport.clone(), self.options.clone()))
    }

    pub fn prepare(&self, sql: impl Into<String>) -> Result<PreparedStatement> {
        Ok(PreparedStatement::new(sql.into(), self.create_statement()?))
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Closes the connection. Statements already opened keep working until
    /// they are closed themselves.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(DriverError::Closed("connection"));
        }
        Ok(())
    }
}
