use crate::DriverError;

/// Connection properties for a CovenantSQL adapter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectOptions {
    /// Adapter host name or address.
    pub host: String,
    /// Adapter port.
    pub port: u16,
    /// Target database identifier.
    pub database: String,
    /// Use `https` instead of `http`.
    pub ssl: bool,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 11105,
            database: String::new(),
            ssl: false,
            timeout_ms: 10_000,
        }
    }
}

impl ConnectOptions {
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn with_ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Reads options from the environment.
    ///
    /// - `COVENANTSQL_HOST` (default `127.0.0.1`)
    /// - `COVENANTSQL_PORT` (default `11105`)
    /// - `COVENANTSQL_DATABASE` (required)
    /// - `COVENANTSQL_SSL` (`true`/`1` enables https)
    pub fn from_env() -> Result<Self, DriverError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DriverError> {
        let mut options = Self::default();

        if let Some(host) = lookup("COVENANTSQL_HOST").filter(|host| !host.trim().is_empty()) {
            options.host = host.trim().to_owned();
        }
        if let Some(port) = lookup("COVENANTSQL_PORT") {
            options.port = port.trim().parse().map_err(|err| {
                DriverError::Validation(format!("invalid COVENANTSQL_PORT '{port}': {err}"))
            })?;
        }
        options.database = lookup("COVENANTSQL_DATABASE")
            .map(|database| database.trim().to_owned())
            .filter(|database| !database.is_empty())
            .ok_or_else(|| {
                DriverError::Validation("missing COVENANTSQL_DATABASE environment variable".to_owned())
            })?;
        if let Some(ssl) = lookup("COVENANTSQL_SSL") {
            options.ssl = matches!(ssl.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(options)
    }

    /// Returns `{scheme}://{host}:{port}` for the adapter.
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}
