//! Parts of the usual SQL driver surface that the adapter protocol cannot
//! express.
//!
//! Every operation here is implemented explicitly and fails with
//! [`DriverError::NotSupported`]; none of them silently succeeds.

use std::any::{type_name, Any};

use crate::{Connection, DriverError, PreparedStatement, Result, ResultCursor, Statement};

/// Transaction, savepoint, callable-statement and session-metadata operations.
pub trait ConnectionCompat {
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
    fn auto_commit(&self) -> Result<bool>;
    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()>;
    fn set_transaction_isolation(&mut self, level: u32) -> Result<()>;
    fn set_savepoint(&mut self, name: Option<&str>) -> Result<String>;
    fn release_savepoint(&mut self, name: &str) -> Result<()>;
    fn rollback_to_savepoint(&mut self, name: &str) -> Result<()>;
    fn prepare_call(&self, sql: &str) -> Result<PreparedStatement>;
    fn client_info(&self, name: &str) -> Result<Option<String>>;
    fn set_client_info(&mut self, name: &str, value: &str) -> Result<()>;
    fn type_map(&self) -> Result<Vec<(String, String)>>;
}

impl ConnectionCompat for Connection {
    fn commit(&mut self) -> Result<()> {
        Err(DriverError::NotSupported("commit"))
    }

    fn rollback(&mut self) -> Result<()> {
        Err(DriverError::NotSupported("rollback"))
    }

    /// The adapter commits each statement as it runs; the mode can be neither
    /// queried nor changed.
    fn auto_commit(&self) -> Result<bool> {
        Err(DriverError::NotSupported("auto commit"))
    }

    fn set_auto_commit(&mut self, _auto_commit: bool) -> Result<()> {
        Err(DriverError::NotSupported("auto commit"))
    }

    fn set_transaction_isolation(&mut self, _level: u32) -> Result<()> {
        Err(DriverError::NotSupported("transaction isolation"))
    }

    fn set_savepoint(&mut self, _name: Option<&str>) -> Result<String> {
        Err(DriverError::NotSupported("savepoints"))
    }

    fn release_savepoint(&mut self, _name: &str) -> Result<()> {
        Err(DriverError::NotSupported("savepoints"))
    }

    fn rollback_to_savepoint(&mut self, _name: &str) -> Result<()> {
        Err(DriverError::NotSupported("savepoints"))
    }

    fn prepare_call(&self, _sql: &str) -> Result<PreparedStatement> {
        Err(DriverError::NotSupported("callable statements"))
    }

    fn client_info(&self, _name: &str) -> Result<Option<String>> {
        Err(DriverError::NotSupported("client info"))
    }

    fn set_client_info(&mut self, _name: &str, _value: &str) -> Result<()> {
        Err(DriverError::NotSupported("client info"))
    }

    fn type_map(&self) -> Result<Vec<(String, String)>> {
        Err(DriverError::NotSupported("type map"))
    }
}

/// Batching, cancellation and generated-key operations.
pub trait StatementCompat {
    fn add_batch(&mut self, sql: &str) -> Result<()>;
    fn execute_batch(&mut self) -> Result<Vec<i64>>;
    fn cancel(&mut self) -> Result<()>;
    fn generated_keys(&mut self) -> Result<ResultCursor>;
    fn set_fetch_size(&mut self, rows: u32) -> Result<()>;
}

impl StatementCompat for Statement {
    fn add_batch(&mut self, _sql: &str) -> Result<()> {
        Err(DriverError::NotSupported("batch execution"))
    }

    fn execute_batch(&mut self) -> Result<Vec<i64>> {
        Err(DriverError::NotSupported("batch execution"))
    }

    fn cancel(&mut self) -> Result<()> {
        Err(DriverError::NotSupported("cancel"))
    }

    /// Use [`Statement::last_insert_id`] instead.
    fn generated_keys(&mut self) -> Result<ResultCursor> {
        Err(DriverError::NotSupported("generated keys cursor"))
    }

    /// Results are always fetched in full.
    fn set_fetch_size(&mut self, _rows: u32) -> Result<()> {
        Err(DriverError::NotSupported("fetch size"))
    }
}

/// Checked access to the driver's concrete handle types.
pub trait Wrapper: Any + Sized {
    fn is_wrapper_for<T: Any>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    fn unwrap_as<T: Any>(&self) -> Result<&T> {
        (self as &dyn Any).downcast_ref::<T>().ok_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                from = type_name::<Self>(),
                to = type_name::<T>(),
                "rejected unwrap"
            );
            DriverError::NotSupported(type_name::<T>())
        })
    }
}

impl Wrapper for Connection {}
impl Wrapper for Statement {}
impl Wrapper for PreparedStatement {}
impl Wrapper for ResultCursor {}
