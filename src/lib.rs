//! `covenantsql-http` is a blocking SQL driver for the CovenantSQL HTTP adapter.
//!
//! Statements are submitted as JSON envelopes to two endpoints:
//! - `/v1/query` for reads, surfaced through a [`ResultCursor`]
//! - `/v1/exec` for writes, surfaced through [`Statement::update_count`]
//!
//! The whole result of a query is fetched eagerly; the cursor only limits how
//! many of the fetched rows are visible.

mod compat;
mod connection;
mod cursor;
mod decode;
mod error;
mod options;
mod params;
mod prepared;
mod sql;
mod statement;
mod transport;
mod types;
mod value;
mod wire;

pub use compat::{ConnectionCompat, StatementCompat, Wrapper};
pub use connection::Connection;
pub use cursor::{ColumnIndex, ResultCursor};
pub use error::{DriverError, TransportError};
pub use options::ConnectOptions;
pub use params::Params;
pub use prepared::{PreparedStatement, MAX_PARAMETERS};
pub use sql::{extract_table_name, is_select};
pub use statement::{Statement, NO_UPDATE_COUNT};
pub use transport::{HttpTransport, Transport};
pub use types::Column;
pub use value::Value;

pub use chrono::NaiveDateTime;

pub type Result<T> = std::result::Result<T, DriverError>;
