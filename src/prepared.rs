use crate::{DriverError, Params, Result, ResultCursor, Statement, Value};

/// Highest number of positional parameters a statement accepts.
pub const MAX_PARAMETERS: usize = 65_535;

/// SQL text with positionally bound parameters.
///
/// Parameters are substituted by the adapter in order; no type inference is
/// done on the client.
#[derive(Debug)]
pub struct PreparedStatement {
    sql: String,
    params: Vec<Value>,
    statement: Statement,
}

impl PreparedStatement {
    pub(crate) fn new(sql: String, statement: Statement) -> Self {
        Self {
            sql,
            params: Vec::new(),
            statement,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Binds `value` at the 0-based position `index`. Unbound positions
    /// before it are sent as `NULL`.
    ///
    /// Fails with [`DriverError::Validation`] when `index` is not below
    /// [`MAX_PARAMETERS`]; nothing is allocated in that case.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<&mut Self> {
        let len = index
            .checked_add(1)
            .filter(|len| *len <= MAX_PARAMETERS)
            .ok_or_else(|| {
                DriverError::Validation(format!(
                    "parameter index {index} exceeds the limit of {MAX_PARAMETERS}"
                ))
            })?;
        if len > self.params.len() {
            self.params.resize(len, Value::Null);
        }
        self.params[index] = value.into();
        Ok(self)
    }

    /// Binds `value` at the next free position.
    pub fn bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.params.push(value.into());
        self
    }

    pub fn clear_parameters(&mut self) {
        self.params.clear();
    }

    pub fn parameters(&self) -> &[Value] {
        &self.params
    }

    pub fn execute_query(&mut self) -> Result<&mut ResultCursor> {
        let params = Params::from(self.params.as_slice());
        self.statement.execute_query(&self.sql, params)
    }

    pub fn execute_update(&mut self) -> Result<usize> {
        let params = Params::from(self.params.as_slice());
        self.statement.execute_update(&self.sql, params)
    }

    pub fn execute(&mut self) -> Result<bool> {
        let params = Params::from(self.params.as_slice());
        self.statement.execute(&self.sql, params)
    }

    /// Underlying statement holding the cursor and update count.
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn statement_mut(&mut self) -> &mut Statement {
        &mut self.statement
    }

    pub fn close(&mut self) {
        self.statement.close();
    }
}
