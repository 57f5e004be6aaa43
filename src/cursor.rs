use chrono::NaiveDateTime;

use crate::{types::RowSet, Column, DriverError, Result, Value};

const TEMPORAL_TYPES: [&str; 3] = ["DATE", "DATETIME", "TIMESTAMP"];

fn is_temporal_type(decltype: &str) -> bool {
    let base = decltype.trim().split(['(', ' ']).next().unwrap_or_default();
    TEMPORAL_TYPES
        .iter()
        .any(|temporal| base.eq_ignore_ascii_case(temporal))
}

/// Column selector accepted by [`ResultCursor::get`].
///
/// Implemented for 0-based `usize` indices and for column names, which are
/// matched ASCII case-insensitively.
pub trait ColumnIndex {
    fn resolve(&self, columns: &[Column], width: usize) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn resolve(&self, _columns: &[Column], width: usize) -> Result<usize> {
        if *self < width {
            Ok(*self)
        } else {
            Err(DriverError::InvalidColumn(format!(
                "index {self} out of range for {width} columns"
            )))
        }
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, columns: &[Column], width: usize) -> Result<usize> {
        columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(self))
            .filter(|idx| *idx < width)
            .ok_or_else(|| DriverError::InvalidColumn((*self).to_owned()))
    }
}

impl ColumnIndex for String {
    fn resolve(&self, columns: &[Column], width: usize) -> Result<usize> {
        self.as_str().resolve(columns, width)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    OnRow(usize),
    Exhausted,
}

/// Forward-only view over rows that were fetched in full by one execution.
///
/// The cursor owns the complete row snapshot; `max_rows` only limits how many
/// of those rows [`advance`](Self::advance) will visit.
#[derive(Debug)]
pub struct ResultCursor {
    columns: Vec<Column>,
    // `None` once closed.
    rows: Option<Vec<Vec<Value>>>,
    position: Position,
    max_rows: u64,
    database: String,
    table_name: String,
}

impl ResultCursor {
    pub(crate) fn new(
        row_set: RowSet,
        database: impl Into<String>,
        table_name: impl Into<String>,
        max_rows: u64,
    ) -> Self {
        Self {
            columns: row_set.columns,
            rows: Some(row_set.rows),
            position: Position::BeforeFirst,
            max_rows,
            database: database.into(),
            table_name: table_name.into(),
        }
    }

    /// Cursor with no columns and no rows, left on a statement after a write.
    pub fn empty() -> Self {
        Self::new(RowSet::default(), "", "", 0)
    }

    /// Moves to the next visible row. Returns `false` once no row remains.
    pub fn advance(&mut self) -> Result<bool> {
        let rows = self.rows.as_ref().ok_or(DriverError::Closed("cursor"))?;

        let next = match self.position {
            Position::BeforeFirst => 0,
            Position::OnRow(idx) => idx + 1,
            Position::Exhausted => return Ok(false),
        };

        let capped = self.max_rows > 0 && next as u64 >= self.max_rows;
        if capped || next >= rows.len() {
            self.position = Position::Exhausted;
            return Ok(false);
        }

        self.position = Position::OnRow(next);
        Ok(true)
    }

    /// Returns a value of the current row by 0-based index or column name.
    pub fn get<I: ColumnIndex>(&self, column: I) -> Result<&Value> {
        self.cell(column).map(|(_, value)| value)
    }

    /// Reads a date/time cell of the current row. `NULL` yields `None`.
    ///
    /// Fails with [`DriverError::TypeMismatch`] when the column is declared
    /// with a non-temporal type, or when the cell is not date/time text.
    pub fn get_datetime<I: ColumnIndex>(&self, column: I) -> Result<Option<NaiveDateTime>> {
        let (idx, value) = self.cell(column)?;
        let declared = self.columns.get(idx).and_then(|col| col.decltype.as_deref());
        if let Some(decltype) = declared.filter(|decltype| !is_temporal_type(decltype)) {
            return Err(DriverError::TypeMismatch(format!(
                "column {idx} is declared {decltype}, not a date/time type"
            )));
        }

        match value {
            Value::Null => Ok(None),
            Value::Text(text) => value.as_datetime().map(Some).ok_or_else(|| {
                DriverError::TypeMismatch(format!("'{text}' is not a date/time value"))
            }),
            other => Err(DriverError::TypeMismatch(format!(
                "expected date/time text, found {other:?}"
            ))),
        }
    }

    fn cell<I: ColumnIndex>(&self, column: I) -> Result<(usize, &Value)> {
        let rows = self.rows.as_ref().ok_or(DriverError::Closed("cursor"))?;
        let Position::OnRow(row_idx) = self.position else {
            return Err(DriverError::NoCurrentRow);
        };
        let row = rows.get(row_idx).ok_or(DriverError::NoCurrentRow)?;
        let idx = column.resolve(&self.columns, row.len())?;
        Ok((idx, &row[idx]))
    }

    /// Closes the cursor and drops its rows. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.rows = None;
    }

    pub fn is_closed(&self) -> bool {
        self.rows.is_none()
    }

    pub fn columns(&self) -> Result<&[Column]> {
        if self.is_closed() {
            return Err(DriverError::Closed("cursor"));
        }
        Ok(&self.columns)
    }

    /// Database the rows were read from.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Table label guessed from the query text; diagnostic only.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn max_rows(&self) -> u64 {
        self.max_rows
    }
}
