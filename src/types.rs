/// Column metadata reported by the adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Declared type, e.g. `INTEGER` or `DATETIME`, when the adapter sends one.
    pub decltype: Option<String>,
}

/// Column names and row values decoded from one response envelope.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RowSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<crate::Value>>,
}
