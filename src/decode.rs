use crate::{
    types::RowSet,
    wire::{self, RequestEnvelope},
    Column, DriverError, Params, Value,
};

pub(crate) fn build_request(
    database: &str,
    sql: &str,
    params: Params,
) -> Result<RequestEnvelope, DriverError> {
    let args = params
        .into_values()
        .into_iter()
        .map(encode_value)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RequestEnvelope {
        database: database.to_owned(),
        query: sql.to_owned(),
        args,
    })
}

/// Aligns the response rows with the column list.
///
/// Keyed rows are reordered to `columns`; when the adapter omits `columns`,
/// the keys of the first keyed row define them.
pub(crate) fn decode_row_set(data: wire::ResultData) -> RowSet {
    let wire::ResultData {
        columns,
        types,
        rows,
        ..
    } = data;

    let names = if columns.is_empty() {
        rows.iter()
            .find_map(|row| match row {
                wire::Row::Keyed(map) => Some(map.keys().cloned().collect::<Vec<_>>()),
                wire::Row::Positional(_) => None,
            })
            .unwrap_or_default()
    } else {
        columns
    };

    let rows: Vec<Vec<Value>> = rows
        .into_iter()
        .map(|row| match row {
            wire::Row::Positional(values) => values.into_iter().map(decode_value).collect(),
            wire::Row::Keyed(mut map) => names
                .iter()
                .map(|name| map.remove(name).map_or(Value::Null, decode_value))
                .collect(),
        })
        .collect();

    let mut types = types.into_iter();
    let columns: Vec<Column> = names
        .into_iter()
        .map(|name| Column {
            name,
            decltype: types.next().filter(|decltype| !decltype.is_empty()),
        })
        .collect();

    RowSet { columns, rows }
}

/// Maps a JSON cell onto a [`Value`]. Nested arrays and objects are kept as
/// their JSON text, as are integers above `i64::MAX` so no digits are lost.
pub(crate) fn decode_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(value) => Value::Bool(value),
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(integer) => Value::Integer(integer),
            None if number.is_u64() => Value::Text(number.to_string()),
            None => number.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_json::Value::String(text) => Value::Text(text),
        nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
            Value::Text(nested.to_string())
        }
    }
}

fn encode_value(value: Value) -> Result<serde_json::Value, DriverError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(value) => Ok(serde_json::Value::Bool(value)),
        Value::Integer(value) => Ok(value.into()),
        Value::Float(value) => serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .ok_or_else(|| {
                DriverError::Validation(format!(
                    "non-finite float parameter '{value}' is unsupported"
                ))
            }),
        Value::Text(value) => Ok(serde_json::Value::String(value)),
    }
}
