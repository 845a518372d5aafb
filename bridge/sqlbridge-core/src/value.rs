//!
//! Bridge Value Types
//!
//! `BindValue` is one positional statement parameter. `RowSet` is a fully
//! materialized query result where every row maps column names (in query
//! column order) to the string form of the cell. `InvocationResult` is the
//! envelope handed back to the host, either directly or through a callback.
//!
//! Envelope JSON shape:
//! - `{"result": true}` for open/close/execute
//! - `{"result": [{"id": "1", "name": "a"}]}` for query
//! - `{"result": 2, "error": "..."}` for batch execution
//! - `{"result": null}` when nothing was produced
//!

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::BridgeError;

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

impl BindValue {
    /// Converts one element of a host `bind` array.
    ///
    /// Nested arrays and objects have no scalar form and are bound as their
    /// compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BindValue::Integer(i),
                None => BindValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => BindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Text(value.to_string()),
        }
    }

    pub fn list_from_json(values: &[Value]) -> Vec<BindValue> {
        values.iter().map(BindValue::from_json).collect()
    }
}

/// One materialized row. Keys keep the query's column order.
pub type Row = IndexMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// The payload slot of an envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultValue {
    #[default]
    None,
    Boolean(bool),
    Integer(i64),
    Rows(RowSet),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvocationResult {
    result: ResultValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl InvocationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            result: ResultValue::Boolean(value),
            error: None,
        }
    }

    /// Envelope for an operation that raised before producing a result.
    pub fn failed(err: &BridgeError) -> Self {
        Self {
            result: ResultValue::None,
            error: Some(err.to_string()),
        }
    }

    pub fn set_boolean(&mut self, value: bool) {
        self.result = ResultValue::Boolean(value);
    }

    pub fn set_integer(&mut self, value: i64) {
        self.result = ResultValue::Integer(value);
    }

    pub fn set_rows(&mut self, rows: RowSet) {
        self.result = ResultValue::Rows(rows);
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn value(&self) -> &ResultValue {
        &self.result
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.result {
            ResultValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.result {
            ResultValue::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&RowSet> {
        match &self.result {
            ResultValue::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn to_json(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self)?)
    }
}
