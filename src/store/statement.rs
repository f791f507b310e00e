//! Statements and the document matching rules shared by all engines.

use serde_json::{Map, Number, Value};

/// A stored entity: one JSON object per row.
pub type Document = Map<String, Value>;

/// What a connection should operate on.
///
/// `conditions` are ANDed equality conditions with JSONB containment
/// semantics (`data @> conditions`). `limit`, `offset` and `descending` only
/// affect `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub table: String,
    pub conditions: Document,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub descending: bool,
}

impl Statement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Conditions as a single JSON object, the shape bound to `@>`.
    pub fn filter_value(&self) -> Value {
        Value::Object(self.conditions.clone())
    }

    /// Whether a stored document satisfies every condition.
    pub fn matches(&self, doc: &Document) -> bool {
        contains_object(doc, &self.conditions)
    }
}

/// Zero values: `null`, `false`, `0`, `""`, `[]` and `{}`.
///
/// Zero fields of a template add no condition and zero fields of an update
/// value leave the stored field untouched.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) if n.is_f64() => n.as_f64() == Some(0.0),
        Value::Number(n) => n.as_u64() == Some(0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// The non-zero fields of a document.
pub fn non_zero_fields(doc: Document) -> Document {
    doc.into_iter().filter(|(_, v)| !is_zero(v)).collect()
}

/// JSONB `@>` containment: does `doc` contain `pattern`?
///
/// A top-level array also contains a matching scalar. Below the top level
/// a scalar only matches an equal scalar, as in PostgreSQL.
pub fn contains(doc: &Value, pattern: &Value) -> bool {
    match (doc, pattern) {
        (Value::Array(d), scalar) if !scalar.is_array() && !scalar.is_object() => {
            d.iter().any(|candidate| scalar_eq(candidate, scalar))
        }
        _ => contains_nested(doc, pattern),
    }
}

fn contains_nested(doc: &Value, pattern: &Value) -> bool {
    match (doc, pattern) {
        (Value::Object(d), Value::Object(p)) => contains_object(d, p),
        (Value::Array(d), Value::Array(p)) => p
            .iter()
            .all(|item| d.iter().any(|candidate| contains_nested(candidate, item))),
        (d, p) => scalar_eq(d, p),
    }
}

fn contains_object(doc: &Document, pattern: &Document) -> bool {
    pattern.iter().all(|(key, expected)| {
        doc.get(key)
            .is_some_and(|actual| contains_nested(actual, expected))
    })
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_eq(x, y),
        _ => a == b,
    }
}

/// Integers compare exactly; `f64` only when either side is a float.
fn numbers_eq(x: &Number, y: &Number) -> bool {
    if x.is_f64() || y.is_f64() {
        return x.as_f64() == y.as_f64();
    }
    match (x.as_i64(), y.as_i64()) {
        (Some(a), Some(b)) => a == b,
        (None, None) => x.as_u64() == y.as_u64(),
        _ => false,
    }
}
