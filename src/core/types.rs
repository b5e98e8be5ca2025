use serde_json::{Map, Value};

/// One tabular record: column name to scalar value, in column order.
pub type Row = Map<String, Value>;

/// Builds a JSON array value from rows, keeping row and column order.
#[must_use]
pub fn rows_to_value(rows: &[Row]) -> Value {
    Value::Array(rows.iter().cloned().map(Value::Object).collect())
}

/// Reads a JSON array of objects back into rows.
///
/// Returns `None` when `value` is not an array or any element is not an object.
#[must_use]
pub fn rows_from_value(value: &Value) -> Option<Vec<Row>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_object().cloned())
        .collect()
}

/// Numeric reading of a cell: numbers as-is, numeric strings parsed.
#[must_use]
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{numeric_value, rows_from_value, rows_to_value};

    #[test]
    fn numeric_strings_count_as_numbers() {
        assert_eq!(numeric_value(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(numeric_value(&json!("n/a")), None);
        assert_eq!(numeric_value(&json!(true)), None);
    }

    #[test]
    fn rows_round_trip_through_value() {
        let value = json!([{ "month": "Jan", "sales": 1 }, { "month": "Feb", "sales": 2 }]);
        let rows = rows_from_value(&value).expect("array of objects");
        assert_eq!(rows_to_value(&rows), value);
        assert!(rows_from_value(&json!([1, 2])).is_none());
    }
}
