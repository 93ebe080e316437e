// Aggregations over fetched tables and the report artifacts built from them.

pub mod product;
pub mod report;
pub mod sales;

pub const DATE_FIELD: &str = "entryDate";
pub const AMOUNT_FIELD: &str = "amount";
pub const TRANSACTION_ID_FIELD: &str = "transaction_id";
pub const PRODUCT_ID_FIELD: &str = "product_id";

/// Join key for id-like values, so `7`, `7.0` and `"7"` match.
pub(crate) fn id_key(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(number_key(n)),
        _ => None,
    }
}

fn number_key(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
