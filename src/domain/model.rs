use crate::utils::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// One row returned by the API. Field names and values are endpoint-defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }

    /// Numeric value of `field`, accepting JSON numbers and numeric strings.
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        match self.data.get(field)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl<K: Into<String>> FromIterator<(K, serde_json::Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, serde_json::Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// All records of one endpoint fetch, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// True when at least one record carries `field`.
    pub fn has_column(&self, field: &str) -> bool {
        self.records.iter().any(|r| r.data.contains_key(field))
    }

    /// Union of field names over all records, sorted.
    pub fn columns(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|r| r.data.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// A named API resource and the query parameters used to page through it.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl Endpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Page size. Defaults to 100 when absent; zero or non-numeric is rejected.
    pub fn limit(&self) -> Result<u64> {
        let Some(raw) = self.params.get("limit") else {
            return Ok(DEFAULT_PAGE_LIMIT);
        };
        match raw.trim().parse::<u64>() {
            Ok(0) => Err(ReportError::invalid_config(format!(
                "endpoint '{}': limit must be a positive integer, got 0",
                self.name
            ))),
            Ok(limit) => Ok(limit),
            Err(_) => Err(ReportError::invalid_config(format!(
                "endpoint '{}': limit must be a positive integer, got '{}'",
                self.name, raw
            ))),
        }
    }

    /// Query parameters for one page: caller parameters with `start` and `limit` substituted.
    pub fn page_query(&self, page: &PageRequest) -> Vec<(String, String)> {
        let mut params = self.params.clone();
        params.insert("start".to_string(), page.offset().to_string());
        params.insert("limit".to_string(), page.limit.to_string());
        params.into_iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based.
    pub page_number: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page_number: u64, limit: u64) -> Self {
        Self { page_number, limit }
    }

    pub fn offset(&self) -> u64 {
        self.page_number.saturating_sub(1) * self.limit
    }
}

/// Lifecycle notifications emitted while an endpoint is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Page count is known; `total_pages` page fetches follow.
    Start { endpoint: String, total_pages: u64 },
    /// One page merged into the result.
    PageDone { endpoint: String },
    /// The fetch failed; no `Complete` follows.
    Error { endpoint: String, message: String },
    Complete { endpoint: String },
}

/// Tables fetched for a run, keyed by endpoint name.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub tables: BTreeMap<String, Table>,
}

impl Dataset {
    pub fn insert(&mut self, endpoint: impl Into<String>, table: Table) {
        self.tables.insert(endpoint.into(), table);
    }

    pub fn table(&self, endpoint: &str) -> Option<&Table> {
        self.tables.get(endpoint)
    }

    pub fn transactions(&self) -> Option<&Table> {
        self.table("transactions")
    }

    pub fn products(&self) -> Option<&Table> {
        self.table("products")
    }

    pub fn customers(&self) -> Option<&Table> {
        self.table("customers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limit_defaults_to_100() {
        assert_eq!(Endpoint::new("products").limit().unwrap(), 100);
    }

    #[test]
    fn test_limit_rejects_zero_and_garbage() {
        let zero = Endpoint::new("products").with_param("limit", 0);
        assert!(matches!(zero.limit(), Err(ReportError::InvalidConfig { .. })));

        let negative = Endpoint::new("products").with_param("limit", -5);
        assert!(matches!(negative.limit(), Err(ReportError::InvalidConfig { .. })));
    }

    #[test]
    fn test_page_query_substitutes_start_only() {
        let endpoint = Endpoint::new("transactions")
            .with_param("limit", 50)
            .with_param("start", 0)
            .with_param("sort", "entryDate");
        let query: BTreeMap<String, String> =
            endpoint.page_query(&PageRequest::new(3, 50)).into_iter().collect();

        assert_eq!(query["start"], "100");
        assert_eq!(query["limit"], "50");
        assert_eq!(query["sort"], "entryDate");
        assert_eq!(endpoint.params["start"], "0");
    }

    #[test]
    fn test_record_deserializes_from_plain_object() {
        let record: Record =
            serde_json::from_value(json!({"id": 7, "amount": "12.50", "name": "Pellet"})).unwrap();
        assert_eq!(record.get_f64("id"), Some(7.0));
        assert_eq!(record.get_f64("amount"), Some(12.5));
        assert_eq!(record.get_str("name"), Some("Pellet"));
        assert_eq!(record.get_f64("name"), None);
    }

    #[test]
    fn test_table_columns_are_union_of_fields() {
        let table = Table::new(vec![
            Record::from_iter([("b", json!(1))]),
            Record::from_iter([("a", json!(2)), ("b", json!(3))]),
        ]);
        assert_eq!(table.columns(), vec!["a".to_string(), "b".to_string()]);
        assert!(table.has_column("a"));
        assert!(!table.has_column("c"));
    }

    #[test]
    fn test_progress_event_serializes_tagged() {
        let event = ProgressEvent::Start {
            endpoint: "products".to_string(),
            total_pages: 3,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "start", "endpoint": "products", "total_pages": 3})
        );
    }
}
