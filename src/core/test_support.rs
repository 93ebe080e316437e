use crate::core::paging::page_count;
use crate::domain::model::{Endpoint, PageRequest, Record};
use crate::domain::ports::PageSource;
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory page source that records how many page fetches overlap.
pub struct FakeSource {
    totals: HashMap<String, u64>,
    date_field: &'static str,
    fail_page: Option<u64>,
    panic_page: Option<u64>,
    fail_estimate: bool,
    delay: Duration,
    in_flight: AtomicUsize,
    pub high_water: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub estimate_calls: AtomicUsize,
    pub fetched_pages: Mutex<Vec<u64>>,
}

impl FakeSource {
    pub fn new(endpoint: &str, total_records: u64) -> Self {
        Self {
            totals: HashMap::from([(endpoint.to_string(), total_records)]),
            date_field: "entryDate",
            fail_page: None,
            panic_page: None,
            fail_estimate: false,
            delay: Duration::from_millis(5),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            page_calls: AtomicUsize::new(0),
            estimate_calls: AtomicUsize::new(0),
            fetched_pages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str, total_records: u64) -> Self {
        self.totals.insert(endpoint.to_string(), total_records);
        self
    }

    pub fn with_date_field(mut self, field: &'static str) -> Self {
        self.date_field = field;
        self
    }

    pub fn failing_on_page(mut self, page: u64) -> Self {
        self.fail_page = Some(page);
        self
    }

    pub fn panicking_on_page(mut self, page: u64) -> Self {
        self.panic_page = Some(page);
        self
    }

    pub fn failing_estimate(mut self) -> Self {
        self.fail_estimate = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn total(&self, endpoint: &Endpoint) -> u64 {
        self.totals.get(&endpoint.name).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn estimate_pages(&self, endpoint: &Endpoint) -> Result<u64> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_estimate {
            return Err(ReportError::Api {
                endpoint: endpoint.name.clone(),
                status: 503,
                body: "maintenance".to_string(),
            });
        }
        page_count(self.total(endpoint), endpoint.limit()?)
    }

    async fn fetch_page(&self, endpoint: &Endpoint, page: PageRequest) -> Result<Vec<Record>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        // Uneven latency so completion order differs from submission order.
        let skew = Duration::from_millis(page.page_number % 3);
        tokio::time::sleep(self.delay + skew).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.fetched_pages
            .lock()
            .expect("fetched_pages lock")
            .push(page.page_number);

        if self.panic_page == Some(page.page_number) {
            panic!("page {} task crashed", page.page_number);
        }

        if self.fail_page == Some(page.page_number) {
            return Err(ReportError::Api {
                endpoint: endpoint.name.clone(),
                status: 500,
                body: format!("page {} exploded", page.page_number),
            });
        }

        let start = page.offset();
        let end = (start + page.limit).min(self.total(endpoint));
        Ok((start..end)
            .map(|id| {
                Record::from_iter([
                    ("id", json!(id)),
                    (self.date_field, json!("2024-01-15 09:30:00")),
                ])
            })
            .collect())
    }
}
