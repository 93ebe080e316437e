use crate::core::fetch_engine::{FetchEngine, ProgressSender};
use crate::domain::model::{Dataset, Endpoint, DEFAULT_PAGE_LIMIT};
use crate::domain::ports::PageSource;
use crate::utils::error::Result;
use chrono::NaiveDate;

/// Endpoints fetched in one run, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub endpoints: Vec<Endpoint>,
}

impl FetchPlan {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    /// Transactions inside `[from, to]`, plus the full product and customer lists.
    pub fn for_range(from: NaiveDate, to: NaiveDate) -> Self {
        let transactions = Endpoint::new("transactions")
            .with_param("start", 0)
            .with_param("limit", DEFAULT_PAGE_LIMIT)
            .with_param("sort", "entryDate")
            .with_param("dir", "ASC")
            .with_param("dateFrom", from.format("%Y-%m-%d"))
            .with_param("dateTo", to.format("%Y-%m-%d"))
            .with_param("dataFormat", "MEDIUM");

        let by_name = |name: &str| {
            Endpoint::new(name)
                .with_param("start", 0)
                .with_param("limit", DEFAULT_PAGE_LIMIT)
                .with_param("sort", "name")
                .with_param("dir", "ASC")
                .with_param("dataFormat", "MEDIUM")
        };

        Self::new(vec![transactions, by_name("products"), by_name("customers")])
    }
}

/// Runs the fetch engine over every endpoint of a plan, one endpoint at a time.
pub struct FetchOrchestrator<S: PageSource + 'static> {
    engine: FetchEngine<S>,
}

impl<S: PageSource + 'static> FetchOrchestrator<S> {
    pub fn new(engine: FetchEngine<S>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &FetchEngine<S> {
        &self.engine
    }

    /// Sum of page counts over the plan, for sizing an overall progress display.
    pub async fn estimate_total_pages(&self, plan: &FetchPlan) -> Result<u64> {
        let mut total = 0;
        for endpoint in &plan.endpoints {
            total += self.engine.source().estimate_pages(endpoint).await?;
        }
        tracing::debug!("Plan spans {} pages in total", total);
        Ok(total)
    }

    /// Fetches each endpoint in turn. The first failing endpoint stops the run.
    pub async fn fetch_all(&self, plan: &FetchPlan, events: &ProgressSender) -> Result<Dataset> {
        let mut dataset = Dataset::default();
        for endpoint in &plan.endpoints {
            let table = self.engine.fetch(endpoint, events).await?;
            dataset.insert(endpoint.name.clone(), table);
        }
        Ok(dataset)
    }
}
