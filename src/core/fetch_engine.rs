use crate::core::paging::page_requests;
use crate::core::schema::{normalize_date_field, DateField};
use crate::domain::model::{Endpoint, PageRequest, ProgressEvent, Record, Table};
use crate::domain::ports::PageSource;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::validate_positive_number;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};

/// Default cap on simultaneous page requests against the API.
pub const MAX_CONCURRENCY: usize = 10;

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

type PageOutcome = (u64, Result<Vec<Record>>);

/// Fetches every page of an endpoint through a bounded pool of tasks.
///
/// Each call is independent: the engine keeps no state between fetches. Page
/// results are merged by the calling task only, in completion order. The first
/// failed page fails the whole fetch; pages still in flight are left to finish
/// but their records are dropped and nothing further is dispatched.
pub struct FetchEngine<S: PageSource + 'static> {
    source: Arc<S>,
    max_concurrency: usize,
    date_field: DateField,
}

impl<S: PageSource + 'static> FetchEngine<S> {
    pub fn new(source: S) -> Self {
        Self::from_arc(Arc::new(source))
    }

    pub fn from_arc(source: Arc<S>) -> Self {
        Self {
            source,
            max_concurrency: MAX_CONCURRENCY,
            date_field: DateField::default(),
        }
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Result<Self> {
        validate_positive_number("max_concurrency", max_concurrency, 1)?;
        self.max_concurrency = max_concurrency;
        Ok(self)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Fetches all records of `endpoint`, reporting lifecycle events on `events`.
    ///
    /// On success the stream is `Start`, one `PageDone` per page, `Complete`.
    /// Any failure emits exactly one `Error` and no `Complete`.
    pub async fn fetch(&self, endpoint: &Endpoint, events: &ProgressSender) -> Result<Table> {
        match self.run(endpoint, events).await {
            Ok(table) => {
                tracing::info!(
                    "✅ {}: fetched {} records",
                    endpoint.name,
                    table.len()
                );
                emit(
                    events,
                    ProgressEvent::Complete {
                        endpoint: endpoint.name.clone(),
                    },
                );
                Ok(table)
            }
            Err(e) => {
                tracing::error!("❌ {}: fetch failed: {}", endpoint.name, e);
                emit(
                    events,
                    ProgressEvent::Error {
                        endpoint: endpoint.name.clone(),
                        message: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    async fn run(&self, endpoint: &Endpoint, events: &ProgressSender) -> Result<Table> {
        let limit = endpoint.limit()?;
        let total_pages = self.source.estimate_pages(endpoint).await?;

        tracing::info!(
            "📡 {}: {} page(s) of up to {} records",
            endpoint.name,
            total_pages,
            limit
        );
        emit(
            events,
            ProgressEvent::Start {
                endpoint: endpoint.name.clone(),
                total_pages,
            },
        );

        if total_pages == 0 {
            return Ok(Table::default());
        }

        let mut table = self.fetch_pages(endpoint, total_pages, limit, events).await?;
        normalize_date_field(&endpoint.name, &mut table, &self.date_field)?;
        Ok(table)
    }

    async fn fetch_pages(
        &self,
        endpoint: &Endpoint,
        total_pages: u64,
        limit: u64,
        events: &ProgressSender,
    ) -> Result<Table> {
        let shared = Arc::new(endpoint.clone());
        let mut pending = page_requests(total_pages, limit);
        let mut in_flight: JoinSet<PageOutcome> = JoinSet::new();
        // Page numbers of running tasks, so a task that panics can still be reported by page.
        let mut task_pages: HashMap<task::Id, u64> = HashMap::new();

        for page in pending.by_ref().take(self.max_concurrency) {
            self.dispatch(&mut in_flight, &mut task_pages, &shared, page);
        }

        let mut records = Vec::new();
        while let Some(joined) = in_flight.join_next_with_id().await {
            let (page_number, outcome) = match joined {
                Ok((id, done)) => {
                    task_pages.remove(&id);
                    done
                }
                Err(e) => {
                    let page = task_pages.remove(&e.id()).unwrap_or_default();
                    tracing::error!(
                        "{}: page {} task did not finish, dropping {} in-flight page(s): {}",
                        endpoint.name,
                        page,
                        in_flight.len(),
                        e
                    );
                    in_flight.detach_all();
                    return Err(ReportError::FetchFailure {
                        endpoint: endpoint.name.clone(),
                        page,
                        source: Box::new(ReportError::Processing {
                            message: format!("page task did not finish: {}", e),
                        }),
                    });
                }
            };

            match outcome {
                Ok(page_records) => {
                    tracing::debug!(
                        "{}: page {}/{} returned {} records",
                        endpoint.name,
                        page_number,
                        total_pages,
                        page_records.len()
                    );
                    records.extend(page_records);
                    emit(
                        events,
                        ProgressEvent::PageDone {
                            endpoint: endpoint.name.clone(),
                        },
                    );
                    if let Some(next) = pending.next() {
                        self.dispatch(&mut in_flight, &mut task_pages, &shared, next);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        "{}: page {} failed, dropping {} in-flight page(s): {}",
                        endpoint.name,
                        page_number,
                        in_flight.len(),
                        e
                    );
                    in_flight.detach_all();
                    return Err(ReportError::FetchFailure {
                        endpoint: endpoint.name.clone(),
                        page: page_number,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(Table::new(records))
    }

    fn dispatch(
        &self,
        in_flight: &mut JoinSet<PageOutcome>,
        task_pages: &mut HashMap<task::Id, u64>,
        endpoint: &Arc<Endpoint>,
        page: PageRequest,
    ) {
        let source = Arc::clone(&self.source);
        let endpoint = Arc::clone(endpoint);
        let handle = in_flight.spawn(async move {
            let result = source.fetch_page(&endpoint, page).await;
            (page.page_number, result)
        });
        task_pages.insert(handle.id(), page.page_number);
    }
}

fn emit(events: &ProgressSender, event: ProgressEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Progress receiver dropped, event discarded");
    }
}
