use crate::domain::model::{Endpoint, PageRequest, Record};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Paged access to one remote collection.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Number of pages behind `endpoint` at its configured `limit`.
    async fn estimate_pages(&self, endpoint: &Endpoint) -> Result<u64>;

    /// Records of a single page. No retries.
    async fn fetch_page(&self, endpoint: &Endpoint, page: PageRequest) -> Result<Vec<Record>>;
}
