use crate::config::ApiConfig;
use crate::core::paging::page_count;
use crate::domain::model::{Endpoint, PageRequest, Record};
use crate::domain::ports::PageSource;
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

/// Response body shape shared by every list endpoint.
#[derive(Debug, Deserialize)]
struct PageEnvelope {
    #[serde(rename = "totalSize", default)]
    total_size: Option<u64>,
    #[serde(default)]
    data: Option<Vec<Record>>,
}

/// Authenticated client for the records API. One instance is shared by all page fetches.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    login: String,
    password: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            login: config.login.clone(),
            password: config.password.clone(),
        })
    }

    fn endpoint_url(&self, endpoint: &Endpoint) -> Result<Url> {
        Ok(self.base_url.join(endpoint.name.trim_start_matches('/'))?)
    }

    async fn get_page(&self, endpoint: &Endpoint, page: &PageRequest) -> Result<PageEnvelope> {
        let url = self.endpoint_url(endpoint)?;
        let query = endpoint.page_query(page);
        tracing::debug!(
            "GET {} (page {}, start {})",
            url,
            page.page_number,
            page.offset()
        );

        let response = self
            .client
            .get(url)
            .basic_auth(&self.login, Some(&self.password))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        "Could not read error body from {} (page {}): {}",
                        endpoint.name,
                        page.page_number,
                        e
                    );
                    String::new()
                }
            };
            tracing::error!(
                "API error ({}) on page {}: {}, {}",
                endpoint.name,
                page.page_number,
                status.as_u16(),
                body
            );
            return Err(ReportError::Api {
                endpoint: endpoint.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl PageSource for ApiClient {
    async fn estimate_pages(&self, endpoint: &Endpoint) -> Result<u64> {
        let limit = endpoint.limit()?;
        let envelope = self.get_page(endpoint, &PageRequest::new(1, limit)).await?;
        let total = envelope.total_size.unwrap_or(0);
        let pages = page_count(total, limit)?;
        tracing::debug!(
            "Endpoint '{}' reports {} records ({} pages of {})",
            endpoint.name,
            total,
            pages,
            limit
        );
        Ok(pages)
    }

    async fn fetch_page(&self, endpoint: &Endpoint, page: PageRequest) -> Result<Vec<Record>> {
        let envelope = self.get_page(endpoint, &page).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}
