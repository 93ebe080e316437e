use crate::domain::model::PageRequest;
use crate::utils::error::{ReportError, Result};

/// `ceil(total_records / limit)`. A zero limit is a configuration error, not a division.
pub fn page_count(total_records: u64, limit: u64) -> Result<u64> {
    if limit == 0 {
        return Err(ReportError::invalid_config(
            "page size limit must be a positive integer",
        ));
    }
    Ok(total_records.div_ceil(limit))
}

/// Requests for pages `1..=total_pages`.
pub fn page_requests(total_pages: u64, limit: u64) -> impl Iterator<Item = PageRequest> {
    (1..=total_pages).map(move |n| PageRequest::new(n, limit))
}
