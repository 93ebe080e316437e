pub mod fetch_engine;
pub mod orchestrator;
pub mod paging;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{Dataset, Endpoint, PageRequest, ProgressEvent, Record, Table};
pub use crate::domain::ports::{PageSource, Storage};
pub use crate::utils::error::Result;
