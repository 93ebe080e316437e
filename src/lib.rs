pub mod adapters;
pub mod analysis;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::http::ApiClient;
pub use crate::config::{cli::LocalStorage, ApiConfig};
pub use crate::core::fetch_engine::{progress_channel, FetchEngine, ProgressSender, MAX_CONCURRENCY};
pub use crate::core::orchestrator::{FetchOrchestrator, FetchPlan};
pub use crate::domain::model::{Dataset, Endpoint, ProgressEvent, Record, Table};
pub use crate::utils::error::{ReportError, Result};
