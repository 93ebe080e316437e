pub mod cli;
pub mod toml_config;

use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Connection settings for the records API.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub login: String,
    pub password: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, login: impl Into<String>, password: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            login: login.into(),
            password: password.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `API_BASE_URL`, `API_LOGIN`, `API_PASSWORD` and optional `API_TIMEOUT_SECONDS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("API_BASE_URL");
        let login = lookup("API_LOGIN");
        let password = lookup("API_PASSWORD");

        let base_url = validation::validate_required_field("API_BASE_URL", &base_url)?;
        let login = validation::validate_required_field("API_LOGIN", &login)?;
        let password = validation::validate_required_field("API_PASSWORD", &password)?;

        let timeout = match lookup("API_TIMEOUT_SECONDS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ReportError::invalid_config(format!(
                    "API_TIMEOUT_SECONDS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECONDS,
        };

        let config = Self::new(base_url.as_str(), login.as_str(), password.as_str())
            .with_timeout(Duration::from_secs(timeout));
        config.validate()?;
        Ok(config)
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("API_BASE_URL", &self.base_url)?;
        validation::validate_non_empty_string("API_LOGIN", &self.login)?;
        if self.timeout.is_zero() {
            return Err(ReportError::invalid_config(
                "API_TIMEOUT_SECONDS must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use chrono::{Datelike, Duration as DateDuration, NaiveDate};
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "sales-report")]
    #[command(about = "Fetches transactions, products and customers and builds sales reports")]
    pub struct CliConfig {
        #[arg(long, help = "First day of the fetched range (YYYY-MM-DD), defaults to the start of last month")]
        pub date_from: Option<NaiveDate>,

        #[arg(long, help = "Last day of the fetched range (YYYY-MM-DD), defaults to the end of last month")]
        pub date_to: Option<NaiveDate>,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, default_value = "10", help = "Maximum simultaneous page requests")]
        pub concurrency: usize,

        #[arg(long, help = "TOML file describing the endpoints to fetch")]
        pub plan: Option<PathBuf>,

        #[arg(long, help = "Also write a single-day sales report for this date")]
        pub report_date: Option<NaiveDate>,

        #[arg(long, help = "Also write a sales analysis for this product name")]
        pub product: Option<String>,

        #[arg(long, help = "Append logs to this file")]
        pub log_file: Option<PathBuf>,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl CliConfig {
        /// Explicit dates win; a missing side falls back to the previous calendar month
        /// relative to `today`. The resolved range must not be inverted.
        pub fn date_range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
            let first_of_month = today.with_day(1).unwrap_or(today);
            let last_of_previous = first_of_month - DateDuration::days(1);
            let first_of_previous = last_of_previous.with_day(1).unwrap_or(last_of_previous);
            let from = self.date_from.unwrap_or(first_of_previous);
            let to = self.date_to.unwrap_or(last_of_previous);
            validation::validate_date_range(from, to)?;
            Ok((from, to))
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_positive_number("concurrency", self.concurrency, 1)?;
            validation::validate_non_empty_string("output_path", &self.output_path)?;
            if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
                validation::validate_date_range(from, to)?;
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::utils::error::ReportError;

        #[test]
        fn test_default_range_is_previous_month() {
            let config = CliConfig::parse_from(["sales-report"]);
            let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
            let (from, to) = config.date_range(today).unwrap();
            assert_eq!(from, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
            assert_eq!(to, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        }

        #[test]
        fn test_one_sided_range_is_checked_after_defaulting() {
            let today = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();

            let config = CliConfig::parse_from(["sales-report", "--date-from", "2024-03-20"]);
            assert!(config.validate().is_ok());
            let err = config.date_range(today).unwrap_err();
            assert!(matches!(err, ReportError::InvalidConfig { .. }));

            let config = CliConfig::parse_from(["sales-report", "--date-to", "2024-01-10"]);
            assert!(config.date_range(today).is_err());

            let config = CliConfig::parse_from(["sales-report", "--date-from", "2024-02-10"]);
            let (from, to) = config.date_range(today).unwrap();
            assert_eq!(from, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
            assert_eq!(to, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        }

        #[test]
        fn test_explicit_dates_and_validation() {
            let config = CliConfig::parse_from([
                "sales-report",
                "--date-from",
                "2024-05-10",
                "--date-to",
                "2024-05-01",
            ]);
            assert!(config.validate().is_err());

            let config = CliConfig::parse_from(["sales-report", "--concurrency", "0"]);
            assert!(config.validate().is_err());

            let config = CliConfig::parse_from(["sales-report", "--date-from", "2024-05-01"]);
            assert!(config.validate().is_ok());
            assert_eq!(config.concurrency, 10);
        }
    }
}
