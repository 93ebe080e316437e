use crate::utils::error::{ReportError, Result};
use chrono::NaiveDate;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ReportError::invalid_config(format!(
            "{}: URL cannot be empty",
            field_name
        )));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ReportError::invalid_config(format!(
                "{}: unsupported URL scheme: {}",
                field_name, scheme
            ))),
        },
        Err(e) => Err(ReportError::invalid_config(format!(
            "{}: invalid URL format '{}': {}",
            field_name, url_str, e
        ))),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ReportError::invalid_config(format!(
            "{}: value {} must be at least {}",
            field_name, value, min_value
        )));
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| ReportError::MissingConfig {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReportError::invalid_config(format!(
            "{}: value cannot be empty or whitespace-only",
            field_name
        )));
    }
    Ok(())
}

pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> Result<()> {
    if from > to {
        return Err(ReportError::invalid_config(format!(
            "start date {} is later than end date {}",
            from, to
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("base_url", "https://example.com/svc/v1/").is_ok());
        assert!(validate_url("base_url", "http://example.com").is_ok());
        assert!(validate_url("base_url", "").is_err());
        assert!(validate_url("base_url", "invalid-url").is_err());
        assert!(validate_url("base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("concurrency", 5, 1).is_ok());
        assert!(validate_positive_number("concurrency", 0, 1).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("login".to_string());
        let missing: Option<String> = None;
        assert_eq!(validate_required_field("API_LOGIN", &present).unwrap(), "login");
        assert!(matches!(
            validate_required_field("API_LOGIN", &missing),
            Err(ReportError::MissingConfig { .. })
        ));
    }

    #[test]
    fn test_validate_date_range() {
        let early = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(validate_date_range(early, late).is_ok());
        assert!(validate_date_range(early, early).is_ok());
        assert!(validate_date_range(late, early).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("output_path", "./out").is_ok());
        assert!(validate_non_empty_string("output_path", "   ").is_err());
    }
}
