use crate::core::orchestrator::FetchPlan;
use crate::domain::model::Endpoint;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Endpoint list loaded from TOML:
///
/// ```toml
/// [[endpoints]]
/// name = "transactions"
/// [endpoints.params]
/// limit = 100
/// dateFrom = "${DATE_FROM}"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    pub endpoints: Vec<EndpointConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
}

impl PlanConfig {
    /// `vars` take precedence over process environment variables during `${VAR}` substitution.
    pub fn from_file<P: AsRef<Path>>(path: P, vars: &HashMap<String, String>) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content, vars)
    }

    pub fn from_toml_str(content: &str, vars: &HashMap<String, String>) -> Result<Self> {
        let processed = substitute_vars(content, vars)?;
        let config: Self = toml::from_str(&processed)
            .map_err(|e| ReportError::invalid_config(format!("TOML parsing error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(ReportError::invalid_config("plan lists no endpoints"));
        }
        for endpoint in &self.endpoints {
            validation::validate_non_empty_string("endpoints.name", &endpoint.name)?;
        }
        Ok(())
    }

    pub fn into_plan(self) -> Result<FetchPlan> {
        let endpoints = self
            .endpoints
            .into_iter()
            .map(|config| {
                let mut endpoint = Endpoint::new(config.name);
                for (key, value) in config.params {
                    let value = param_string(&endpoint.name, &key, value)?;
                    endpoint.params.insert(key, value);
                }
                endpoint.limit()?;
                Ok(endpoint)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FetchPlan::new(endpoints))
    }
}

fn param_string(endpoint: &str, key: &str, value: toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Datetime(d) => Ok(d.to_string()),
        other => Err(ReportError::invalid_config(format!(
            "endpoint '{}': parameter '{}' must be a scalar, got {}",
            endpoint,
            key,
            other.type_str()
        ))),
    }
}

/// Replaces `${VAR}` from `vars`, then the environment. Unknown names are left as written.
fn substitute_vars(content: &str, vars: &HashMap<String, String>) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ReportError::invalid_config(format!("bad substitution pattern: {}", e)))?;

    let result = re.replace_all(content, |caps: &Captures| {
        let name = &caps[1];
        match vars.get(name).cloned().or_else(|| std::env::var(name).ok()) {
            Some(value) => value,
            None => {
                tracing::warn!("No value for ${{{}}} in plan file", name);
                caps[0].to_string()
            }
        }
    });

    Ok(result.into_owned())
}
