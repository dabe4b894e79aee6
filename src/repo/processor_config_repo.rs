use crate::domain::error::PaymentError;
use anyhow::Result;
use sqlx::{PgPool, Row};
use std::collections::HashMap;

/// Per-tenant, per-provider settings (API keys, secrets, endpoint URLs,
/// allow-listed caller hosts, fixed fees). Resolved once per request and
/// passed by value; nothing reads configuration ambiently.
#[derive(Debug, Clone, Default)]
pub struct ProcessorConfiguration {
    pub tenant_id: String,
    pub processor_name: String,
    values: HashMap<String, String>,
}

impl ProcessorConfiguration {
    pub fn from_values(
        tenant_id: &str,
        processor_name: &str,
        values: HashMap<String, String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            processor_name: processor_name.to_string(),
            values,
        }
    }

    /// Required key; a missing key aborts before any network call.
    pub fn get(&self, key: &str) -> Result<&str, PaymentError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| PaymentError::Configuration(format!("{}/{}", self.processor_name, key)))
    }

    pub fn get_optional(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Comma-separated allow-list of caller hosts/IPs for webhook origin
    /// verification.
    pub fn allowed_hosts(&self) -> Vec<String> {
        self.get_optional("allowed_hosts")
            .map(|raw| {
                raw.split(',')
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct ProcessorConfigRepo {
    pub pool: PgPool,
}

impl ProcessorConfigRepo {
    pub async fn load(
        &self,
        tenant_id: &str,
        processor_name: &str,
    ) -> Result<ProcessorConfiguration> {
        let rows = sqlx::query(
            r#"
            SELECT config_key, config_value
            FROM processor_configurations
            WHERE tenant_id = $1 AND processor_name = $2
            "#,
        )
        .bind(tenant_id)
        .bind(processor_name)
        .fetch_all(&self.pool)
        .await?;

        let values = rows
            .into_iter()
            .map(|r| (r.get("config_key"), r.get("config_value")))
            .collect();

        Ok(ProcessorConfiguration::from_values(
            tenant_id,
            processor_name,
            values,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> ProcessorConfiguration {
        let values = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProcessorConfiguration::from_values("default", "easypaisa", values)
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let cfg = config(&[("store_id", "S1")]);
        assert!(matches!(
            cfg.get("hash_key"),
            Err(PaymentError::Configuration(_))
        ));
        assert_eq!(cfg.get("store_id").unwrap(), "S1");
    }

    #[test]
    fn allowed_hosts_splits_and_trims() {
        let cfg = config(&[("allowed_hosts", "10.0.0.1, courier.example.com,")]);
        assert_eq!(
            cfg.allowed_hosts(),
            vec!["10.0.0.1".to_string(), "courier.example.com".to_string()]
        );
    }
}
