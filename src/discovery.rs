use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::DiscoveryConfig;

/// A resolved instance of a registered service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServiceInstance {
    #[serde(rename = "ServiceAddress")]
    pub address: String,
    #[serde(rename = "ServicePort")]
    pub port: u16,
}

/// Resolves a logical service name to live network addresses.
///
/// Injected through `AppState` so login code never reaches for a global
/// registry handle and tests can substitute a double.
#[async_trait]
pub trait ServiceLocator: Send + Sync {
    async fn resolve(&self, service_name: &str) -> anyhow::Result<Vec<ServiceInstance>>;
}

/// Consul-backed locator, also responsible for this process's own
/// registration lifecycle (register on start, deregister on shutdown).
pub struct ConsulClient {
    http: reqwest::Client,
    cfg: DiscoveryConfig,
}

impl ConsulClient {
    pub fn new(cfg: DiscoveryConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .context("build consul http client")?;
        Ok(Self { http, cfg })
    }

    /// Register this service in the Consul agent.
    pub async fn register(&self) -> anyhow::Result<()> {
        let url = format!("{}/v1/agent/service/register", self.cfg.consul_url);
        let body = json!({
            "ID": self.cfg.service_id,
            "Name": self.cfg.service_name,
            "Address": self.cfg.service_address,
            "Port": self.cfg.service_port,
        });
        self.http
            .put(&url)
            .json(&body)
            .send()
            .await
            .context("consul register request")?
            .error_for_status()
            .context("consul register rejected")?;
        info!(service = %self.cfg.service_name, id = %self.cfg.service_id, "registered in consul");
        Ok(())
    }

    /// Deregister on graceful shutdown. Failure is logged, not fatal.
    pub async fn deregister(&self) {
        let url = format!(
            "{}/v1/agent/service/deregister/{}",
            self.cfg.consul_url, self.cfg.service_id
        );
        match self.http.put(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(id = %self.cfg.service_id, "deregistered from consul");
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "consul deregister rejected");
            }
            Err(e) => {
                warn!(error = %e, "consul deregister failed");
            }
        }
    }
}

#[async_trait]
impl ServiceLocator for ConsulClient {
    async fn resolve(&self, service_name: &str) -> anyhow::Result<Vec<ServiceInstance>> {
        let url = format!("{}/v1/catalog/service/{}", self.cfg.consul_url, service_name);
        let instances = self
            .http
            .get(&url)
            .send()
            .await
            .context("consul catalog request")?
            .error_for_status()
            .context("consul catalog rejected")?
            .json::<Vec<ServiceInstance>>()
            .await
            .context("decode consul catalog response")?;
        Ok(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_node_deserializes() {
        // Trimmed-down Consul catalog payload; unknown fields are ignored.
        let raw = r#"[{
            "Node": "agent-one",
            "ServiceID": "poc-1",
            "ServiceName": "Express_Poc",
            "ServiceAddress": "10.0.0.5",
            "ServicePort": 3001
        }]"#;
        let nodes: Vec<ServiceInstance> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            nodes,
            vec![ServiceInstance {
                address: "10.0.0.5".into(),
                port: 3001
            }]
        );
    }

    #[test]
    fn empty_catalog_is_empty_vec() {
        let nodes: Vec<ServiceInstance> = serde_json::from_str("[]").unwrap();
        assert!(nodes.is_empty());
    }
}
