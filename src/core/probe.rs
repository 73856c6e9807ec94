use crate::core::{ConfigProvider, IntegrationProbe};
use crate::domain::model::{Integration, ProbeOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// 對整合的每個端點發 GET，檢查狀態碼與回應是否為 JSON 物件
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(Duration::from_secs(config.request_timeout_seconds()))
    }

    /// `GET {base_url}/health` 是否回 200
    pub async fn check_health(&self, base_url: &str) -> bool {
        let url = format!("{}/health", base_url.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!("Health check {} failed: {}", url, e);
                false
            }
        }
    }

    async fn probe_endpoint(
        &self,
        integration: &Integration,
        endpoint: &str,
        outcome: &mut ProbeOutcome,
    ) {
        let url = integration.endpoint_url(endpoint);
        tracing::debug!("Probing {} endpoint: {}", integration.name, url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                outcome.errors.push(format!("Endpoint {} failed: {}", endpoint, e));
                return;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            outcome
                .errors
                .push(format!("Endpoint {} returned {}", endpoint, status.as_u16()));
            return;
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                outcome.errors.push(format!("Endpoint {} failed: {}", endpoint, e));
                return;
            }
        };

        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(serde_json::Value::Object(_)) => {}
            Ok(_) => outcome
                .warnings
                .push(format!("Endpoint {} returned non-JSON data", endpoint)),
            Err(_) => outcome
                .warnings
                .push(format!("Endpoint {} returned invalid JSON", endpoint)),
        }
    }
}

#[async_trait]
impl IntegrationProbe for HttpProbe {
    async fn run_suite(&self, integration: &Integration) -> ProbeOutcome {
        let mut outcome = ProbeOutcome::default();
        for endpoint in &integration.endpoints {
            self.probe_endpoint(integration, endpoint, &mut outcome).await;
        }
        outcome
    }
}
