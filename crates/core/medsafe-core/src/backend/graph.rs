//! HTTP adapter for an external interaction graph
//!
//! Consumes a single capability: `GET {base}/interactions?drug_a=..&drug_b=..`
//! answering `200` with an interaction object (or `null`), or `404` for none.

use super::InteractionBackend;
use crate::nlp::normalize_term;
use crate::resilience::{CircuitBreaker, CircuitState};
use crate::types::{InteractionRecord, RecordSource, Severity};
use crate::{MedSafeError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Interaction as returned by the graph service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphInteraction {
    /// First drug
    pub drug_a: String,
    /// Second drug
    pub drug_b: String,
    /// Severity label
    pub severity: String,
    /// Category
    #[serde(default)]
    pub category: String,
    /// Mechanism
    #[serde(default)]
    pub mechanism: String,
    /// Recommendation
    #[serde(default)]
    pub recommendation: String,
    /// Evidence level
    #[serde(default)]
    pub evidence_level: String,
    /// Citation
    #[serde(default)]
    pub reference: Option<String>,
}

impl From<GraphInteraction> for InteractionRecord {
    fn from(g: GraphInteraction) -> Self {
        InteractionRecord {
            drug_a: normalize_term(&g.drug_a),
            drug_b: normalize_term(&g.drug_b),
            severity: Severity::parse_lenient(&g.severity),
            category: g.category,
            mechanism: g.mechanism,
            recommendation: g.recommendation,
            evidence_level: g.evidence_level,
            source: RecordSource::Graph,
            reference: g.reference,
        }
    }
}

/// Graph tier over HTTP, guarded by a circuit breaker
pub struct HttpGraphBackend {
    client: Client,
    base_url: String,
    breaker: CircuitBreaker,
}

impl HttpGraphBackend {
    /// Build a backend. `timeout` bounds every request.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        failure_threshold: usize,
        cooldown: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            breaker: CircuitBreaker::new(failure_threshold, cooldown),
        })
    }

    /// Current breaker state
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    async fn fetch(&self, drug_a: &str, drug_b: &str) -> Result<Option<InteractionRecord>> {
        let url = format!("{}/interactions", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("drug_a", drug_a), ("drug_b", drug_b)])
            .send()
            .await
            .map_err(|e| MedSafeError::backend_unavailable(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MedSafeError::backend_unavailable(format!(
                "graph returned {}",
                status
            )));
        }

        let body: Option<GraphInteraction> = resp
            .json()
            .await
            .map_err(|e| MedSafeError::backend_unavailable(format!("bad graph payload: {}", e)))?;
        Ok(body.map(InteractionRecord::from))
    }
}

#[async_trait]
impl InteractionBackend for HttpGraphBackend {
    fn name(&self) -> &'static str {
        "graph"
    }

    async fn find_interaction(
        &self,
        drug_a: &str,
        drug_b: &str,
    ) -> Result<Option<InteractionRecord>> {
        debug!(drug_a, drug_b, "Querying graph backend");
        self.breaker.call(self.fetch(drug_a, drug_b)).await
    }
}
