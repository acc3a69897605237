//! Tiered interaction resolution
//!
//! For every unordered pair in a request:
//! safety gate -> cache -> graph backend -> fallback store.
//! The gate always runs first and a blocked pair never reaches any tier.
//! Pairs are independent and run concurrently; each pair is sequential.

use crate::backend::{InteractionBackend, NullBackend};
use crate::cache::{CacheStats, ResultCache};
use crate::config::ResolverConfig;
use crate::nlp::{normalize_term, NameSimilarityEngine};
use crate::readiness::StoreState;
use crate::safety::SafetyGate;
use crate::store::InteractionStore;
use crate::types::{
    InteractionRecord, InteractionReport, InteractionResult, RecordSource, SafetyBlockResult,
    Severity,
};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// What happened to one pair
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    /// Names were too similar to compare
    Blocked(SafetyBlockResult),
    /// A known interaction
    Found(InteractionRecord),
    /// No known interaction (or no tier could answer)
    NotFound,
}

impl PairOutcome {
    fn from_lookup(value: Option<InteractionRecord>) -> Self {
        value.map_or(PairOutcome::NotFound, PairOutcome::Found)
    }

    fn into_result(self) -> Option<InteractionResult> {
        match self {
            PairOutcome::Blocked(block) => Some(InteractionResult::SafetyBlock(block)),
            PairOutcome::Found(record) => Some(InteractionResult::Interaction(record)),
            PairOutcome::NotFound => None,
        }
    }
}

/// Point-in-time view of the tiers
#[derive(Debug, Clone, Serialize)]
pub struct ResolverHealth {
    /// Fallback store lifecycle
    pub store: StoreState,
    /// Name of the configured backend
    pub backend: &'static str,
    /// Cache counters
    pub cache: CacheStats,
}

/// Public entry point: checks every pair in a list of drug names
pub struct InteractionResolver {
    gate: SafetyGate,
    cache: Arc<ResultCache>,
    backend: Arc<dyn InteractionBackend>,
    store: Arc<dyn InteractionStore>,
    config: ResolverConfig,
}

impl InteractionResolver {
    /// Resolver with no graph tier and a fresh cache sized from `config`
    pub fn new(store: Arc<dyn InteractionStore>, config: ResolverConfig) -> Self {
        Self {
            gate: SafetyGate::new(Arc::new(NameSimilarityEngine::new())),
            cache: Arc::new(ResultCache::new(config.cache_max_entries)),
            backend: Arc::new(NullBackend),
            store,
            config,
        }
    }

    /// Use a graph tier
    pub fn with_backend(mut self, backend: Arc<dyn InteractionBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Share a cache built elsewhere
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Share a safety gate (and its phonetic memo)
    pub fn with_gate(mut self, gate: SafetyGate) -> Self {
        self.gate = gate;
        self
    }

    /// The result cache
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The safety gate
    pub fn gate(&self) -> &SafetyGate {
        &self.gate
    }

    /// Snapshot of store state, backend and cache
    pub fn health(&self) -> ResolverHealth {
        ResolverHealth {
            store: self.store.state(),
            backend: self.backend.name(),
            cache: self.cache.stats(),
        }
    }

    /// Check every unordered pair in `drugs`
    pub async fn check_interactions<S: AsRef<str>>(&self, drugs: &[S]) -> InteractionReport {
        self.check_interactions_with_deadline(drugs, None).await
    }

    /// Like [`check_interactions`](Self::check_interactions), but pairs still
    /// unresolved at `deadline` are omitted and the report is marked partial
    pub async fn check_interactions_with_deadline<S: AsRef<str>>(
        &self,
        drugs: &[S],
        deadline: Option<Instant>,
    ) -> InteractionReport {
        let request_id = Uuid::new_v4();
        let span = info_span!("check_interactions", %request_id, drugs = drugs.len());
        self.run_check(drugs, deadline, request_id)
            .instrument(span)
            .await
    }

    async fn run_check<S: AsRef<str>>(
        &self,
        drugs: &[S],
        deadline: Option<Instant>,
        request_id: Uuid,
    ) -> InteractionReport {
        let mut warnings = Vec::new();
        let mut names = Vec::with_capacity(drugs.len());
        let mut blank = 0;
        for drug in drugs {
            let name = normalize_term(drug.as_ref());
            if name.is_empty() {
                blank += 1;
            } else {
                names.push(name);
            }
        }
        if blank > 0 {
            warnings.push(format!("Ignored {} blank drug name(s)", blank));
        }

        let mut report = InteractionReport::empty(names.clone());
        report.request_id = request_id;
        report.warnings = warnings;

        if names.len() < 2 {
            debug!("Fewer than two drugs, nothing to compare");
            return report;
        }

        let count = names.len();
        let pairs: Vec<(usize, usize)> = (0..count)
            .flat_map(|i| (i + 1..count).map(move |j| (i, j)))
            .collect();
        let total = pairs.len();

        let outcomes: Vec<Option<PairOutcome>> = stream::iter(pairs)
            .map(|(i, j)| {
                let a = names[i].as_str();
                let b = names[j].as_str();
                async move {
                    match deadline {
                        Some(at) => tokio::time::timeout_at(at, self.check_pair(a, b)).await.ok(),
                        None => Some(self.check_pair(a, b).await),
                    }
                }
            })
            .buffered(self.config.max_concurrent_pairs.max(1))
            .collect()
            .await;

        let mut omitted = 0;
        for outcome in outcomes {
            match outcome {
                Some(outcome) => {
                    if let Some(result) = outcome.into_result() {
                        report.interactions.push(result);
                    }
                }
                None => omitted += 1,
            }
        }

        report.pairs_checked = total - omitted;
        if omitted > 0 {
            report.partial = true;
            report.warnings.push(format!(
                "Deadline exceeded: {} of {} drug pairs were not checked",
                omitted, total
            ));
            warn!(omitted, total, "Interaction check cut short by deadline");
        }
        report.found_interactions = !report.interactions.is_empty();

        info!(
            pairs = total,
            results = report.interactions.len(),
            partial = report.partial,
            "Interaction check complete"
        );
        report
    }

    /// Resolve one pair through every tier
    pub async fn check_pair(&self, a: &str, b: &str) -> PairOutcome {
        if let Some(block) = self.gate.check(a, b) {
            error!(
                drug_a = %block.drug_a,
                drug_b = %block.drug_b,
                reason = %block.reason,
                similarity = block.similarity_score,
                "SAFETY BLOCK: refusing to compare confusable drug names"
            );
            return PairOutcome::Blocked(block);
        }

        let outcome = match self.cache.get(a, b) {
            Some(cached) => {
                debug!(drug_a = a, drug_b = b, "Cache hit");
                PairOutcome::from_lookup(cached)
            }
            None => match self.resolve_uncached(a, b).await {
                Some(value) => {
                    self.cache.put(a, b, value.clone());
                    PairOutcome::from_lookup(value)
                }
                None => PairOutcome::NotFound,
            },
        };

        if let PairOutcome::Found(record) = &outcome {
            if record.severity == Severity::Severe {
                warn!(
                    drug_a = %record.drug_a,
                    drug_b = %record.drug_b,
                    category = %record.category,
                    source = %record.source,
                    "Severe interaction found"
                );
            }
        }
        outcome
    }

    /// `Some(answer)` when a tier answered (answer may be "no interaction"),
    /// `None` when no tier could answer; that case is not cached.
    async fn resolve_uncached(&self, a: &str, b: &str) -> Option<Option<InteractionRecord>> {
        let backend = self.backend.name();
        let lookup = self.backend.find_interaction(a, b);
        match tokio::time::timeout(self.config.graph_timeout, lookup).await {
            Ok(Ok(Some(record))) => {
                debug!(drug_a = a, drug_b = b, backend, "Graph hit");
                return Some(Some(record.with_source(RecordSource::Graph)));
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                warn!(
                    drug_a = a,
                    drug_b = b,
                    backend,
                    error = %e,
                    "Graph lookup failed, using fallback store"
                );
            }
            Err(_) => {
                warn!(
                    drug_a = a,
                    drug_b = b,
                    backend,
                    timeout_ms = self.config.graph_timeout.as_millis() as u64,
                    "Graph lookup timed out, using fallback store"
                );
            }
        }

        match self.store.query_interaction(a, b).await {
            Ok(value) => Some(value.map(|r| r.with_source(RecordSource::FallbackStore))),
            Err(e) if e.is_store_unavailable() => {
                warn!(drug_a = a, drug_b = b, error = %e, "Fallback store unavailable");
                None
            }
            Err(e) => {
                error!(drug_a = a, drug_b = b, error = %e, "Fallback store query failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockInteractionBackend;
    use crate::store::MockInteractionStore;
    use crate::MedSafeError;
    use async_trait::async_trait;
    use std::time::Duration;

    fn record(a: &str, b: &str, severity: Severity) -> InteractionRecord {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        InteractionRecord {
            drug_a: a.to_string(),
            drug_b: b.to_string(),
            severity,
            category: "bleeding_risk".to_string(),
            mechanism: "additive anticoagulation".to_string(),
            recommendation: "avoid combination".to_string(),
            evidence_level: "established".to_string(),
            source: RecordSource::FallbackStore,
            reference: None,
        }
    }

    fn ready_store() -> MockInteractionStore {
        let mut store = MockInteractionStore::new();
        store.expect_state().return_const(StoreState::Ready);
        store
    }

    fn resolver(store: MockInteractionStore) -> InteractionResolver {
        InteractionResolver::new(Arc::new(store), ResolverConfig::default())
    }

    struct SlowStore {
        delay: Duration,
    }

    #[async_trait]
    impl InteractionStore for SlowStore {
        async fn query_interaction(
            &self,
            drug_a: &str,
            drug_b: &str,
        ) -> crate::Result<Option<InteractionRecord>> {
            tokio::time::sleep(self.delay).await;
            Ok(Some(record(drug_a, drug_b, Severity::Moderate)))
        }

        fn state(&self) -> StoreState {
            StoreState::Ready
        }
    }

    struct HangingBackend;

    #[async_trait]
    impl InteractionBackend for HangingBackend {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn find_interaction(
            &self,
            _drug_a: &str,
            _drug_b: &str,
        ) -> crate::Result<Option<InteractionRecord>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_single_drug_is_empty_report() {
        let mut store = ready_store();
        store.expect_query_interaction().never();
        let resolver = resolver(store);

        let report = resolver.check_interactions(&["metformin"]).await;
        assert!(!report.found_interactions);
        assert!(report.interactions.is_empty());
        assert_eq!(report.drugs_checked, vec!["metformin"]);
        assert_eq!(report.pairs_checked, 0);
    }

    #[tokio::test]
    async fn test_known_severe_pair_resolves_from_store() {
        let mut store = ready_store();
        store
            .expect_query_interaction()
            .times(1)
            .returning(|a, b| Ok(Some(record(a, b, Severity::Severe))));
        let resolver = resolver(store);

        let report = resolver.check_interactions(&["Warfarin", " heparin "]).await;
        assert!(report.found_interactions);
        assert_eq!(report.drugs_checked, vec!["warfarin", "heparin"]);
        assert_eq!(report.interactions.len(), 1);

        let found = report.interactions[0].as_interaction().unwrap();
        assert_eq!(found.severity, Severity::Severe);
        assert_eq!(found.source, RecordSource::FallbackStore);
    }

    #[tokio::test]
    async fn test_lookalike_pair_is_blocked_without_lookup() {
        let mut store = ready_store();
        store.expect_query_interaction().never();
        let mut backend = MockInteractionBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_find_interaction().never();
        let resolver = resolver(store).with_backend(Arc::new(backend));

        let report = resolver.check_interactions(&["lisinopril", "atenolol"]).await;
        assert_eq!(report.interactions.len(), 1);
        assert_eq!(report.interactions[0].severity_label(), "critical_safety_error");
        assert!(report.found_interactions);
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_safety_block_beats_existing_store_row() {
        // Store would happily answer for the confusable pair
        let mut store = ready_store();
        store
            .expect_query_interaction()
            .never()
            .returning(|a, b| Ok(Some(record(a, b, Severity::Mild))));
        let resolver = resolver(store);

        for (a, b) in crate::nlp::tables::OPPOSITE_TERM_PAIRS {
            let report = resolver.check_interactions(&[*a, *b]).await;
            assert_eq!(report.interactions.len(), 1, "{} / {}", a, b);
            assert!(report.interactions[0].is_safety_block());
        }
    }

    #[tokio::test]
    async fn test_unrelated_pair_without_data_is_absent() {
        let mut store = ready_store();
        store.expect_query_interaction().times(1).returning(|_, _| Ok(None));
        let resolver = resolver(store);

        let report = resolver.check_interactions(&["acetaminophen", "omeprazole"]).await;
        assert!(!report.found_interactions);
        assert!(report.interactions.is_empty());
        assert_eq!(report.pairs_checked, 1);
    }

    #[tokio::test]
    async fn test_graph_errors_fall_through_to_store() {
        let mut backend = MockInteractionBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_find_interaction()
            .returning(|_, _| Err(MedSafeError::backend_unavailable("connection refused")));
        let mut store = ready_store();
        store
            .expect_query_interaction()
            .times(1)
            .returning(|a, b| Ok(Some(record(a, b, Severity::Severe))));
        let resolver = resolver(store).with_backend(Arc::new(backend));

        let report = resolver.check_interactions(&["warfarin", "heparin"]).await;
        let found = report.interactions[0].as_interaction().unwrap();
        assert_eq!(found.severity, Severity::Severe);
        assert_eq!(found.source, RecordSource::FallbackStore);
    }

    #[tokio::test]
    async fn test_graph_hit_skips_store() {
        let mut backend = MockInteractionBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_find_interaction().times(1).returning(|a, b| {
            Ok(Some(record(a, b, Severity::Moderate).with_source(RecordSource::Graph)))
        });
        let mut store = ready_store();
        store.expect_query_interaction().never();
        let resolver = resolver(store).with_backend(Arc::new(backend));

        let report = resolver.check_interactions(&["simvastatin", "amiodarone"]).await;
        let found = report.interactions[0].as_interaction().unwrap();
        assert_eq!(found.source, RecordSource::Graph);
    }

    #[tokio::test]
    async fn test_hanging_graph_times_out_to_store() {
        let mut store = ready_store();
        store
            .expect_query_interaction()
            .times(1)
            .returning(|a, b| Ok(Some(record(a, b, Severity::Severe))));
        let config = ResolverConfig {
            graph_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let resolver = InteractionResolver::new(Arc::new(store), config)
            .with_backend(Arc::new(HangingBackend));

        let report = resolver.check_interactions(&["warfarin", "heparin"]).await;
        assert_eq!(report.interactions.len(), 1);
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache_in_either_order() {
        let mut store = ready_store();
        store
            .expect_query_interaction()
            .times(1)
            .returning(|a, b| Ok(Some(record(a, b, Severity::Severe))));
        let resolver = resolver(store);

        let first = resolver.check_interactions(&["warfarin", "heparin"]).await;
        let second = resolver.check_interactions(&["heparin", "warfarin"]).await;
        assert_eq!(first.interactions, second.interactions);
        assert_eq!(resolver.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_no_interaction_is_cached() {
        let mut store = ready_store();
        store.expect_query_interaction().times(1).returning(|_, _| Ok(None));
        let resolver = resolver(store);

        resolver.check_interactions(&["metformin", "omeprazole"]).await;
        let again = resolver.check_interactions(&["omeprazole", "metformin"]).await;
        assert!(!again.found_interactions);
        assert_eq!(resolver.cache().get("metformin", "omeprazole"), Some(None));
    }

    #[tokio::test]
    async fn test_store_errors_degrade_per_pair_and_are_not_cached() {
        let mut store = ready_store();
        store
            .expect_query_interaction()
            .times(2)
            .returning(|_, _| Err(MedSafeError::query("database is locked")));
        let resolver = resolver(store);

        let report = resolver.check_interactions(&["warfarin", "heparin"]).await;
        assert!(!report.found_interactions);
        resolver.check_interactions(&["warfarin", "heparin"]).await;
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_store_unavailable_still_returns_report() {
        let mut store = MockInteractionStore::new();
        store
            .expect_state()
            .return_const(StoreState::Failed("seed file missing".to_string()));
        store
            .expect_query_interaction()
            .returning(|_, _| Err(MedSafeError::store_init_failed("seed file missing")));
        let resolver = resolver(store);

        let report = resolver
            .check_interactions(&["warfarin", "heparin", "lisinopril", "atenolol"])
            .await;
        // Only the look-alike block survives
        assert_eq!(report.interactions.len(), 1);
        assert!(report.interactions[0].is_safety_block());
        assert_eq!(report.pairs_checked, 6);
        assert!(matches!(resolver.health().store, StoreState::Failed(_)));
    }

    #[tokio::test]
    async fn test_symmetry_across_orderings() {
        let drugs = ["warfarin", "aspirin", "simvastatin", "clarithromycin"];
        let make = || {
            let mut store = ready_store();
            store.expect_query_interaction().returning(|a, b| {
                let hit = matches!(
                    (a.min(b), a.max(b)),
                    ("aspirin", "warfarin") | ("clarithromycin", "simvastatin")
                );
                Ok(hit.then(|| record(a, b, Severity::Severe)))
            });
            resolver(store)
        };

        let forward = make().check_interactions(&drugs).await;
        let mut reversed_input = drugs;
        reversed_input.reverse();
        let reversed = make().check_interactions(&reversed_input).await;

        assert_eq!(forward.interactions.len(), 2);
        assert_eq!(reversed.interactions.len(), 2);
        for result in &forward.interactions {
            let (a, b) = result.pair();
            let other = reversed.find(a, b).expect("pair present in both orders");
            assert_eq!(result.severity_label(), other.severity_label());
            assert_eq!(
                result.as_interaction().map(|r| &r.category),
                other.as_interaction().map(|r| &r.category)
            );
        }
    }

    #[tokio::test]
    async fn test_duplicate_and_blank_names() {
        let mut store = ready_store();
        store.expect_query_interaction().never();
        let resolver = resolver(store);

        let report = resolver.check_interactions(&["Warfarin", "  ", "warfarin"]).await;
        assert_eq!(report.drugs_checked, vec!["warfarin", "warfarin"]);
        assert_eq!(report.interactions.len(), 1);
        assert!(report.interactions[0].is_safety_block());
        assert!(report.warnings.iter().any(|w| w.contains("blank")));
    }

    #[tokio::test]
    async fn test_deadline_yields_partial_report() {
        let store = SlowStore {
            delay: Duration::from_millis(500),
        };
        let resolver = InteractionResolver::new(Arc::new(store), ResolverConfig::default());

        let deadline = Instant::now() + Duration::from_millis(50);
        let report = resolver
            .check_interactions_with_deadline(
                &["warfarin", "heparin", "lisinopril", "atenolol"],
                Some(deadline),
            )
            .await;

        assert!(report.partial);
        assert!(report.pairs_checked < 6);
        assert!(report.warnings.iter().any(|w| w.contains("Deadline exceeded")));
        assert!(report.interactions.iter().all(|r| r.is_safety_block()));
    }

    #[tokio::test]
    async fn test_health_snapshot() {
        let resolver = resolver(ready_store());
        let health = resolver.health();
        assert_eq!(health.store, StoreState::Ready);
        assert_eq!(health.backend, "null");
        assert_eq!(health.cache.capacity, 100);
    }
}
