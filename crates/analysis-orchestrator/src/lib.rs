use analysis_core::{
    AnalysisError, ClassificationResult, CompanyData, MarketDataProvider, PeerData,
    PeerSetProvider, ResultCache, RiskFreeRateSource, SectorId, TechnicalData, ValuationSignal,
    WeightedScoreResult,
};
use sector_dcf::{SectorDcfEngine, SumOfPartsBlender};
use sector_intelligence::{SectorClassifier, SectorModelRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod scoring;
pub mod snapshot;

#[cfg(test)]
mod scoring_tests;

pub use cache::{assessment_cache_key, InMemoryResultCache};
pub use config::ScoringConfig;
pub use scoring::{valuation_component, WeightedScoringEngine};
pub use snapshot::{MarketSnapshot, SnapshotProvider};

/// Everything produced for one ticker: sector view, valuation and composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAssessment {
    pub ticker: String,
    pub classification: ClassificationResult,
    /// `None` when neither the DCF nor the sum-of-the-parts could run
    pub valuation: Option<ValuationSignal>,
    pub score: WeightedScoreResult,
}

pub struct ValuationOrchestrator {
    market_data: Arc<dyn MarketDataProvider>,
    peer_provider: Option<Arc<dyn PeerSetProvider>>,
    classifier: Arc<SectorClassifier>,
    dcf_engine: SectorDcfEngine,
    blender: SumOfPartsBlender,
    scoring: WeightedScoringEngine,
    cache: Option<Arc<dyn ResultCache>>,
    config: ScoringConfig,
}

impl ValuationOrchestrator {
    pub fn new(
        config: ScoringConfig,
        market_data: Arc<dyn MarketDataProvider>,
        rate_source: Option<Arc<dyn RiskFreeRateSource>>,
        peer_provider: Option<Arc<dyn PeerSetProvider>>,
    ) -> Self {
        let mut registry = SectorModelRegistry::builtin()
            .with_rate_timeout(config.rate_lookup_timeout)
            .with_fallback_risk_free_rate(config.fallback_risk_free_rate)
            .with_market_risk_premium(config.market_risk_premium);
        if let Some(source) = rate_source {
            registry = registry.with_rate_source(source);
        }
        let registry = Arc::new(registry);

        // Peers are fetched here alongside the valuation, not by the classifier
        let classifier = Arc::new(
            SectorClassifier::new(market_data.clone())
                .with_materiality_threshold(config.materiality_threshold),
        );

        Self {
            dcf_engine: SectorDcfEngine::new(registry.clone()),
            blender: SumOfPartsBlender::new(registry.clone(), classifier.clone(), market_data.clone())
                .with_discount(config.conglomerate_discount),
            scoring: WeightedScoringEngine::from_config(registry, &config),
            market_data,
            peer_provider,
            classifier,
            cache: None,
            config,
        }
    }

    /// Orchestrator over a snapshot that serves company data, rates and peers.
    pub fn from_snapshot(config: ScoringConfig, provider: Arc<SnapshotProvider>) -> Self {
        Self::new(
            config,
            provider.clone(),
            Some(provider.clone()),
            Some(provider),
        )
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Classifies, values and scores `ticker`.
    ///
    /// Collaborator failures only lower confidence; the one error is an empty ticker.
    pub async fn assess(
        &self,
        ticker: &str,
        technical: TechnicalData,
    ) -> Result<InvestmentAssessment, AnalysisError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(AnalysisError::Precondition("ticker must not be empty".to_string()));
        }
        tracing::info!("Starting assessment for {}", ticker);

        let company = match self.market_data.company_data(ticker).await {
            Ok(company) => company,
            Err(e) => {
                tracing::warn!("Company data unavailable for {}: {}", ticker, e);
                CompanyData::new(ticker)
            }
        };

        let mut classification = self.classifier.classify_from(ticker, &company);
        let sector = classification.primary_sector;
        tracing::info!(
            "{} classified as {} ({:?}, confidence {:.0}){}",
            ticker,
            sector,
            classification.evidence,
            classification.confidence,
            if classification.is_conglomerate { ", conglomerate" } else { "" }
        );

        let (valuation, peers) = tokio::join!(
            self.valuate(ticker, &classification, &company),
            self.fetch_peers(ticker, sector),
        );
        classification.peer_tickers = peers.peers.iter().map(|p| p.ticker.clone()).collect();

        let cache_key = match serde_json::to_vec(&(&valuation, &company, &peers, &technical)) {
            Ok(fingerprint) => Some(assessment_cache_key(ticker, &fingerprint)),
            Err(e) => {
                tracing::warn!("Cannot fingerprint inputs for {}: {}", ticker, e);
                None
            }
        };
        if let Some(cached) = self.cached(cache_key.as_deref()).await {
            tracing::info!("Serving cached assessment for {}", ticker);
            return Ok(cached);
        }

        let score = self
            .scoring
            .score_with_valuation(
                ticker,
                Arc::new(company),
                sector,
                Arc::new(peers),
                Arc::new(technical),
                valuation.clone().map(Arc::new),
            )
            .await;

        let assessment = InvestmentAssessment {
            ticker: ticker.to_string(),
            classification,
            valuation,
            score,
        };
        self.store(cache_key.as_deref(), &assessment).await;
        Ok(assessment)
    }

    async fn valuate(
        &self,
        ticker: &str,
        classification: &ClassificationResult,
        company: &CompanyData,
    ) -> Option<ValuationSignal> {
        if classification.is_conglomerate {
            return match self.blender.blend_classification(classification, company) {
                Ok(result) => Some(ValuationSignal::Blended(result)),
                Err(e) => {
                    tracing::warn!("Sum-of-the-parts failed for {}: {}", ticker, e);
                    None
                }
            };
        }

        match self
            .dcf_engine
            .calculate(ticker, classification.primary_sector, self.config.dcf_mode, company)
            .await
        {
            Ok(result) => Some(ValuationSignal::Dcf(result)),
            Err(e) => {
                tracing::warn!("DCF failed for {}: {}", ticker, e);
                None
            }
        }
    }

    async fn fetch_peers(&self, ticker: &str, sector: SectorId) -> PeerData {
        let Some(provider) = self.peer_provider.as_ref().filter(|_| self.config.include_peers) else {
            return PeerData::default();
        };
        match provider.peers(ticker, sector).await {
            Ok(mut peers) => {
                peers.peers.retain(|p| !p.ticker.eq_ignore_ascii_case(ticker));
                peers
            }
            Err(e) => {
                tracing::warn!("Peer lookup failed for {}: {}", ticker, e);
                PeerData::default()
            }
        }
    }

    async fn cached(&self, key: Option<&str>) -> Option<InvestmentAssessment> {
        let (cache, key) = (self.cache.as_ref()?, key?);
        let raw = cache.get(key).await?;
        match decode_cached(&raw) {
            Ok(assessment) => Some(assessment),
            Err(e) => {
                tracing::debug!("Ignoring cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn store(&self, key: Option<&str>, assessment: &InvestmentAssessment) {
        let (Some(cache), Some(key)) = (self.cache.as_ref(), key) else {
            return;
        };
        match serde_json::to_string(assessment) {
            Ok(json) => cache.put(key, json, self.config.result_cache_ttl).await,
            Err(e) => tracing::warn!("Cannot cache assessment for {}: {}", assessment.ticker, e),
        }
    }
}

/// Decodes a cached assessment; corrupt entries surface as `CacheError`.
pub fn decode_cached(raw: &str) -> Result<InvestmentAssessment, AnalysisError> {
    serde_json::from_str(raw)
        .map_err(|e| AnalysisError::CacheError(format!("undecodable assessment: {e}")))
}
