use analysis_core::{
    CompanyData, ComponentKind, ComponentScore, DcfMode, InvestmentLabel, PeerData, SectorId,
    TechnicalData, ValuationSignal, WeightedScoreResult,
};
use fundamental_analysis::{FinancialHealthScorer, PeerComparisonScorer};
use sector_dcf::SectorDcfEngine;
use sector_intelligence::SectorModelRegistry;
use std::sync::Arc;
use std::time::Duration;
use technical_analysis::TechnicalMomentumScorer;
use tokio::task::JoinHandle;

use crate::config::ScoringConfig;

/// Upside in percent that maps to a full +100 valuation score
const FULL_SCALE_UPSIDE_PCT: f64 = 40.0;
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.2;
pub const DEFAULT_COMPONENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Combines valuation, financial health, technicals and peer standing into one
/// weighted score.
///
/// Holds no state between calls: identical inputs give identical results.
pub struct WeightedScoringEngine {
    registry: Arc<SectorModelRegistry>,
    dcf_engine: Arc<SectorDcfEngine>,
    dcf_mode: DcfMode,
    component_timeout: Duration,
    confidence_floor: f64,
}

impl WeightedScoringEngine {
    pub fn new(registry: Arc<SectorModelRegistry>) -> Self {
        Self {
            dcf_engine: Arc::new(SectorDcfEngine::new(registry.clone())),
            registry,
            dcf_mode: DcfMode::default(),
            component_timeout: DEFAULT_COMPONENT_TIMEOUT,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
        }
    }

    pub fn from_config(registry: Arc<SectorModelRegistry>, config: &ScoringConfig) -> Self {
        Self::new(registry)
            .with_dcf_mode(config.dcf_mode)
            .with_component_timeout(config.component_timeout)
            .with_confidence_floor(config.confidence_floor)
    }

    pub fn with_dcf_mode(mut self, mode: DcfMode) -> Self {
        self.dcf_mode = mode;
        self
    }

    pub fn with_component_timeout(mut self, timeout: Duration) -> Self {
        self.component_timeout = timeout;
        self
    }

    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = if floor.is_nan() {
            DEFAULT_CONFIDENCE_FLOOR
        } else {
            floor.clamp(0.0, 1.0)
        };
        self
    }

    /// Scores `ticker`, running the sector DCF for the valuation component.
    pub async fn score(
        &self,
        ticker: &str,
        company: Arc<CompanyData>,
        sector: SectorId,
        peers: Arc<PeerData>,
        technical: Arc<TechnicalData>,
    ) -> WeightedScoreResult {
        let dcf_task = {
            let engine = self.dcf_engine.clone();
            let company = company.clone();
            let ticker = ticker.to_string();
            let mode = self.dcf_mode;
            tokio::spawn(async move {
                match engine.calculate(&ticker, sector, mode, &company).await {
                    Ok(result) => valuation_component(&ValuationSignal::Dcf(result)),
                    Err(e) => {
                        tracing::warn!("DCF failed for {}: {}", ticker, e);
                        ComponentScore::degraded(ComponentKind::Dcf, format!("DCF unavailable: {e}"))
                    }
                }
            })
        };
        self.run(ticker, dcf_task, company, sector, peers, technical)
            .await
    }

    /// Scores `ticker` with a valuation computed elsewhere, single-sector or blended.
    pub async fn score_with_valuation(
        &self,
        ticker: &str,
        company: Arc<CompanyData>,
        sector: SectorId,
        peers: Arc<PeerData>,
        technical: Arc<TechnicalData>,
        valuation: Option<Arc<ValuationSignal>>,
    ) -> WeightedScoreResult {
        let dcf_task = tokio::spawn(async move {
            match valuation {
                Some(valuation) => valuation_component(&valuation),
                None => ComponentScore::degraded(ComponentKind::Dcf, "No valuation available"),
            }
        });
        self.run(ticker, dcf_task, company, sector, peers, technical)
            .await
    }

    async fn run(
        &self,
        ticker: &str,
        dcf_task: JoinHandle<ComponentScore>,
        company: Arc<CompanyData>,
        sector: SectorId,
        peers: Arc<PeerData>,
        technical: Arc<TechnicalData>,
    ) -> WeightedScoreResult {
        let financial_task = {
            let registry = self.registry.clone();
            let company = company.clone();
            tokio::spawn(async move {
                FinancialHealthScorer::new().score(&company, registry.profile_for(sector))
            })
        };
        let technical_task =
            tokio::spawn(async move { TechnicalMomentumScorer::new().score(&technical) });
        let peer_task = tokio::spawn(async move { PeerComparisonScorer::new().score(&company, &peers) });

        let timeout = self.component_timeout;
        let (dcf, financial, technical, peer) = tokio::join!(
            settle(ComponentKind::Dcf, timeout, dcf_task),
            settle(ComponentKind::Financial, timeout, financial_task),
            settle(ComponentKind::Technical, timeout, technical_task),
            settle(ComponentKind::Peer, timeout, peer_task),
        );

        self.combine(ticker, dcf, financial, technical, peer)
    }

    /// Weighted sum of the four components and the confidence-weighted blend.
    pub fn combine(
        &self,
        ticker: &str,
        dcf: ComponentScore,
        financial: ComponentScore,
        technical: ComponentScore,
        peer: ComponentScore,
    ) -> WeightedScoreResult {
        let components = [&dcf, &financial, &technical, &peer];
        let total_score: f64 = components.iter().map(|c| c.weighted()).sum();
        let weighted_confidence: f64 = components
            .iter()
            .map(|c| c.component.weight() * c.confidence)
            .sum();
        let confidence = weighted_confidence.max(self.confidence_floor).min(1.0);
        let label = InvestmentLabel::from_score(total_score);

        let degraded: Vec<&str> = components
            .iter()
            .filter(|c| c.is_degraded())
            .map(|c| c.component.label())
            .collect();
        if !degraded.is_empty() {
            tracing::warn!("{}: degraded components: {}", ticker, degraded.join(", "));
        }
        tracing::info!(
            "{}: score {:.1} ({}), confidence {:.2}",
            ticker,
            total_score,
            label,
            confidence
        );

        WeightedScoreResult {
            ticker: ticker.to_string(),
            total_score,
            label,
            confidence,
            dcf,
            financial,
            technical,
            peer,
        }
    }
}

/// Awaits a component task, turning a panic or timeout into a degraded score.
pub(crate) async fn settle(
    component: ComponentKind,
    timeout: Duration,
    mut handle: JoinHandle<ComponentScore>,
) -> ComponentScore {
    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(score)) => score,
        Ok(Err(e)) => {
            tracing::warn!("{} component task failed: {}", component, e);
            ComponentScore::degraded(component, format!("{} component failed", component.label()))
        }
        Err(_) => {
            handle.abort();
            tracing::warn!("{} component timed out after {:?}", component, timeout);
            ComponentScore::degraded(
                component,
                format!("{} component timed out after {}ms", component.label(), timeout.as_millis()),
            )
        }
    }
}

/// Valuation component: upside in percent, ±40% maps to ±100.
pub fn valuation_component(valuation: &ValuationSignal) -> ComponentScore {
    let Some(upside) = valuation.upside_pct().filter(|u| u.is_finite()) else {
        let mut reasoning = vec![format!("No upside from {} valuation", valuation.describe())];
        if let ValuationSignal::Dcf(result) = valuation {
            reasoning.extend(result.reasoning.iter().cloned());
        }
        return ComponentScore {
            reasoning,
            ..ComponentScore::degraded(ComponentKind::Dcf, "")
        };
    };

    let mut reasoning = vec![match valuation.fair_value_per_share() {
        Some(fair) => format!(
            "{} fair value {:.2}, upside {:+.1}%",
            valuation.describe(),
            fair,
            upside
        ),
        None => format!("{} valuation gap {:+.1}%", valuation.describe(), upside),
    }];
    match valuation {
        ValuationSignal::Dcf(result) => reasoning.extend(result.reasoning.iter().cloned()),
        ValuationSignal::Blended(result) => reasoning.extend(result.reasoning.iter().cloned()),
    }

    ComponentScore::from_raw(
        ComponentKind::Dcf,
        upside,
        FULL_SCALE_UPSIDE_PCT,
        valuation.confidence(),
        reasoning,
    )
}
