use analysis_core::{AnalysisError, RiskFreeRateSource, SectorId, SectorProfile};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::profiles::{builtin_profiles, generic_profile};

/// 10-year G-Sec yield used when no live rate is available
pub const FALLBACK_RISK_FREE_RATE: f64 = 0.07;
pub const DEFAULT_MARKET_RISK_PREMIUM: f64 = 0.07;
/// Spread over the risk-free rate for corporate borrowing
pub const DEFAULT_CREDIT_SPREAD: f64 = 0.02;
pub const MIN_WACC: f64 = 0.06;
pub const MAX_WACC: f64 = 0.25;

/// Per-sector valuation parameters plus the cost-of-capital model built on them.
///
/// The profile table is immutable once constructed; share it behind an `Arc`.
pub struct SectorModelRegistry {
    profiles: HashMap<SectorId, SectorProfile>,
    fallback: SectorProfile,
    rate_source: Option<Arc<dyn RiskFreeRateSource>>,
    rate_timeout: Duration,
    fallback_risk_free_rate: f64,
    market_risk_premium: f64,
    credit_spread: f64,
}

impl SectorModelRegistry {
    pub fn builtin() -> Self {
        Self::with_profiles(builtin_profiles())
    }

    /// Registry over a substitute table. A missing GENERIC entry is filled
    /// from the built-in one so lookups stay total.
    pub fn with_profiles(profiles: Vec<SectorProfile>) -> Self {
        let profiles: HashMap<SectorId, SectorProfile> =
            profiles.into_iter().map(|p| (p.sector, p)).collect();
        let fallback = profiles
            .get(&SectorId::Generic)
            .cloned()
            .unwrap_or_else(generic_profile);

        Self {
            profiles,
            fallback,
            rate_source: None,
            rate_timeout: Duration::from_millis(2_000),
            fallback_risk_free_rate: FALLBACK_RISK_FREE_RATE,
            market_risk_premium: DEFAULT_MARKET_RISK_PREMIUM,
            credit_spread: DEFAULT_CREDIT_SPREAD,
        }
    }

    pub fn with_rate_source(mut self, source: Arc<dyn RiskFreeRateSource>) -> Self {
        self.rate_source = Some(source);
        self
    }

    pub fn with_rate_timeout(mut self, timeout: Duration) -> Self {
        self.rate_timeout = timeout;
        self
    }

    pub fn with_fallback_risk_free_rate(mut self, rate: f64) -> Self {
        self.fallback_risk_free_rate = rate;
        self
    }

    pub fn with_market_risk_premium(mut self, premium: f64) -> Self {
        self.market_risk_premium = premium;
        self
    }

    pub fn profile_for(&self, sector: SectorId) -> &SectorProfile {
        self.profiles.get(&sector).unwrap_or(&self.fallback)
    }

    pub fn supported_sectors(&self) -> Vec<SectorId> {
        let mut sectors: Vec<SectorId> = self.profiles.keys().copied().collect();
        sectors.sort();
        sectors
    }

    pub fn fallback_risk_free_rate(&self) -> f64 {
        self.fallback_risk_free_rate
    }

    pub fn market_risk_premium(&self) -> f64 {
        self.market_risk_premium
    }

    /// Live risk-free rate, or the fallback when the source is absent, fails,
    /// times out or returns something implausible.
    pub async fn risk_free_rate(&self) -> f64 {
        match self.live_risk_free_rate().await {
            Ok(rate) => {
                tracing::debug!("Live risk-free rate: {:.4}", rate);
                rate
            }
            Err(AnalysisError::InsufficientData(_)) => self.fallback_risk_free_rate,
            Err(e) => {
                tracing::warn!(
                    "Risk-free rate lookup failed: {}, using fallback {:.4}",
                    e,
                    self.fallback_risk_free_rate
                );
                self.fallback_risk_free_rate
            }
        }
    }

    /// Queries the live source under the lookup timeout.
    pub async fn live_risk_free_rate(&self) -> Result<f64, AnalysisError> {
        let source = self
            .rate_source
            .as_ref()
            .ok_or_else(|| AnalysisError::InsufficientData("no risk-free rate source".to_string()))?;

        let rate = tokio::time::timeout(self.rate_timeout, source.risk_free_rate())
            .await
            .map_err(|_| {
                AnalysisError::Timeout(format!(
                    "risk-free rate lookup exceeded {}ms",
                    self.rate_timeout.as_millis()
                ))
            })??;
        if !(rate.is_finite() && rate > 0.0 && rate < 0.25) {
            return Err(AnalysisError::InvalidData(format!(
                "implausible risk-free rate {rate}"
            )));
        }
        Ok(rate)
    }

    pub async fn wacc_for(&self, sector: SectorId) -> f64 {
        let rate = self.risk_free_rate().await;
        self.wacc_with_rate(sector, rate)
    }

    /// Beta relevered at the sector's target capital structure (Hamada).
    pub fn levered_beta(&self, sector: SectorId) -> f64 {
        let p = self.profile_for(sector);
        p.unlevered_beta * (1.0 + (1.0 - p.effective_tax_rate) * p.target_debt_to_equity)
    }

    /// CAPM cost of equity.
    pub fn cost_of_equity_with_rate(&self, sector: SectorId, risk_free_rate: f64) -> f64 {
        risk_free_rate + self.levered_beta(sector) * self.market_risk_premium
    }

    /// WACC at the sector's target D/E, clamped to `[MIN_WACC, MAX_WACC]`.
    pub fn wacc_with_rate(&self, sector: SectorId, risk_free_rate: f64) -> f64 {
        let p = self.profile_for(sector);
        let cost_of_equity = self.cost_of_equity_with_rate(sector, risk_free_rate);
        let after_tax_cost_of_debt =
            (risk_free_rate + self.credit_spread) * (1.0 - p.effective_tax_rate);

        let de = p.target_debt_to_equity.max(0.0);
        let equity_weight = 1.0 / (1.0 + de);
        let debt_weight = de / (1.0 + de);

        let wacc = equity_weight * cost_of_equity + debt_weight * after_tax_cost_of_debt;
        if wacc.is_nan() {
            return MAX_WACC;
        }
        wacc.clamp(MIN_WACC, MAX_WACC)
    }
}

impl Default for SectorModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
