use analysis_core::DcfMode;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub materiality_threshold: f64, // 0.10 (10% of revenue)
    pub conglomerate_discount: f64, // 0.20, within [0.15, 0.25]
    pub confidence_floor: f64,      // 0.20

    pub component_timeout: Duration,   // 5s per scoring component
    pub rate_lookup_timeout: Duration, // 2s for the live risk-free rate
    pub result_cache_ttl: Duration,    // 5 minutes

    pub fallback_risk_free_rate: f64, // 0.07
    pub market_risk_premium: f64,     // 0.07

    pub dcf_mode: DcfMode,
    pub include_peers: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            materiality_threshold: 0.10,
            conglomerate_discount: 0.20,
            confidence_floor: 0.20,
            component_timeout: Duration::from_millis(5_000),
            rate_lookup_timeout: Duration::from_millis(2_000),
            result_cache_ttl: Duration::from_secs(300),
            fallback_risk_free_rate: 0.07,
            market_risk_premium: 0.07,
            dcf_mode: DcfMode::Simple,
            include_peers: true,
        }
    }
}

impl ScoringConfig {
    /// Reads overrides from the process environment; unset keys keep defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            materiality_threshold: parse_or(&lookup, "MATERIALITY_THRESHOLD", defaults.materiality_threshold)?,
            conglomerate_discount: parse_or(&lookup, "CONGLOMERATE_DISCOUNT", defaults.conglomerate_discount)?,
            confidence_floor: parse_or(&lookup, "CONFIDENCE_FLOOR", defaults.confidence_floor)?,
            component_timeout: Duration::from_millis(parse_or(
                &lookup,
                "COMPONENT_TIMEOUT_MS",
                defaults.component_timeout.as_millis() as u64,
            )?),
            rate_lookup_timeout: Duration::from_millis(parse_or(
                &lookup,
                "RATE_LOOKUP_TIMEOUT_MS",
                defaults.rate_lookup_timeout.as_millis() as u64,
            )?),
            result_cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "RESULT_CACHE_TTL_SECS",
                defaults.result_cache_ttl.as_secs(),
            )?),
            fallback_risk_free_rate: parse_or(&lookup, "FALLBACK_RISK_FREE_RATE", defaults.fallback_risk_free_rate)?,
            market_risk_premium: parse_or(&lookup, "MARKET_RISK_PREMIUM", defaults.market_risk_premium)?,
            dcf_mode: parse_or(&lookup, "DCF_MODE", defaults.dcf_mode)?,
            include_peers: parse_or(&lookup, "INCLUDE_PEERS", defaults.include_peers)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=0.5).contains(&self.materiality_threshold) {
            bail!(
                "MATERIALITY_THRESHOLD must be within [0, 0.5], got {}",
                self.materiality_threshold
            );
        }
        if !(0.15..=0.25).contains(&self.conglomerate_discount) {
            bail!(
                "CONGLOMERATE_DISCOUNT must be within [0.15, 0.25], got {}",
                self.conglomerate_discount
            );
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            bail!("CONFIDENCE_FLOOR must be within [0, 1], got {}", self.confidence_floor);
        }
        if self.component_timeout.is_zero() {
            bail!("COMPONENT_TIMEOUT_MS must be positive");
        }
        if self.rate_lookup_timeout.is_zero() {
            bail!("RATE_LOOKUP_TIMEOUT_MS must be positive");
        }
        if !(self.fallback_risk_free_rate > 0.0 && self.fallback_risk_free_rate < 0.25) {
            bail!(
                "FALLBACK_RISK_FREE_RATE must be within (0, 0.25), got {}",
                self.fallback_risk_free_rate
            );
        }
        if !(self.market_risk_premium > 0.0 && self.market_risk_premium <= 0.20) {
            bail!(
                "MARKET_RISK_PREMIUM must be within (0, 0.20], got {}",
                self.market_risk_premium
            );
        }
        Ok(())
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        _ => Ok(default),
    }
}
