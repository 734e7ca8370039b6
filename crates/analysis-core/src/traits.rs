use async_trait::async_trait;
use std::time::Duration;

use crate::{AnalysisError, CompanyData, PeerData, SectorId};

/// Source of company snapshots; any field may be missing
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn company_data(&self, ticker: &str) -> Result<CompanyData, AnalysisError>;
}

/// Live risk-free rate as a fraction (0.07 = 7%)
#[async_trait]
pub trait RiskFreeRateSource: Send + Sync {
    async fn risk_free_rate(&self) -> Result<f64, AnalysisError>;
}

/// Comparable companies for a ticker; an empty set is valid
#[async_trait]
pub trait PeerSetProvider: Send + Sync {
    async fn peers(&self, ticker: &str, sector: SectorId) -> Result<PeerData, AnalysisError>;
}

/// Key/value store for serialized results.
///
/// Callers treat misses, expired entries and undecodable payloads alike.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: String, ttl: Duration);
}
