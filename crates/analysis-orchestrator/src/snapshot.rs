use analysis_core::{
    AnalysisError, Bar, CompanyData, MarketDataProvider, PeerData, PeerRecord, PeerSetProvider,
    RiskFreeRateSource, SectorId, TechnicalData,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use technical_analysis::FromBars;

/// Offline market data, typically loaded from a JSON file.
///
/// ```json
/// {
///   "risk_free_rate": 0.068,
///   "companies": { "TCS.NS": { "ticker": "TCS.NS", "sector": "Technology" } },
///   "peers": { "TCS.NS": [{ "ticker": "INFY.NS", "pe_ratio": 24.0 }] },
///   "technicals": { "TCS.NS": { "rsi": 48.0, "trend": "uptrend" } },
///   "bars": { "INFY.NS": [] }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSnapshot {
    pub risk_free_rate: Option<f64>,
    pub companies: HashMap<String, CompanyData>,
    pub peers: HashMap<String, Vec<PeerRecord>>,
    pub technicals: HashMap<String, TechnicalData>,
    pub bars: HashMap<String, Vec<Bar>>,
}

/// Serves all three data collaborators from a [`MarketSnapshot`].
pub struct SnapshotProvider {
    snapshot: MarketSnapshot,
}

impl SnapshotProvider {
    pub fn new(mut snapshot: MarketSnapshot) -> Self {
        for (ticker, company) in snapshot.companies.iter_mut() {
            if company.ticker.is_empty() {
                company.ticker = ticker.clone();
            }
        }
        Self { snapshot }
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let snapshot: MarketSnapshot = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidData(format!("Malformed snapshot: {e}")))?;
        Ok(Self::new(snapshot))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AnalysisError::ApiError(format!("Cannot read snapshot {}: {}", path.display(), e))
        })?;
        let provider = Self::from_json(&raw)?;
        tracing::info!(
            "Loaded snapshot {} with {} companies",
            path.display(),
            provider.snapshot.companies.len()
        );
        Ok(provider)
    }

    pub fn snapshot(&self) -> &MarketSnapshot {
        &self.snapshot
    }

    /// Indicator snapshot for `ticker`: explicit values first, then derived from bars.
    pub fn technical_data(&self, ticker: &str) -> TechnicalData {
        if let Some(data) = lookup(&self.snapshot.technicals, ticker) {
            return data.clone();
        }
        lookup(&self.snapshot.bars, ticker)
            .map(|bars| TechnicalData::from_bars(bars))
            .unwrap_or_default()
    }

    /// Peers derived from other snapshot companies whose sector label maps to `sector`.
    fn derived_peers(&self, ticker: &str, sector: SectorId) -> Vec<PeerRecord> {
        let mut peers: Vec<PeerRecord> = self
            .snapshot
            .companies
            .values()
            .filter(|c| !c.ticker.eq_ignore_ascii_case(ticker))
            .filter(|c| {
                c.sector
                    .as_deref()
                    .and_then(SectorId::from_label)
                    .or_else(|| c.industry.as_deref().and_then(SectorId::from_label))
                    == Some(sector)
            })
            .map(|c| {
                let ratios = c.ratios.normalized();
                PeerRecord {
                    ticker: c.ticker.clone(),
                    pe_ratio: ratios.trailing_pe,
                    revenue_growth: ratios.revenue_growth,
                    profit_margin: ratios.profit_margin,
                    roe: ratios.roe,
                }
            })
            .collect();
        peers.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        peers
    }
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, ticker: &str) -> Option<&'a T> {
    map.get(ticker).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(ticker))
            .map(|(_, value)| value)
    })
}

#[async_trait]
impl MarketDataProvider for SnapshotProvider {
    async fn company_data(&self, ticker: &str) -> Result<CompanyData, AnalysisError> {
        lookup(&self.snapshot.companies, ticker)
            .cloned()
            .ok_or_else(|| AnalysisError::InsufficientData(format!("{ticker} not in snapshot")))
    }
}

#[async_trait]
impl RiskFreeRateSource for SnapshotProvider {
    async fn risk_free_rate(&self) -> Result<f64, AnalysisError> {
        self.snapshot
            .risk_free_rate
            .ok_or_else(|| AnalysisError::InsufficientData("Snapshot has no risk-free rate".to_string()))
    }
}

#[async_trait]
impl PeerSetProvider for SnapshotProvider {
    async fn peers(&self, ticker: &str, sector: SectorId) -> Result<PeerData, AnalysisError> {
        let peers = match lookup(&self.snapshot.peers, ticker) {
            Some(explicit) => explicit
                .iter()
                .filter(|p| !p.ticker.eq_ignore_ascii_case(ticker))
                .cloned()
                .collect(),
            None => self.derived_peers(ticker, sector),
        };
        tracing::debug!("{} peers for {} from snapshot", peers.len(), ticker);
        Ok(PeerData::new(peers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "risk_free_rate": 0.068,
        "companies": {
            "TCS.NS": { "sector": "Technology", "industry": "Information Technology Services",
                        "ratios": { "trailingPE": 30.0, "returnOnEquity": 0.45 } },
            "INFY.NS": { "ticker": "INFY.NS", "industry": "Software - IT Services",
                         "ratios": { "trailingPE": 24.0, "profitMargins": 0.17 } },
            "HDFCBANK.NS": { "ticker": "HDFCBANK.NS", "sector": "Banks - Regional" }
        },
        "peers": {
            "HDFCBANK.NS": [{ "ticker": "ICICIBANK.NS", "pe_ratio": 18.0 },
                            { "ticker": "HDFCBANK.NS", "pe_ratio": 19.0 }]
        },
        "technicals": { "TCS.NS": { "rsi": 41.0, "ma_trend": "uptrend" } }
    }"#;

    fn provider() -> SnapshotProvider {
        SnapshotProvider::from_json(SNAPSHOT).unwrap()
    }

    #[tokio::test]
    async fn test_company_lookup_fills_ticker() {
        let company = provider().company_data("tcs.ns").await.unwrap();
        assert_eq!(company.ticker, "TCS.NS");
        assert_eq!(company.ratios.trailing_pe, Some(30.0));

        let err = provider().company_data("WIPRO.NS").await.unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[tokio::test]
    async fn test_risk_free_rate() {
        assert_eq!(provider().risk_free_rate().await.unwrap(), 0.068);
        let empty = SnapshotProvider::from_json("{}").unwrap();
        assert!(empty.risk_free_rate().await.is_err());
    }

    #[tokio::test]
    async fn test_explicit_peers_exclude_self() {
        let peers = provider().peers("HDFCBANK.NS", SectorId::Bfsi).await.unwrap();
        assert_eq!(peers.peers.len(), 1);
        assert_eq!(peers.peers[0].ticker, "ICICIBANK.NS");
    }

    #[tokio::test]
    async fn test_peers_derived_from_sector_labels() {
        let peers = provider().peers("TCS.NS", SectorId::It).await.unwrap();
        assert_eq!(peers.peers.len(), 1);
        assert_eq!(peers.peers[0].ticker, "INFY.NS");
        assert_eq!(peers.peers[0].pe_ratio, Some(24.0));
    }

    #[test]
    fn test_technical_data_sources() {
        let provider = provider();
        assert_eq!(provider.technical_data("TCS.NS").rsi, Some(41.0));
        assert!(provider.technical_data("INFY.NS").is_empty());
    }

    #[test]
    fn test_malformed_snapshot() {
        let err = SnapshotProvider::from_json("{\"companies\": 3}").err().unwrap();
        assert!(matches!(err, AnalysisError::InvalidData(_)));
    }
}
