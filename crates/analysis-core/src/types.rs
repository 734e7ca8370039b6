use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::fraction;

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Trailing ratios as reported by the market data provider.
///
/// Values are fractions (0.15 = 15%). Providers that report some fields in
/// percent are handled by [`FinancialRatios::normalized`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialRatios {
    #[serde(alias = "trailingPE")]
    pub trailing_pe: Option<f64>,
    #[serde(alias = "priceToBook")]
    pub price_to_book: Option<f64>,
    #[serde(alias = "returnOnEquity")]
    pub roe: Option<f64>,
    #[serde(alias = "returnOnAssets")]
    pub roa: Option<f64>,
    #[serde(alias = "profitMargins")]
    pub profit_margin: Option<f64>,
    #[serde(alias = "revenueGrowth")]
    pub revenue_growth: Option<f64>,
    #[serde(alias = "debtToEquity")]
    pub debt_to_equity: Option<f64>,
    #[serde(alias = "currentRatio")]
    pub current_ratio: Option<f64>,
    #[serde(alias = "netInterestMargin")]
    pub net_interest_margin: Option<f64>,
    #[serde(alias = "costToIncome")]
    pub cost_to_income: Option<f64>,
    #[serde(alias = "gnpaRatio")]
    pub gross_npa_ratio: Option<f64>,
    #[serde(alias = "bookValue")]
    pub book_value_per_share: Option<f64>,
}

impl FinancialRatios {
    /// Drops non-finite values and rescales percent-reported fields.
    ///
    /// Return, margin and growth ratios above 1.0 are read as percentages. Debt/equity
    /// above 10 is read as a percentage (providers commonly report 36.6 for 0.366).
    pub fn normalized(&self) -> Self {
        fn finite(v: Option<f64>) -> Option<f64> {
            v.filter(|x| x.is_finite())
        }

        Self {
            trailing_pe: finite(self.trailing_pe),
            price_to_book: finite(self.price_to_book),
            roe: fraction(self.roe),
            roa: fraction(self.roa),
            profit_margin: fraction(self.profit_margin),
            revenue_growth: fraction(self.revenue_growth),
            debt_to_equity: finite(self.debt_to_equity)
                .map(|d| if d > 10.0 { d / 100.0 } else { d }),
            current_ratio: finite(self.current_ratio),
            net_interest_margin: fraction(self.net_interest_margin),
            cost_to_income: fraction(self.cost_to_income),
            gross_npa_ratio: fraction(self.gross_npa_ratio),
            book_value_per_share: finite(self.book_value_per_share),
        }
    }
}

/// Revenue reported for one business segment in company filings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDisclosure {
    pub name: String,
    pub revenue: f64,
}

/// Point-in-time company snapshot supplied by the market data provider.
///
/// Every field may be absent; consumers degrade rather than fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyData {
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub business_summary: Option<String>,
    pub current_price: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub market_cap: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub net_income: Option<f64>,
    pub total_debt: Option<f64>,
    pub cash: Option<f64>,
    /// Annual revenue, oldest first
    pub revenue_history: Vec<f64>,
    /// Annual EBITDA margin as a fraction, oldest first
    pub ebitda_margin_history: Vec<f64>,
    pub ratios: FinancialRatios,
    pub segment_revenues: Vec<SegmentDisclosure>,
}

impl CompanyData {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    /// Market cap as reported, or price × shares.
    pub fn market_cap_or_derived(&self) -> Option<f64> {
        crate::stats::positive(self.market_cap).or_else(|| {
            match (
                crate::stats::positive(self.current_price),
                crate::stats::positive(self.shares_outstanding),
            ) {
                (Some(p), Some(s)) => Some(p * s),
                _ => None,
            }
        })
    }
}

/// One peer company's trailing ratios.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerRecord {
    pub ticker: String,
    pub pe_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub profit_margin: Option<f64>,
    pub roe: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerData {
    pub peers: Vec<PeerRecord>,
}

impl PeerData {
    pub fn new(peers: Vec<PeerRecord>) -> Self {
        Self { peers }
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Moving-average trend direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

impl Trend {
    pub fn direction(&self) -> f64 {
        match self {
            Trend::Uptrend => 1.0,
            Trend::Downtrend => -1.0,
            Trend::Sideways => 0.0,
        }
    }
}

/// MACD line vs signal line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdSignal {
    BullishCrossover,
    Bullish,
    Neutral,
    Bearish,
    BearishCrossover,
}

impl MacdSignal {
    pub fn direction(&self) -> f64 {
        match self {
            MacdSignal::BullishCrossover => 1.0,
            MacdSignal::Bullish => 0.5,
            MacdSignal::Neutral => 0.0,
            MacdSignal::Bearish => -0.5,
            MacdSignal::BearishCrossover => -1.0,
        }
    }
}

/// Volume relative to its recent average, signed by price direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    HighBullish,
    NormalBullish,
    Neutral,
    NormalBearish,
    HighBearish,
}

impl VolumeTrend {
    pub fn direction(&self) -> f64 {
        match self {
            VolumeTrend::HighBullish => 1.0,
            VolumeTrend::NormalBullish => 0.5,
            VolumeTrend::Neutral => 0.0,
            VolumeTrend::NormalBearish => -0.5,
            VolumeTrend::HighBearish => -1.0,
        }
    }
}

/// Technical indicator snapshot consumed by the technical component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalData {
    pub rsi: Option<f64>,
    #[serde(alias = "ma_trend")]
    pub trend: Option<Trend>,
    #[serde(alias = "macd_signal")]
    pub macd: Option<MacdSignal>,
    pub volume_trend: Option<VolumeTrend>,
    /// Recent price change in percent
    pub price_momentum: Option<f64>,
}

impl TechnicalData {
    pub fn is_empty(&self) -> bool {
        self.rsi.is_none()
            && self.trend.is_none()
            && self.macd.is_none()
            && self.volume_trend.is_none()
            && self.price_momentum.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_normalization() {
        let ratios = FinancialRatios {
            roe: Some(15.0),
            profit_margin: Some(0.12),
            debt_to_equity: Some(36.6),
            current_ratio: Some(1.4),
            trailing_pe: Some(f64::NAN),
            ..Default::default()
        };
        let n = ratios.normalized();
        assert!((n.roe.unwrap() - 0.15).abs() < 1e-9);
        assert!((n.profit_margin.unwrap() - 0.12).abs() < 1e-9);
        assert!((n.debt_to_equity.unwrap() - 0.366).abs() < 1e-9);
        assert_eq!(n.current_ratio, Some(1.4));
        assert_eq!(n.trailing_pe, None);
    }

    #[test]
    fn test_growth_reported_in_percent_is_rescaled() {
        let n = FinancialRatios {
            revenue_growth: Some(12.0),
            ..Default::default()
        }
        .normalized();
        assert!((n.revenue_growth.unwrap() - 0.12).abs() < 1e-9);

        let n = FinancialRatios {
            revenue_growth: Some(-0.05),
            ..Default::default()
        }
        .normalized();
        assert_eq!(n.revenue_growth, Some(-0.05));
    }

    #[test]
    fn test_leverage_below_ten_is_a_ratio() {
        let ratios = FinancialRatios {
            debt_to_equity: Some(2.5),
            ..Default::default()
        };
        assert_eq!(ratios.normalized().debt_to_equity, Some(2.5));
    }

    #[test]
    fn test_market_cap_derived_from_price_and_shares() {
        let mut company = CompanyData::new("TEST");
        company.current_price = Some(100.0);
        company.shares_outstanding = Some(1_000.0);
        assert_eq!(company.market_cap_or_derived(), Some(100_000.0));

        company.market_cap = Some(250_000.0);
        assert_eq!(company.market_cap_or_derived(), Some(250_000.0));
    }

    #[test]
    fn test_technical_data_accepts_provider_field_names() {
        let json = r#"{"rsi": 25, "macd_signal": "bullish_crossover", "volume_trend": "high_bullish", "price_momentum": 15}"#;
        let data: TechnicalData = serde_json::from_str(json).unwrap();
        assert_eq!(data.macd, Some(MacdSignal::BullishCrossover));
        assert_eq!(data.volume_trend, Some(VolumeTrend::HighBullish));
        assert_eq!(data.rsi, Some(25.0));
        assert!(!data.is_empty());
    }

    #[test]
    fn test_company_data_accepts_provider_ratio_names() {
        let json = r#"{"ticker": "BANK", "current_price": 150, "ratios": {"returnOnEquity": 0.15, "bookValue": 140}}"#;
        let data: CompanyData = serde_json::from_str(json).unwrap();
        assert_eq!(data.ratios.roe, Some(0.15));
        assert_eq!(data.ratios.book_value_per_share, Some(140.0));
        assert_eq!(data.current_price, Some(150.0));
    }
}
