use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{AnalysisError, MultipleBand, SectorId, TradingMultiples};

/// Which rung of the evidence ladder produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// Revenue splits disclosed in the company snapshot
    DisclosedSegments,
    /// Reference table of known multi-segment companies
    KnownConglomerate,
    /// Activity keywords in the business description
    BusinessDescription,
    /// Provider sector or industry label
    SectorLabel,
    /// Built-in ticker table
    KnownTicker,
    /// Nothing matched
    Fallback,
}

/// A line of business with its estimated share of group revenue (0..=1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSegment {
    pub sector: SectorId,
    pub label: String,
    pub revenue_contribution: f64,
}

impl BusinessSegment {
    pub fn new(sector: SectorId, label: impl Into<String>, revenue_contribution: f64) -> Self {
        Self {
            sector,
            label: label.into(),
            revenue_contribution,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub ticker: String,
    pub company_name: Option<String>,
    pub primary_sector: SectorId,
    /// True iff at least two segments clear the materiality threshold
    pub is_conglomerate: bool,
    /// Largest first, contributions sum to at most 1
    pub segments: Vec<BusinessSegment>,
    /// Evidence strength, 0-100
    pub confidence: f64,
    pub evidence: EvidenceKind,
    pub peer_tickers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DcfMode {
    /// Single stage, 5-year explicit horizon
    #[default]
    Simple,
    /// 10-year horizon with growth and returns fading to terminal levels
    MultiStage,
}

impl DcfMode {
    pub fn projection_years(&self) -> usize {
        match self {
            DcfMode::Simple => 5,
            DcfMode::MultiStage => 10,
        }
    }
}

impl fmt::Display for DcfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DcfMode::Simple => write!(f, "simple"),
            DcfMode::MultiStage => write!(f, "multi_stage"),
        }
    }
}

impl FromStr for DcfMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "simple" => Ok(DcfMode::Simple),
            "multi_stage" | "multistage" | "multi" => Ok(DcfMode::MultiStage),
            other => Err(AnalysisError::InvalidData(format!("Unknown DCF mode: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DcfMethod {
    BankResidualIncome,
    FirmFreeCashFlow,
}

/// Caller-supplied replacements for registry or reported inputs.
/// Any field left `None` falls back to the usual source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfOverrides {
    pub revenue_growth: Option<f64>,
    pub ebitda_margin: Option<f64>,
    pub terminal_growth: Option<f64>,
    pub discount_rate: Option<f64>,
    pub tax_rate: Option<f64>,
    pub roe: Option<f64>,
    pub book_value_per_share: Option<f64>,
}

/// Inputs the model actually ran with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    pub risk_free_rate: f64,
    /// WACC for the firm model, cost of equity for the bank model
    pub discount_rate: f64,
    pub terminal_growth: f64,
    pub projection_years: usize,
    pub tax_rate: f64,
    pub revenue_growth: Option<f64>,
    pub ebitda_margin: Option<f64>,
    pub roe: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub payout_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfResult {
    pub ticker: String,
    pub sector: SectorId,
    pub method: DcfMethod,
    pub mode: DcfMode,
    /// `None` when a mandatory input was missing
    pub fair_value_per_share: Option<f64>,
    pub current_price: Option<f64>,
    pub upside_pct: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub equity_value: Option<f64>,
    pub confidence: f64,
    pub assumptions: DcfAssumptions,
    pub reasoning: Vec<String>,
}

/// How a segment's value was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationBasis {
    /// Share of net income × sector median P/E
    Earnings,
    /// Share of revenue × implied price/sales
    Revenue,
    /// No usable financials; contributes zero
    Unpriced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentValuation {
    pub segment: BusinessSegment,
    pub multiples: TradingMultiples,
    pub basis: ValuationBasis,
    /// Multiple applied to the segment's earnings or revenue
    pub applied_multiple: Option<f64>,
    pub value: f64,
}

/// Revenue-weighted sector multiples; `None` when no segment had a positive one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedMultiples {
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub ev_ebitda: Option<f64>,
    pub pe_band: Option<MultipleBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedValuationResult {
    pub ticker: String,
    pub company_name: Option<String>,
    pub segments: Vec<SegmentValuation>,
    pub sum_of_parts_value: f64,
    /// Percent, e.g. 20.0
    pub conglomerate_discount_pct: f64,
    pub discounted_sotp_value: f64,
    pub market_cap: Option<f64>,
    pub valuation_gap_pct: Option<f64>,
    pub blended_multiples: BlendedMultiples,
    pub fair_value_per_share: Option<f64>,
    pub current_price: Option<f64>,
    pub upside_pct: Option<f64>,
    pub confidence: f64,
    pub reasoning: Vec<String>,
}

/// Valuation consumed by the DCF scoring component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum ValuationSignal {
    Dcf(DcfResult),
    Blended(BlendedValuationResult),
}

impl ValuationSignal {
    pub fn upside_pct(&self) -> Option<f64> {
        match self {
            ValuationSignal::Dcf(r) => r.upside_pct,
            ValuationSignal::Blended(r) => r.upside_pct.or(r.valuation_gap_pct),
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            ValuationSignal::Dcf(r) => r.confidence,
            ValuationSignal::Blended(r) => r.confidence,
        }
    }

    pub fn fair_value_per_share(&self) -> Option<f64> {
        match self {
            ValuationSignal::Dcf(r) => r.fair_value_per_share,
            ValuationSignal::Blended(r) => r.fair_value_per_share,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ValuationSignal::Dcf(r) => match r.method {
                DcfMethod::BankResidualIncome => "bank residual income",
                DcfMethod::FirmFreeCashFlow => "free cash flow",
            },
            ValuationSignal::Blended(_) => "sum of the parts",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dcf_mode_parsing() {
        assert_eq!("simple".parse::<DcfMode>().unwrap(), DcfMode::Simple);
        assert_eq!("Multi-Stage".parse::<DcfMode>().unwrap(), DcfMode::MultiStage);
        assert!("monte_carlo".parse::<DcfMode>().is_err());
        assert_eq!(DcfMode::Simple.projection_years(), 5);
        assert_eq!(DcfMode::MultiStage.projection_years(), 10);
    }

    #[test]
    fn test_blended_signal_falls_back_to_valuation_gap() {
        let blended = BlendedValuationResult {
            ticker: "CONG".to_string(),
            company_name: None,
            segments: Vec::new(),
            sum_of_parts_value: 100.0,
            conglomerate_discount_pct: 20.0,
            discounted_sotp_value: 80.0,
            market_cap: Some(64.0),
            valuation_gap_pct: Some(25.0),
            blended_multiples: BlendedMultiples {
                pe: None,
                pb: None,
                ev_ebitda: None,
                pe_band: None,
            },
            fair_value_per_share: None,
            current_price: None,
            upside_pct: None,
            confidence: 0.6,
            reasoning: Vec::new(),
        };
        let signal = ValuationSignal::Blended(blended);
        assert_eq!(signal.upside_pct(), Some(25.0));
        assert_eq!(signal.describe(), "sum of the parts");
    }
}
