use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// Sector archetypes with their own valuation parameters.
///
/// `Generic` is the documented fallback for anything unmapped: it carries
/// market-wide parameters rather than borrowing another sector's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SectorId {
    Bfsi,
    It,
    Pharma,
    Energy,
    Fmcg,
    RealEstate,
    Auto,
    Metals,
    Telecom,
    Retail,
    Infra,
    Generic,
}

/// Which cash-flow model family applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorFamily {
    /// Banks and lenders: equity valued from book value and returns
    Financial,
    /// Everything else: free cash flow to the firm
    NonFinancial,
}

impl SectorId {
    pub const ALL: [SectorId; 12] = [
        SectorId::Bfsi,
        SectorId::It,
        SectorId::Pharma,
        SectorId::Energy,
        SectorId::Fmcg,
        SectorId::RealEstate,
        SectorId::Auto,
        SectorId::Metals,
        SectorId::Telecom,
        SectorId::Retail,
        SectorId::Infra,
        SectorId::Generic,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            SectorId::Bfsi => "BFSI",
            SectorId::It => "IT",
            SectorId::Pharma => "PHARMA",
            SectorId::Energy => "ENERGY",
            SectorId::Fmcg => "FMCG",
            SectorId::RealEstate => "REALESTATE",
            SectorId::Auto => "AUTO",
            SectorId::Metals => "METALS",
            SectorId::Telecom => "TELECOM",
            SectorId::Retail => "RETAIL",
            SectorId::Infra => "INFRA",
            SectorId::Generic => "GENERIC",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SectorId::Bfsi => "Banking & Financial Services",
            SectorId::It => "Information Technology",
            SectorId::Pharma => "Pharmaceuticals & Healthcare",
            SectorId::Energy => "Oil, Gas & Energy",
            SectorId::Fmcg => "Consumer Staples",
            SectorId::RealEstate => "Real Estate",
            SectorId::Auto => "Automobiles",
            SectorId::Metals => "Metals & Mining",
            SectorId::Telecom => "Telecommunications",
            SectorId::Retail => "Retail",
            SectorId::Infra => "Infrastructure & Engineering",
            SectorId::Generic => "Diversified Market",
        }
    }

    pub fn family(&self) -> SectorFamily {
        match self {
            SectorId::Bfsi => SectorFamily::Financial,
            _ => SectorFamily::NonFinancial,
        }
    }

    /// Activity keywords used to recognise this sector in free text.
    /// Matched on whole words, so short tokens like "it" are deliberately absent.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            SectorId::Bfsi => &[
                "bank", "banks", "banking", "lending", "loans", "insurance", "nbfc",
                "financial services", "asset management", "deposits", "credit cards",
            ],
            SectorId::It => &[
                "software", "information technology", "it services", "consulting services",
                "cloud", "digital services", "outsourcing", "semiconductor",
            ],
            SectorId::Pharma => &[
                "pharmaceutical", "pharmaceuticals", "pharma", "drug", "drugs", "generics",
                "biotech", "hospital", "hospitals", "healthcare", "formulations",
            ],
            SectorId::Energy => &[
                "oil", "gas", "refining", "refinery", "petrochemicals", "petroleum",
                "exploration", "power generation", "renewable energy", "energy", "o2c",
            ],
            SectorId::Fmcg => &[
                "fmcg", "consumer staples", "packaged foods", "food", "beverages",
                "tobacco", "cigarettes", "personal care", "household products", "agri business",
            ],
            SectorId::RealEstate => &[
                "real estate", "realty", "property development", "residential projects",
                "commercial property", "reit",
            ],
            SectorId::Auto => &[
                "automobile", "automobiles", "vehicles", "cars", "two wheelers",
                "tractors", "auto components",
            ],
            SectorId::Metals => &[
                "steel", "aluminium", "aluminum", "copper", "zinc", "mining", "metals",
            ],
            SectorId::Telecom => &[
                "telecom", "telecommunications", "wireless", "broadband", "mobile network",
                "digital platforms", "spectrum",
            ],
            SectorId::Retail => &[
                "retail", "retail stores", "e-commerce", "ecommerce", "supermarkets",
                "apparel retail", "hypermarkets",
            ],
            SectorId::Infra => &[
                "construction", "infrastructure", "engineering", "cement", "ports",
                "airports", "capital goods", "epc",
            ],
            SectorId::Generic => &[],
        }
    }

    /// Strict lookup by code or common alias, case-insensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_ascii_uppercase().replace(['-', '_', '&'], " ");
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
        let sector = match normalized.as_str() {
            "BFSI" | "BANKING" | "BANKS" | "FINANCIALS" | "FINANCIAL SERVICES" | "FINANCE" => {
                SectorId::Bfsi
            }
            "IT" | "TECHNOLOGY" | "INFORMATION TECHNOLOGY" | "SOFTWARE" => SectorId::It,
            "PHARMA" | "PHARMACEUTICALS" | "HEALTHCARE" | "HEALTH CARE" => SectorId::Pharma,
            "ENERGY" | "OIL GAS" | "OIL AND GAS" | "UTILITIES" => SectorId::Energy,
            "FMCG" | "CONSUMER STAPLES" | "CONSUMER DEFENSIVE" => SectorId::Fmcg,
            "REALESTATE" | "REAL ESTATE" | "REALTY" => SectorId::RealEstate,
            "AUTO" | "AUTOMOBILE" | "AUTOMOBILES" | "CONSUMER CYCLICAL" => SectorId::Auto,
            "METALS" | "METALS MINING" | "BASIC MATERIALS" | "MATERIALS" => SectorId::Metals,
            "TELECOM" | "TELECOMMUNICATIONS" | "COMMUNICATION SERVICES" => SectorId::Telecom,
            "RETAIL" | "CONSUMER DISCRETIONARY" => SectorId::Retail,
            "INFRA" | "INFRASTRUCTURE" | "INDUSTRIALS" | "CAPITAL GOODS" => SectorId::Infra,
            "GENERIC" => SectorId::Generic,
            _ => return None,
        };
        Some(sector)
    }

    /// Lenient lookup for provider sector/industry labels: exact code first,
    /// then the sector with the most keyword hits.
    pub fn from_label(label: &str) -> Option<Self> {
        if let Some(sector) = Self::from_code(label) {
            return Some(sector);
        }
        keyword_hits(label).into_iter().next().map(|(sector, _)| sector)
    }
}

/// Counts keyword hits per sector in `text`, strongest first.
///
/// Ties are broken by sector order so the result is deterministic.
pub fn keyword_hits(text: &str) -> Vec<(SectorId, usize)> {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return Vec::new();
    }
    let haystack = format!(" {} ", words.join(" "));

    let mut hits: Vec<(SectorId, usize)> = SectorId::ALL
        .iter()
        .filter_map(|sector| {
            let count: usize = sector
                .keywords()
                .iter()
                .map(|kw| haystack.matches(&format!(" {kw} ")).count())
                .sum();
            (count > 0).then_some((*sector, count))
        })
        .collect();
    hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    hits
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SectorId {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
            .ok_or_else(|| AnalysisError::InvalidData(format!("Unknown sector code: {s}")))
    }
}

/// Median and interquartile band of a trading multiple across a sector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultipleBand {
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

impl MultipleBand {
    pub const fn new(q1: f64, median: f64, q3: f64) -> Self {
        Self { median, q1, q3 }
    }

    /// Band centred on `median` at ±20%, used when only a point estimate exists.
    pub fn around(median: f64) -> Self {
        Self {
            median,
            q1: median * 0.8,
            q3: median * 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingMultiples {
    pub pe: MultipleBand,
    pub pb: MultipleBand,
    pub ev_ebitda: MultipleBand,
}

/// Reference level for a financial ratio: typical value and the deviation
/// that counts as one unit of out- or under-performance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBand {
    pub median: f64,
    pub spread: f64,
}

impl RatioBand {
    pub const fn new(median: f64, spread: f64) -> Self {
        Self { median, spread }
    }

    /// Signed distance from the median in units of `spread`.
    pub fn deviation(&self, value: f64) -> f64 {
        if self.spread <= 0.0 {
            return 0.0;
        }
        (value - self.median) / self.spread
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBenchmarks {
    pub roe: RatioBand,
    pub roa: RatioBand,
    pub profit_margin: RatioBand,
    pub revenue_growth: RatioBand,
    pub debt_to_equity: RatioBand,
    pub current_ratio: RatioBand,
    pub net_interest_margin: RatioBand,
    pub cost_to_income: RatioBand,
    pub gross_npa_ratio: RatioBand,
}

/// Immutable per-sector valuation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorProfile {
    pub sector: SectorId,
    /// Reference industry name the parameters were taken from
    pub reference_industry: String,
    pub unlevered_beta: f64,
    pub target_debt_to_equity: f64,
    pub terminal_growth_rate: f64,
    pub effective_tax_rate: f64,
    pub default_revenue_growth: f64,
    pub default_ebitda_margin: f64,
    pub capex_to_revenue: f64,
    pub depreciation_to_revenue: f64,
    /// Net working capital needed per unit of incremental revenue
    pub working_capital_to_revenue: f64,
    /// Share of earnings paid out; retention compounds book value for lenders
    pub payout_ratio: f64,
    pub multiples: TradingMultiples,
    pub ratios: RatioBenchmarks,
}

impl SectorProfile {
    pub fn family(&self) -> SectorFamily {
        self.sector.family()
    }
}
