//! Reference tables for well-known NSE listings.

use analysis_core::SectorId;

/// Large caps whose sector is unambiguous.
const KNOWN_TICKERS: &[(&str, SectorId)] = &[
    ("HDFCBANK", SectorId::Bfsi),
    ("ICICIBANK", SectorId::Bfsi),
    ("SBIN", SectorId::Bfsi),
    ("KOTAKBANK", SectorId::Bfsi),
    ("AXISBANK", SectorId::Bfsi),
    ("BAJFINANCE", SectorId::Bfsi),
    ("TCS", SectorId::It),
    ("INFY", SectorId::It),
    ("WIPRO", SectorId::It),
    ("HCLTECH", SectorId::It),
    ("TECHM", SectorId::It),
    ("SUNPHARMA", SectorId::Pharma),
    ("DRREDDY", SectorId::Pharma),
    ("CIPLA", SectorId::Pharma),
    ("DIVISLAB", SectorId::Pharma),
    ("RELIANCE", SectorId::Energy),
    ("ONGC", SectorId::Energy),
    ("BPCL", SectorId::Energy),
    ("IOC", SectorId::Energy),
    ("NTPC", SectorId::Energy),
    ("POWERGRID", SectorId::Energy),
    ("HINDUNILVR", SectorId::Fmcg),
    ("ITC", SectorId::Fmcg),
    ("NESTLEIND", SectorId::Fmcg),
    ("BRITANNIA", SectorId::Fmcg),
    ("DABUR", SectorId::Fmcg),
    ("DLF", SectorId::RealEstate),
    ("GODREJPROP", SectorId::RealEstate),
    ("OBEROIRLTY", SectorId::RealEstate),
    ("MARUTI", SectorId::Auto),
    ("TATAMOTORS", SectorId::Auto),
    ("BAJAJ-AUTO", SectorId::Auto),
    ("HEROMOTOCO", SectorId::Auto),
    ("EICHERMOT", SectorId::Auto),
    ("TATASTEEL", SectorId::Metals),
    ("JSWSTEEL", SectorId::Metals),
    ("HINDALCO", SectorId::Metals),
    ("VEDL", SectorId::Metals),
    ("COALINDIA", SectorId::Metals),
    ("BHARTIARTL", SectorId::Telecom),
    ("IDEA", SectorId::Telecom),
    ("DMART", SectorId::Retail),
    ("TRENT", SectorId::Retail),
    ("ULTRACEMCO", SectorId::Infra),
    ("ADANIPORTS", SectorId::Infra),
];

/// Multi-segment groups with approximate revenue splits.
const KNOWN_CONGLOMERATES: &[(&str, &[(SectorId, &str, f64)])] = &[
    (
        "RELIANCE",
        &[
            (SectorId::Energy, "Oil to Chemicals", 0.60),
            (SectorId::Retail, "Reliance Retail", 0.25),
            (SectorId::Telecom, "Jio Platforms", 0.15),
        ],
    ),
    (
        "ADANIENT",
        &[
            (SectorId::Energy, "New Energy & Resources", 0.45),
            (SectorId::Infra, "Airports & Roads", 0.35),
            (SectorId::Metals, "Mining Services", 0.20),
        ],
    ),
    (
        "LT",
        &[
            (SectorId::Infra, "Engineering & Construction", 0.70),
            (SectorId::It, "IT & Technology Services", 0.20),
            (SectorId::Bfsi, "Financial Services", 0.10),
        ],
    ),
    (
        "M&M",
        &[
            (SectorId::Auto, "Automotive & Farm Equipment", 0.65),
            (SectorId::Bfsi, "Mahindra Finance", 0.20),
            (SectorId::It, "Tech Mahindra", 0.15),
        ],
    ),
    (
        "GRASIM",
        &[
            (SectorId::Infra, "Cement", 0.55),
            (SectorId::Generic, "Viscose & Chemicals", 0.25),
            (SectorId::Bfsi, "Financial Services", 0.20),
        ],
    ),
];

/// Exchange-neutral symbol: `reliance.ns` and `RELIANCE.BO` both become `RELIANCE`.
pub fn base_symbol(ticker: &str) -> String {
    let upper = ticker.trim().to_ascii_uppercase();
    match upper.rsplit_once('.') {
        Some((base, suffix)) if matches!(suffix, "NS" | "BO") => base.to_string(),
        _ => upper,
    }
}

pub fn known_sector(ticker: &str) -> Option<SectorId> {
    let base = base_symbol(ticker);
    KNOWN_TICKERS
        .iter()
        .find(|(symbol, _)| *symbol == base)
        .map(|(_, sector)| *sector)
}

pub fn known_segments(ticker: &str) -> Option<&'static [(SectorId, &'static str, f64)]> {
    let base = base_symbol(ticker);
    KNOWN_CONGLOMERATES
        .iter()
        .find(|(symbol, _)| *symbol == base)
        .map(|(_, segments)| *segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_symbol_strips_exchange_suffix() {
        assert_eq!(base_symbol("reliance.ns"), "RELIANCE");
        assert_eq!(base_symbol("TCS.BO"), "TCS");
        assert_eq!(base_symbol("BRK.B"), "BRK.B");
    }

    #[test]
    fn test_known_tables() {
        assert_eq!(known_sector("HDFCBANK.NS"), Some(SectorId::Bfsi));
        assert_eq!(known_sector("UNKNOWN.NS"), None);
        let segments = known_segments("RELIANCE.NS").unwrap();
        let total: f64 = segments.iter().map(|s| s.2).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
