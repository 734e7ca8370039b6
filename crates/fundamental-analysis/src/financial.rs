use analysis_core::stats::{cagr, positive, saturate};
use analysis_core::{
    CompanyData, ComponentKind, ComponentScore, RatioBand, SectorFamily, SectorProfile,
};

/// Per-ratio deviations are capped at this many spreads
const MAX_DEVIATION: f64 = 3.0;
/// Mean deviation that maps to a full ±100 score
const FULL_SCALE: f64 = 1.5;

struct RatioCheck {
    name: &'static str,
    value: Option<f64>,
    band: RatioBand,
    weight: f64,
    /// Lower is better (leverage, cost, bad loans)
    inverted: bool,
    /// Fractions rendered as percentages in reasoning
    percent: bool,
}

impl RatioCheck {
    fn new(name: &'static str, value: Option<f64>, band: RatioBand, weight: f64) -> Self {
        Self {
            name,
            value: value.filter(|v| v.is_finite()),
            band,
            weight,
            inverted: false,
            percent: true,
        }
    }

    fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    fn times(mut self) -> Self {
        self.percent = false;
        self
    }
}

/// Scores a company's ratios against its sector's reference bands.
pub struct FinancialHealthScorer;

impl FinancialHealthScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, company: &CompanyData, profile: &SectorProfile) -> ComponentScore {
        let checks = match profile.family() {
            SectorFamily::Financial => self.bank_checks(company, profile),
            SectorFamily::NonFinancial => self.operating_checks(company, profile),
        };
        let considered = checks.len();

        let mut signals: Vec<(String, f64, f64)> = Vec::new();
        for check in &checks {
            let Some(value) = check.value else { continue };
            let deviation = saturate(check.band.deviation(value), MAX_DEVIATION);
            let deviation = if check.inverted { -deviation } else { deviation };
            let fmt = |v: f64| {
                if check.percent {
                    format!("{:.1}%", v * 100.0)
                } else {
                    format!("{v:.2}")
                }
            };
            signals.push((
                format!(
                    "{} {} {} vs sector {}",
                    if deviation >= 0.0 { "+" } else { "-" },
                    check.name,
                    fmt(value),
                    fmt(check.band.median)
                ),
                deviation,
                check.weight,
            ));
        }

        if signals.is_empty() {
            return ComponentScore::degraded(
                ComponentKind::Financial,
                "No financial ratios available",
            );
        }

        let total_weight: f64 = signals.iter().map(|(_, _, w)| w).sum();
        let raw = signals.iter().map(|(_, d, w)| d * w).sum::<f64>() / total_weight;
        let confidence = signals.len() as f64 / considered as f64;

        tracing::debug!(
            "Financial health for {}: raw {:.3} from {}/{} ratios",
            company.ticker,
            raw,
            signals.len(),
            considered
        );

        let mut reasoning: Vec<String> = signals.into_iter().map(|(reason, _, _)| reason).collect();
        let missing: Vec<&str> = checks
            .iter()
            .filter(|c| c.value.is_none())
            .map(|c| c.name)
            .collect();
        if !missing.is_empty() {
            reasoning.push(format!("Missing: {}", missing.join(", ")));
        }

        ComponentScore::from_raw(ComponentKind::Financial, raw, FULL_SCALE, confidence, reasoning)
    }

    fn operating_checks(&self, company: &CompanyData, profile: &SectorProfile) -> Vec<RatioCheck> {
        let ratios = company.ratios.normalized();
        let bands = &profile.ratios;
        vec![
            RatioCheck::new("ROE", ratios.roe, bands.roe, 3.0),
            RatioCheck::new("Profit margin", profit_margin(company), bands.profit_margin, 2.0),
            RatioCheck::new("Revenue growth", revenue_growth(company), bands.revenue_growth, 2.0),
            RatioCheck::new("Debt/equity", ratios.debt_to_equity, bands.debt_to_equity, 2.0)
                .inverted()
                .times(),
            RatioCheck::new("Current ratio", ratios.current_ratio, bands.current_ratio, 1.0).times(),
        ]
    }

    fn bank_checks(&self, company: &CompanyData, profile: &SectorProfile) -> Vec<RatioCheck> {
        let ratios = company.ratios.normalized();
        let bands = &profile.ratios;
        vec![
            RatioCheck::new("ROE", ratios.roe, bands.roe, 3.0),
            RatioCheck::new("ROA", ratios.roa, bands.roa, 2.0),
            RatioCheck::new("Net interest margin", ratios.net_interest_margin, bands.net_interest_margin, 2.0),
            RatioCheck::new("Cost/income", ratios.cost_to_income, bands.cost_to_income, 1.0).inverted(),
            RatioCheck::new("Gross NPA", ratios.gross_npa_ratio, bands.gross_npa_ratio, 2.0).inverted(),
            RatioCheck::new("Revenue growth", revenue_growth(company), bands.revenue_growth, 1.0),
        ]
    }
}

impl Default for FinancialHealthScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn profit_margin(company: &CompanyData) -> Option<f64> {
    company.ratios.normalized().profit_margin.or_else(|| {
        match (company.net_income.filter(|n| n.is_finite()), positive(company.revenue)) {
            (Some(ni), Some(revenue)) => Some(ni / revenue),
            _ => None,
        }
    })
}

fn revenue_growth(company: &CompanyData) -> Option<f64> {
    company
        .ratios
        .normalized()
        .revenue_growth
        .or_else(|| cagr(&company.revenue_history))
}
