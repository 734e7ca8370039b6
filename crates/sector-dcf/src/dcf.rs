use analysis_core::stats::{cagr, positive};
use analysis_core::{
    AnalysisError, CompanyData, DcfAssumptions, DcfMethod, DcfMode, DcfOverrides, DcfResult,
    SectorFamily, SectorId, SectorProfile,
};
use sector_intelligence::SectorModelRegistry;
use std::sync::Arc;

/// Confidence reported when a mandatory input is missing
pub const INSUFFICIENT_DATA_CONFIDENCE: f64 = 0.05;

const MIN_REVENUE_GROWTH: f64 = -0.20;
const MAX_REVENUE_GROWTH: f64 = 0.40;
/// Years of constant growth before the multi-stage fade begins
const HIGH_GROWTH_YEARS: usize = 5;

/// Model-specific inputs, resolved once per call.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelInputs {
    Bank(BankModelInputs),
    Firm(FirmModelInputs),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BankModelInputs {
    pub book_value_per_share: f64,
    pub roe: f64,
    /// Long-run ROE the multi-stage model fades toward
    pub sector_roe: f64,
    pub payout_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirmModelInputs {
    pub revenue: f64,
    pub revenue_growth: f64,
    pub ebitda_margin: f64,
    pub net_debt: f64,
    pub shares_outstanding: f64,
}

/// Counts which model inputs came from the company rather than sector defaults.
#[derive(Debug, Default)]
struct InputTally {
    explicit: usize,
    considered: usize,
}

impl InputTally {
    fn record(&mut self, explicit: bool) {
        self.considered += 1;
        if explicit {
            self.explicit += 1;
        }
    }

    fn confidence(&self) -> f64 {
        if self.considered == 0 {
            return 0.30;
        }
        0.30 + 0.65 * self.explicit as f64 / self.considered as f64
    }
}

struct ModelOutput {
    fair_value_per_share: f64,
    enterprise_value: Option<f64>,
    equity_value: Option<f64>,
}

/// Sector-aware discounted cash flow valuation.
///
/// Lenders are valued on residual income over book value; everyone else on
/// free cash flow to the firm discounted at the sector WACC.
pub struct SectorDcfEngine {
    registry: Arc<SectorModelRegistry>,
}

impl SectorDcfEngine {
    pub fn new(registry: Arc<SectorModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SectorModelRegistry {
        &self.registry
    }

    /// Valuation with registry defaults and the live risk-free rate.
    pub async fn calculate(
        &self,
        ticker: &str,
        sector: SectorId,
        mode: DcfMode,
        company: &CompanyData,
    ) -> Result<DcfResult, AnalysisError> {
        let risk_free_rate = self.registry.risk_free_rate().await;
        self.calculate_with_overrides(
            ticker,
            sector,
            mode,
            company,
            &DcfOverrides::default(),
            risk_free_rate,
        )
    }

    /// Deterministic valuation for a given risk-free rate.
    ///
    /// Fails when an override is out of domain or terminal growth is not below
    /// the discount rate; missing mandatory data yields a low-confidence result
    /// without a fair value.
    pub fn calculate_with_overrides(
        &self,
        ticker: &str,
        sector: SectorId,
        mode: DcfMode,
        company: &CompanyData,
        overrides: &DcfOverrides,
        risk_free_rate: f64,
    ) -> Result<DcfResult, AnalysisError> {
        check_overrides(overrides)?;
        let profile = self.registry.profile_for(sector);
        let family = sector.family();
        let method = match family {
            SectorFamily::Financial => DcfMethod::BankResidualIncome,
            SectorFamily::NonFinancial => DcfMethod::FirmFreeCashFlow,
        };

        let mut tally = InputTally::default();
        let mut reasoning = Vec::new();

        let discount_rate = match overrides.discount_rate {
            Some(rate) => rate,
            None => match family {
                SectorFamily::Financial => {
                    self.registry.cost_of_equity_with_rate(sector, risk_free_rate)
                }
                SectorFamily::NonFinancial => self.registry.wacc_with_rate(sector, risk_free_rate),
            },
        };
        tally.record(overrides.discount_rate.is_some());

        let terminal_growth = overrides
            .terminal_growth
            .unwrap_or(profile.terminal_growth_rate);
        tally.record(overrides.terminal_growth.is_some());

        if terminal_growth >= discount_rate {
            return Err(AnalysisError::TerminalGrowthTooHigh {
                terminal_growth,
                discount_rate,
            });
        }

        let tax_rate = overrides.tax_rate.unwrap_or(profile.effective_tax_rate);
        reasoning.push(format!(
            "{} model at {:.2}% discount rate, {:.2}% terminal growth ({})",
            match family {
                SectorFamily::Financial => "Residual income",
                SectorFamily::NonFinancial => "Free cash flow",
            },
            discount_rate * 100.0,
            terminal_growth * 100.0,
            profile.reference_industry
        ));

        let mut assumptions = DcfAssumptions {
            risk_free_rate,
            discount_rate,
            terminal_growth,
            projection_years: mode.projection_years(),
            tax_rate,
            revenue_growth: None,
            ebitda_margin: None,
            roe: None,
            book_value_per_share: None,
            payout_ratio: None,
        };

        let current_price = positive(company.current_price);
        let insufficient = |missing: &str, assumptions: DcfAssumptions, mut reasoning: Vec<String>| {
            tracing::warn!("DCF for {} lacks {}, returning low-confidence result", ticker, missing);
            reasoning.push(format!("Insufficient data: missing {missing}"));
            DcfResult {
                ticker: ticker.to_string(),
                sector,
                method,
                mode,
                fair_value_per_share: None,
                current_price,
                upside_pct: None,
                enterprise_value: None,
                equity_value: None,
                confidence: INSUFFICIENT_DATA_CONFIDENCE,
                assumptions,
                reasoning,
            }
        };

        let Some(price) = current_price else {
            return Ok(insufficient("current price", assumptions, reasoning));
        };

        let inputs = match family {
            SectorFamily::Financial => {
                resolve_bank_inputs(company, profile, overrides, price, &mut tally, &mut reasoning)
            }
            SectorFamily::NonFinancial => {
                match resolve_firm_inputs(company, profile, overrides, price, &mut tally, &mut reasoning) {
                    Ok(inputs) => inputs,
                    Err(missing) => return Ok(insufficient(missing, assumptions, reasoning)),
                }
            }
        };
        tally.record(overrides.tax_rate.is_some());

        let output = match &inputs {
            ModelInputs::Bank(bank) => {
                assumptions.roe = Some(bank.roe);
                assumptions.book_value_per_share = Some(bank.book_value_per_share);
                assumptions.payout_ratio = Some(bank.payout_ratio);
                value_bank(bank, mode, discount_rate, terminal_growth, &mut reasoning)?
            }
            ModelInputs::Firm(firm) => {
                assumptions.revenue_growth = Some(firm.revenue_growth);
                assumptions.ebitda_margin = Some(firm.ebitda_margin);
                value_firm(firm, profile, mode, discount_rate, terminal_growth, tax_rate, &mut reasoning)?
            }
        };

        let fair_value = output.fair_value_per_share;
        let upside_pct = (fair_value - price) / price * 100.0;
        let confidence = tally.confidence();
        reasoning.push(format!(
            "Fair value {:.2} vs price {:.2} ({:+.1}%)",
            fair_value, price, upside_pct
        ));

        tracing::info!(
            "DCF {} [{} {:?} {}]: fair value {:.2}, upside {:+.1}%, confidence {:.2}",
            ticker,
            sector,
            method,
            mode,
            fair_value,
            upside_pct,
            confidence
        );

        Ok(DcfResult {
            ticker: ticker.to_string(),
            sector,
            method,
            mode,
            fair_value_per_share: Some(fair_value),
            current_price: Some(price),
            upside_pct: Some(upside_pct),
            enterprise_value: output.enterprise_value,
            equity_value: output.equity_value,
            confidence,
            assumptions,
            reasoning,
        })
    }
}

/// Rejects overrides no model can run with.
fn check_overrides(overrides: &DcfOverrides) -> Result<(), AnalysisError> {
    let fields = [
        ("revenue growth", overrides.revenue_growth),
        ("EBITDA margin", overrides.ebitda_margin),
        ("terminal growth", overrides.terminal_growth),
        ("discount rate", overrides.discount_rate),
        ("tax rate", overrides.tax_rate),
        ("ROE", overrides.roe),
        ("book value per share", overrides.book_value_per_share),
    ];
    if let Some((name, value)) = fields
        .into_iter()
        .find_map(|(name, value)| value.filter(|v| !v.is_finite()).map(|v| (name, v)))
    {
        return Err(AnalysisError::Assumption(format!(
            "{name} override must be finite, got {value}"
        )));
    }
    if let Some(rate) = overrides.discount_rate.filter(|r| *r <= 0.0) {
        return Err(AnalysisError::Assumption(format!(
            "discount rate override must be positive, got {rate:.4}"
        )));
    }
    if let Some(tax) = overrides.tax_rate.filter(|t| !(0.0..1.0).contains(t)) {
        return Err(AnalysisError::Assumption(format!(
            "tax rate override must lie in [0, 1), got {tax:.4}"
        )));
    }
    Ok(())
}

fn resolve_bank_inputs(
    company: &CompanyData,
    profile: &SectorProfile,
    overrides: &DcfOverrides,
    price: f64,
    tally: &mut InputTally,
    reasoning: &mut Vec<String>,
) -> ModelInputs {
    let ratios = company.ratios.normalized();

    let (book_value_per_share, bv_explicit) = if let Some(bv) = positive(overrides.book_value_per_share) {
        (bv, true)
    } else if let Some(bv) = positive(company.book_value_per_share).or(positive(ratios.book_value_per_share)) {
        (bv, true)
    } else if let Some(pb) = positive(ratios.price_to_book) {
        reasoning.push(format!("Book value derived from reported P/B of {pb:.2}"));
        (price / pb, true)
    } else {
        let pb = profile.multiples.pb.median;
        reasoning.push(format!("Book value unavailable, using sector median P/B of {pb:.2}"));
        (price / pb, false)
    };
    tally.record(bv_explicit);

    let shares = positive(company.shares_outstanding);
    let (roe, roe_explicit) = if let Some(roe) = overrides.roe.filter(|r| r.is_finite()) {
        (roe, true)
    } else if let Some(roe) = ratios.roe {
        (roe, true)
    } else if let (Some(ni), Some(shares)) = (company.net_income.filter(|n| n.is_finite()), shares) {
        reasoning.push("ROE derived from net income over book equity".to_string());
        (ni / (book_value_per_share * shares), true)
    } else {
        let roe = profile.ratios.roe.median;
        reasoning.push(format!("ROE unavailable, using sector median {:.1}%", roe * 100.0));
        (roe, false)
    };
    tally.record(roe_explicit);

    ModelInputs::Bank(BankModelInputs {
        book_value_per_share,
        roe,
        sector_roe: profile.ratios.roe.median,
        payout_ratio: profile.payout_ratio,
    })
}

fn resolve_firm_inputs(
    company: &CompanyData,
    profile: &SectorProfile,
    overrides: &DcfOverrides,
    price: f64,
    tally: &mut InputTally,
    reasoning: &mut Vec<String>,
) -> Result<ModelInputs, &'static str> {
    let shares_outstanding = positive(company.shares_outstanding)
        .or_else(|| positive(company.market_cap).map(|mc| mc / price))
        .ok_or("shares outstanding")?;

    let reported_revenue = positive(company.revenue);
    let reported_ebitda = company.ebitda.filter(|e| e.is_finite());
    let revenue = match (reported_revenue, reported_ebitda) {
        (Some(revenue), _) => revenue,
        (None, Some(ebitda)) if ebitda > 0.0 => {
            reasoning.push(format!(
                "Revenue implied from EBITDA at sector margin {:.1}%",
                profile.default_ebitda_margin * 100.0
            ));
            ebitda / profile.default_ebitda_margin
        }
        _ => return Err("revenue or EBITDA"),
    };

    let ratios = company.ratios.normalized();
    let (growth, growth_explicit) = if let Some(g) = overrides.revenue_growth {
        (g, true)
    } else if let Some(g) = ratios.revenue_growth {
        (g, true)
    } else if let Some(g) = cagr(&company.revenue_history) {
        reasoning.push(format!(
            "Revenue growth {:.1}% from {}-year history",
            g * 100.0,
            company.revenue_history.len().saturating_sub(1)
        ));
        (g, true)
    } else {
        reasoning.push(format!(
            "Revenue growth unavailable, using sector default {:.1}%",
            profile.default_revenue_growth * 100.0
        ));
        (profile.default_revenue_growth, false)
    };
    tally.record(growth_explicit);
    let revenue_growth = growth.clamp(MIN_REVENUE_GROWTH, MAX_REVENUE_GROWTH);
    if revenue_growth != growth {
        reasoning.push(format!(
            "Revenue growth {:.1}% capped at {:.1}%",
            growth * 100.0,
            revenue_growth * 100.0
        ));
    }

    let (ebitda_margin, margin_explicit) = if let Some(m) = overrides.ebitda_margin {
        (m, true)
    } else if let (Some(ebitda), Some(revenue)) = (reported_ebitda, reported_revenue) {
        (ebitda / revenue, true)
    } else if let Some(m) = company.ebitda_margin_history.last().filter(|m| m.is_finite()) {
        (*m, true)
    } else {
        reasoning.push(format!(
            "EBITDA margin unavailable, using sector default {:.1}%",
            profile.default_ebitda_margin * 100.0
        ));
        (profile.default_ebitda_margin, false)
    };
    tally.record(margin_explicit);

    let debt = company.total_debt.filter(|d| d.is_finite());
    let cash = company.cash.filter(|c| c.is_finite());
    if debt.is_none() && cash.is_none() {
        reasoning.push("Debt and cash unavailable, assuming no net debt".to_string());
    }
    tally.record(debt.is_some() || cash.is_some());
    let net_debt = debt.unwrap_or(0.0) - cash.unwrap_or(0.0);

    Ok(ModelInputs::Firm(FirmModelInputs {
        revenue,
        revenue_growth,
        ebitda_margin,
        net_debt,
        shares_outstanding,
    }))
}

/// Justified P/B in simple mode; explicit residual income with ROE fade otherwise.
fn value_bank(
    inputs: &BankModelInputs,
    mode: DcfMode,
    cost_of_equity: f64,
    growth: f64,
    reasoning: &mut Vec<String>,
) -> Result<ModelOutput, AnalysisError> {
    let bv = inputs.book_value_per_share;
    let ke = cost_of_equity;

    let value = match mode {
        DcfMode::Simple => {
            let justified_pb = 1.0 + (inputs.roe - ke) / (ke - growth);
            reasoning.push(format!(
                "Justified P/B {:.2} from ROE {:.1}% vs cost of equity {:.1}%",
                justified_pb,
                inputs.roe * 100.0,
                ke * 100.0
            ));
            bv * justified_pb
        }
        DcfMode::MultiStage => {
            let years = mode.projection_years();
            let retention = 1.0 - inputs.payout_ratio;
            let mut book = bv;
            let mut pv_residual = 0.0;
            let mut last_residual = 0.0;
            for year in 1..=years {
                let fade = year as f64 / years as f64;
                let roe = inputs.roe + (inputs.sector_roe - inputs.roe) * fade;
                let residual = (roe - ke) * book;
                pv_residual += residual / (1.0 + ke).powi(year as i32);
                last_residual = residual;
                book *= 1.0 + roe * retention;
            }
            let terminal = last_residual * (1.0 + growth) / (ke - growth);
            let pv_terminal = terminal / (1.0 + ke).powi(years as i32);
            reasoning.push(format!(
                "Residual income over {} years, ROE fading from {:.1}% to {:.1}%",
                years,
                inputs.roe * 100.0,
                inputs.sector_roe * 100.0
            ));
            bv + pv_residual + pv_terminal
        }
    };

    if !value.is_finite() {
        return Err(AnalysisError::CalculationError(format!(
            "residual income value is not finite ({value}) at cost of equity {ke:.4}"
        )));
    }
    if value < 0.0 {
        reasoning.push("Returns below cost of equity erase book value; fair value floored at zero".to_string());
    }
    Ok(ModelOutput {
        fair_value_per_share: value.max(0.0),
        enterprise_value: None,
        equity_value: None,
    })
}

fn value_firm(
    inputs: &FirmModelInputs,
    profile: &SectorProfile,
    mode: DcfMode,
    wacc: f64,
    terminal_growth: f64,
    tax_rate: f64,
    reasoning: &mut Vec<String>,
) -> Result<ModelOutput, AnalysisError> {
    let years = mode.projection_years();
    let mut revenue = inputs.revenue;
    let mut pv_fcff = 0.0;
    let mut last_fcff = 0.0;

    for year in 1..=years {
        let (growth, margin) = match mode {
            DcfMode::MultiStage if year > HIGH_GROWTH_YEARS => {
                let fade = (year - HIGH_GROWTH_YEARS) as f64 / (years - HIGH_GROWTH_YEARS) as f64;
                (
                    inputs.revenue_growth + (terminal_growth - inputs.revenue_growth) * fade,
                    inputs.ebitda_margin + (profile.default_ebitda_margin - inputs.ebitda_margin) * fade,
                )
            }
            _ => (inputs.revenue_growth, inputs.ebitda_margin),
        };

        let next_revenue = revenue * (1.0 + growth);
        let ebitda = next_revenue * margin;
        let depreciation = next_revenue * profile.depreciation_to_revenue;
        let nopat = (ebitda - depreciation) * (1.0 - tax_rate);
        let capex = next_revenue * profile.capex_to_revenue;
        let working_capital = (next_revenue - revenue) * profile.working_capital_to_revenue;
        let fcff = nopat + depreciation - capex - working_capital;

        pv_fcff += fcff / (1.0 + wacc).powi(year as i32);
        last_fcff = fcff;
        revenue = next_revenue;
    }

    let terminal_value = last_fcff * (1.0 + terminal_growth) / (wacc - terminal_growth);
    let pv_terminal = terminal_value / (1.0 + wacc).powi(years as i32);
    let enterprise_value = pv_fcff + pv_terminal;
    let equity_value = enterprise_value - inputs.net_debt;
    if !equity_value.is_finite() {
        return Err(AnalysisError::CalculationError(format!(
            "equity value is not finite ({equity_value}) at WACC {wacc:.4}"
        )));
    }

    reasoning.push(format!(
        "{}-year FCFF at {:.1}% growth and {:.1}% EBITDA margin; terminal value is {:.0}% of EV",
        years,
        inputs.revenue_growth * 100.0,
        inputs.ebitda_margin * 100.0,
        if enterprise_value.abs() > f64::EPSILON {
            pv_terminal / enterprise_value * 100.0
        } else {
            0.0
        }
    ));
    if equity_value <= 0.0 {
        reasoning.push("Net debt exceeds enterprise value; fair value floored at zero".to_string());
    }

    Ok(ModelOutput {
        fair_value_per_share: equity_value.max(0.0) / inputs.shares_outstanding,
        enterprise_value: Some(enterprise_value),
        equity_value: Some(equity_value),
    })
}
