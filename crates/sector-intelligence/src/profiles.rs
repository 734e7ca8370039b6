//! Built-in sector parameter table.
//!
//! Betas, tax rates and capital structures follow Damodaran's emerging-market
//! industry datasets; trading multiples are NSE sector bands.

use analysis_core::{
    MultipleBand, RatioBand, RatioBenchmarks, SectorId, SectorProfile, TradingMultiples,
};

const UNUSED: RatioBand = RatioBand::new(0.0, 0.0);

const NON_FINANCIAL_RATIOS: RatioBenchmarks = RatioBenchmarks {
    roe: RatioBand::new(0.15, 0.06),
    roa: RatioBand::new(0.07, 0.04),
    profit_margin: RatioBand::new(0.10, 0.06),
    revenue_growth: RatioBand::new(0.10, 0.08),
    debt_to_equity: RatioBand::new(0.60, 0.40),
    current_ratio: RatioBand::new(1.50, 0.50),
    net_interest_margin: UNUSED,
    cost_to_income: UNUSED,
    gross_npa_ratio: UNUSED,
};

const BANK_RATIOS: RatioBenchmarks = RatioBenchmarks {
    roe: RatioBand::new(0.14, 0.04),
    roa: RatioBand::new(0.012, 0.005),
    profit_margin: RatioBand::new(0.20, 0.08),
    revenue_growth: RatioBand::new(0.12, 0.08),
    debt_to_equity: UNUSED,
    current_ratio: UNUSED,
    net_interest_margin: RatioBand::new(0.032, 0.008),
    cost_to_income: RatioBand::new(0.48, 0.10),
    gross_npa_ratio: RatioBand::new(0.03, 0.015),
};

fn multiples(pe: [f64; 3], pb: [f64; 3], ev_ebitda: [f64; 3]) -> TradingMultiples {
    TradingMultiples {
        pe: MultipleBand::new(pe[0], pe[1], pe[2]),
        pb: MultipleBand::new(pb[0], pb[1], pb[2]),
        ev_ebitda: MultipleBand::new(ev_ebitda[0], ev_ebitda[1], ev_ebitda[2]),
    }
}

/// Market-wide parameters used for unmapped companies.
pub fn generic_profile() -> SectorProfile {
    SectorProfile {
        sector: SectorId::Generic,
        reference_industry: "Total Market".to_string(),
        unlevered_beta: 1.0,
        target_debt_to_equity: 0.40,
        terminal_growth_rate: 0.05,
        effective_tax_rate: 0.25,
        default_revenue_growth: 0.08,
        default_ebitda_margin: 0.15,
        capex_to_revenue: 0.05,
        depreciation_to_revenue: 0.04,
        working_capital_to_revenue: 0.10,
        payout_ratio: 0.35,
        multiples: multiples([16.0, 22.0, 30.0], [2.0, 3.2, 4.5], [10.0, 13.0, 17.0]),
        ratios: NON_FINANCIAL_RATIOS,
    }
}

pub fn builtin_profiles() -> Vec<SectorProfile> {
    let generic = generic_profile();
    vec![
        SectorProfile {
            sector: SectorId::Bfsi,
            reference_industry: "Banks (Regional)".to_string(),
            unlevered_beta: 1.0,
            // Deposits are operating liabilities, so the equity charge is the whole cost
            target_debt_to_equity: 0.0,
            terminal_growth_rate: 0.05,
            default_revenue_growth: 0.12,
            default_ebitda_margin: 0.0,
            capex_to_revenue: 0.0,
            depreciation_to_revenue: 0.0,
            working_capital_to_revenue: 0.0,
            payout_ratio: 0.25,
            multiples: multiples([14.0, 18.0, 24.0], [1.8, 2.6, 3.5], [0.0, 0.0, 0.0]),
            ratios: BANK_RATIOS,
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::It,
            reference_industry: "Computer Services".to_string(),
            unlevered_beta: 1.05,
            target_debt_to_equity: 0.05,
            default_revenue_growth: 0.10,
            default_ebitda_margin: 0.24,
            capex_to_revenue: 0.03,
            depreciation_to_revenue: 0.03,
            working_capital_to_revenue: 0.15,
            payout_ratio: 0.60,
            multiples: multiples([22.0, 28.0, 34.0], [6.0, 8.0, 11.0], [15.0, 19.0, 24.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.25, 0.08),
                profit_margin: RatioBand::new(0.18, 0.06),
                revenue_growth: RatioBand::new(0.10, 0.07),
                debt_to_equity: RatioBand::new(0.10, 0.20),
                current_ratio: RatioBand::new(2.0, 0.6),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::Pharma,
            reference_industry: "Drugs (Pharmaceutical)".to_string(),
            unlevered_beta: 0.90,
            target_debt_to_equity: 0.15,
            default_revenue_growth: 0.10,
            default_ebitda_margin: 0.22,
            capex_to_revenue: 0.06,
            depreciation_to_revenue: 0.04,
            working_capital_to_revenue: 0.25,
            payout_ratio: 0.30,
            multiples: multiples([24.0, 30.0, 38.0], [3.0, 4.5, 6.0], [14.0, 18.0, 23.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.16, 0.06),
                profit_margin: RatioBand::new(0.14, 0.06),
                debt_to_equity: RatioBand::new(0.25, 0.25),
                current_ratio: RatioBand::new(2.0, 0.6),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::Energy,
            reference_industry: "Oil/Gas (Integrated)".to_string(),
            unlevered_beta: 0.85,
            target_debt_to_equity: 0.60,
            terminal_growth_rate: 0.04,
            default_revenue_growth: 0.07,
            default_ebitda_margin: 0.14,
            capex_to_revenue: 0.08,
            depreciation_to_revenue: 0.05,
            working_capital_to_revenue: 0.08,
            multiples: multiples([8.0, 11.0, 15.0], [1.0, 1.6, 2.4], [5.0, 7.0, 9.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.13, 0.05),
                profit_margin: RatioBand::new(0.07, 0.04),
                revenue_growth: RatioBand::new(0.07, 0.10),
                debt_to_equity: RatioBand::new(0.70, 0.40),
                current_ratio: RatioBand::new(1.1, 0.4),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::Fmcg,
            reference_industry: "Food Processing / Household Products".to_string(),
            unlevered_beta: 0.70,
            target_debt_to_equity: 0.05,
            terminal_growth_rate: 0.055,
            default_revenue_growth: 0.09,
            default_ebitda_margin: 0.22,
            capex_to_revenue: 0.03,
            depreciation_to_revenue: 0.02,
            working_capital_to_revenue: 0.05,
            payout_ratio: 0.70,
            multiples: multiples([40.0, 50.0, 60.0], [8.0, 12.0, 18.0], [28.0, 35.0, 45.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.30, 0.10),
                profit_margin: RatioBand::new(0.15, 0.05),
                revenue_growth: RatioBand::new(0.09, 0.05),
                debt_to_equity: RatioBand::new(0.10, 0.20),
                current_ratio: RatioBand::new(1.3, 0.4),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::RealEstate,
            reference_industry: "Real Estate (Development)".to_string(),
            unlevered_beta: 1.10,
            target_debt_to_equity: 0.50,
            terminal_growth_rate: 0.045,
            default_revenue_growth: 0.12,
            default_ebitda_margin: 0.30,
            capex_to_revenue: 0.02,
            depreciation_to_revenue: 0.01,
            working_capital_to_revenue: 0.40,
            payout_ratio: 0.15,
            multiples: multiples([25.0, 35.0, 50.0], [2.5, 4.0, 6.0], [18.0, 25.0, 35.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.10, 0.05),
                profit_margin: RatioBand::new(0.18, 0.08),
                revenue_growth: RatioBand::new(0.12, 0.12),
                debt_to_equity: RatioBand::new(0.50, 0.35),
                current_ratio: RatioBand::new(1.8, 0.6),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::Auto,
            reference_industry: "Auto & Truck".to_string(),
            unlevered_beta: 1.0,
            target_debt_to_equity: 0.40,
            default_revenue_growth: 0.09,
            default_ebitda_margin: 0.13,
            capex_to_revenue: 0.06,
            depreciation_to_revenue: 0.04,
            working_capital_to_revenue: 0.08,
            payout_ratio: 0.30,
            multiples: multiples([18.0, 24.0, 30.0], [3.0, 4.5, 6.0], [10.0, 13.0, 17.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.16, 0.06),
                profit_margin: RatioBand::new(0.08, 0.04),
                revenue_growth: RatioBand::new(0.09, 0.08),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::Metals,
            reference_industry: "Steel / Metals & Mining".to_string(),
            unlevered_beta: 1.20,
            target_debt_to_equity: 0.70,
            terminal_growth_rate: 0.035,
            default_revenue_growth: 0.06,
            default_ebitda_margin: 0.16,
            capex_to_revenue: 0.09,
            depreciation_to_revenue: 0.05,
            working_capital_to_revenue: 0.10,
            payout_ratio: 0.30,
            multiples: multiples([7.0, 10.0, 14.0], [1.0, 1.6, 2.4], [4.5, 6.0, 8.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.12, 0.07),
                profit_margin: RatioBand::new(0.08, 0.05),
                revenue_growth: RatioBand::new(0.06, 0.12),
                debt_to_equity: RatioBand::new(0.70, 0.40),
                current_ratio: RatioBand::new(1.2, 0.4),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::Telecom,
            reference_industry: "Telecom Services".to_string(),
            unlevered_beta: 0.90,
            target_debt_to_equity: 1.0,
            terminal_growth_rate: 0.045,
            default_revenue_growth: 0.10,
            default_ebitda_margin: 0.45,
            capex_to_revenue: 0.20,
            depreciation_to_revenue: 0.18,
            working_capital_to_revenue: 0.02,
            payout_ratio: 0.10,
            multiples: multiples([25.0, 35.0, 55.0], [3.0, 5.0, 8.0], [8.0, 11.0, 14.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.10, 0.08),
                profit_margin: RatioBand::new(0.08, 0.08),
                debt_to_equity: RatioBand::new(1.20, 0.60),
                current_ratio: RatioBand::new(0.8, 0.3),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::Retail,
            reference_industry: "Retail (General)".to_string(),
            unlevered_beta: 1.0,
            target_debt_to_equity: 0.30,
            terminal_growth_rate: 0.055,
            default_revenue_growth: 0.15,
            default_ebitda_margin: 0.09,
            capex_to_revenue: 0.05,
            depreciation_to_revenue: 0.03,
            working_capital_to_revenue: 0.10,
            payout_ratio: 0.10,
            multiples: multiples([45.0, 65.0, 90.0], [8.0, 12.0, 18.0], [25.0, 35.0, 50.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.15, 0.06),
                profit_margin: RatioBand::new(0.05, 0.03),
                revenue_growth: RatioBand::new(0.15, 0.10),
                debt_to_equity: RatioBand::new(0.30, 0.30),
                current_ratio: RatioBand::new(1.4, 0.5),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        SectorProfile {
            sector: SectorId::Infra,
            reference_industry: "Engineering/Construction".to_string(),
            unlevered_beta: 0.95,
            target_debt_to_equity: 0.80,
            default_revenue_growth: 0.10,
            default_ebitda_margin: 0.14,
            capex_to_revenue: 0.06,
            depreciation_to_revenue: 0.03,
            working_capital_to_revenue: 0.18,
            payout_ratio: 0.25,
            multiples: multiples([20.0, 28.0, 38.0], [2.5, 4.0, 6.0], [12.0, 16.0, 22.0]),
            ratios: RatioBenchmarks {
                roe: RatioBand::new(0.13, 0.05),
                profit_margin: RatioBand::new(0.07, 0.04),
                debt_to_equity: RatioBand::new(0.80, 0.40),
                current_ratio: RatioBand::new(1.3, 0.4),
                ..NON_FINANCIAL_RATIOS
            },
            ..generic.clone()
        },
        generic,
    ]
}
