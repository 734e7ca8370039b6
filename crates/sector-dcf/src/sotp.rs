use analysis_core::stats::{positive, weighted_mean};
use analysis_core::{
    AnalysisError, BlendedMultiples, BlendedValuationResult, ClassificationResult, CompanyData,
    MarketDataProvider, MultipleBand, SegmentValuation, ValuationBasis,
};
use sector_intelligence::{SectorClassifier, SectorModelRegistry};
use std::sync::Arc;

pub const DEFAULT_CONGLOMERATE_DISCOUNT: f64 = 0.20;
pub const MIN_CONGLOMERATE_DISCOUNT: f64 = 0.15;
pub const MAX_CONGLOMERATE_DISCOUNT: f64 = 0.25;

/// Revenue-weighted average of `(multiple, weight)` pairs.
///
/// Non-positive or non-finite multiples drop out of both numerator and
/// denominator, so `[(20, 0.5), (0, 0.5)]` blends to 20.
pub fn blended_multiple(pairs: &[(f64, f64)]) -> Option<f64> {
    let usable: Vec<(f64, f64)> = pairs
        .iter()
        .copied()
        .filter(|(multiple, _)| multiple.is_finite() && *multiple > 0.0)
        .collect();
    weighted_mean(&usable)
}

fn weighted_pairs(
    segments: &[SegmentValuation],
    multiple: impl Fn(&SegmentValuation) -> f64,
) -> Vec<(f64, f64)> {
    segments
        .iter()
        .map(|s| (multiple(s), s.segment.revenue_contribution))
        .collect()
}

/// Sum-of-the-parts valuation for multi-segment groups.
pub struct SumOfPartsBlender {
    registry: Arc<SectorModelRegistry>,
    classifier: Arc<SectorClassifier>,
    market_data: Arc<dyn MarketDataProvider>,
    discount: f64,
}

impl SumOfPartsBlender {
    pub fn new(
        registry: Arc<SectorModelRegistry>,
        classifier: Arc<SectorClassifier>,
        market_data: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self {
            registry,
            classifier,
            market_data,
            discount: DEFAULT_CONGLOMERATE_DISCOUNT,
        }
    }

    /// Conglomerate discount as a fraction, clamped to [15%, 25%].
    pub fn with_discount(mut self, discount: f64) -> Self {
        if !(MIN_CONGLOMERATE_DISCOUNT..=MAX_CONGLOMERATE_DISCOUNT).contains(&discount) {
            tracing::warn!(
                "Conglomerate discount {:.3} outside [{}, {}], clamping",
                discount,
                MIN_CONGLOMERATE_DISCOUNT,
                MAX_CONGLOMERATE_DISCOUNT
            );
        }
        self.discount = if discount.is_nan() {
            DEFAULT_CONGLOMERATE_DISCOUNT
        } else {
            discount.clamp(MIN_CONGLOMERATE_DISCOUNT, MAX_CONGLOMERATE_DISCOUNT)
        };
        self
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Fetches and classifies `ticker`, then blends.
    pub async fn blend(&self, ticker: &str) -> Result<BlendedValuationResult, AnalysisError> {
        let company = match self.market_data.company_data(ticker).await {
            Ok(company) => company,
            Err(e) => {
                tracing::warn!("Company data unavailable for {}: {}", ticker, e);
                CompanyData::new(ticker)
            }
        };
        let classification = self.classifier.classify_from(ticker, &company);
        self.blend_classification(&classification, &company)
    }

    /// Values each segment at its sector multiples and applies the discount.
    ///
    /// Errors with `Precondition` unless the classification is a conglomerate.
    pub fn blend_classification(
        &self,
        classification: &ClassificationResult,
        company: &CompanyData,
    ) -> Result<BlendedValuationResult, AnalysisError> {
        if !classification.is_conglomerate {
            return Err(AnalysisError::Precondition(format!(
                "{} is not classified as a conglomerate",
                classification.ticker
            )));
        }

        let net_income = company.net_income.filter(|n| n.is_finite() && *n > 0.0);
        let revenue = positive(company.revenue);
        let mut reasoning = Vec::new();

        let segments: Vec<SegmentValuation> = classification
            .segments
            .iter()
            .map(|segment| {
                let profile = self.registry.profile_for(segment.sector);
                let pe = profile.multiples.pe.median;
                let share = segment.revenue_contribution;

                let (basis, applied_multiple, value) = match (net_income, revenue) {
                    (Some(ni), _) if pe > 0.0 => (ValuationBasis::Earnings, Some(pe), ni * share * pe),
                    (_, Some(rev)) if pe > 0.0 && profile.ratios.profit_margin.median > 0.0 => {
                        let price_to_sales = pe * profile.ratios.profit_margin.median;
                        (
                            ValuationBasis::Revenue,
                            Some(price_to_sales),
                            rev * share * price_to_sales,
                        )
                    }
                    _ => (ValuationBasis::Unpriced, None, 0.0),
                };

                reasoning.push(match basis {
                    ValuationBasis::Earnings => format!(
                        "{} ({:.0}% of revenue): earnings share at {} median P/E {:.1}",
                        segment.label,
                        share * 100.0,
                        segment.sector,
                        pe
                    ),
                    ValuationBasis::Revenue => format!(
                        "{} ({:.0}% of revenue): revenue share at implied P/S {:.2}",
                        segment.label,
                        share * 100.0,
                        applied_multiple.unwrap_or_default()
                    ),
                    ValuationBasis::Unpriced => format!(
                        "{} ({:.0}% of revenue): no earnings or revenue, left unpriced",
                        segment.label,
                        share * 100.0
                    ),
                });

                SegmentValuation {
                    segment: segment.clone(),
                    multiples: profile.multiples,
                    basis,
                    applied_multiple,
                    value,
                }
            })
            .collect();

        let sum_of_parts_value: f64 = segments.iter().map(|s| s.value).sum();
        let discounted_sotp_value = sum_of_parts_value * (1.0 - self.discount);
        reasoning.push(format!(
            "Sum of parts {:.0}, less {:.0}% conglomerate discount = {:.0}",
            sum_of_parts_value,
            self.discount * 100.0,
            discounted_sotp_value
        ));

        let market_cap = company.market_cap_or_derived();
        let valuation_gap_pct = market_cap
            .filter(|_| sum_of_parts_value > 0.0)
            .map(|mc| (discounted_sotp_value - mc) / mc * 100.0);

        let current_price = positive(company.current_price);
        let shares = positive(company.shares_outstanding).or_else(|| {
            match (market_cap, current_price) {
                (Some(mc), Some(price)) => Some(mc / price),
                _ => None,
            }
        });
        let fair_value_per_share = shares
            .filter(|_| sum_of_parts_value > 0.0)
            .map(|s| discounted_sotp_value / s);
        let upside_pct = match (fair_value_per_share, current_price) {
            (Some(fair), Some(price)) => Some((fair - price) / price * 100.0),
            _ => None,
        };

        let pe = blended_multiple(&weighted_pairs(&segments, |s| s.multiples.pe.median));
        let blended_multiples = BlendedMultiples {
            pe,
            pb: blended_multiple(&weighted_pairs(&segments, |s| s.multiples.pb.median)),
            ev_ebitda: blended_multiple(&weighted_pairs(&segments, |s| s.multiples.ev_ebitda.median)),
            pe_band: pe.map(MultipleBand::around),
        };

        let confidence = self.confidence(classification, &segments, upside_pct.is_some());

        tracing::info!(
            "SOTP {}: {} segments, discounted value {:.0}, gap {:?}, confidence {:.2}",
            classification.ticker,
            segments.len(),
            discounted_sotp_value,
            valuation_gap_pct,
            confidence
        );

        Ok(BlendedValuationResult {
            ticker: classification.ticker.clone(),
            company_name: classification.company_name.clone(),
            segments,
            sum_of_parts_value,
            conglomerate_discount_pct: self.discount * 100.0,
            discounted_sotp_value,
            market_cap,
            valuation_gap_pct,
            blended_multiples,
            fair_value_per_share,
            current_price,
            upside_pct,
            confidence,
            reasoning,
        })
    }

    fn confidence(
        &self,
        classification: &ClassificationResult,
        segments: &[SegmentValuation],
        priced_per_share: bool,
    ) -> f64 {
        let basis_quality: f64 = segments
            .iter()
            .map(|s| {
                let quality = match s.basis {
                    ValuationBasis::Earnings => 1.0,
                    ValuationBasis::Revenue => 0.7,
                    ValuationBasis::Unpriced => 0.0,
                };
                quality * s.segment.revenue_contribution
            })
            .sum();
        let evidence = classification.confidence / 100.0;
        let mut confidence = 0.15 + 0.5 * basis_quality + 0.25 * evidence;
        if !priced_per_share {
            confidence *= 0.5;
        }
        confidence.clamp(0.05, 0.95)
    }
}
