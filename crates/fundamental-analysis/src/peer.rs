use analysis_core::stats::{fraction, mean, saturate, Distribution};
use analysis_core::{CompanyData, ComponentKind, ComponentScore, PeerData};

const MAX_DEVIATION: f64 = 3.0;
/// Peer sets at least this large earn full confidence
const FULL_PEER_SET: usize = 5;

/// Ranks a company against the median of its peers, scaled by the peer IQR.
pub struct PeerComparisonScorer;

impl PeerComparisonScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, company: &CompanyData, peers: &PeerData) -> ComponentScore {
        if peers.is_empty() {
            return ComponentScore::degraded(ComponentKind::Peer, "No peer data available");
        }

        let ratios = company.ratios.normalized();
        // (name, company value, peer values, lower is better)
        let metrics: [(&str, Option<f64>, Vec<f64>, bool); 3] = [
            (
                "P/E",
                ratios.trailing_pe.filter(|pe| *pe > 0.0),
                peers
                    .peers
                    .iter()
                    .filter_map(|p| p.pe_ratio)
                    .filter(|pe| pe.is_finite() && *pe > 0.0)
                    .collect(),
                true,
            ),
            (
                "Revenue growth",
                ratios.revenue_growth,
                peers
                    .peers
                    .iter()
                    .filter_map(|p| fraction(p.revenue_growth))
                    .collect(),
                false,
            ),
            (
                "Profit margin",
                ratios.profit_margin,
                peers
                    .peers
                    .iter()
                    .filter_map(|p| fraction(p.profit_margin))
                    .collect(),
                false,
            ),
        ];

        let mut signals: Vec<(String, f64)> = Vec::new();
        let mut skipped: Vec<&str> = Vec::new();
        for (name, value, peer_values, lower_is_better) in metrics {
            let (Some(value), Some(dist)) = (value, Distribution::from_values(peer_values)) else {
                skipped.push(name);
                continue;
            };
            let deviation = saturate(dist.scaled_deviation(value), MAX_DEVIATION);
            let deviation = if lower_is_better { -deviation } else { deviation };
            let rendered = |v: f64| {
                if name == "P/E" {
                    format!("{v:.1}")
                } else {
                    format!("{:.1}%", v * 100.0)
                }
            };
            signals.push((
                format!(
                    "{} {} {} vs peer median {} (n={})",
                    if deviation >= 0.0 { "+" } else { "-" },
                    name,
                    rendered(value),
                    rendered(dist.median),
                    dist.count
                ),
                deviation,
            ));
        }

        let deviations: Vec<f64> = signals.iter().map(|(_, d)| *d).collect();
        let Some(raw) = mean(&deviations) else {
            return ComponentScore::degraded(
                ComponentKind::Peer,
                "No comparable metrics between company and peers",
            );
        };

        let coverage = (peers.peers.len() as f64 / FULL_PEER_SET as f64).min(1.0);
        let confidence = coverage * signals.len() as f64 / 3.0;

        tracing::debug!(
            "Peer comparison for {}: raw {:.3} over {} peers",
            company.ticker,
            raw,
            peers.peers.len()
        );

        let mut reasoning: Vec<String> = signals.into_iter().map(|(r, _)| r).collect();
        if !skipped.is_empty() {
            reasoning.push(format!("Not compared: {}", skipped.join(", ")));
        }
        ComponentScore::from_raw(ComponentKind::Peer, raw, 1.0, confidence, reasoning)
    }
}

impl Default for PeerComparisonScorer {
    fn default() -> Self {
        Self::new()
    }
}
