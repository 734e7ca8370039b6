use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats::saturate;

/// The four signals combined into the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Dcf,
    Financial,
    Technical,
    Peer,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Dcf,
        ComponentKind::Financial,
        ComponentKind::Technical,
        ComponentKind::Peer,
    ];

    /// Fixed weight in the composite; the four sum to 1.0
    pub fn weight(&self) -> f64 {
        match self {
            ComponentKind::Dcf => 0.35,
            ComponentKind::Financial => 0.25,
            ComponentKind::Technical => 0.20,
            ComponentKind::Peer => 0.20,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::Dcf => "DCF",
            ComponentKind::Financial => "Financial",
            ComponentKind::Technical => "Technical",
            ComponentKind::Peer => "Peer",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One component's contribution: unbounded raw value, bounded score, confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub component: ComponentKind,
    pub raw_score: f64,
    /// -100..=100
    pub normalized_score: f64,
    /// 0..=1
    pub confidence: f64,
    pub reasoning: Vec<String>,
}

impl ComponentScore {
    /// Builds a score from a raw value and the raw magnitude that maps to ±100.
    pub fn from_raw(
        component: ComponentKind,
        raw_score: f64,
        full_scale: f64,
        confidence: f64,
        reasoning: Vec<String>,
    ) -> Self {
        Self {
            component,
            raw_score,
            normalized_score: saturate(raw_score / full_scale * 100.0, 100.0),
            confidence: confidence.clamp(0.0, 1.0),
            reasoning,
        }
    }

    /// Neutral score with zero confidence, used when an input is missing or a
    /// component failed.
    pub fn degraded(component: ComponentKind, reason: impl Into<String>) -> Self {
        Self {
            component,
            raw_score: 0.0,
            normalized_score: 0.0,
            confidence: 0.0,
            reasoning: vec![reason.into()],
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.confidence == 0.0
    }

    pub fn weighted(&self) -> f64 {
        self.component.weight() * self.normalized_score
    }
}

/// Ordered from most bearish to most bullish
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentLabel {
    StronglyBearish,
    CautiouslyBearish,
    Neutral,
    CautiouslyBullish,
    StronglyBullish,
}

impl InvestmentLabel {
    pub fn from_score(total_score: f64) -> Self {
        if total_score >= 60.0 {
            InvestmentLabel::StronglyBullish
        } else if total_score >= 20.0 {
            InvestmentLabel::CautiouslyBullish
        } else if total_score >= -20.0 {
            InvestmentLabel::Neutral
        } else if total_score >= -60.0 {
            InvestmentLabel::CautiouslyBearish
        } else {
            InvestmentLabel::StronglyBearish
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentLabel::StronglyBearish => "STRONGLY_BEARISH",
            InvestmentLabel::CautiouslyBearish => "CAUTIOUSLY_BEARISH",
            InvestmentLabel::Neutral => "NEUTRAL",
            InvestmentLabel::CautiouslyBullish => "CAUTIOUSLY_BULLISH",
            InvestmentLabel::StronglyBullish => "STRONGLY_BULLISH",
        }
    }
}

impl fmt::Display for InvestmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite result. Carries no timestamps so identical inputs serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedScoreResult {
    pub ticker: String,
    pub total_score: f64,
    pub label: InvestmentLabel,
    pub confidence: f64,
    pub dcf: ComponentScore,
    pub financial: ComponentScore,
    pub technical: ComponentScore,
    pub peer: ComponentScore,
}

impl WeightedScoreResult {
    pub fn components(&self) -> [&ComponentScore; 4] {
        [&self.dcf, &self.financial, &self.technical, &self.peer]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = ComponentKind::ALL.iter().map(|c| c.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(InvestmentLabel::from_score(60.0), InvestmentLabel::StronglyBullish);
        assert_eq!(InvestmentLabel::from_score(59.99), InvestmentLabel::CautiouslyBullish);
        assert_eq!(InvestmentLabel::from_score(20.0), InvestmentLabel::CautiouslyBullish);
        assert_eq!(InvestmentLabel::from_score(19.99), InvestmentLabel::Neutral);
        assert_eq!(InvestmentLabel::from_score(-20.0), InvestmentLabel::Neutral);
        assert_eq!(InvestmentLabel::from_score(-20.01), InvestmentLabel::CautiouslyBearish);
        assert_eq!(InvestmentLabel::from_score(-60.0), InvestmentLabel::CautiouslyBearish);
        assert_eq!(InvestmentLabel::from_score(-60.01), InvestmentLabel::StronglyBearish);
    }

    #[test]
    fn test_labels_are_ordered() {
        assert!(InvestmentLabel::StronglyBearish < InvestmentLabel::CautiouslyBearish);
        assert!(InvestmentLabel::Neutral < InvestmentLabel::CautiouslyBullish);
        assert!(InvestmentLabel::CautiouslyBullish < InvestmentLabel::StronglyBullish);
    }

    #[test]
    fn test_from_raw_saturates() {
        let score = ComponentScore::from_raw(ComponentKind::Dcf, 80.0, 40.0, 0.7, vec![]);
        assert_eq!(score.normalized_score, 100.0);
        let score = ComponentScore::from_raw(ComponentKind::Dcf, -10.0, 40.0, 1.4, vec![]);
        assert!((score.normalized_score + 25.0).abs() < 1e-9);
        assert_eq!(score.confidence, 1.0);
    }

    #[test]
    fn test_degraded_component() {
        let score = ComponentScore::degraded(ComponentKind::Peer, "No peer data available");
        assert!(score.is_degraded());
        assert_eq!(score.normalized_score, 0.0);
        assert_eq!(score.reasoning, vec!["No peer data available".to_string()]);
    }

    #[test]
    fn test_label_serializes_screaming_case() {
        let json = serde_json::to_string(&InvestmentLabel::CautiouslyBullish).unwrap();
        assert_eq!(json, "\"CAUTIOUSLY_BULLISH\"");
    }
}
