use analysis_core::stats::saturate;
use analysis_core::{ComponentKind, ComponentScore, TechnicalData};

const RSI_WEIGHT: f64 = 0.25;
const TREND_WEIGHT: f64 = 0.25;
const MACD_WEIGHT: f64 = 0.25;
const VOLUME_WEIGHT: f64 = 0.15;
const MOMENTUM_WEIGHT: f64 = 0.10;
/// Momentum in percent that counts as a full signal
const FULL_MOMENTUM_PCT: f64 = 15.0;
const SIGNAL_COUNT: f64 = 5.0;

/// Turns an indicator snapshot into the technical component score.
///
/// Every available indicator maps to a direction in `[-1, 1]`; the raw score is
/// their weighted mean scaled to ±100. Oversold RSI reads as bullish.
pub struct TechnicalMomentumScorer;

impl TechnicalMomentumScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, data: &TechnicalData) -> ComponentScore {
        if data.is_empty() {
            return ComponentScore::degraded(ComponentKind::Technical, "No technical data available");
        }

        // (reason, direction, weight)
        let mut signals: Vec<(String, f64, f64)> = Vec::new();

        if let Some(rsi) = data.rsi.filter(|r| r.is_finite()) {
            let direction = saturate((50.0 - rsi) / 20.0, 1.0);
            let zone = if rsi < 30.0 {
                " (oversold)"
            } else if rsi > 70.0 {
                " (overbought)"
            } else {
                ""
            };
            signals.push((format!("RSI {rsi:.1}{zone}"), direction, RSI_WEIGHT));
        }
        if let Some(trend) = data.trend {
            signals.push((format!("MA trend {trend:?}"), trend.direction(), TREND_WEIGHT));
        }
        if let Some(signal) = data.macd {
            signals.push((format!("MACD {signal:?}"), signal.direction(), MACD_WEIGHT));
        }
        if let Some(volume) = data.volume_trend {
            signals.push((format!("Volume {volume:?}"), volume.direction(), VOLUME_WEIGHT));
        }
        if let Some(momentum) = data.price_momentum.filter(|m| m.is_finite()) {
            signals.push((
                format!("Momentum {momentum:+.1}%"),
                saturate(momentum / FULL_MOMENTUM_PCT, 1.0),
                MOMENTUM_WEIGHT,
            ));
        }

        if signals.is_empty() {
            return ComponentScore::degraded(ComponentKind::Technical, "No technical data available");
        }

        let total_weight: f64 = signals.iter().map(|(_, _, w)| w).sum();
        let raw = signals.iter().map(|(_, d, w)| d * w).sum::<f64>() / total_weight * 100.0;
        let confidence = signals.len() as f64 / SIGNAL_COUNT;
        tracing::debug!("Technical score {:.1} from {} signals", raw, signals.len());

        let reasoning = signals
            .into_iter()
            .map(|(reason, direction, _)| {
                let sign = if direction > 0.0 {
                    "+"
                } else if direction < 0.0 {
                    "-"
                } else {
                    "="
                };
                format!("{sign} {reason}")
            })
            .collect();

        ComponentScore::from_raw(ComponentKind::Technical, raw, 100.0, confidence, reasoning)
    }
}

impl Default for TechnicalMomentumScorer {
    fn default() -> Self {
        Self::new()
    }
}
