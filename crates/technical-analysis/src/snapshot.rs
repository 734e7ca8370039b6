use analysis_core::{Bar, MacdSignal, TechnicalData, Trend, VolumeTrend};

use crate::indicators::{macd, rsi, sma};

const RSI_PERIOD: usize = 14;
const SHORT_MA: usize = 20;
const LONG_MA: usize = 50;
const VOLUME_LOOKBACK: usize = 20;
const MOMENTUM_LOOKBACK: usize = 20;
/// Volume this many times its recent average counts as heavy
const HIGH_VOLUME_RATIO: f64 = 1.5;
/// Band around SMA20 used when there is no SMA50 yet
const SHORT_TREND_BAND: f64 = 0.02;

/// Builds an indicator snapshot from OHLCV history.
pub trait FromBars {
    fn from_bars(bars: &[Bar]) -> Self;
}

impl FromBars for TechnicalData {
    /// Each field is `None` when the history is too short for its indicator.
    fn from_bars(bars: &[Bar]) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        TechnicalData {
            rsi: rsi(&closes, RSI_PERIOD).last().copied(),
            trend: detect_trend(&closes),
            macd: macd_signal(&closes),
            volume_trend: volume_trend(bars),
            price_momentum: momentum(&closes),
        }
    }
}

fn detect_trend(closes: &[f64]) -> Option<Trend> {
    let price = *closes.last()?;
    let short = *sma(closes, SHORT_MA).last()?;

    let trend = match sma(closes, LONG_MA).last() {
        Some(&long) => {
            if price > short && short > long {
                Trend::Uptrend
            } else if price < short && short < long {
                Trend::Downtrend
            } else {
                Trend::Sideways
            }
        }
        None => {
            if price > short * (1.0 + SHORT_TREND_BAND) {
                Trend::Uptrend
            } else if price < short * (1.0 - SHORT_TREND_BAND) {
                Trend::Downtrend
            } else {
                Trend::Sideways
            }
        }
    };
    Some(trend)
}

fn macd_signal(closes: &[f64]) -> Option<MacdSignal> {
    let histogram = macd(closes, 12, 26, 9).histogram;
    let last = *histogram.last()?;

    if histogram.len() > 1 {
        let prev = histogram[histogram.len() - 2];
        if prev <= 0.0 && last > 0.0 {
            return Some(MacdSignal::BullishCrossover);
        }
        if prev >= 0.0 && last < 0.0 {
            return Some(MacdSignal::BearishCrossover);
        }
    }

    Some(if last > 0.0 {
        MacdSignal::Bullish
    } else if last < 0.0 {
        MacdSignal::Bearish
    } else {
        MacdSignal::Neutral
    })
}

fn volume_trend(bars: &[Bar]) -> Option<VolumeTrend> {
    if bars.len() < VOLUME_LOOKBACK + 1 {
        return None;
    }
    let (last, history) = bars.split_last()?;
    let previous = history.last()?;
    let window = &history[history.len() - VOLUME_LOOKBACK..];
    let average = window.iter().map(|b| b.volume).sum::<f64>() / VOLUME_LOOKBACK as f64;
    if average <= 0.0 {
        return None;
    }

    let heavy = last.volume / average > HIGH_VOLUME_RATIO;
    let change = last.close - previous.close;
    let trend = match (heavy, change) {
        (_, c) if c == 0.0 => VolumeTrend::Neutral,
        (true, c) if c > 0.0 => VolumeTrend::HighBullish,
        (true, _) => VolumeTrend::HighBearish,
        (false, c) if c > 0.0 => VolumeTrend::NormalBullish,
        (false, _) => VolumeTrend::NormalBearish,
    };
    Some(trend)
}

/// Percent change over the momentum lookback
fn momentum(closes: &[f64]) -> Option<f64> {
    if closes.len() < MOMENTUM_LOOKBACK + 1 {
        return None;
    }
    let base = closes[closes.len() - 1 - MOMENTUM_LOOKBACK];
    let last = *closes.last()?;
    (base > 0.0).then(|| (last / base - 1.0) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_from(closes: &[f64], volumes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| Bar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume,
            })
            .collect()
    }

    fn rising(len: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
        bars_from(&closes, &vec![1_000_000.0; len])
    }

    #[test]
    fn test_steady_uptrend_snapshot() {
        let data = TechnicalData::from_bars(&rising(60));

        assert_eq!(data.rsi, Some(100.0));
        assert_eq!(data.trend, Some(Trend::Uptrend));
        assert_eq!(data.volume_trend, Some(VolumeTrend::NormalBullish));
        assert!(data.macd.is_some());
        let momentum = data.price_momentum.unwrap();
        assert!((momentum - (159.0 / 139.0 - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_uses_sma20_band() {
        let data = TechnicalData::from_bars(&rising(30));
        // 129 vs SMA20 of 119.5
        assert_eq!(data.trend, Some(Trend::Uptrend));
        assert!(data.macd.is_none());
    }

    #[test]
    fn test_too_few_bars_is_empty() {
        let data = TechnicalData::from_bars(&rising(10));
        assert!(data.is_empty());
        assert!(TechnicalData::from_bars(&[]).is_empty());
    }

    #[test]
    fn test_heavy_volume_on_down_close() {
        let mut closes = vec![100.0; 25];
        closes[24] = 95.0;
        let mut volumes = vec![1_000.0; 25];
        volumes[24] = 2_000.0;
        let data = TechnicalData::from_bars(&bars_from(&closes, &volumes));

        assert_eq!(data.volume_trend, Some(VolumeTrend::HighBearish));
        assert_eq!(data.trend, Some(Trend::Downtrend));
        assert!((data.price_momentum.unwrap() + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_close_is_neutral_volume() {
        let closes = vec![100.0; 25];
        let mut volumes = vec![1_000.0; 25];
        volumes[24] = 5_000.0;
        let data = TechnicalData::from_bars(&bars_from(&closes, &volumes));
        assert_eq!(data.volume_trend, Some(VolumeTrend::Neutral));
        assert_eq!(data.trend, Some(Trend::Sideways));
        assert_eq!(data.rsi, Some(50.0));
    }
}
