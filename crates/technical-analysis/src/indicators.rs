/// Simple moving average; one value per full window.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }
    data.windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Exponential moving average seeded with the SMA of the first `period` values.
///
/// `result[0]` lines up with `data[period - 1]`.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = data[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(data.len() - period + 1);
    result.push(seed);
    for value in &data[period..] {
        let prev = result[result.len() - 1];
        result.push((value - prev) * multiplier + prev);
    }
    result
}

/// Wilder's Relative Strength Index
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let changes: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: &f64| c.max(0.0);
    let loss = |c: &f64| (-c).max(0.0);

    let mut avg_gain = changes[..period].iter().map(gain).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(loss).sum::<f64>() / period as f64;

    let to_rsi = |g: f64, l: f64| {
        if l == 0.0 {
            if g == 0.0 {
                50.0
            } else {
                100.0
            }
        } else {
            100.0 - 100.0 / (1.0 + g / l)
        }
    };

    let mut values = Vec::with_capacity(changes.len() - period + 1);
    values.push(to_rsi(avg_gain, avg_loss));
    for change in &changes[period..] {
        avg_gain = (avg_gain * (period - 1) as f64 + gain(change)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(change)) / period as f64;
        values.push(to_rsi(avg_gain, avg_loss));
    }
    values
}

/// MACD line, signal line and histogram, all aligned to their last element.
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    let empty = MacdResult {
        macd_line: vec![],
        signal_line: vec![],
        histogram: vec![],
    };
    if fast_period == 0 || signal_period == 0 || slow_period <= fast_period {
        return empty;
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);
    if ema_slow.is_empty() {
        return empty;
    }

    let offset = slow_period - fast_period;
    let macd_line: Vec<f64> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, slow)| ema_fast[i + offset] - slow)
        .collect();

    let signal_line = ema(&macd_line, signal_period);
    let hist_offset = macd_line.len() - signal_line.len();
    let histogram = signal_line
        .iter()
        .enumerate()
        .map(|(i, signal)| macd_line[i + hist_offset] - signal)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}
