#[cfg(test)]
mod tests {
    use super::super::indicators::*;

    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    fn long_series(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001);
        assert!((result[1] - 3.0).abs() < 0.001);
        assert!((result[2] - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(sma(&[1.0, 2.0], 5).is_empty());
        assert!(sma(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_sma_real_prices() {
        let prices = sample_prices();
        let result = sma(&prices, 5);

        let expected_first = (44.34 + 44.09 + 44.15 + 43.61 + 44.33) / 5.0;
        assert!((result[0] - expected_first).abs() < 0.01);
        assert_eq!(result.len(), prices.len() - 4);
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let data = vec![22.0, 24.0, 23.0, 25.0, 26.0];
        let result = ema(&data, 3);

        assert_eq!(result.len(), 3);
        let seed = (22.0 + 24.0 + 23.0) / 3.0;
        assert!((result[0] - seed).abs() < 1e-9);
        // multiplier 0.5
        assert!((result[1] - (25.0 + seed) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_ema_empty_data() {
        assert!(ema(&[], 5).is_empty());
        assert!(ema(&[1.0, 2.0], 5).is_empty());
    }

    #[test]
    fn test_ema_increases_with_uptrend() {
        let data: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let result = ema(&data, 3);
        for pair in result.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_rsi_bounds() {
        let result = rsi(&sample_prices(), 14);

        assert_eq!(result.len(), 20 - 14);
        for value in result {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert!(rsi(&[1.0, 2.0, 3.0], 14).is_empty());
    }

    #[test]
    fn test_rsi_extremes() {
        let uptrend: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(*rsi(&uptrend, 14).last().unwrap(), 100.0);

        let downtrend: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert!(*rsi(&downtrend, 14).last().unwrap() < 1e-9);

        let flat = vec![50.0; 20];
        assert_eq!(*rsi(&flat, 14).last().unwrap(), 50.0);
    }

    #[test]
    fn test_macd_lengths() {
        let prices = long_series(60);
        let result = macd(&prices, 12, 26, 9);

        assert_eq!(result.macd_line.len(), 60 - 26 + 1);
        assert_eq!(result.signal_line.len(), result.macd_line.len() - 8);
        assert_eq!(result.histogram.len(), result.signal_line.len());
    }

    #[test]
    fn test_macd_short_series_is_empty() {
        let result = macd(&sample_prices(), 12, 26, 9);
        assert!(result.macd_line.is_empty());
        assert!(result.histogram.is_empty());
    }

    #[test]
    fn test_macd_histogram() {
        let result = macd(&long_series(80), 12, 26, 9);
        let offset = result.macd_line.len() - result.signal_line.len();
        for (i, hist) in result.histogram.iter().enumerate() {
            let expected = result.macd_line[i + offset] - result.signal_line[i];
            assert!((hist - expected).abs() < 1e-12);
        }
    }
}
