#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use ta_pairs::{AlignedSeriesPair, EngineConfig, PairStatistics, WindowSpec, WindowedEvaluator};

fn series(len: impl Into<prop::collection::SizeRange>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1e3f64..1e3, len)
}

fn pair(len: std::ops::Range<usize>) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    len.prop_flat_map(|n| (series(n), series(n)))
}

fn spread_of(values: &[f64]) -> f64 {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    hi - lo
}

proptest! {
    #[test]
    fn correlation_with_itself_is_one(a in series(3..60), exponent in -120i32..120) {
        prop_assume!(spread_of(&a) > 1e-3);
        let scale = 10f64.powi(exponent);
        let a: Vec<f64> = a.iter().map(|v| v * scale).collect();
        let stats = PairStatistics::new(&a, &a).unwrap();
        prop_assert!(stats.correlation().is_ok());
        prop_assert!((stats.correlation().value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_regressor_hedge_ratio_is_scaled_mean(a in series(2..60), c in 0.5f64..100.0) {
        let b = vec![c; a.len()];
        let stats = PairStatistics::new(&a, &b).unwrap();
        let expected = a.iter().sum::<f64>() / a.len() as f64 / c;
        let tol = 1e-9 * (1.0 + expected.abs());
        prop_assert!((stats.hedge_ratio().value() - expected).abs() < tol);
    }

    #[test]
    fn spread_is_orthogonal_to_regressor((a, b) in pair(2..80)) {
        prop_assume!(b.iter().any(|v| v.abs() > 1e-3));
        let stats = PairStatistics::new(&a, &b).unwrap();
        let cross: f64 = stats.spread().iter().zip(&b).map(|(s, y)| s * y).sum();
        let scale: f64 = a.iter().zip(&b).map(|(x, y)| (x * y).abs()).sum::<f64>()
            + b.iter().map(|y| y * y).sum::<f64>();
        prop_assert!(cross.abs() <= 1e-9 * scale);
    }

    #[test]
    fn zscore_is_standardized((a, b) in pair(3..80)) {
        let stats = PairStatistics::new(&a, &b).unwrap();
        prop_assume!(stats.zscore().is_ok());
        let z = stats.zscore().as_value();
        let n = z.len() as f64;
        let mean = z.iter().sum::<f64>() / n;
        let var = z.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        prop_assert!(mean.abs() < 1e-9);
        prop_assert!((var.sqrt() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rolling_zscore_warm_up(
        (a, b, w) in (3usize..80).prop_flat_map(|n| (series(n), series(n), 2..=n))
    ) {
        let stats = PairStatistics::new(&a, &b).unwrap();
        let rolling = stats.zscore_rolling_with(w);
        prop_assume!(rolling.is_ok());
        let values = rolling.as_value();
        prop_assert_eq!(values.len(), a.len());
        prop_assert!(values[..w - 1].iter().all(Option::is_none));
        prop_assert!(values[w - 1..].iter().all(Option::is_some));
    }

    #[test]
    fn evaluator_yields_one_snapshot_per_step(
        (length, k, a, b) in (10usize..30, 0usize..8).prop_flat_map(|(length, k)| {
            (Just(length), Just(k), series(length + k), series(length + k))
        })
    ) {
        let timestamps: Vec<u64> = (0..(length + k) as u64).collect();
        let pair = AlignedSeriesPair::new(timestamps, a.clone(), b.clone()).unwrap();
        let config = EngineConfig {
            rolling_window: 5,
            ..Default::default()
        };
        let evaluator =
            WindowedEvaluator::new(&pair, WindowSpec::new(length).unwrap(), config).unwrap();
        let snapshots = evaluator.evaluate();
        prop_assert_eq!(snapshots.len(), k);
        for (j, snap) in snapshots.iter().enumerate() {
            let last = length + j - 1;
            prop_assert_eq!(snap.timestamp, last as u64);
            prop_assert_eq!(snap.last_a, a[last]);
            prop_assert_eq!(snap.last_b, b[last]);
        }
    }
}
