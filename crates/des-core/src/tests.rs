//! Unit tests for des-core primitives.

#[cfg(test)]
mod ids {
    use crate::EventId;

    #[test]
    fn next_increments() {
        assert_eq!(EventId(0).next(), EventId(1));
        assert_eq!(EventId(41).next().get(), 42);
    }

    #[test]
    fn ordering() {
        assert!(EventId(0) < EventId(1));
    }

    #[test]
    fn display() {
        assert_eq!(EventId(7).to_string(), "EventId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::{CoreError, Duration, Instant, SimConfig};

    fn secs(s: f64) -> Duration {
        Duration::from_secs(s).unwrap()
    }

    fn at(s: f64) -> Instant {
        Instant::from_secs(s).unwrap()
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        assert!(matches!(
            Duration::from_secs(-1.0),
            Err(CoreError::InvalidMeasure { what: "duration", .. })
        ));
        assert!(Duration::from_secs(f64::NAN).is_err());
        assert!(Duration::from_secs(f64::INFINITY).is_err());
        assert!(Instant::from_secs(-0.5).is_err());
        assert!(Instant::from_secs(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn negative_zero_is_canonical_zero() {
        let z = Duration::from_secs(-0.0).unwrap();
        assert_eq!(z, Duration::ZERO);
        assert!(z.as_secs().is_sign_positive());
    }

    #[test]
    fn instant_arithmetic() {
        let t = at(4.0);
        assert_eq!(t.checked_add(secs(6.0)).unwrap(), at(10.0));
        assert_eq!(at(10.0).duration_since(t).unwrap(), secs(6.0));
        assert_eq!(t.since_epoch(), secs(4.0));
        assert_eq!(Instant::at_offset(secs(4.0)), t);
    }

    #[test]
    fn duration_since_later_fails() {
        assert_eq!(
            at(3.0).duration_since(at(5.0)),
            Err(CoreError::NegativeInterval { from: 5.0, to: 3.0 })
        );
    }

    #[test]
    fn overflow_is_reported() {
        let big = secs(f64::MAX);
        assert_eq!(big.checked_add(big), Err(CoreError::Overflow));
        assert_eq!(Instant::at_offset(big).checked_add(big), Err(CoreError::Overflow));
    }

    #[test]
    fn duration_checked_sub() {
        assert_eq!(secs(10.0).checked_sub(secs(4.0)).unwrap(), secs(6.0));
        assert!(secs(1.0).checked_sub(secs(2.0)).is_err());
    }

    #[test]
    fn total_order_matches_numeric_order() {
        let mut v = vec![at(5.0), at(0.0), at(2.5), at(100.0)];
        v.sort();
        assert_eq!(v, vec![at(0.0), at(2.5), at(5.0), at(100.0)]);
    }

    #[test]
    fn display() {
        assert_eq!(secs(2.5).to_string(), "2.5s");
        assert_eq!(at(6.0).to_string(), "@6s");
    }

    #[test]
    fn default_config() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.start, Instant::EPOCH);
        assert!(cfg.stop_at.is_none());
        assert!(cfg.max_dispatches.is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_negative() {
        // Only compiled with `--features serde`; uses the f64 conversion path.
        assert!(Duration::try_from(-2.0).is_err());
        assert_eq!(f64::from(secs(2.0)), 2.0);
    }
}

#[cfg(test)]
mod rng {
    use crate::{CoreError, Duration, SimRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = SimRng::new(12345);
        let mut r2 = SimRng::new(12345);
        for _ in 0..100 {
            let a: u64 = r1.random();
            let b: u64 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn children_diverge() {
        let mut root = SimRng::new(1);
        let mut c0 = root.child(0);
        let mut c1 = root.child(1);
        let a: u64 = c0.random();
        let b: u64 = c1.random();
        assert_ne!(a, b);
    }

    #[test]
    fn exponential_is_non_negative_with_plausible_mean() {
        let mut rng = SimRng::new(7);
        let mean = Duration::from_secs(4.0).unwrap();
        let n = 20_000;
        let total: f64 = (0..n).map(|_| rng.exponential(mean).unwrap().as_secs()).sum();
        let sample_mean = total / n as f64;
        assert!((sample_mean - 4.0).abs() < 0.2, "got {sample_mean}");
    }

    #[test]
    fn exponential_zero_mean() {
        let mut rng = SimRng::new(0);
        assert_eq!(rng.exponential(Duration::ZERO), Ok(Duration::ZERO));
    }

    #[test]
    fn exponential_overflow_is_reported() {
        let mut rng = SimRng::new(3);
        let huge = Duration::from_secs(f64::MAX).unwrap();
        let draws: Vec<_> = (0..64).map(|_| rng.exponential(huge)).collect();
        // ln(1 - u) < -1 for u > 0.64, so most draws overflow.
        assert!(draws.iter().any(|d| *d == Err(CoreError::Overflow)));
        assert!(draws.iter().all(|d| match d {
            Ok(d) => d.as_secs().is_finite(),
            Err(e) => *e == CoreError::Overflow,
        }));
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = SimRng::new(0);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }
}

#[cfg(test)]
mod stats {
    use crate::{CoreError, Histogram, SummaryStatistics};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn summary_of(values: &[f64]) -> SummaryStatistics {
        let mut s = SummaryStatistics::new();
        for &v in values {
            s.record(v).unwrap();
        }
        s
    }

    #[test]
    fn empty_summary_has_no_values() {
        let s = SummaryStatistics::new();
        assert_eq!(s.observations(), 0);
        let none = Err(CoreError::InsufficientData { needed: 1, have: 0 });
        assert_eq!(s.minimum(), none);
        assert_eq!(s.maximum(), none);
        assert_eq!(s.mean(), none);
        assert_eq!(s.variance(), Err(CoreError::InsufficientData { needed: 2, have: 0 }));
    }

    #[test]
    fn single_observation() {
        let s = summary_of(&[-3.5]);
        assert_eq!(s.minimum(), Ok(-3.5));
        assert_eq!(s.maximum(), Ok(-3.5));
        assert_eq!(s.mean(), Ok(-3.5));
        assert_eq!(s.std_deviation(), Err(CoreError::InsufficientData { needed: 2, have: 1 }));
    }

    #[test]
    fn known_dataset() {
        // Sample variance of 2, 4, 4, 4, 5, 5, 7, 9 is 32 / 7.
        let s = summary_of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.observations(), 8);
        assert_eq!(s.minimum(), Ok(2.0));
        assert_eq!(s.maximum(), Ok(9.0));
        assert!(close(s.mean().unwrap(), 5.0));
        assert!(close(s.variance().unwrap(), 32.0 / 7.0));
        assert!(close(s.std_deviation().unwrap(), (32.0f64 / 7.0).sqrt()));
    }

    #[test]
    fn large_offset_keeps_variance_accurate() {
        let s = summary_of(&[1e9 + 4.0, 1e9 + 7.0, 1e9 + 13.0, 1e9 + 16.0]);
        let v = s.variance().unwrap();
        assert!((v - 30.0).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn non_finite_observation_rejected() {
        let mut s = summary_of(&[1.0, 2.0]);
        let before = s.clone();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(s.record(bad), Err(CoreError::NotFinite { what: "observation", .. })));
        }
        assert_eq!(s, before);
    }

    #[test]
    fn reset_clears_summary() {
        let mut s = summary_of(&[1.0, 2.0, 3.0]);
        s.reset();
        assert_eq!(s.observations(), 0);
        assert!(s.mean().is_err());
    }

    #[test]
    fn histogram_rejects_bad_layout() {
        assert!(matches!(Histogram::new(0.0, 1, 1.0), Err(CoreError::InvalidHistogram(_))));
        assert!(matches!(Histogram::new(0.0, 4, 0.0), Err(CoreError::InvalidHistogram(_))));
        assert!(matches!(Histogram::new(0.0, 4, -2.0), Err(CoreError::InvalidHistogram(_))));
        assert!(matches!(Histogram::new(0.0, 4, f64::NAN), Err(CoreError::InvalidHistogram(_))));
        assert!(matches!(Histogram::new(f64::INFINITY, 4, 1.0), Err(CoreError::NotFinite { .. })));
    }

    #[test]
    fn histogram_bins_values() {
        // Bins [10, 15), [15, 20), [20, 25).
        let mut h = Histogram::new(10.0, 3, 5.0).unwrap();
        for v in [9.999, -40.0, 10.0, 14.9, 15.0, 24.999, 25.0, 1e300] {
            h.record(v).unwrap();
        }
        assert_eq!(h.underflow(), 2);
        assert_eq!(h.bins(), [2, 1, 1]);
        assert_eq!(h.overflow(), 2);
        assert_eq!(h.bin_count(), 3);
        assert_eq!(h.bin_start(2), 20.0);
        assert_eq!(h.summary().observations(), 8);
        assert_eq!(h.summary().minimum(), Ok(-40.0));
    }

    #[test]
    fn histogram_extreme_values_route_to_outer_bins() {
        let mut h = Histogram::new(-1.0, 2, 1.0).unwrap();
        h.record(f64::MAX).unwrap();
        h.record(-f64::MAX).unwrap();
        assert_eq!(h.overflow(), 1);
        assert_eq!(h.underflow(), 1);
        assert_eq!(h.bins(), [0, 0]);
    }

    #[test]
    fn histogram_rejects_non_finite_and_resets() {
        let mut h = Histogram::new(0.0, 2, 1.0).unwrap();
        h.record(0.5).unwrap();
        assert!(h.record(f64::NAN).is_err());
        assert_eq!(h.bins(), [1, 0]);
        h.reset();
        assert_eq!(h.bins(), [0, 0]);
        assert_eq!(h.summary().observations(), 0);
        assert_eq!(h.bin_width(), 1.0);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use crate::{Duration, Instant};

    proptest! {
        #[test]
        fn add_then_since_recovers_delay(start in 0.0f64..1e6, delay in 0.0f64..1e6) {
            let t = Instant::from_secs(start).unwrap();
            let d = Duration::from_secs(delay).unwrap();
            let later = t.checked_add(d).unwrap();
            prop_assert!(later >= t);
            let back = later.duration_since(t).unwrap();
            prop_assert!((back.as_secs() - delay).abs() <= 1e-6 * (1.0 + start + delay));
        }

        #[test]
        fn negative_inputs_always_rejected(v in -1e9f64..-1e-9) {
            prop_assert!(Duration::from_secs(v).is_err());
            prop_assert!(Instant::from_secs(v).is_err());
        }
    }
}
