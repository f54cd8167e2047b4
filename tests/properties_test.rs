//! Property tests for matrix expansion and sample statistics.

use perf_matrix::perf::{ConfidenceLevel, ParamSpace, SampleStats};
use proptest::prelude::*;
use std::collections::HashSet;

fn space_strategy() -> impl Strategy<Value = Vec<Vec<u64>>> {
    prop::collection::vec(prop::collection::vec(0u64..20, 0..5), 0..4)
}

proptest! {
    #[test]
    fn expansion_size_is_product_of_distinct_values(values in space_strategy()) {
        let mut space = ParamSpace::new();
        for (i, vals) in values.iter().enumerate() {
            space = space.with_parameter(&format!("P{i}"), vals.iter().copied());
        }

        let expected: usize = values
            .iter()
            .map(|v| v.iter().collect::<HashSet<_>>().len())
            .product();
        let configs = space.expand();

        prop_assert_eq!(configs.len(), expected);
        prop_assert_eq!(space.len(), expected);

        let unique: HashSet<_> = configs.iter().collect();
        prop_assert_eq!(unique.len(), configs.len());

        for config in &configs {
            prop_assert_eq!(config.len(), values.len());
            for (i, vals) in values.iter().enumerate() {
                let value = config.get(&format!("P{i}")).unwrap();
                prop_assert!(vals.contains(&value));
            }
        }
    }

    #[test]
    fn expansion_is_deterministic(values in space_strategy()) {
        let mut space = ParamSpace::new();
        for (i, vals) in values.iter().enumerate() {
            space = space.with_parameter(&format!("P{i}"), vals.iter().copied());
        }
        prop_assert_eq!(space.expand(), space.expand());
    }

    #[test]
    fn mean_lies_between_extremes(samples in prop::collection::vec(0.0f64..1e9, 1..200)) {
        let stats = SampleStats::from_nanos(&samples, ConfidenceLevel::P999).unwrap();

        prop_assert_eq!(stats.count, samples.len());
        prop_assert!(stats.min_ns <= stats.mean_ns);
        prop_assert!(stats.mean_ns <= stats.max_ns);
        prop_assert!(stats.min_ns <= stats.median_ns && stats.median_ns <= stats.max_ns);
        prop_assert!(stats.std_dev_ns >= 0.0);
        prop_assert!(stats.error_ns >= 0.0);
    }

    #[test]
    fn wider_confidence_gives_wider_error(samples in prop::collection::vec(0.0f64..1e6, 2..60)) {
        let p95 = SampleStats::from_nanos(&samples, ConfidenceLevel::P95).unwrap();
        let p999 = SampleStats::from_nanos(&samples, ConfidenceLevel::P999).unwrap();
        prop_assert!(p95.error_ns <= p999.error_ns);
    }
}
