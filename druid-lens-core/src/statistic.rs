use druid_lens_common::{DruidLensError, Result};

use crate::sample::{shape_size, SyntheticValues};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Minimum,
    Maximum,
    Mean,
    Median,
    Sum,
    /// percentile in `[0, 100]`
    Percentile(f64),
}

impl Statistic {
    pub fn from_name(name: &str, percentile: Option<f64>) -> Result<Self> {
        match (name.to_lowercase().as_str(), percentile) {
            ("minimum" | "min", _) => Ok(Statistic::Minimum),
            ("maximum" | "max", _) => Ok(Statistic::Maximum),
            ("mean", _) => Ok(Statistic::Mean),
            ("median", _) => Ok(Statistic::Median),
            ("sum", _) => Ok(Statistic::Sum),
            ("percentile", Some(p)) => Ok(Statistic::Percentile(p)),
            ("percentile", None) => Err(DruidLensError::Other(
                "percentile statistic needs a percentile value".into(),
            )),
            (other, _) => Err(DruidLensError::Other(format!("unknown statistic: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StatisticValue {
    Scalar(f64),
    /// reduced over a subset of axes; values are sampled, not computed
    Array { shape: Vec<u64>, values: SyntheticValues },
}

impl StatisticValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            StatisticValue::Scalar(v) => Some(*v),
            StatisticValue::Array { .. } => None,
        }
    }
}

/// Placeholder for a whole-dataset reduction. `pixel_extent` is the axis length when the
/// component is a pixel axis.
pub(crate) fn placeholder(stat: Statistic, pixel_extent: Option<u64>, size: u64) -> f64 {
    match stat {
        Statistic::Minimum => 0.0,
        Statistic::Maximum => pixel_extent.map(|n| n as f64).unwrap_or(1.0),
        Statistic::Mean | Statistic::Median => 0.5,
        Statistic::Percentile(p) => p / 100.0,
        Statistic::Sum => size as f64 / 2.0,
    }
}

/// Random array for a reduction over `axes` only: the surviving axes keep their extent.
pub(crate) fn partial_reduction(shape: &[u64], axes: &[usize]) -> StatisticValue {
    let reduced: Vec<u64> = shape
        .iter()
        .enumerate()
        .filter(|(i, _)| !axes.contains(i))
        .map(|(_, &n)| n)
        .collect();
    let values = SyntheticValues::new(shape_size(&reduced));
    StatisticValue::Array { shape: reduced, values }
}

#[cfg(test)]
mod tests_statistic {
    use super::*;

    #[test] fn minimum_is_zero() { assert_eq!(placeholder(Statistic::Minimum, None, 10), 0.0); }
    #[test] fn maximum_defaults_to_one() { assert_eq!(placeholder(Statistic::Maximum, None, 10), 1.0); }
    #[test] fn maximum_of_pixel_axis_is_extent() { assert_eq!(placeholder(Statistic::Maximum, Some(42), 10), 42.0); }
    #[test] fn mean_and_median_are_half() {
        assert_eq!(placeholder(Statistic::Mean, None, 10), 0.5);
        assert_eq!(placeholder(Statistic::Median, None, 10), 0.5);
    }
    #[test] fn percentile_scales() { assert_eq!(placeholder(Statistic::Percentile(90.0), None, 10), 0.9); }
    #[test] fn sum_is_half_size() { assert_eq!(placeholder(Statistic::Sum, None, 1_000_000_000), 5e8); }

    #[test]
    fn reducing_only_axis_leaves_scalar_shape() {
        let StatisticValue::Array { shape, values } = partial_reduction(&[1_000_000_000], &[0]) else {
            panic!("expected array");
        };
        assert!(shape.is_empty());
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn surviving_axes_keep_extent() {
        let StatisticValue::Array { shape, values } = partial_reduction(&[4, 3], &[1]) else {
            panic!("expected array");
        };
        assert_eq!(shape, vec![4]);
        assert_eq!(values.count(), 4);
    }

    #[test]
    fn names_parse() {
        assert_eq!(Statistic::from_name("Maximum", None).unwrap(), Statistic::Maximum);
        assert_eq!(Statistic::from_name("percentile", Some(25.0)).unwrap(), Statistic::Percentile(25.0));
        assert!(Statistic::from_name("percentile", None).is_err());
        assert!(Statistic::from_name("mode", None).is_err());
    }
}
