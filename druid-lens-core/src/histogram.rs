use druid_lens_common::{DruidLensError, Result};
use serde::{Deserialize, Serialize};

use crate::query::ValueRange;

/// (offset, bin_size, bin_count) partition of a histogram domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinGeometry {
    offset: f64,
    bin_size: f64,
    bin_count: usize,
}

impl BinGeometry {
    pub fn new(range: ValueRange, bin_count: usize) -> Result<Self> {
        if bin_count == 0 {
            return Err(DruidLensError::InvalidBinGeometry(format!(
                "bin count must be positive for range [{}, {}]",
                range.lower, range.upper
            )));
        }
        Self::from_parts(range.lower, range.width() / bin_count as f64, bin_count)
    }

    pub fn from_parts(offset: f64, bin_size: f64, bin_count: usize) -> Result<Self> {
        if bin_count == 0 {
            return Err(DruidLensError::InvalidBinGeometry("bin count must be positive".into()));
        }
        if bin_size == 0.0 || !bin_size.is_finite() || !offset.is_finite() {
            return Err(DruidLensError::InvalidBinGeometry(format!(
                "bin size {bin_size} with offset {offset} cannot partition a domain"
            )));
        }
        Ok(Self { offset, bin_size, bin_count })
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
    pub fn bin_size(&self) -> f64 {
        self.bin_size
    }
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// bin holding `x`, or None when `x` falls outside `[0, bin_count)` (NaN included)
    pub fn index_of(&self, x: f64) -> Option<usize> {
        let idx = ((x - self.offset) / self.bin_size).floor();
        if idx >= 0.0 && idx < self.bin_count as f64 {
            Some(idx as usize)
        } else {
            None
        }
    }
}

/// one element of a groupBy response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub event: BinEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinEvent {
    pub bin: f64, // bucket start, not an index
    pub count: u64,
}

impl RawRecord {
    pub fn new(bin: f64, count: u64) -> Self {
        Self { event: BinEvent { bin, count } }
    }
}

/// Folds sparse bucket records into a dense array of `bin_count` counts.
///
/// Records outside the domain are dropped. Two records landing in the same bin do not add up:
/// the later one in input order overwrites the earlier.
pub fn reduce_histogram(records: &[RawRecord], geometry: &BinGeometry) -> Vec<u64> {
    let mut counts = vec![0u64; geometry.bin_count()];
    for rec in records {
        match geometry.index_of(rec.event.bin) {
            Some(idx) => counts[idx] = rec.event.count,
            None => log::trace!(
                "discarding bucket {} (count {}) outside [{}, +{}x{})",
                rec.event.bin,
                rec.event.count,
                geometry.offset(),
                geometry.bin_count(),
                geometry.bin_size()
            ),
        }
    }
    counts
}

#[cfg(test)]
mod tests_reduce_histogram {
    use super::*;

    fn geom() -> BinGeometry {
        BinGeometry::new(ValueRange::new(0.0, 5.0), 5).unwrap()
    }

    #[test]
    fn sparse_records_fill_dense_array() {
        let recs = vec![RawRecord::new(0.0, 3), RawRecord::new(2.0, 7), RawRecord::new(4.9, 1)];
        assert_eq!(reduce_histogram(&recs, &geom()), vec![3, 0, 7, 0, 1]);
    }

    #[test]
    fn out_of_domain_record_is_discarded() {
        let base = vec![RawRecord::new(0.0, 3), RawRecord::new(2.0, 7), RawRecord::new(4.9, 1)];
        let mut with_extra = base.clone();
        with_extra.push(RawRecord::new(5.5, 99));
        with_extra.push(RawRecord::new(-0.5, 42));
        assert_eq!(reduce_histogram(&with_extra, &geom()), reduce_histogram(&base, &geom()));
    }

    #[test]
    fn upper_bound_bucket_is_discarded() {
        // floor((5 - 0) / 1) == 5 == bin_count
        let recs = vec![RawRecord::new(5.0, 8)];
        assert_eq!(reduce_histogram(&recs, &geom()), vec![0; 5]);
    }

    #[test]
    fn nan_bucket_is_discarded() {
        let recs = vec![RawRecord::new(f64::NAN, 8)];
        assert_eq!(reduce_histogram(&recs, &geom()), vec![0; 5]);
    }

    #[test]
    fn collisions_keep_last_write() {
        let recs = vec![RawRecord::new(1.2, 4), RawRecord::new(1.7, 6)];
        assert_eq!(reduce_histogram(&recs, &geom())[1], 6);
        let reversed = vec![RawRecord::new(1.7, 6), RawRecord::new(1.2, 4)];
        assert_eq!(reduce_histogram(&reversed, &geom())[1], 4);
    }

    #[test]
    fn unsorted_records_map_by_value() {
        let recs = vec![RawRecord::new(3.0, 2), RawRecord::new(1.0, 5)];
        assert_eq!(reduce_histogram(&recs, &geom()), vec![0, 5, 0, 2, 0]);
    }

    #[test]
    fn reducing_twice_is_identical() {
        let recs = vec![RawRecord::new(0.5, 1), RawRecord::new(2.5, 9)];
        let g = geom();
        assert_eq!(reduce_histogram(&recs, &g), reduce_histogram(&recs, &g));
    }

    #[test]
    fn offset_shifts_index() {
        let g = BinGeometry::new(ValueRange::new(10.0, 20.0), 4).unwrap();
        let recs = vec![RawRecord::new(10.0, 1), RawRecord::new(17.5, 2), RawRecord::new(9.99, 3)];
        assert_eq!(reduce_histogram(&recs, &g), vec![1, 0, 0, 2]);
    }

    #[test]
    fn empty_response_is_all_zero() {
        assert_eq!(reduce_histogram(&[], &geom()), vec![0; 5]);
    }

    #[test]
    fn zero_bins_is_invalid_geometry() {
        let err = BinGeometry::new(ValueRange::new(0.0, 5.0), 0).unwrap_err();
        assert!(matches!(err, DruidLensError::InvalidBinGeometry(_)));
    }

    #[test]
    fn empty_range_is_invalid_geometry() {
        let err = BinGeometry::new(ValueRange::new(2.0, 2.0), 4).unwrap_err();
        assert!(matches!(err, DruidLensError::InvalidBinGeometry(_)));
        assert!(BinGeometry::from_parts(0.0, 0.0, 3).is_err());
        assert!(BinGeometry::from_parts(0.0, f64::INFINITY, 3).is_err());
    }

    #[test]
    fn bin_size_is_exact_quotient() {
        let g = BinGeometry::new(ValueRange::new(0.0, 1.0), 3).unwrap();
        assert_eq!(g.bin_size(), (1.0 - 0.0) / 3.0);
        assert_eq!(g.offset(), 0.0);
    }
}
