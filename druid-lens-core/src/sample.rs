use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Region of a 1-d virtual dataset, in the front end's indexing vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewSpec {
    /// single element; reduces the axis away
    Index(i64),
    /// python-style `start:stop:step`, negative bounds count from the end
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
    },
    Indices(Vec<u64>),
}

impl ViewSpec {
    pub fn full() -> Self {
        ViewSpec::Slice { start: None, stop: None, step: 1 }
    }

    /// shape of the view over an axis of `len` elements
    pub fn shape(&self, len: u64) -> Vec<u64> {
        match self {
            ViewSpec::Index(_) => Vec::new(),
            ViewSpec::Slice { start, stop, step } => vec![slice_len(*start, *stop, *step, len)],
            ViewSpec::Indices(ix) => vec![ix.len() as u64],
        }
    }
}

/// element count of `start:stop:step` over `len` items; a zero step is read as 1.
/// Widened to i128 so extreme bounds and steps cannot overflow.
fn slice_len(start: Option<i64>, stop: Option<i64>, step: i64, len: u64) -> u64 {
    let len = i128::from(len);
    let step = if step == 0 { 1 } else { i128::from(step) };
    let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
    let clamp = |v: i64| {
        let v = i128::from(v);
        if v < 0 { (v + len).max(lower) } else { v.min(upper) }
    };
    let start = start.map(clamp).unwrap_or(if step > 0 { lower } else { upper });
    let stop = stop.map(clamp).unwrap_or(if step > 0 { upper } else { lower });
    let n = if step > 0 && start < stop {
        (stop - start - 1) / step + 1
    } else if step < 0 && stop < start {
        (start - stop - 1) / -step + 1
    } else {
        0
    };
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// number of elements a shape holds; the empty shape is a scalar
pub fn shape_size(shape: &[u64]) -> u64 {
    shape.iter().product()
}

/// Lazily generated uniform `[0, 1)` values standing in for rows that are never fetched.
#[derive(Debug, Clone)]
pub struct SyntheticValues {
    rng: StdRng,
    remaining: u64,
}

impl SyntheticValues {
    pub fn new(len: u64) -> Self {
        Self { rng: StdRng::from_entropy(), remaining: len }
    }

    pub fn with_seed(len: u64, seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), remaining: len }
    }
}

impl Iterator for SyntheticValues {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.rng.gen::<f64>())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

impl ExactSizeIterator for SyntheticValues {}

/// Per-element membership of a selection, evaluated lazily against synthetic values.
/// With no bounds every element is selected.
#[derive(Debug, Clone)]
pub struct SelectionMask {
    values: SyntheticValues,
    bounds: Option<(f64, f64)>,
}

impl SelectionMask {
    pub fn new(values: SyntheticValues, bounds: Option<(f64, f64)>) -> Self {
        Self { values, bounds }
    }
}

impl Iterator for SelectionMask {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let v = self.values.next()?;
        Some(match self.bounds {
            Some((lower, upper)) => lower <= v && v <= upper,
            None => true,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl ExactSizeIterator for SelectionMask {}
