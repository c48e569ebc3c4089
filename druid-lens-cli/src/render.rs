use druid_lens_core::{SyntheticValues, ValueRange};

const BAR_WIDTH: usize = 40;
const MAX_PRINTED_VALUES: usize = 20;

pub fn histogram_lines(range: ValueRange, counts: &[u64]) -> Vec<String> {
    if counts.is_empty() { return Vec::new(); }
    let max_c = counts.iter().copied().max().unwrap_or(0).max(1);
    let width = range.width() / counts.len() as f64;
    counts.iter().enumerate().map(|(i, &c)| {
        let start = range.lower + i as f64 * width;
        let blen = (c as f64 / max_c as f64 * BAR_WIDTH as f64) as usize;
        format!("{:8.2}-{:8.2} |{:<bw$}| {}", start, start + width, "█".repeat(blen), c, bw = BAR_WIDTH)
    }).collect()
}

pub fn print_histogram(range: ValueRange, counts: &[u64]) {
    for line in histogram_lines(range, counts) { println!("{line}"); }
}

/// prints at most MAX_PRINTED_VALUES, the dataset is virtually unbounded
pub fn print_values(values: SyntheticValues) {
    let total = values.len();
    for v in values.take(MAX_PRINTED_VALUES) { println!("{v:.6}"); }
    if total > MAX_PRINTED_VALUES { println!("... ({} more)", total - MAX_PRINTED_VALUES); }
}
