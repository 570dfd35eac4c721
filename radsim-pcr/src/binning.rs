use std::collections::BTreeMap;
use std::ops::Range;

///
/// Logarithmic clone size classes. Class `k` holds the integer sizes `a`
/// with `ceil(b^k) <= a < ceil(b^(k+1))`; for a base close to 1 the first
/// classes are mostly empty.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogBins {
    base: f64,
}

impl LogBins {
    pub fn new(base: f64) -> Self {
        LogBins { base }
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    fn lower_bound(&self, class: usize) -> usize {
        // b^k may land a hair above an exact integer
        (self.base.powi(class as i32) - 1e-9).ceil() as usize
    }

    /// Class holding clone size `size` (`size >= 1`).
    pub fn class_of(&self, size: usize) -> usize {
        let size = size.max(1);
        let mut class = ((size as f64).ln() / self.base.ln()).floor().max(0.0) as usize;
        // float rounding near the class boundaries
        while class > 0 && size < self.lower_bound(class) {
            class -= 1;
        }
        while size >= self.lower_bound(class + 1) {
            class += 1;
        }
        class
    }

    /// Integer sizes in `class`, `None` for an empty class.
    pub fn sizes(&self, class: usize) -> Option<Range<usize>> {
        let range = self.lower_bound(class)..self.lower_bound(class + 1);
        if range.is_empty() { None } else { Some(range) }
    }

    ///
    /// Size standing in for every member of `class`: `round(b^(k + 0.5))`,
    /// clamped into the class.
    ///
    pub fn representative(&self, class: usize) -> Option<usize> {
        let range = self.sizes(class)?;
        let value = self.base.powf(class as f64 + 0.5).round() as usize;
        Some(value.clamp(range.start, range.end - 1))
    }

    ///
    /// Collapse a clone size histogram (size -> probability) into class
    /// probabilities. Size 0 carries no mass and is ignored.
    ///
    pub fn collapse(&self, histogram: &BTreeMap<u64, f64>) -> Vec<f64> {
        let Some(&max_size) = histogram.keys().next_back() else {
            return Vec::new();
        };
        let mut classes = vec![0.0; self.class_of(max_size.max(1) as usize) + 1];
        for (&size, &prob) in histogram {
            if size == 0 {
                continue;
            }
            classes[self.class_of(size as usize)] += prob;
        }
        classes
    }
}
