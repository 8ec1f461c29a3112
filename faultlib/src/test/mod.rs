use crate::trace::UniformSource;

mod tests;

/// Replays a fixed list of variates, wrapping around at the end
pub struct FixedSequence {
    values: Vec<f64>,
    next: usize,
}

impl FixedSequence {
    pub fn new(values: &[f64]) -> Self {
        Self {
            values: values.to_vec(),
            next: 0,
        }
    }

    /// How many variates have been drawn
    pub fn drawn(&self) -> usize {
        self.next
    }
}

impl UniformSource for FixedSequence {
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}

/// The textbook trace used to show FIFO and LRU behaving differently
pub const REFERENCE_TRACE: [i64; 12] = [1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5];
