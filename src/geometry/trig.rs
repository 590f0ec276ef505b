//! Precomputed cos/sin lookup table

use std::f32::consts::PI;

/// Cosine and sine sampled at `len` equal steps over a full turn
#[derive(Debug, Clone, Default)]
pub struct TrigTable {
    cos: Vec<f32>,
    sin: Vec<f32>,
}

impl TrigTable {
    pub fn new(len: usize) -> Self {
        let (cos, sin) = (0..len)
            .map(|t| {
                let angle = 2.0 * PI * (t as f32 / len as f32);
                (angle.cos(), angle.sin())
            })
            .unzip();
        Self { cos, sin }
    }

    pub fn len(&self) -> usize {
        self.cos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cos.is_empty()
    }

    /// Cosine of step `index`; wraps around the table.
    /// `None` once the table has been cleared.
    pub fn cos(&self, index: usize) -> Option<f32> {
        self.cos.get(index.checked_rem(self.cos.len())?).copied()
    }

    /// Sine of step `index`; wraps around the table
    pub fn sin(&self, index: usize) -> Option<f32> {
        self.sin.get(index.checked_rem(self.sin.len())?).copied()
    }

    /// Table step nearest to `turns` full revolutions
    pub fn index_for(&self, turns: f64) -> usize {
        let len = self.len() as f64;
        ((turns.rem_euclid(1.0) * len).round() as usize) % self.len().max(1)
    }

    /// Release the table storage
    pub fn clear(&mut self) {
        self.cos = Vec::new();
        self.sin = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quarter_turns() {
        let t = TrigTable::new(8);
        assert_relative_eq!(t.cos(0).unwrap(), 1.0);
        assert_relative_eq!(t.sin(2).unwrap(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(t.cos(4).unwrap(), -1.0, epsilon = 1e-6);
        assert_relative_eq!(t.sin(10).unwrap(), t.sin(2).unwrap());
    }

    #[test]
    fn test_cleared_table_has_no_entries() {
        let mut t = TrigTable::new(16);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.cos(3), None);
        assert_eq!(t.sin(0), None);
        assert_eq!(t.index_for(0.5), 0);
    }

    #[test]
    fn test_index_for_wraps() {
        let t = TrigTable::new(100);
        assert_eq!(t.index_for(0.25), 25);
        assert_eq!(t.index_for(1.25), 25);
        assert_eq!(t.index_for(-0.25), 75);
        assert_eq!(t.index_for(0.999), 0);
    }
}
