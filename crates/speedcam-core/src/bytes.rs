//! An integral byte count, with addition and integer scaling only.
//!
//! No floating-point arithmetic happens in the accumulation path: summing
//! capacities and bandwidth samples always stays in `u64`. Conversion to
//! `f64` happens only at the scoring boundary (`selector.rs`), once, at the edge.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub const ZERO: ByteSize = ByteSize(0);

    pub fn bytes(&self) -> u64 {
        self.0
    }

    /// Convert to `f64` for scoring. The one place this crate leaves the integer
    /// domain on purpose.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    pub fn from_gb(gb: u64) -> Self {
        ByteSize(gb * 1_000_000_000)
    }

    pub fn from_kb(kb: u64) -> Self {
        ByteSize(kb * 1_000)
    }

    /// Saturating subtraction — used by the finite-difference worker to clamp a
    /// counter reset to zero instead of underflowing.
    pub fn saturating_sub(self, other: ByteSize) -> ByteSize {
        ByteSize(self.0.saturating_sub(other.0))
    }
}

impl Add for ByteSize {
    type Output = ByteSize;
    fn add(self, rhs: ByteSize) -> ByteSize {
        ByteSize(self.0 + rhs.0)
    }
}

impl AddAssign for ByteSize {
    fn add_assign(&mut self, rhs: ByteSize) {
        self.0 += rhs.0;
    }
}

impl Mul<u64> for ByteSize {
    type Output = ByteSize;
    fn mul(self, rhs: u64) -> ByteSize {
        ByteSize(self.0 * rhs)
    }
}

impl Sum for ByteSize {
    fn sum<I: Iterator<Item = ByteSize>>(iter: I) -> Self {
        iter.fold(ByteSize::ZERO, Add::add)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_accumulates_exactly() {
        let a = ByteSize::from_gb(2);
        let b = ByteSize::from_gb(3);
        assert_eq!((a + b).bytes(), 5_000_000_000);
    }

    #[test]
    fn scaling_is_integer() {
        let a = ByteSize(7);
        assert_eq!((a * 3).bytes(), 21);
    }

    #[test]
    fn saturating_sub_clamps_at_zero() {
        let newer = ByteSize(50);
        let older = ByteSize(100);
        assert_eq!(newer.saturating_sub(older).bytes(), 0);
    }

    #[test]
    fn sum_over_iterator() {
        let total: ByteSize = vec![ByteSize(1), ByteSize(2), ByteSize(3)].into_iter().sum();
        assert_eq!(total.bytes(), 6);
    }
}
