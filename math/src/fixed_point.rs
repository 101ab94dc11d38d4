use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

pub const FRACBITS: i32 = 16;
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// `FixedMul`: 16.16 multiply with a 64-bit intermediate.
#[inline]
pub const fn fixed_mul(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64) >> FRACBITS) as i32
}

/// `FixedDiv`: 16.16 divide. A quotient that would not fit in 32 bits
/// (including division by zero) saturates towards the sign of the result.
#[inline]
pub const fn fixed_div(a: i32, b: i32) -> i32 {
    if (a.unsigned_abs() >> 14) >= b.unsigned_abs() {
        if (a ^ b) < 0 { i32::MIN } else { i32::MAX }
    } else {
        (((a as i64) << FRACBITS) / b as i64) as i32
    }
}

/// A `fixed_t`. Addition and subtraction wrap exactly as 32-bit integer
/// arithmetic does, multiplication and division go through [`fixed_mul`]
/// and [`fixed_div`].
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(i32);

impl FixedPoint {
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Whole map units to fixed point
    pub const fn from_int(value: i32) -> Self {
        Self(value << FRACBITS)
    }

    pub const fn unit() -> Self {
        Self(FRACUNIT)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn min() -> Self {
        Self(i32::MIN)
    }

    pub const fn max() -> Self {
        Self(i32::MAX)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Integer part, rounded towards negative infinity
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }
}

impl fmt::Debug for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedPoint({} + {}/65536)", self.to_int(), self.0 & (FRACUNIT - 1))
    }
}

impl Add for FixedPoint {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for FixedPoint {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for FixedPoint {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for FixedPoint {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Mul for FixedPoint {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(fixed_mul(self.0, rhs.0))
    }
}

impl Div for FixedPoint {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self(fixed_div(self.0, rhs.0))
    }
}

impl Neg for FixedPoint {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl From<i16> for FixedPoint {
    fn from(value: i16) -> Self {
        Self((value as i32) << FRACBITS)
    }
}

impl From<FixedPoint> for i32 {
    fn from(value: FixedPoint) -> Self {
        value.to_int()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_saturates_instead_of_faulting() {
        assert_eq!(fixed_div(FRACUNIT, 0), i32::MAX);
        assert_eq!(fixed_div(-FRACUNIT, 0), i32::MIN);
        assert_eq!(fixed_div(i32::MIN, 1), i32::MIN);
        assert_eq!(fixed_div(3 * FRACUNIT, 2 * FRACUNIT), 3 * FRACUNIT / 2);
    }

    #[test]
    fn mul_truncates_towards_negative_infinity() {
        assert_eq!(fixed_mul(-1, FRACUNIT / 2), -1);
        assert_eq!(fixed_mul(1, FRACUNIT / 2), 0);
        assert_eq!(fixed_mul(10 * FRACUNIT, 10 * FRACUNIT), 100 * FRACUNIT);
    }

    #[test]
    fn add_wraps_like_c() {
        let a = FixedPoint::max();
        assert_eq!(a + FixedPoint::new(1), FixedPoint::min());
        assert_eq!(-FixedPoint::min(), FixedPoint::min());
    }

    #[test]
    fn int_conversions() {
        let f = FixedPoint::from(-3i16);
        assert_eq!(f.raw(), -3 * FRACUNIT);
        assert_eq!(i32::from(f), -3);
        assert_eq!(FixedPoint::new(-1).to_int(), -1);
        assert_eq!(FixedPoint::from_int(128).raw(), 128 << 16);
    }
}
