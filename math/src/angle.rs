use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::{FixedPoint, finecosine, finesine, finetangent};

pub const ANG45: u32 = 0x2000_0000;
pub const ANG90: u32 = 0x4000_0000;
pub const ANG180: u32 = 0x8000_0000;
pub const ANG270: u32 = 0xc000_0000;

/// Shift that turns a binary angle into an index of the fine tables
pub const ANGLETOFINESHIFT: u32 = 19;

/// A Binary Angle Measurement. The full `u32` range is one turn, so all
/// arithmetic wraps for free.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Angle(u32);

impl Angle {
    #[inline]
    pub const fn new(bam: u32) -> Self {
        Angle(bam)
    }

    #[inline]
    pub const fn bam(self) -> u32 {
        self.0
    }

    /// Index in to the fine tables
    #[inline]
    pub const fn fine(self) -> usize {
        (self.0 >> ANGLETOFINESHIFT) as usize
    }

    #[inline]
    pub fn sin(self) -> FixedPoint {
        FixedPoint::new(finesine(self.fine()))
    }

    #[inline]
    pub fn cos(self) -> FixedPoint {
        FixedPoint::new(finecosine(self.fine()))
    }

    /// Only meaningful for angles in `(-ANG90, ANG90)` after adding `ANG90`,
    /// which is how the wall and projection code indexes `finetangent`.
    #[inline]
    pub fn tan(self) -> FixedPoint {
        FixedPoint::new(finetangent(self.fine()))
    }
}

impl Add for Angle {
    type Output = Angle;

    #[inline]
    fn add(self, other: Angle) -> Angle {
        Angle(self.0.wrapping_add(other.0))
    }
}

impl AddAssign for Angle {
    #[inline]
    fn add_assign(&mut self, other: Angle) {
        self.0 = self.0.wrapping_add(other.0);
    }
}

impl Sub for Angle {
    type Output = Angle;

    #[inline]
    fn sub(self, other: Angle) -> Angle {
        Angle(self.0.wrapping_sub(other.0))
    }
}

impl SubAssign for Angle {
    #[inline]
    fn sub_assign(&mut self, other: Angle) {
        self.0 = self.0.wrapping_sub(other.0);
    }
}

impl Neg for Angle {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Angle(self.0.wrapping_neg())
    }
}
