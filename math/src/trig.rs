//! The fine sine and tangent tables.
//!
//! The original engine ships these as precomputed constants; here they are
//! generated once on first use from the same formula (sample at the centre of
//! each fine angle, truncate to 16.16).

use std::f64::consts::TAU;

use lazy_static::lazy_static;

use crate::FRACUNIT;

/// Size of the angle table (fineangles)
pub const FINEANGLES: usize = 8192;
pub const FINEMASK: usize = FINEANGLES - 1;

lazy_static! {
    /// Five quarters of a turn, so that cosine is a quarter turn offset in to
    /// the same table.
    static ref FINESINE: Vec<i32> = (0..FINEANGLES * 5 / 4)
        .map(|i| {
            let a = (i as f64 + 0.5) * TAU / FINEANGLES as f64;
            (a.sin() * FRACUNIT as f64) as i32
        })
        .collect();

    /// Half a turn, from -90 to +90 degrees
    static ref FINETANGENT: Vec<i32> = (0..FINEANGLES / 2)
        .map(|i| {
            let a = (i as f64 - (FINEANGLES / 4) as f64 + 0.5) * TAU / FINEANGLES as f64;
            (a.tan() * FRACUNIT as f64) as i32
        })
        .collect();
}

#[inline]
pub fn finesine(index: usize) -> i32 {
    FINESINE[index & FINEMASK]
}

#[inline]
pub fn finecosine(index: usize) -> i32 {
    FINESINE[(index & FINEMASK) + FINEANGLES / 4]
}

/// Indexes wrap at half a turn rather than reading past the table
#[inline]
pub fn finetangent(index: usize) -> i32 {
    FINETANGENT[index & (FINEANGLES / 2 - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sine_entries() {
        assert_eq!(finesine(0), 25);
        assert_eq!(finesine(2048), 65535);
        assert_eq!(finesine(4096), -25);
        assert_eq!(finecosine(0), finesine(2048));
    }

    #[test]
    fn tangent_increases_across_table() {
        for i in 1..FINEANGLES / 2 {
            assert!(finetangent(i) > finetangent(i - 1));
        }
        assert_eq!(finetangent(FINEANGLES / 2), finetangent(0));
    }
}
