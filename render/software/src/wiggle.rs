//! Dynamic wall rescaling, "WiggleHack II".
//!
//! Looking nearly parallel down a tall wall makes the wall scale explode and
//! the later fixed point maths overflow. The clamp on the scale and the
//! number of fractional bits used for the wall edges are picked per wall from
//! the height of its sector: taller sectors trade precision for range.

use std::collections::HashMap;

use math::{FRACBITS, FRACUNIT, FixedPoint};

/// `{max_rwscale, heightbits}` by scale index
const SCALE_VALUES: [(i32, i32); 8] = [
    (2048 * FRACUNIT, 12),
    (1024 * FRACUNIT, 12),
    (1024 * FRACUNIT, 11),
    (512 * FRACUNIT, 11),
    (512 * FRACUNIT, 10),
    (256 * FRACUNIT, 10),
    (256 * FRACUNIT, 9),
    (128 * FRACUNIT, 9),
];

/// The precision a wall is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WiggleParams {
    /// Largest scale a wall may be drawn at
    pub max_rwscale: FixedPoint,
    pub heightbits: i32,
    pub heightunit: i32,
    /// `FRACBITS - heightbits`
    pub invhgtbits: i32,
}

impl WiggleParams {
    fn from_index(index: usize) -> Self {
        let (clamp, heightbits) = SCALE_VALUES[index.min(SCALE_VALUES.len() - 1)];
        Self {
            max_rwscale: FixedPoint::new(clamp),
            heightbits,
            heightunit: 1 << heightbits,
            invhgtbits: FRACBITS - heightbits,
        }
    }
}

impl Default for WiggleParams {
    fn default() -> Self {
        Self::from_index(0)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SectorScale {
    cached_height: i32,
    scale_index: usize,
}

pub struct WiggleCorrector {
    params: WiggleParams,
    last_height: i32,
    /// Keyed by sector id, which need not be dense. Only touched when the
    /// height changes.
    sectors: HashMap<usize, SectorScale>,
}

impl Default for WiggleCorrector {
    fn default() -> Self {
        Self::new()
    }
}

impl WiggleCorrector {
    pub fn new() -> Self {
        Self {
            params: WiggleParams::default(),
            last_height: 0,
            sectors: HashMap::new(),
        }
    }

    pub fn params(&self) -> WiggleParams {
        self.params
    }

    /// Doom function name `R_FixWiggle`. Call once per wall with the wall's
    /// front sector. Returns `true` if the active parameters changed.
    pub fn fix(&mut self, sector: usize, floor: FixedPoint, ceiling: FixedPoint) -> bool {
        // heights below 1 force the cache to initialise
        let height = ((ceiling.raw().wrapping_sub(floor.raw())) >> FRACBITS).max(1);
        if height == self.last_height {
            return false;
        }
        self.last_height = height;

        let cache = self.sectors.entry(sector).or_default();
        if height != cache.cached_height {
            cache.cached_height = height;
            cache.scale_index = 0;
            let mut h = height >> 7;
            loop {
                h >>= 1;
                if h == 0 {
                    break;
                }
                cache.scale_index += 1;
            }
        }

        let params = WiggleParams::from_index(cache.scale_index);
        let changed = params != self.params;
        self.params = params;
        changed
    }

    /// Forget the per sector cache, on level change
    pub fn clear(&mut self) {
        self.params = WiggleParams::default();
        self.last_height = 0;
        self.sectors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(w: &mut WiggleCorrector, sector: usize, height: i32) -> bool {
        w.fix(sector, FixedPoint::zero(), FixedPoint::from_int(height))
    }

    #[test]
    fn height_sequence_changes_twice() {
        let mut w = WiggleCorrector::new();
        let changes = [10, 10, 4096, 4096, 10]
            .iter()
            .enumerate()
            .filter(|&(i, &h)| fix(&mut w, i, h))
            .count();
        assert_eq!(changes, 2);
        assert_eq!(w.params(), WiggleParams::default());
    }

    #[test]
    fn scale_index_from_height() {
        let mut w = WiggleCorrector::new();
        fix(&mut w, 0, 4096);
        let p = w.params();
        assert_eq!(p.max_rwscale, FixedPoint::from_int(256));
        assert_eq!(p.heightbits, 10);
        assert_eq!(p.heightunit, 1024);
        assert_eq!(p.invhgtbits, 6);

        fix(&mut w, 1, 512);
        assert_eq!(w.params().max_rwscale, FixedPoint::from_int(1024));
        assert_eq!(w.params().heightbits, 11);

        // Taller than the table, clamps to the last entry
        fix(&mut w, 2, 32767);
        assert_eq!(w.params().max_rwscale, FixedPoint::from_int(128));
    }

    #[test]
    fn inverted_sector_treated_as_one_unit() {
        let mut w = WiggleCorrector::new();
        assert!(fix(&mut w, 0, 4096));
        assert!(w.fix(0, FixedPoint::from_int(64), FixedPoint::zero()));
        assert_eq!(w.params(), WiggleParams::default());
    }

    #[test]
    fn sparse_sector_ids() {
        let mut w = WiggleCorrector::new();
        fix(&mut w, usize::MAX, 4096);
        assert_eq!(w.params().max_rwscale, FixedPoint::new(256 * FRACUNIT));
        fix(&mut w, 1 << 40, 10);
        assert_eq!(w.params(), WiggleParams::default());
        fix(&mut w, usize::MAX, 4096);
        assert_eq!(w.sectors.len(), 2);
        w.clear();
        assert!(w.sectors.is_empty());
    }
}
