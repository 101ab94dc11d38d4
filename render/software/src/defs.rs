use std::fmt::Debug;

use math::FixedPoint;

use crate::segs::WallSeg;

pub const SIL_NONE: i32 = 0;
pub const SIL_BOTTOM: i32 = 1;
pub const SIL_TOP: i32 = 2;
pub const SIL_BOTH: i32 = 3;

/// The vanilla limit. The list grows past it but warns once.
pub const MAXDRAWSEGS: usize = 1024 * 2;

/// Where a draw segment's sprite clip values live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteClip {
    /// `screenheightarray`, every column clipped at the view height
    ScreenHeight,
    /// `negonearray`, every column clipped at -1
    NegOne,
    /// Saved clip values in `openings`, the first entry is column `x1`
    Openings(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct DrawSeg {
    pub curline: WallSeg,
    pub x1: i32,
    pub x2: i32,

    pub scale1: FixedPoint,
    pub scale2: FixedPoint,
    pub scalestep: FixedPoint,

    /// 0=none, 1=bottom, 2=top, 3=both
    pub silhouette: i32,

    /// do not clip sprites above this
    pub bsilheight: FixedPoint,

    /// do not clip sprites below this
    pub tsilheight: FixedPoint,

    pub sprtopclip: Option<SpriteClip>,
    pub sprbottomclip: Option<SpriteClip>,

    /// Index in to `openings` of the texture column for `x1`, set when the
    /// seg has a masked mid texture
    pub maskedtexturecol: Option<usize>,
}

impl DrawSeg {
    pub fn new(seg: WallSeg) -> Self {
        DrawSeg {
            curline: seg,
            x1: 0,
            x2: 0,
            scale1: FixedPoint::zero(),
            scale2: FixedPoint::zero(),
            scalestep: FixedPoint::zero(),
            silhouette: SIL_NONE,
            bsilheight: FixedPoint::zero(),
            tsilheight: FixedPoint::zero(),
            sprtopclip: None,
            sprbottomclip: None,
            maskedtexturecol: None,
        }
    }

    /// `openings` index of column `x` for an offset stored against `x1`
    #[inline]
    pub fn opening_index(&self, base: usize, x: i32) -> usize {
        base + (x - self.x1) as usize
    }
}

/// Now what is a visplane, anyway?
#[derive(Clone)]
pub struct Visplane {
    pub height: FixedPoint,
    pub picnum: usize,
    pub lightlevel: i32,
    pub minx: i32,
    pub maxx: i32,
    /// Top row marked in each column, `i32::MAX` where unmarked
    pub top: Vec<i32>,
    pub bottom: Vec<i32>,
}

impl Debug for Visplane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visplane")
            .field("height", &self.height)
            .field("picnum", &self.picnum)
            .field("lightlevel", &self.lightlevel)
            .field("minx", &self.minx)
            .field("maxx", &self.maxx)
            .finish_non_exhaustive()
    }
}

/// Column not marked yet
pub const PLANE_UNMARKED: i32 = i32::MAX;

impl Visplane {
    pub fn new(screen_width: usize) -> Self {
        Visplane {
            height: FixedPoint::zero(),
            picnum: 0,
            lightlevel: 0,
            minx: 0,
            maxx: 0,
            top: vec![PLANE_UNMARKED; screen_width],
            bottom: vec![0; screen_width],
        }
    }

    pub fn clear(&mut self) {
        self.height = FixedPoint::zero();
        self.picnum = 0;
        self.lightlevel = 0;
        self.minx = 0;
        self.maxx = 0;
        self.top.fill(PLANE_UNMARKED);
        self.bottom.fill(0);
    }

    /// Columns with a marked span
    pub fn marked(&self) -> impl Iterator<Item = (i32, i32, i32)> + '_ {
        self.top
            .iter()
            .zip(self.bottom.iter())
            .enumerate()
            .filter(|(_, (t, _))| **t != PLANE_UNMARKED)
            .map(|(x, (t, b))| (x as i32, *t, *b))
    }
}
