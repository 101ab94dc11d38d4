//! The seams between the wall renderer and whatever actually puts pixels on a
//! screen. The renderer works out *what* to draw and hands it over through
//! [`ColumnDrawer`] and [`PlaneSpans`].

use math::{FRACBITS, FixedPoint};

/// channels should match pixel format
pub const SOFT_PIXEL_CHANNELS: usize = 4;

pub const LIGHTLEVELS: usize = 16;
pub const LIGHTSEGSHIFT: i32 = 4;
pub const MAXLIGHTSCALE: usize = 48;
pub const LIGHTSCALESHIFT: i32 = 12;
pub const NUMCOLORMAPS: usize = 32;
const DISTMAP: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferSize {
    width_usize: usize,
    height_usize: usize,
    width: i32,
    height: i32,
}

impl BufferSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width_usize: width,
            height_usize: height,
            width: width as i32,
            height: height as i32,
        }
    }

    pub const fn width(&self) -> i32 {
        self.width
    }

    pub const fn height(&self) -> i32 {
        self.height
    }

    pub const fn half_width(&self) -> i32 {
        self.width / 2
    }

    pub const fn half_height(&self) -> i32 {
        self.height / 2
    }

    pub const fn width_usize(&self) -> usize {
        self.width_usize
    }

    pub const fn height_usize(&self) -> usize {
        self.height_usize
    }
}

pub trait PixelBuffer {
    fn size(&self) -> &BufferSize;
    fn clear(&mut self);
    fn set_pixel(&mut self, x: usize, y: usize, colour: &[u8; SOFT_PIXEL_CHANNELS]);
    fn read_pixel(&self, x: usize, y: usize) -> [u8; SOFT_PIXEL_CHANNELS];
}

/// Which colormap a column is shaded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightTable {
    /// A whole-view colormap such as invulnerability or light amplification
    Fixed(usize),
    /// `scalelight[level][scale]`, `level` in `0..LIGHTLEVELS` and `scale` in
    /// `0..MAXLIGHTSCALE`
    Scaled { level: usize, scale: usize },
}

impl LightTable {
    /// Index of the `COLORMAP` entry to use. Brighter levels and nearer walls
    /// pick lower maps.
    pub fn colourmap_index(&self) -> usize {
        match *self {
            LightTable::Fixed(map) => map,
            LightTable::Scaled { level, scale } => {
                let level = level.min(LIGHTLEVELS - 1);
                let startmap = ((LIGHTLEVELS - 1 - level) * 2 * NUMCOLORMAPS / LIGHTLEVELS) as i32;
                let map = startmap - (scale.min(MAXLIGHTSCALE - 1) / DISTMAP) as i32;
                map.clamp(0, NUMCOLORMAPS as i32 - 1) as usize
            }
        }
    }
}

/// Palette ranges of a texture that stay at full brightness regardless of
/// sector light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Brightmap {
    NotGray,
    NotGrayOrBrown,
    RedOnly,
    RedOnlyDoom1,
    RedOnlyDoom2,
    GreenOnly1,
    GreenOnly1Doom2,
    GreenOnly2,
    GreenOnly3,
    OrangeYellow,
}

impl Brightmap {
    /// The `BRTMAPn` lump carrying the 256 entry flag table for this kind
    pub const fn lump_name(&self) -> &'static str {
        match self {
            Brightmap::NotGray => "BRTMAP1",
            Brightmap::NotGrayOrBrown => "BRTMAP2",
            Brightmap::RedOnly | Brightmap::RedOnlyDoom1 | Brightmap::RedOnlyDoom2 => "BRTMAP3",
            Brightmap::GreenOnly1 | Brightmap::GreenOnly1Doom2 => "BRTMAP4",
            Brightmap::GreenOnly2 => "BRTMAP5",
            Brightmap::GreenOnly3 => "BRTMAP6",
            Brightmap::OrangeYellow => "BRTMAP7",
        }
    }
}

/// Everything needed to draw one vertical run of a wall or masked texture
#[derive(Debug, Clone)]
pub struct DrawColumn<'a> {
    /// Palette indexes, addressed by the integer part of the texture coordinate
    pub source: &'a [u8],
    pub x: i32,
    pub yl: i32,
    pub yh: i32,
    /// Texture row at the view centre line
    pub texture_mid: FixedPoint,
    /// Texture rows stepped per screen row
    pub iscale: FixedPoint,
    /// Height in pixels to wrap the texture coordinate at, 0 for no wrapping
    pub tex_height: i32,
    pub center_y: i32,
    pub light: LightTable,
    pub brightmap: Option<Brightmap>,
}

impl DrawColumn<'_> {
    /// Step down the column calling `f(y, texel)` for each screen row. Textures
    /// with a height that is not a power of two wrap at their real height.
    ///
    /// Doom function name `R_DrawColumn`
    pub fn for_each_texel(&self, mut f: impl FnMut(i32, u8)) {
        if self.yh < self.yl {
            return;
        }
        let step = self.iscale.raw();
        let mut frac = self
            .texture_mid
            .raw()
            .wrapping_add((self.yl - self.center_y).wrapping_mul(step));

        let height = self.tex_height;
        if height > 0 && height & (height - 1) != 0 {
            let heightmask = height << FRACBITS;
            if frac < 0 {
                frac = frac.rem_euclid(heightmask);
            } else {
                frac %= heightmask;
            }
            for y in self.yl..=self.yh {
                if let Some(&texel) = self.source.get((frac >> FRACBITS) as usize) {
                    f(y, texel);
                }
                frac = frac.wrapping_add(step);
                if frac >= heightmask {
                    frac -= heightmask;
                }
            }
        } else {
            let mask = if height > 0 { height - 1 } else { -1 };
            for y in self.yl..=self.yh {
                let index = (frac >> FRACBITS) & mask;
                if index >= 0 {
                    if let Some(&texel) = self.source.get(index as usize) {
                        f(y, texel);
                    }
                }
                frac = frac.wrapping_add(step);
            }
        }
    }
}

/// The column-draw primitive
pub trait ColumnDrawer {
    fn draw_column(&mut self, dc: &DrawColumn);
}

/// Accumulates the screen spans of floors and ceilings bounded by walls
pub trait PlaneSpans {
    /// Doom function name `R_CheckPlane`. Returns the plane to mark for
    /// columns `start..=stop`, which may be a new copy of `plane`.
    fn check_plane(&mut self, plane: usize, start: i32, stop: i32) -> usize;

    /// Record that `plane` is visible in column `x` from `top` to `bottom`
    fn mark(&mut self, plane: usize, x: i32, top: i32, bottom: i32);
}
