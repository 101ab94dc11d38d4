//! The software wall renderer: composites wall textures from patches on
//! first use, then projects segs to screen columns in fixed point, marking
//! the floor and ceiling spans around them.

use self::{defs::DrawSeg, portals::PortalClip, utilities::ViewProjection, wiggle::WiggleCorrector};
use defs::MAXDRAWSEGS;

pub mod defs;
pub mod masked;
pub mod planes;
pub mod portals;
pub mod segs;
pub mod textures;
pub mod utilities;
pub mod wiggle;

pub use masked::{MASKED_DONE, MaskedColumn, draw_masked_column};
pub use planes::VisPlaneRender;
pub use segs::{LineDefFlags, SectorView, SideDefView, Vertex, ViewPoint, WallSeg};
pub use textures::TextureData;

/// We store most of what is needed for rendering in various functions here to avoid
/// having to pass too many things in args through multiple function calls. This
/// is due to the Doom C relying a fair bit on global state.
///
/// `RenderData` is shared by the wall renderer and the masked pass
/// ----------------------------------------------------------------------------
/// - R_StoreWallRange, r_segs.c, appends one entry to `drawsegs` per call and
///                               grows `openings` for masked columns and clips
/// - R_DrawMasked, r_things.c, walks `drawsegs` back to front
pub struct RenderData {
    pub projection: ViewProjection,
    pub portal_clip: PortalClip,
    // DrawSeg used, which is inserted in drawsegs at end of r_segs
    pub drawsegs: Vec<DrawSeg>,
    /// Saved sprite clips and masked texture columns, indexed by the draw
    /// segments
    pub openings: Vec<i32>,
    pub wiggle: WiggleCorrector,
    /// Planes of the subsector being drawn, set by the caller before each
    /// run of walls
    pub floorplane: Option<usize>,
    pub ceilingplane: Option<usize>,
    drawseg_limit_warned: bool,
}

impl RenderData {
    pub fn new(screen_width: usize, screen_height: usize) -> Self {
        Self {
            projection: ViewProjection::new(screen_width, screen_height),
            portal_clip: PortalClip::new(screen_width, screen_height),
            drawsegs: Vec::with_capacity(MAXDRAWSEGS),
            openings: Vec::new(),
            wiggle: WiggleCorrector::new(),
            floorplane: None,
            ceilingplane: None,
            drawseg_limit_warned: false,
        }
    }

    /// Doom function name `R_ClearDrawSegs` and `R_ClearClipSegs`, once per
    /// frame. The wiggle cache lives across frames.
    pub fn clear_data(&mut self) {
        self.portal_clip.clear();
        self.drawsegs.clear();
        self.openings.clear();
        self.floorplane = None;
        self.ceilingplane = None;
    }
}
