#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::{debug, warn};
use math::{ANG90, Angle, FRACBITS, FixedPoint, finetangent, fixed_mul};
use render_trait::{
    ColumnDrawer, DrawColumn, LIGHTLEVELS, LIGHTSCALESHIFT, LIGHTSEGSHIFT, LightTable,
    MAXLIGHTSCALE, PlaneSpans,
};

use crate::textures::TextureData;
use crate::utilities::{line_length, scale_from_global_angle};

use super::{
    RenderData,
    defs::{DrawSeg, MAXDRAWSEGS, SIL_BOTH, SIL_BOTTOM, SIL_TOP, SpriteClip},
};

/// The flags control some attributes of the line
pub enum LineDefFlags {
    Blocking = 1,
    BlockMonsters = 1 << 1,
    TwoSided = 1 << 2,
    /// The upper texture is pasted onto the wall from the top down instead
    /// of from the bottom up like usual.
    UnpegTop = 1 << 3,
    /// Lower and middle textures are drawn from the bottom up, instead of
    /// from the top down like usual
    UnpegBottom = 1 << 4,
    Secret = 1 << 5,
    BlockSound = 1 << 6,
    DontDraw = 1 << 7,
    Mapped = 1 << 8,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Vertex {
    pub x: FixedPoint,
    pub y: FixedPoint,
}

impl Vertex {
    pub const fn new(x: FixedPoint, y: FixedPoint) -> Self {
        Self { x, y }
    }
}

/// What the wall renderer needs of a sector
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectorView {
    /// Unique per sector, keys the wiggle cache
    pub id: usize,
    pub floorheight: FixedPoint,
    pub ceilingheight: FixedPoint,
    pub floorpic: usize,
    pub ceilingpic: usize,
    pub lightlevel: i32,
}

/// The textures of one side of a line. Texture 0 is no texture.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SideDefView {
    pub textureoffset: FixedPoint,
    pub rowoffset: FixedPoint,
    pub toptexture: usize,
    pub bottomtexture: usize,
    pub midtexture: usize,
}

/// A visible seg, `curline` in Doom
#[derive(Debug, Clone, Copy)]
pub struct WallSeg {
    pub v1: Vertex,
    pub v2: Vertex,
    /// As stored in the `SEGS` lump
    pub angle: Angle,
    /// Distance along the linedef to the start of this seg
    pub offset: FixedPoint,
    pub length: FixedPoint,
    pub sidedef: SideDefView,
    pub line_flags: u32,
    pub frontsector: SectorView,
    pub backsector: Option<SectorView>,
}

impl WallSeg {
    pub fn new(
        v1: Vertex,
        v2: Vertex,
        angle: Angle,
        sidedef: SideDefView,
        line_flags: u32,
        frontsector: SectorView,
        backsector: Option<SectorView>,
    ) -> Self {
        Self {
            v1,
            v2,
            angle,
            offset: FixedPoint::zero(),
            length: line_length(v2.x, v2.y, v1.x, v1.y),
            sidedef,
            line_flags,
            frontsector,
            backsector,
        }
    }

    #[inline]
    pub fn has_flag(&self, flag: LineDefFlags) -> bool {
        self.line_flags & flag as u32 != 0
    }

    /// Sector light shifted to a light level, with the fake contrast of axis
    /// aligned walls
    pub fn light_level(&self, extralight: i32) -> usize {
        let mut lightnum = (self.frontsector.lightlevel >> LIGHTSEGSHIFT) + extralight;
        if self.v1.y == self.v2.y {
            lightnum -= 1;
        } else if self.v1.x == self.v2.x {
            lightnum += 1;
        }
        lightnum.clamp(0, LIGHTLEVELS as i32 - 1) as usize
    }
}

/// Where the view is for this frame
#[derive(Debug, Default, Clone, Copy)]
pub struct ViewPoint {
    pub x: FixedPoint,
    pub y: FixedPoint,
    pub z: FixedPoint,
    pub angle: Angle,
    pub extralight: i32,
    /// Invulnerability or light amplification
    pub fixed_colormap: Option<usize>,
    /// Flat number of `F_SKY1`
    pub sky_flat: usize,
}

/// The colormap for a wall column at `scale`
#[inline]
pub(crate) fn wall_light(view: &ViewPoint, level: usize, scale: FixedPoint) -> LightTable {
    match view.fixed_colormap {
        Some(map) => LightTable::Fixed(map),
        None => {
            let index = (scale.raw() as u32 >> LIGHTSCALESHIFT) as usize;
            LightTable::Scaled {
                level,
                scale: index.min(MAXLIGHTSCALE - 1),
            }
        }
    }
}

/// `0xffffffff / scale`, texture rows per screen row
#[inline]
pub(crate) fn inverse_scale(scale: FixedPoint) -> FixedPoint {
    FixedPoint::new(
        u32::MAX
            .checked_div(scale.raw() as u32)
            .unwrap_or(u32::MAX) as i32,
    )
}

// Column indexes are checked against the clip arrays on entry to
// `store_wall_range`
#[inline(always)]
fn clip_at(clip: &[i32], x: usize) -> i32 {
    #[cfg(not(feature = "safety_check"))]
    unsafe {
        *clip.get_unchecked(x)
    }
    #[cfg(feature = "safety_check")]
    clip[x]
}

#[inline(always)]
fn set_clip(clip: &mut [i32], x: usize, value: i32) {
    #[cfg(not(feature = "safety_check"))]
    unsafe {
        *clip.get_unchecked_mut(x) = value;
    }
    #[cfg(feature = "safety_check")]
    {
        clip[x] = value;
    }
}

/// One wall tier: the texture and the texture row at the view centre line
#[derive(Debug, Clone, Copy)]
struct Tier {
    texture: usize,
    texturemid: FixedPoint,
    /// Whole pixel height to wrap at
    height: i32,
}

/// All of the state here is unique to one seg as it is rendered.
pub(crate) struct WallRenderContext {
    /// True if any of the segs textures might be visible.
    segtextured: bool,
    /// False if the back side is the same plane.
    markfloor: bool,
    markceiling: bool,
    /// `openings` index of the texture column for `start_x` if the mid
    /// texture is masked
    maskedtexturecol: Option<usize>,

    toptexture: Option<Tier>,
    midtexture: Option<Tier>,
    bottomtexture: Option<Tier>,

    start_x: i32,
    rw_x: i32,
    rw_stopx: i32,
    rw_centerangle: Angle,
    rw_offset: FixedPoint,
    rw_distance: FixedPoint,
    rw_scale: FixedPoint,
    rw_scalestep: FixedPoint,

    pixhigh: i64,
    pixlow: i64,
    pixhighstep: i32,
    pixlowstep: i32,

    topfrac: i64,
    topstep: i32,
    bottomfrac: i64,
    bottomstep: i32,

    heightbits: i32,
    heightunit: i64,

    /// Light level for the wall
    wall_lights: usize,
}

impl WallRenderContext {
    fn new(start: i32, stop: i32) -> Self {
        Self {
            segtextured: false,
            markfloor: false,
            markceiling: false,
            maskedtexturecol: None,
            toptexture: None,
            midtexture: None,
            bottomtexture: None,
            start_x: start,
            rw_x: start,
            rw_stopx: stop + 1,
            rw_centerangle: Angle::default(),
            rw_offset: FixedPoint::zero(),
            rw_distance: FixedPoint::zero(),
            rw_scale: FixedPoint::zero(),
            rw_scalestep: FixedPoint::zero(),
            pixhigh: 0,
            pixlow: 0,
            pixhighstep: 0,
            pixlowstep: 0,
            topfrac: 0,
            topstep: 0,
            bottomfrac: 0,
            bottomstep: 0,
            heightbits: 12,
            heightunit: 1 << 12,
            wall_lights: 0,
        }
    }

    /// Doom function name `R_RenderSegLoop`
    fn render_seg_loop(
        &mut self,
        view: &ViewPoint,
        rdata: &mut RenderData,
        textures: &mut TextureData,
        planes: &mut impl PlaneSpans,
        drawer: &mut impl ColumnDrawer,
    ) {
        #[cfg(feature = "hprof")]
        profile!("render_seg_loop");
        let view_height = rdata.projection.view_height;
        let center_y = rdata.projection.centery;
        let ceilingplane = rdata.ceilingplane;
        let floorplane = rdata.floorplane;

        let mut texturecolumn = 0;
        let mut light = LightTable::Fixed(0);
        let mut iscale = FixedPoint::zero();

        while self.rw_x < self.rw_stopx {
            let x = self.rw_x;
            let clip_x = x as usize;
            let ceilingclip = clip_at(&rdata.portal_clip.ceilingclip, clip_x);
            let floorclip = clip_at(&rdata.portal_clip.floorclip, clip_x);

            // mark floor / ceiling areas
            let mut yl = ((self.topfrac + self.heightunit - 1) >> self.heightbits) as i32;
            // no space above wall?
            if yl < ceilingclip + 1 {
                yl = ceilingclip + 1;
            }

            if self.markceiling {
                let top = ceilingclip + 1;
                let mut bottom = yl - 1;
                if bottom >= floorclip {
                    bottom = floorclip - 1;
                }
                if let Some(plane) = ceilingplane.filter(|_| top <= bottom) {
                    planes.mark(plane, x, top, bottom);
                }
            }

            let mut yh = (self.bottomfrac >> self.heightbits) as i32;
            if yh >= floorclip {
                yh = floorclip - 1;
            }

            if self.markfloor {
                let mut top = yh + 1;
                let bottom = floorclip - 1;
                if top <= ceilingclip {
                    top = ceilingclip + 1;
                }
                if let Some(plane) = floorplane.filter(|_| top <= bottom) {
                    planes.mark(plane, x, top, bottom);
                }
            }

            if self.segtextured {
                let angle = self.rw_centerangle + rdata.projection.x_to_view_angle(x);
                texturecolumn = self.rw_offset.raw().wrapping_sub(fixed_mul(
                    finetangent(angle.fine()),
                    self.rw_distance.raw(),
                )) >> FRACBITS;
                light = wall_light(view, self.wall_lights, self.rw_scale);
                iscale = inverse_scale(self.rw_scale);
            }

            let mut draw = |tier: Tier, yl: i32, yh: i32, textures: &mut TextureData| {
                let brightmap = textures.catalog().brightmap(tier.texture);
                let column = textures.get_column(tier.texture, texturecolumn, true);
                drawer.draw_column(&DrawColumn {
                    source: column.pixels(),
                    x,
                    yl,
                    yh,
                    texture_mid: tier.texturemid,
                    iscale,
                    tex_height: tier.height,
                    center_y,
                    light,
                    brightmap,
                });
            };

            if let Some(mid) = self.midtexture {
                // single sided line
                if yl <= yh {
                    draw(mid, yl, yh, textures);
                }
                set_clip(&mut rdata.portal_clip.ceilingclip, clip_x, view_height);
                set_clip(&mut rdata.portal_clip.floorclip, clip_x, -1);
            } else {
                // two sided line
                if let Some(top) = self.toptexture {
                    let mut mid = (self.pixhigh >> self.heightbits) as i32;
                    self.pixhigh += self.pixhighstep as i64;
                    if mid >= floorclip {
                        mid = floorclip - 1;
                    }
                    if mid >= yl {
                        draw(top, yl, mid, textures);
                        set_clip(&mut rdata.portal_clip.ceilingclip, clip_x, mid);
                    } else {
                        set_clip(&mut rdata.portal_clip.ceilingclip, clip_x, yl - 1);
                    }
                } else if self.markceiling {
                    // no top wall
                    set_clip(&mut rdata.portal_clip.ceilingclip, clip_x, yl - 1);
                }

                if let Some(bottom) = self.bottomtexture {
                    let mut mid = ((self.pixlow + self.heightunit - 1) >> self.heightbits) as i32;
                    self.pixlow += self.pixlowstep as i64;
                    // no space above wall?
                    let ceilingclip = clip_at(&rdata.portal_clip.ceilingclip, clip_x);
                    if mid <= ceilingclip {
                        mid = ceilingclip + 1;
                    }
                    if mid <= yh {
                        draw(bottom, mid, yh, textures);
                        set_clip(&mut rdata.portal_clip.floorclip, clip_x, mid);
                    } else {
                        set_clip(&mut rdata.portal_clip.floorclip, clip_x, yh + 1);
                    }
                } else if self.markfloor {
                    // no bottom wall
                    set_clip(&mut rdata.portal_clip.floorclip, clip_x, yh + 1);
                }

                if let Some(base) = self.maskedtexturecol {
                    // save texturecol for backdrawing of masked mid texture
                    if let Some(col) = rdata.openings.get_mut(base + (x - self.start_x) as usize) {
                        *col = texturecolumn;
                    }
                }
            }

            self.rw_x += 1;
            self.rw_scale += self.rw_scalestep;
            self.topfrac += self.topstep as i64;
            self.bottomfrac += self.bottomstep as i64;
        }
    }
}

/// Screen row of a view space `height` at `scale`, in wall precision
#[inline]
fn project_height(
    centeryfrac: FixedPoint,
    invhgtbits: i32,
    height: i32,
    scale: FixedPoint,
) -> i64 {
    ((centeryfrac.raw() as i64) >> invhgtbits) - ((height as i64 * scale.raw() as i64) >> FRACBITS)
}

/// Per column change of a projected edge. Wraps like the 32 bit original.
#[inline]
fn height_step(scalestep: FixedPoint, height: i32) -> i32 {
    fixed_mul(scalestep.raw(), height).wrapping_neg()
}

impl RenderData {
    /// Doom function name `R_StoreWallRange`
    ///
    /// Draw the seg over screen columns `start..=stop`, marking the floor and
    /// ceiling planes either side of it, and record a draw segment for
    /// sprites and the masked pass.
    #[allow(clippy::too_many_arguments)]
    pub fn store_wall_range(
        &mut self,
        start: i32,
        stop: i32,
        seg: &WallSeg,
        view: &ViewPoint,
        textures: &mut TextureData,
        planes: &mut impl PlaneSpans,
        drawer: &mut impl ColumnDrawer,
    ) {
        #[cfg(feature = "hprof")]
        profile!("store_wall_range");
        let width = self
            .projection
            .view_width
            .min(self.portal_clip.floorclip.len() as i32)
            .min(self.portal_clip.ceilingclip.len() as i32);
        if start < 0 || stop >= width || start > stop {
            debug!("Bad R_RenderWallRange: {start} to {stop}");
            return;
        }
        if seg.length.raw() <= 0 {
            return;
        }

        if self.drawsegs.len() == MAXDRAWSEGS && !self.drawseg_limit_warned {
            warn!("R_StoreWallRange: Hit MAXDRAWSEGS ({MAXDRAWSEGS}) Vanilla limit.");
            self.drawseg_limit_warned = true;
        }

        let mut ctx = WallRenderContext::new(start, stop);
        let mut ds_p = DrawSeg::new(*seg);
        let catalog = textures.catalog();
        let texture_count = catalog.len();
        let sidedef = seg.sidedef;
        let frontsector = seg.frontsector;
        let viewz = view.z;

        // calculate rw_distance for scale calculation
        let rw_normalangle = seg.angle + Angle::new(ANG90);

        // Straight from the vertices in 64 bit so far walls don't wobble
        let dx = (seg.v2.x - seg.v1.x).raw() as i64;
        let dy = (seg.v2.y - seg.v1.y).raw() as i64;
        let dx1 = (view.x - seg.v1.x).raw() as i64;
        let dy1 = (view.y - seg.v1.y).raw() as i64;
        let len = seg.length.raw() as i64;
        ctx.rw_distance =
            FixedPoint::new((dy.wrapping_mul(dx1).wrapping_sub(dx.wrapping_mul(dy1)) / len) as i32);

        ds_p.x1 = start;
        ds_p.x2 = stop;

        self.wiggle.fix(
            frontsector.id,
            frontsector.floorheight,
            frontsector.ceilingheight,
        );
        let wiggle = self.wiggle.params();
        ctx.heightbits = wiggle.heightbits;
        ctx.heightunit = wiggle.heightunit as i64;

        // calculate scale at both ends and step
        let projection = &self.projection;
        let rw_distance = ctx.rw_distance;
        let scale_at = |x: i32| {
            scale_from_global_angle(
                view.angle + projection.x_to_view_angle(x),
                view.angle,
                rw_normalangle,
                rw_distance,
                projection.projection,
                wiggle.max_rwscale,
            )
        };
        ctx.rw_scale = scale_at(start);
        ds_p.scale1 = ctx.rw_scale;
        if stop > start {
            ds_p.scale2 = scale_at(stop);
            ctx.rw_scalestep = FixedPoint::new((ds_p.scale2 - ctx.rw_scale).raw() / (stop - start));
            ds_p.scalestep = ctx.rw_scalestep;
        } else {
            ds_p.scale2 = ds_p.scale1;
        }

        // calculate texture boundaries and decide if floor / ceiling marks
        // are needed
        let mut worldtop = (frontsector.ceilingheight - viewz).raw();
        let mut worldbottom = (frontsector.floorheight - viewz).raw();
        let mut worldhigh = 0;
        let mut worldlow = 0;

        let texture = |tex: usize| {
            let tex = catalog.translation(tex);
            (tex != 0 && tex < texture_count).then_some(tex)
        };
        let tier = |tex: usize, texturemid: i32| Tier {
            texture: tex,
            texturemid: FixedPoint::new(texturemid) + sidedef.rowoffset,
            height: catalog.height(tex).to_int(),
        };

        let mut maskedtexture = false;
        match seg.backsector {
            None => {
                // single sided line
                ctx.midtexture = texture(sidedef.midtexture).map(|tex| {
                    let texturemid = if seg.has_flag(LineDefFlags::UnpegBottom) {
                        // bottom of texture at bottom
                        let vtop = frontsector.floorheight + catalog.height(sidedef.midtexture);
                        (vtop - viewz).raw()
                    } else {
                        // top of texture at top
                        worldtop
                    };
                    tier(tex, texturemid)
                });
                // a single sided line is terminal, so it must mark ends
                ctx.markfloor = true;
                ctx.markceiling = true;

                ds_p.silhouette = SIL_BOTH;
                ds_p.sprtopclip = Some(SpriteClip::ScreenHeight);
                ds_p.sprbottomclip = Some(SpriteClip::NegOne);
                ds_p.bsilheight = FixedPoint::max();
                ds_p.tsilheight = FixedPoint::min();
            }
            Some(backsector) => {
                // two sided line
                if frontsector.floorheight > backsector.floorheight {
                    ds_p.silhouette = SIL_BOTTOM;
                    ds_p.bsilheight = frontsector.floorheight;
                } else if backsector.floorheight > viewz {
                    ds_p.silhouette = SIL_BOTTOM;
                    ds_p.bsilheight = FixedPoint::max();
                }

                if frontsector.ceilingheight < backsector.ceilingheight {
                    ds_p.silhouette |= SIL_TOP;
                    ds_p.tsilheight = frontsector.ceilingheight;
                } else if backsector.ceilingheight < viewz {
                    ds_p.silhouette |= SIL_TOP;
                    ds_p.tsilheight = FixedPoint::min();
                }

                if backsector.ceilingheight <= frontsector.floorheight {
                    ds_p.sprbottomclip = Some(SpriteClip::NegOne);
                    ds_p.bsilheight = FixedPoint::max();
                    ds_p.silhouette |= SIL_BOTTOM;
                }

                if backsector.floorheight >= frontsector.ceilingheight {
                    ds_p.sprtopclip = Some(SpriteClip::ScreenHeight);
                    ds_p.tsilheight = FixedPoint::min();
                    ds_p.silhouette |= SIL_TOP;
                }

                worldhigh = (backsector.ceilingheight - viewz).raw();
                worldlow = (backsector.floorheight - viewz).raw();

                // hack to allow height changes in outdoor areas
                if frontsector.ceilingpic == view.sky_flat && backsector.ceilingpic == view.sky_flat
                {
                    worldtop = worldhigh;
                }

                ctx.markfloor = worldlow != worldbottom
                    || backsector.floorpic != frontsector.floorpic
                    || backsector.lightlevel != frontsector.lightlevel;

                ctx.markceiling = worldhigh != worldtop
                    || backsector.ceilingpic != frontsector.ceilingpic
                    || backsector.lightlevel != frontsector.lightlevel;

                if backsector.ceilingheight <= frontsector.floorheight
                    || backsector.floorheight >= frontsector.ceilingheight
                {
                    // closed door
                    ctx.markceiling = true;
                    ctx.markfloor = true;
                }

                if worldhigh < worldtop {
                    // top texture
                    ctx.toptexture = texture(sidedef.toptexture).map(|tex| {
                        let texturemid = if seg.has_flag(LineDefFlags::UnpegTop) {
                            // top of texture at top
                            worldtop
                        } else {
                            // bottom of texture
                            let vtop =
                                backsector.ceilingheight + catalog.height(sidedef.toptexture);
                            (vtop - viewz).raw()
                        };
                        tier(tex, texturemid)
                    });
                }

                if worldlow > worldbottom {
                    // bottom texture
                    ctx.bottomtexture = texture(sidedef.bottomtexture).map(|tex| {
                        let texturemid = if seg.has_flag(LineDefFlags::UnpegBottom) {
                            // bottom of texture at bottom, top of texture at top
                            worldtop
                        } else {
                            // top of texture at top
                            worldlow
                        };
                        tier(tex, texturemid)
                    });
                }

                // allocate space for masked texture tables
                if sidedef.midtexture != 0 {
                    maskedtexture = true;
                    let base = self.openings.len();
                    self.openings
                        .resize(base + (ctx.rw_stopx - ctx.rw_x) as usize, i32::MAX);
                    ctx.maskedtexturecol = Some(base);
                    ds_p.maskedtexturecol = Some(base);
                }
            }
        }

        // calculate rw_offset (only needed for textured lines)
        ctx.segtextured = ctx.midtexture.is_some()
            || ctx.toptexture.is_some()
            || ctx.bottomtexture.is_some()
            || maskedtexture;

        if ctx.segtextured {
            let offset = dx.wrapping_mul(dx1).wrapping_add(dy.wrapping_mul(dy1)) / len;
            ctx.rw_offset = FixedPoint::new(offset as i32) + sidedef.textureoffset + seg.offset;
            ctx.rw_centerangle = Angle::new(ANG90) + view.angle - rw_normalangle;
            ctx.wall_lights = seg.light_level(view.extralight);
        }

        // if a floor / ceiling plane is on the wrong side of the view plane,
        // it is definitely invisible and doesn't need to be marked.
        if frontsector.floorheight >= viewz {
            // above view plane
            ctx.markfloor = false;
        }
        if frontsector.ceilingheight <= viewz && frontsector.ceilingpic != view.sky_flat {
            // below view plane
            ctx.markceiling = false;
        }

        // calculate incremental stepping values for texture edges
        let invhgtbits = wiggle.invhgtbits;
        worldtop >>= invhgtbits;
        worldbottom >>= invhgtbits;
        let centeryfrac = self.projection.centeryfrac;

        ctx.topstep = height_step(ctx.rw_scalestep, worldtop);
        ctx.topfrac = project_height(centeryfrac, invhgtbits, worldtop, ctx.rw_scale);
        ctx.bottomstep = height_step(ctx.rw_scalestep, worldbottom);
        ctx.bottomfrac = project_height(centeryfrac, invhgtbits, worldbottom, ctx.rw_scale);

        if seg.backsector.is_some() {
            worldhigh >>= invhgtbits;
            worldlow >>= invhgtbits;

            if worldhigh < worldtop {
                ctx.pixhigh = project_height(centeryfrac, invhgtbits, worldhigh, ctx.rw_scale);
                ctx.pixhighstep = height_step(ctx.rw_scalestep, worldhigh);
            }
            if worldlow > worldbottom {
                ctx.pixlow = project_height(centeryfrac, invhgtbits, worldlow, ctx.rw_scale);
                ctx.pixlowstep = height_step(ctx.rw_scalestep, worldlow);
            }
        }

        // render it
        if ctx.markceiling {
            if let Some(plane) = self.ceilingplane {
                self.ceilingplane = Some(planes.check_plane(plane, ctx.rw_x, ctx.rw_stopx - 1));
            }
        }
        if ctx.markfloor {
            if let Some(plane) = self.floorplane {
                self.floorplane = Some(planes.check_plane(plane, ctx.rw_x, ctx.rw_stopx - 1));
            }
        }

        ctx.render_seg_loop(view, self, textures, planes, drawer);

        // save sprite clipping info
        let columns = start as usize..=stop as usize;
        if (ds_p.silhouette & SIL_TOP != 0 || maskedtexture) && ds_p.sprtopclip.is_none() {
            let base = self.openings.len();
            self.openings
                .extend_from_slice(&self.portal_clip.ceilingclip[columns.clone()]);
            ds_p.sprtopclip = Some(SpriteClip::Openings(base));
        }
        if (ds_p.silhouette & SIL_BOTTOM != 0 || maskedtexture) && ds_p.sprbottomclip.is_none() {
            let base = self.openings.len();
            self.openings
                .extend_from_slice(&self.portal_clip.floorclip[columns]);
            ds_p.sprbottomclip = Some(SpriteClip::Openings(base));
        }

        if maskedtexture && ds_p.silhouette & SIL_TOP == 0 {
            ds_p.silhouette |= SIL_TOP;
            ds_p.tsilheight = FixedPoint::min();
        }
        if maskedtexture && ds_p.silhouette & SIL_BOTTOM == 0 {
            ds_p.silhouette |= SIL_BOTTOM;
            ds_p.bsilheight = FixedPoint::max();
        }

        self.drawsegs.push(ds_p);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::defs::{SIL_NONE, Visplane};
    use crate::planes::VisPlaneRender;
    use crate::textures::catalog::tests::{catalog, def, solid_patch};
    use crate::textures::ColumnLookup;
    use math::ANG270;
    use wad::lumps::WadPatch;

    pub(crate) const SKY: usize = 99;

    #[derive(Debug, Clone)]
    pub(crate) struct Drawn {
        pub x: i32,
        pub yl: i32,
        pub yh: i32,
        pub texture_mid: FixedPoint,
        pub iscale: FixedPoint,
        pub tex_height: i32,
        pub source: Vec<u8>,
        pub light: LightTable,
    }

    /// Keeps every column instead of drawing it
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub columns: Vec<Drawn>,
    }

    impl ColumnDrawer for Recorder {
        fn draw_column(&mut self, dc: &DrawColumn) {
            self.columns.push(Drawn {
                x: dc.x,
                yl: dc.yl,
                yh: dc.yh,
                texture_mid: dc.texture_mid,
                iscale: dc.iscale,
                tex_height: dc.tex_height,
                source: dc.source.to_vec(),
                light: dc.light,
            });
        }
    }

    /// Rows 0..32 and 96..128 with a gap between
    fn grate_patch() -> WadPatch {
        let columns = vec![vec![(0u8, vec![7u8; 32]), (96u8, vec![8u8; 32])]; 64];
        WadPatch::from_columns("MIDGRAT1", 128, &columns)
    }

    /// `1` is a 64x128 wall of two 32 wide patches, `2` a single patch 64x128
    /// wall and `3` a masked grate
    pub(crate) fn wall_textures() -> TextureData {
        TextureData::new(catalog(
            vec![
                def("AASHITTY", 8, 8, &[]),
                def("STARTAN3", 64, 128, &[(0, 0, 0), (32, 0, 1)]),
                def("DOOR3", 64, 128, &[(0, 0, 2)]),
                def("MIDGRATE", 64, 128, &[(0, 0, 3)]),
                def("BIGDOOR1", 64, 128, &[(0, 0, 4), (16, 0, 5)]),
            ],
            vec![
                Some(solid_patch("SW11_1", 32, 128, 1)),
                Some(solid_patch("SW11_2", 32, 128, 2)),
                Some(solid_patch("DOOR3_6", 64, 128, 3)),
                Some(grate_patch()),
                Some(solid_patch("DOOR1_1", 48, 128, 4)),
                Some(solid_patch("DOOR1_2", 48, 128, 5)),
            ],
        ))
    }

    pub(crate) fn sector(id: usize, floor: i32, ceiling: i32) -> SectorView {
        SectorView {
            id,
            floorheight: FixedPoint::from_int(floor),
            ceilingheight: FixedPoint::from_int(ceiling),
            floorpic: 1,
            ceilingpic: 2,
            lightlevel: 160,
        }
    }

    pub(crate) fn view() -> ViewPoint {
        ViewPoint {
            z: FixedPoint::from_int(41),
            sky_flat: SKY,
            ..Default::default()
        }
    }

    /// A 64 wide wall square across the view, 128 units ahead
    pub(crate) fn wall(
        sidedef: SideDefView,
        flags: u32,
        front: SectorView,
        back: Option<SectorView>,
    ) -> WallSeg {
        WallSeg::new(
            Vertex::new(FixedPoint::from_int(128), FixedPoint::from_int(32)),
            Vertex::new(FixedPoint::from_int(128), FixedPoint::from_int(-32)),
            Angle::new(ANG270),
            sidedef,
            flags,
            front,
            back,
        )
    }

    pub(crate) fn frame(front: SectorView) -> (RenderData, VisPlaneRender) {
        let mut rdata = RenderData::new(320, 200);
        let mut planes = VisPlaneRender::new(320);
        rdata.floorplane =
            Some(planes.find_plane(front.floorheight, front.floorpic, front.lightlevel, false));
        rdata.ceilingplane = Some(planes.find_plane(
            front.ceilingheight,
            front.ceilingpic,
            front.lightlevel,
            false,
        ));
        (rdata, planes)
    }

    fn plane_rows(plane: &Visplane, x: i32) -> Option<(i32, i32)> {
        plane
            .marked()
            .find(|&(px, _, _)| px == x)
            .map(|(_, t, b)| (t, b))
    }

    // Inside the wall's screen extent with a little margin
    pub(crate) const START: i32 = 124;
    pub(crate) const STOP: i32 = 195;

    #[test]
    fn overlapping_patches_build_once_and_draw_full_columns() {
        let front = sector(0, 0, 128);
        let (mut rdata, mut planes) = frame(front);
        let mut textures = wall_textures();
        let mut drawer = Recorder::default();
        let side = SideDefView {
            midtexture: 4,
            ..Default::default()
        };

        let columns = &textures.cache().lookup(4).columns;
        assert!(matches!(columns[0], ColumnLookup::Direct { patch: 4, .. }));
        assert!(columns[16..48]
            .iter()
            .all(|c| matches!(c, ColumnLookup::Composite { .. })));
        assert!(matches!(columns[63], ColumnLookup::Direct { patch: 5, .. }));

        rdata.store_wall_range(
            START,
            STOP,
            &wall(side, 0, front, None),
            &view(),
            &mut textures,
            &mut planes,
            &mut drawer,
        );

        assert_eq!(textures.build_count(4), 1);
        assert_eq!(textures.total_builds(), 1);
        assert_eq!(drawer.columns.len(), (STOP - START + 1) as usize);
        for (dc, x) in drawer.columns.iter().zip(START..=STOP) {
            assert_eq!(dc.x, x);
            assert_eq!(dc.yl, 0);
            assert!((150..=152).contains(&dc.yh), "yh {}", dc.yh);
            assert_eq!(dc.source.len(), 128);
            // One patch or the other, never a mix within a column
            let first = dc.source[0];
            assert!(first == 4 || first == 5);
            assert!(dc.source.iter().all(|&p| p == first));
        }
        assert_eq!(drawer.columns[0].source[0], 4);
        assert_eq!(drawer.columns.last().unwrap().source[0], 5);
    }

    #[test]
    fn solid_wall_draws_mid_only_and_closes_columns() {
        let front = sector(0, 0, 128);
        let (mut rdata, mut planes) = frame(front);
        let mut textures = wall_textures();
        let mut drawer = Recorder::default();
        let side = SideDefView {
            midtexture: 1,
            ..Default::default()
        };

        rdata.store_wall_range(
            START,
            STOP,
            &wall(side, 0, front, None),
            &view(),
            &mut textures,
            &mut planes,
            &mut drawer,
        );

        assert_eq!(textures.build_count(1), 1);
        assert_eq!(drawer.columns.len(), (STOP - START + 1) as usize);
        for (dc, x) in drawer.columns.iter().zip(START..=STOP) {
            assert_eq!(dc.x, x);
            assert_eq!(dc.yl, 0);
            assert!((150..=152).contains(&dc.yh), "yh {}", dc.yh);
            assert_eq!(dc.texture_mid, FixedPoint::from_int(87));
            assert_eq!(dc.tex_height, 128);
            assert_eq!(dc.source.len(), 128);
        }
        // Left half from the first patch, right half from the second
        assert!(drawer.columns[0].source.iter().all(|&p| p == 1));
        assert!(drawer.columns.last().unwrap().source.iter().all(|&p| p == 2));

        for x in START..=STOP {
            assert_eq!(rdata.portal_clip.ceilingclip[x as usize], 200);
            assert_eq!(rdata.portal_clip.floorclip[x as usize], -1);
        }
        assert_eq!(rdata.portal_clip.floorclip[0], 200);
        assert_eq!(rdata.portal_clip.ceilingclip[319], -1);

        // Floor marked under the wall, the ceiling is above the view
        let floor = &planes.visplanes[rdata.floorplane.unwrap()];
        let (top, bottom) = plane_rows(floor, 160).unwrap();
        assert_eq!(bottom, 199);
        assert!((151..=153).contains(&top));
        let ceiling = &planes.visplanes[rdata.ceilingplane.unwrap()];
        assert_eq!(ceiling.marked().count(), 0);

        let ds = &rdata.drawsegs[0];
        assert_eq!((ds.x1, ds.x2), (START, STOP));
        assert_eq!(ds.silhouette, SIL_BOTH);
        assert_eq!(ds.sprtopclip, Some(SpriteClip::ScreenHeight));
        assert_eq!(ds.sprbottomclip, Some(SpriteClip::NegOne));
        assert_eq!(ds.bsilheight, FixedPoint::max());
        assert_eq!(ds.tsilheight, FixedPoint::min());
        assert!(ds.maskedtexturecol.is_none());
        // Square on, so the scale barely moves from 160 / 128
        assert!((ds.scale1.raw() - 81920).abs() < 64);
        assert!(ds.scalestep.raw().abs() < 4);
    }

    #[test]
    fn unpegged_bottom_anchors_to_floor() {
        let front = sector(0, 0, 96);
        let mut textures = wall_textures();
        let side = SideDefView {
            midtexture: 2,
            rowoffset: FixedPoint::from_int(3),
            ..Default::default()
        };

        let mut mids = Vec::new();
        for flags in [0, LineDefFlags::UnpegBottom as u32] {
            let (mut rdata, mut planes) = frame(front);
            let mut drawer = Recorder::default();
            rdata.store_wall_range(
                START,
                STOP,
                &wall(side, flags, front, None),
                &view(),
                &mut textures,
                &mut planes,
                &mut drawer,
            );
            mids.push(drawer.columns[0].texture_mid);
        }
        // worldtop, or floor + texture height, less the view height
        assert_eq!(mids[0], FixedPoint::from_int(58));
        assert_eq!(mids[1], FixedPoint::from_int(90));
        assert_eq!(textures.build_count(2), 1);
    }

    #[test]
    fn closed_door_marks_both_planes() {
        let front = sector(0, 0, 72);
        let back = sector(1, 0, 0);
        let (mut rdata, mut planes) = frame(front);
        let mut textures = wall_textures();
        let mut drawer = Recorder::default();
        let side = SideDefView {
            toptexture: 2,
            ..Default::default()
        };

        rdata.store_wall_range(
            START,
            STOP,
            &wall(side, LineDefFlags::TwoSided as u32, front, Some(back)),
            &view(),
            &mut textures,
            &mut planes,
            &mut drawer,
        );

        let floor = &planes.visplanes[rdata.floorplane.unwrap()];
        let ceiling = &planes.visplanes[rdata.ceilingplane.unwrap()];
        for x in START..=STOP {
            let (ct, cb) = plane_rows(ceiling, x).unwrap();
            assert_eq!(ct, 0);
            assert!((60..=62).contains(&cb));
            let (_, fb) = plane_rows(floor, x).unwrap();
            assert_eq!(fb, 199);
            // Nothing can be seen through a closed door
            let x = x as usize;
            assert!(rdata.portal_clip.ceilingclip[x] + 1 >= rdata.portal_clip.floorclip[x]);
        }

        // Only the upper texture, hung from the back ceiling
        assert_eq!(drawer.columns.len(), (STOP - START + 1) as usize);
        assert!(drawer.columns.iter().all(|d| d.source.first() == Some(&3)));
        assert_eq!(drawer.columns[0].texture_mid, FixedPoint::from_int(87));

        let ds = &rdata.drawsegs[0];
        assert_eq!(ds.silhouette, SIL_BOTH);
        assert_eq!(ds.sprbottomclip, Some(SpriteClip::NegOne));
        assert_eq!(ds.tsilheight, FixedPoint::min());
        assert!(matches!(ds.sprtopclip, Some(SpriteClip::Openings(_))));
    }

    #[test]
    fn open_window_draws_and_marks_nothing() {
        let front = sector(0, 0, 128);
        let (mut rdata, mut planes) = frame(front);
        let mut textures = wall_textures();
        let mut drawer = Recorder::default();

        rdata.store_wall_range(
            START,
            STOP,
            &wall(SideDefView::default(), 4, front, Some(sector(1, 0, 128))),
            &view(),
            &mut textures,
            &mut planes,
            &mut drawer,
        );

        assert!(drawer.columns.is_empty());
        let marks: usize = planes.planes().iter().map(|p| p.marked().count()).sum();
        assert_eq!(marks, 0);
        assert!(rdata.portal_clip.floorclip.iter().all(|&c| c == 200));
        assert!(rdata.portal_clip.ceilingclip.iter().all(|&c| c == -1));
        assert_eq!(rdata.drawsegs[0].silhouette, SIL_NONE);
        assert_eq!(textures.total_builds(), 0);
    }

    #[test]
    fn step_up_draws_lower_texture() {
        let front = sector(0, 0, 128);
        let back = sector(1, 24, 128);
        let (mut rdata, mut planes) = frame(front);
        let mut textures = wall_textures();
        let mut drawer = Recorder::default();
        let side = SideDefView {
            bottomtexture: 2,
            ..Default::default()
        };

        rdata.store_wall_range(
            START,
            STOP,
            &wall(side, 4, front, Some(back)),
            &view(),
            &mut textures,
            &mut planes,
            &mut drawer,
        );

        assert_eq!(drawer.columns.len(), (STOP - START + 1) as usize);
        for dc in &drawer.columns {
            assert!((120..=123).contains(&dc.yl), "yl {}", dc.yl);
            assert!((150..=152).contains(&dc.yh));
            assert_eq!(dc.texture_mid, FixedPoint::from_int(-17));
            let x = dc.x as usize;
            assert_eq!(rdata.portal_clip.floorclip[x], dc.yl);
            assert_eq!(rdata.portal_clip.ceilingclip[x], -1);
        }
        assert_eq!(rdata.drawsegs[0].silhouette, SIL_NONE);
        let floor = &planes.visplanes[rdata.floorplane.unwrap()];
        assert_eq!(floor.marked().count(), (STOP - START + 1) as usize);
    }

    #[test]
    fn masked_mid_saves_columns() {
        let front = sector(0, 0, 128);
        let (mut rdata, mut planes) = frame(front);
        let mut textures = wall_textures();
        let mut drawer = Recorder::default();
        let side = SideDefView {
            midtexture: 3,
            ..Default::default()
        };

        rdata.store_wall_range(
            START,
            STOP,
            &wall(side, 4, front, Some(sector(1, 0, 128))),
            &view(),
            &mut textures,
            &mut planes,
            &mut drawer,
        );

        assert!(drawer.columns.is_empty());
        let ds = rdata.drawsegs[0];
        assert_eq!(ds.silhouette, SIL_BOTH);
        assert_eq!(ds.tsilheight, FixedPoint::min());
        assert_eq!(ds.bsilheight, FixedPoint::max());
        let base = ds.maskedtexturecol.unwrap();
        let cols = &rdata.openings[base..base + (STOP - START + 1) as usize];
        assert!(cols.iter().all(|&c| (-1..=64).contains(&c)));
        assert!(cols.windows(2).all(|w| w[0] <= w[1]));
        assert!(matches!(ds.sprtopclip, Some(SpriteClip::Openings(_))));
        assert!(matches!(ds.sprbottomclip, Some(SpriteClip::Openings(_))));
    }

    #[test]
    fn bad_ranges_are_skipped() {
        let front = sector(0, 0, 128);
        let (mut rdata, mut planes) = frame(front);
        let mut textures = wall_textures();
        let mut drawer = Recorder::default();
        let seg = wall(SideDefView::default(), 0, front, None);
        let view = view();

        for (start, stop) in [(10, 5), (-1, 5), (300, 320)] {
            rdata.store_wall_range(start, stop, &seg, &view, &mut textures, &mut planes, &mut drawer);
        }
        let mut zero = seg;
        zero.length = FixedPoint::zero();
        rdata.store_wall_range(0, 10, &zero, &view, &mut textures, &mut planes, &mut drawer);

        assert!(rdata.drawsegs.is_empty());
        assert!(drawer.columns.is_empty());
    }

    #[test]
    fn drawsegs_grow_past_vanilla_limit() {
        let front = sector(0, 0, 128);
        let (mut rdata, mut planes) = frame(front);
        let mut textures = wall_textures();
        let mut drawer = Recorder::default();
        let seg = wall(SideDefView::default(), 4, front, Some(front));
        let view = view();

        for _ in 0..MAXDRAWSEGS + 2 {
            rdata.store_wall_range(160, 160, &seg, &view, &mut textures, &mut planes, &mut drawer);
        }
        assert_eq!(rdata.drawsegs.len(), MAXDRAWSEGS + 2);
        assert!(rdata.drawseg_limit_warned);

        rdata.clear_data();
        assert!(rdata.drawsegs.is_empty());
        assert!(rdata.openings.is_empty());
    }

    #[test]
    fn axis_aligned_walls_fake_contrast() {
        let vertical = wall(SideDefView::default(), 0, sector(0, 0, 128), None);
        assert_eq!(vertical.light_level(0), 11);
        assert_eq!(vertical.light_level(8), 15);
        let mut horizontal = vertical;
        horizontal.v2 = Vertex::new(FixedPoint::from_int(64), FixedPoint::from_int(32));
        assert_eq!(horizontal.light_level(0), 9);
        assert_eq!(horizontal.light_level(-20), 0);
    }

    #[test]
    fn fixed_colormap_overrides_distance() {
        let mut v = view();
        assert_eq!(
            wall_light(&v, 10, FixedPoint::from_int(1)),
            LightTable::Scaled {
                level: 10,
                scale: 16
            }
        );
        assert_eq!(
            wall_light(&v, 10, FixedPoint::from_int(1000)),
            LightTable::Scaled {
                level: 10,
                scale: 47
            }
        );
        v.fixed_colormap = Some(32);
        assert_eq!(wall_light(&v, 10, FixedPoint::unit()), LightTable::Fixed(32));
        assert_eq!(inverse_scale(FixedPoint::unit()).raw(), 0xffff);
    }

    #[test]
    fn edge_steps_wrap() {
        assert_eq!(height_step(FixedPoint::unit(), i32::MIN), i32::MIN);
        assert_eq!(height_step(FixedPoint::unit(), 64), -64);
        assert_eq!(height_step(FixedPoint::new(-(1 << 15)), 64), 32);
    }
}
