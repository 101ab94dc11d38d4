//! Masked mid textures on two sided lines: grates, fences and the like.
//! They are drawn back to front after all solid walls, column by column as
//! posts, clipped to what the walls in front left open.

#[cfg(feature = "hprof")]
use coarse_prof::profile;
use math::{FRACBITS, FRACUNIT, FixedPoint};
use render_trait::{Brightmap, ColumnDrawer, DrawColumn, LightTable};
use wad::posts::PostIter;

use crate::RenderData;
use crate::defs::{DrawSeg, SpriteClip};
use crate::segs::{LineDefFlags, ViewPoint, inverse_scale, wall_light};
use crate::textures::TextureData;

/// Texture column slot that has been drawn, or was never visible
pub const MASKED_DONE: i32 = i32::MAX;

/// Per column values shared by every post of one masked column
pub struct MaskedColumn {
    pub x: i32,
    /// Screen row of texture row 0, in 16.16
    pub sprtopscreen: i64,
    pub spryscale: FixedPoint,
    pub texturemid: FixedPoint,
    pub iscale: FixedPoint,
    /// First row that may not be drawn above, and below
    pub ceilingclip: i32,
    pub floorclip: i32,
    pub center_y: i32,
    pub light: LightTable,
    pub brightmap: Option<Brightmap>,
}

/// Doom function name `R_DrawMaskedColumn`
///
/// Draws each post of a column on its own, so the gaps between posts stay
/// see-through. Posts are read with no wrapping.
pub fn draw_masked_column(posts: PostIter, column: &MaskedColumn, drawer: &mut impl ColumnDrawer) {
    let scale = column.spryscale.raw() as i64;
    for post in posts {
        let topscreen = column.sprtopscreen + scale * post.top_delta as i64;
        let bottomscreen = topscreen + scale * post.pixels.len() as i64;

        let mut yl = ((topscreen + FRACUNIT as i64 - 1) >> FRACBITS)
            .clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        let mut yh = ((bottomscreen - 1) >> FRACBITS).clamp(i32::MIN as i64, i32::MAX as i64) as i32;

        if yh >= column.floorclip {
            yh = column.floorclip - 1;
        }
        if yl <= column.ceilingclip {
            yl = column.ceilingclip + 1;
        }

        if yl <= yh {
            drawer.draw_column(&DrawColumn {
                source: post.pixels,
                x: column.x,
                yl,
                yh,
                texture_mid: column.texturemid - FixedPoint::from_int(post.top_delta as i32),
                iscale: column.iscale,
                tex_height: 0,
                center_y: column.center_y,
                light: column.light,
                brightmap: column.brightmap,
            });
        }
    }
}

impl RenderData {
    /// Clip value of a saved sprite clip at column `x`
    fn sprite_clip(&self, ds: &DrawSeg, clip: Option<SpriteClip>, x: i32, default: i32) -> i32 {
        match clip {
            Some(SpriteClip::ScreenHeight) => self.projection.view_height,
            Some(SpriteClip::NegOne) => -1,
            Some(SpriteClip::Openings(base)) => self
                .openings
                .get(ds.opening_index(base, x))
                .copied()
                .unwrap_or(default),
            None => default,
        }
    }

    /// Doom function name `R_RenderMaskedSegRange`
    ///
    /// Draw columns `x1..=x2` of the masked mid texture of draw segment
    /// `ds_index`. Each column is drawn once, then marked done.
    #[allow(clippy::too_many_arguments)]
    pub fn render_masked_seg_range(
        &mut self,
        ds_index: usize,
        x1: i32,
        x2: i32,
        view: &ViewPoint,
        textures: &mut TextureData,
        drawer: &mut impl ColumnDrawer,
    ) {
        #[cfg(feature = "hprof")]
        profile!("render_masked_seg_range");
        let Some(&ds) = self.drawsegs.get(ds_index) else {
            return;
        };
        let Some(base) = ds.maskedtexturecol else {
            return;
        };
        let seg = ds.curline;
        let (front, Some(back)) = (seg.frontsector, seg.backsector) else {
            return;
        };
        let texnum = textures.catalog().translation(seg.sidedef.midtexture);
        if texnum == 0 || texnum >= textures.catalog().len() {
            return;
        }
        let x1 = x1.max(ds.x1);
        let x2 = x2.min(ds.x2);

        let wall_lights = seg.light_level(view.extralight);
        let textureheight = textures.catalog().height(texnum);
        let brightmap = textures.catalog().brightmap(texnum);
        let scalestep = ds.scalestep;
        let mut spryscale = ds.scale1 + FixedPoint::new((x1 - ds.x1).wrapping_mul(scalestep.raw()));

        // find positioning
        let mut texturemid = if seg.has_flag(LineDefFlags::UnpegBottom) {
            let floor = front.floorheight.max(back.floorheight);
            floor + textureheight - view.z
        } else {
            let ceiling = front.ceilingheight.min(back.ceilingheight);
            ceiling - view.z
        };
        texturemid += seg.sidedef.rowoffset;

        let centeryfrac = self.projection.centeryfrac.raw() as i64;
        let screen_limit = (self.projection.view_height as i64) << (FRACBITS * 2);
        let center_y = self.projection.centery;

        for x in x1..=x2 {
            let slot = ds.opening_index(base, x);
            let col = self.openings.get(slot).copied().unwrap_or(MASKED_DONE);
            if col != MASKED_DONE {
                let scale = spryscale.raw() as i64;
                let t = (centeryfrac << FRACBITS) - texturemid.raw() as i64 * scale;
                // Entirely above or below the view
                if t + textureheight.raw() as i64 * scale < 0 || t > screen_limit {
                    spryscale += scalestep;
                    continue;
                }

                let column = MaskedColumn {
                    x,
                    sprtopscreen: t >> FRACBITS,
                    spryscale,
                    texturemid,
                    iscale: inverse_scale(spryscale),
                    ceilingclip: self.sprite_clip(&ds, ds.sprtopclip, x, -1),
                    floorclip: self.sprite_clip(
                        &ds,
                        ds.sprbottomclip,
                        x,
                        self.projection.view_height,
                    ),
                    center_y,
                    light: wall_light(view, wall_lights, spryscale),
                    brightmap,
                };
                let posts = textures.get_column(texnum, col, false).posts();
                draw_masked_column(posts, &column, drawer);

                if let Some(slot) = self.openings.get_mut(slot) {
                    *slot = MASKED_DONE;
                }
            }
            spryscale += scalestep;
        }
    }

    /// Doom function name `R_DrawMasked`, walls only
    ///
    /// Draw every draw segment with a masked mid texture, furthest first.
    pub fn draw_masked(
        &mut self,
        view: &ViewPoint,
        textures: &mut TextureData,
        drawer: &mut impl ColumnDrawer,
    ) {
        for ds_index in (0..self.drawsegs.len()).rev() {
            let ds = self.drawsegs[ds_index];
            if ds.maskedtexturecol.is_some() {
                self.render_masked_seg_range(ds_index, ds.x1, ds.x2, view, textures, drawer);
            }
        }
    }
}
