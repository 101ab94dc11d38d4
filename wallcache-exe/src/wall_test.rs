//! Render one wall straight on and save it as an image.

use std::collections::HashMap;
use std::io::{self, Write};

use log::{debug, info, warn};
use math::{ANG270, Angle, FixedPoint};
use render_soft::{
    RenderData, SectorView, SideDefView, TextureData, Vertex, ViewPoint, VisPlaneRender, WallSeg,
};
use render_trait::{
    Brightmap, BufferSize, ColumnDrawer, DrawColumn, PixelBuffer, SOFT_PIXEL_CHANNELS,
};
use wad::{WadData, WadError, lumps::WadPalette};

pub const TEST_WIDTH: usize = 320;
pub const TEST_HEIGHT: usize = 200;

/// RGBA pixels in memory
pub struct Framebuffer {
    size: BufferSize,
    /// Total length is width * height * CHANNELS
    buffer: Vec<u8>,
    stride: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            size: BufferSize::new(width, height),
            buffer: vec![0; width * height * SOFT_PIXEL_CHANNELS],
            stride: width * SOFT_PIXEL_CHANNELS,
        }
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.size.width_usize() && y < self.size.height_usize())
            .then_some(y * self.stride + x * SOFT_PIXEL_CHANNELS)
    }
}

impl PixelBuffer for Framebuffer {
    fn size(&self) -> &BufferSize {
        &self.size
    }

    fn clear(&mut self) {
        self.buffer
            .chunks_mut(SOFT_PIXEL_CHANNELS)
            .for_each(|n| n.copy_from_slice(&[0, 0, 0, 255]));
    }

    fn set_pixel(&mut self, x: usize, y: usize, colour: &[u8; SOFT_PIXEL_CHANNELS]) {
        if let Some(pos) = self.index(x, y) {
            self.buffer[pos..pos + SOFT_PIXEL_CHANNELS].copy_from_slice(colour);
        }
    }

    fn read_pixel(&self, x: usize, y: usize) -> [u8; SOFT_PIXEL_CHANNELS] {
        let mut slice = [0u8; SOFT_PIXEL_CHANNELS];
        if let Some(pos) = self.index(x, y) {
            slice.copy_from_slice(&self.buffer[pos..pos + SOFT_PIXEL_CHANNELS]);
        }
        slice
    }
}

/// Palette, light tables and brightmaps of an IWAD
pub struct Shading {
    palette: WadPalette,
    /// `COLORMAP`, 256 entries per map
    colourmap: Vec<u8>,
    /// Full bright flags per palette index, by `BRTMAPn` lump
    brightmaps: HashMap<&'static str, [bool; 256]>,
}

impl Shading {
    pub fn new(palette: WadPalette, colourmap: Vec<u8>) -> Self {
        Self {
            palette,
            colourmap,
            brightmaps: HashMap::new(),
        }
    }

    /// Doom function name `R_InitColormaps`, plus the brightmap tables when the
    /// WAD carries them
    pub fn from_wad(wad: &WadData) -> Result<Self, WadError> {
        let palette = wad
            .playpal_iter()?
            .next()
            .ok_or_else(|| WadError::MissingLump("PLAYPAL".to_owned()))?;
        let mut shading = Self::new(palette, wad.colourmap_iter()?.collect());

        for brightmap in [
            Brightmap::NotGray,
            Brightmap::NotGrayOrBrown,
            Brightmap::RedOnly,
            Brightmap::GreenOnly1,
            Brightmap::GreenOnly2,
            Brightmap::GreenOnly3,
            Brightmap::OrangeYellow,
        ] {
            let name = brightmap.lump_name();
            if let Ok(data) = wad.lump_by_name(name) {
                let mut bright = [false; 256];
                for (flag, &b) in bright.iter_mut().zip(data) {
                    *flag = b != 0;
                }
                shading.brightmaps.insert(name, bright);
            } else {
                debug!("No {name} lump, brightmap ignored");
            }
        }
        Ok(shading)
    }

    #[inline]
    fn colour(&self, index: u8) -> [u8; SOFT_PIXEL_CHANNELS] {
        let c = self.palette.0[index as usize];
        [c.r, c.g, c.b, 255]
    }

    fn is_bright(&self, brightmap: Option<Brightmap>, texel: u8) -> bool {
        brightmap
            .and_then(|b| self.brightmaps.get(b.lump_name()))
            .is_some_and(|flags| flags[texel as usize])
    }
}

/// Draws columns through the colormaps in to a [`Framebuffer`]
pub struct WallCanvas<'a> {
    pub buffer: &'a mut Framebuffer,
    pub shading: &'a Shading,
    pub columns: usize,
}

impl ColumnDrawer for WallCanvas<'_> {
    fn draw_column(&mut self, dc: &DrawColumn) {
        self.columns += 1;
        if dc.x < 0 {
            return;
        }
        let map = dc.light.colourmap_index() * 256;
        let shading = self.shading;
        let buffer = &mut *self.buffer;
        dc.for_each_texel(|y, texel| {
            if y < 0 {
                return;
            }
            let index = if shading.is_bright(dc.brightmap, texel) {
                texel
            } else {
                shading
                    .colourmap
                    .get(map + texel as usize)
                    .copied()
                    .unwrap_or(texel)
            };
            buffer.set_pixel(dc.x as usize, y as usize, &shading.colour(index));
        });
    }
}

/// Draw texture `tex` as a single sided wall filling as much of the view as
/// its size allows, at scale 1. Returns the columns drawn.
pub fn render_wall(textures: &mut TextureData, tex: usize, canvas: &mut WallCanvas) -> usize {
    let (width, height, name) = {
        let texture = textures.catalog().texture(tex);
        (texture.width, texture.height, texture.name.clone())
    };
    if tex == 0 {
        warn!("{name} is the no-texture placeholder, nothing to draw");
    }

    let size = *canvas.buffer.size();
    let mut rdata = RenderData::new(size.width_usize(), size.height_usize());
    let mut planes = VisPlaneRender::new(size.width_usize());
    let distance = rdata.projection.projection;

    let front = SectorView {
        id: 0,
        floorheight: FixedPoint::zero(),
        ceilingheight: FixedPoint::from_int(height),
        floorpic: 0,
        ceilingpic: 1,
        lightlevel: 255,
    };
    let view = ViewPoint {
        z: FixedPoint::from_int(height / 2),
        sky_flat: usize::MAX,
        ..Default::default()
    };
    let left = FixedPoint::from_int(width / 2);
    let seg = WallSeg::new(
        Vertex::new(distance, left),
        Vertex::new(distance, left - FixedPoint::from_int(width)),
        Angle::new(ANG270),
        SideDefView {
            midtexture: tex,
            ..Default::default()
        },
        0,
        front,
        None,
    );

    rdata.floorplane = Some(planes.find_plane(front.floorheight, front.floorpic, 255, false));
    rdata.ceilingplane = Some(planes.find_plane(front.ceilingheight, front.ceilingpic, 255, false));

    let centerx = rdata.projection.centerx;
    let x1 = (centerx - width / 2).max(0);
    let x2 = (centerx - width / 2 + width - 1).min(rdata.projection.view_width - 1);
    canvas.buffer.clear();
    let before = canvas.columns;
    rdata.store_wall_range(x1, x2, &seg, &view, textures, &mut planes, canvas);

    let drawn = canvas.columns - before;
    info!("Wall test {name}: {width}x{height}, {drawn} columns drawn");
    drawn
}

/// Binary PPM, alpha dropped
pub fn write_ppm(buffer: &impl PixelBuffer, out: &mut impl Write) -> io::Result<()> {
    let size = buffer.size();
    write!(out, "P6\n{} {}\n255\n", size.width(), size.height())?;
    let mut row = Vec::with_capacity(size.width_usize() * 3);
    for y in 0..size.height_usize() {
        row.clear();
        for x in 0..size.width_usize() {
            row.extend_from_slice(&buffer.read_pixel(x, y)[..3]);
        }
        out.write_all(&row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use render_soft::textures::{BrightmapTable, TextureCatalog, TextureConfig};
    use wad::lumps::{WadColour, WadPatch, WadTexPatch, WadTexture};

    fn grey_palette() -> WadPalette {
        let mut colours = [WadColour::default(); 256];
        for (i, c) in colours.iter_mut().enumerate() {
            *c = WadColour {
                r: i as u8,
                g: i as u8,
                b: i as u8,
            };
        }
        WadPalette(colours)
    }

    /// Every map the identity, except map 0 which darkens to index / 2
    fn colourmaps() -> Vec<u8> {
        let mut maps: Vec<u8> = (0..34).flat_map(|_| 0..=255u8).collect();
        for (i, m) in maps[..256].iter_mut().enumerate() {
            *m = (i / 2) as u8;
        }
        maps
    }

    fn textures() -> TextureData {
        let columns = vec![vec![(0u8, vec![40u8; 64])]; 64];
        let patch = WadPatch::from_columns("WALL", 64, &columns);
        let defs = vec![
            WadTexture {
                name: "AASHITTY".to_owned(),
                masked: false,
                width: 8,
                height: 8,
                patches: vec![],
            },
            WadTexture {
                name: "COMPTALL".to_owned(),
                masked: false,
                width: 64,
                height: 64,
                patches: vec![WadTexPatch {
                    origin_x: 0,
                    origin_y: 0,
                    patch_index: 0,
                }],
            },
        ];
        let config = TextureConfig {
            brightmaps: false,
            ..Default::default()
        };
        TextureData::new(TextureCatalog::new(
            defs,
            vec![Some(patch)],
            &BrightmapTable::default(),
            config,
        ))
    }

    #[test]
    fn wall_fills_its_square() {
        let mut textures = textures();
        let shading = Shading::new(grey_palette(), colourmaps());
        let mut buffer = Framebuffer::new(TEST_WIDTH, TEST_HEIGHT);
        let mut canvas = WallCanvas {
            buffer: &mut buffer,
            shading: &shading,
            columns: 0,
        };

        let drawn = render_wall(&mut textures, 1, &mut canvas);
        assert_eq!(drawn, 64);

        // Full light and close, so colormap 0
        assert_eq!(buffer.read_pixel(160, 100), [20, 20, 20, 255]);
        assert_eq!(buffer.read_pixel(130, 70), [20, 20, 20, 255]);
        // Outside the wall
        assert_eq!(buffer.read_pixel(160, 20), [0, 0, 0, 255]);
        assert_eq!(buffer.read_pixel(10, 100), [0, 0, 0, 255]);
    }

    #[test]
    fn bright_texels_skip_the_colormap() {
        let mut shading = Shading::new(grey_palette(), colourmaps());
        let mut flags = [false; 256];
        flags[40] = true;
        shading.brightmaps.insert(Brightmap::NotGray.lump_name(), flags);
        assert!(shading.is_bright(Some(Brightmap::NotGray), 40));
        assert!(!shading.is_bright(Some(Brightmap::NotGray), 41));
        assert!(!shading.is_bright(Some(Brightmap::RedOnly), 40));
        assert!(!shading.is_bright(None, 40));
    }

    #[test]
    fn ppm_header_and_size() {
        let mut buffer = Framebuffer::new(4, 2);
        buffer.clear();
        buffer.set_pixel(1, 1, &[9, 8, 7, 255]);
        // Off the edge is ignored
        buffer.set_pixel(4, 0, &[1, 1, 1, 255]);

        let mut out = Vec::new();
        write_ppm(&buffer, &mut out).unwrap();
        let header = b"P6\n4 2\n255\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(out.len(), header.len() + 4 * 2 * 3);
        let pixel = header.len() + (4 + 1) * 3;
        assert_eq!(&out[pixel..pixel + 3], &[9, 8, 7]);
    }
}
