use std::collections::BTreeMap;
use std::{error, fmt};

use log::{debug, info, warn};
use math::FixedPoint;
use render_trait::Brightmap;
use serde::{Deserialize, Serialize};
use wad::lumps::{WadPatch, WadTexture};
use wad::{WadData, WadError, lump_name_hash, names_match};

use super::brightmaps::{BrightmapTable, Mission};

#[derive(Debug)]
pub enum TextureError {
    NotFound(String),
    /// A `TEXTURE1`/`TEXTURE2` directory entry points outside its lump
    BadTextureDirectory { lump: String, offset: usize },
    Wad(WadError),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::NotFound(name) => write!(f, "R_TextureNumForName: {name} not found"),
            TextureError::BadTextureDirectory { lump, offset } => {
                write!(f, "R_InitTextures: bad texture directory in {lump} at {offset}")
            }
            TextureError::Wad(err) => write!(f, "{err}"),
        }
    }
}

impl error::Error for TextureError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            TextureError::Wad(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WadError> for TextureError {
    fn from(err: WadError) -> Self {
        match err {
            WadError::BadTextureDirectory { lump, offset } => {
                TextureError::BadTextureDirectory { lump, offset }
            }
            err => TextureError::Wad(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureConfig {
    /// Report every construction anomaly instead of one line per texture
    pub dev_parm: bool,
    pub brightmaps: bool,
    pub mission: Mission,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            dev_parm: false,
            brightmaps: true,
            mission: Mission::Doom,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatchPlacement {
    pub origin_x: i32,
    pub origin_y: i32,
    /// Index in to the catalog patches, `None` if the patch lump is missing
    pub patch: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub width: i32,
    pub height: i32,
    /// Largest power of two not above the width, minus one
    pub width_mask: i32,
    pub placements: Vec<PatchPlacement>,
    pub brightmap: Option<Brightmap>,
}

impl Texture {
    /// Height as fixed point, `textureheight` in Doom
    pub fn height_fixed(&self) -> FixedPoint {
        FixedPoint::from_int(self.height)
    }
}

/// `j = 1; while j * 2 <= width { j <<= 1 }` less one
pub fn width_mask(width: i32) -> i32 {
    let mut j = 1;
    while j * 2 <= width {
        j <<= 1;
    }
    j - 1
}

/// All wall textures and the patches they are made of. Built once at load.
pub struct TextureCatalog {
    textures: Vec<Texture>,
    patches: Vec<Option<WadPatch>>,
    /// Buckets of texture indexes keyed by name hash. Each bucket keeps
    /// insertion order so the first texture of a given name is found first.
    hash_table: BTreeMap<u32, Vec<usize>>,
    /// Animated walls remap here
    translation: Vec<usize>,
    config: TextureConfig,
}

impl TextureCatalog {
    /// `patches` is indexed by `PNAMES` position, `None` where the patch lump
    /// does not exist.
    pub fn new(
        defs: Vec<WadTexture>,
        patches: Vec<Option<WadPatch>>,
        brightmaps: &BrightmapTable,
        config: TextureConfig,
    ) -> Self {
        let mut textures = Vec::with_capacity(defs.len());
        for def in defs {
            let placements = def
                .patches
                .iter()
                .map(|p| {
                    let patch = patches
                        .get(p.patch_index)
                        .and_then(|slot| slot.as_ref())
                        .map(|_| p.patch_index);
                    if patch.is_none() {
                        warn!("R_InitTextures: Missing patch in texture {}", def.name);
                    }
                    PatchPlacement {
                        origin_x: p.origin_x,
                        origin_y: p.origin_y,
                        patch,
                    }
                })
                .collect();

            let brightmap = if config.brightmaps {
                brightmaps.find(&def.name, config.mission)
            } else {
                None
            };

            textures.push(Texture {
                width: def.width as i32,
                height: def.height as i32,
                width_mask: width_mask(def.width as i32),
                name: def.name,
                placements,
                brightmap,
            });
        }

        let mut hash_table: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        let buckets = textures.len().max(1) as u32;
        for (i, tex) in textures.iter().enumerate() {
            hash_table
                .entry(lump_name_hash(&tex.name) % buckets)
                .or_default()
                .push(i);
        }

        let translation = (0..textures.len()).collect();
        debug!(
            "Texture catalog: {} textures, {} patches",
            textures.len(),
            patches.len()
        );

        Self {
            textures,
            patches,
            hash_table,
            translation,
            config,
        }
    }

    /// Doom function name `R_InitTextures`
    pub fn from_wad(wad: &WadData, config: TextureConfig) -> Result<Self, TextureError> {
        let mut patches = Vec::new();
        for name in wad.pnames_iter()? {
            // Placements using a bad patch are drawn without it, like a
            // missing one
            let patch = match wad.patch(&name) {
                Err(err @ WadError::BadPatch { .. }) => {
                    warn!("R_InitTextures: {err}, patch ignored");
                    None
                }
                res => res?,
            };
            patches.push(patch);
        }

        let mut defs: Vec<WadTexture> = wad.texture_iter("TEXTURE1")?.collect::<Result<_, _>>()?;
        if wad.lump_exists("TEXTURE2") {
            let defs2: Vec<WadTexture> =
                wad.texture_iter("TEXTURE2")?.collect::<Result<_, _>>()?;
            defs.extend(defs2);
        }
        info!("R_InitTextures: {} textures", defs.len());

        Ok(Self::new(
            defs,
            patches,
            &BrightmapTable::default(),
            config,
        ))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn texture(&self, tex: usize) -> &Texture {
        &self.textures[tex]
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn patch(&self, patch: usize) -> Option<&WadPatch> {
        self.patches.get(patch).and_then(|p| p.as_ref())
    }

    pub fn config(&self) -> &TextureConfig {
        &self.config
    }

    /// Doom function name `R_CheckTextureNumForName`. A leading `-` means no
    /// texture and is index 0.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        if name.starts_with('-') {
            return Some(0);
        }
        if self.textures.is_empty() {
            return None;
        }
        let key = lump_name_hash(name) % self.textures.len() as u32;
        self.hash_table
            .get(&key)?
            .iter()
            .copied()
            .find(|&i| names_match(&self.textures[i].name, name))
    }

    /// Doom function name `R_TextureNumForName`. A missing name is reported
    /// and replaced with texture 0.
    pub fn num_for_name(&self, name: &str) -> usize {
        match self.lookup(name) {
            Some(tex) => tex,
            None => {
                warn!("{}", TextureError::NotFound(name.to_owned()));
                0
            }
        }
    }

    /// Texture to draw in place of `tex`
    #[inline]
    pub fn translation(&self, tex: usize) -> usize {
        self.translation.get(tex).copied().unwrap_or(tex)
    }

    pub fn set_translation(&mut self, tex: usize, to: usize) {
        if let Some(t) = self.translation.get_mut(tex) {
            *t = to;
        }
    }

    pub fn brightmap(&self, tex: usize) -> Option<Brightmap> {
        self.textures.get(tex).and_then(|t| t.brightmap)
    }

    /// `textureheight[tex]`
    pub fn height(&self, tex: usize) -> FixedPoint {
        self.textures
            .get(tex)
            .map(|t| t.height_fixed())
            .unwrap_or_default()
    }
}
