//! Wall textures: the catalog loaded from the WAD, and the composite cache
//! that merges multi-patch textures on first use.

mod brightmaps;
pub(crate) mod catalog;
mod column;
mod composite;

pub use brightmaps::{BrightmapDef, BrightmapTable, Mission};
pub use catalog::{
    PatchPlacement, Texture, TextureCatalog, TextureConfig, TextureError, width_mask,
};
pub use column::Column;
pub use composite::{CacheState, ColumnLookup, CompositeCache, TextureLookup, generate_lookup};

use log::debug;
use wad::WadData;
use wad::posts::POST_HEADER;

/// The texture catalog together with its composite cache. This is what the
/// wall renderer reads columns from.
pub struct TextureData {
    catalog: TextureCatalog,
    cache: CompositeCache,
}

impl TextureData {
    pub fn new(catalog: TextureCatalog) -> Self {
        let cache = CompositeCache::new(&catalog);
        Self { catalog, cache }
    }

    pub fn from_wad(wad: &WadData, config: TextureConfig) -> Result<Self, TextureError> {
        Ok(Self::new(TextureCatalog::from_wad(wad, config)?))
    }

    pub fn catalog(&self) -> &TextureCatalog {
        &self.catalog
    }

    /// Only the translation table may change after load
    pub fn catalog_mut(&mut self) -> &mut TextureCatalog {
        &mut self.catalog
    }

    pub fn cache(&self) -> &CompositeCache {
        &self.cache
    }

    /// Doom function name `R_GetColumn`
    ///
    /// Opaque walls read the result as flat pixels. Masked walls read it as
    /// posts, and a single patch column is then handed out straight from the
    /// patch lump without touching the composite.
    pub fn get_column(&mut self, tex: usize, col: i32, opaque: bool) -> Column<'_> {
        let texture = self.catalog.texture(tex);
        let col = (col & texture.width_mask) as usize;
        let height = texture.height.max(0) as usize;
        let Some(&lookup) = self.cache.lookup(tex).columns.get(col) else {
            return Column::empty();
        };

        if !opaque {
            match lookup {
                ColumnLookup::Direct {
                    patch,
                    patch_offset,
                    ..
                } => {
                    return match self.catalog.patch(patch) {
                        Some(p) => Column::new(p.data(), patch_offset + POST_HEADER, height),
                        None => Column::empty(),
                    };
                }
                ColumnLookup::Missing { .. } => return Column::empty(),
                ColumnLookup::Composite { .. } => {}
            }
        }

        if !self.cache.is_built(tex) {
            self.cache.build(&self.catalog, tex);
        }
        match self.cache.composite_bytes(tex) {
            Some(block) => Column::new(block, lookup.composite_offset(), height),
            None => Column::empty(),
        }
    }

    /// Build the composites of every texture in `present`, typically the
    /// textures used by side definitions plus the sky. Returns the patch lump
    /// bytes touched.
    ///
    /// Doom function name `R_PrecacheLevel`
    pub fn precache(&mut self, present: &[usize]) -> usize {
        let mut memory = 0;
        for &tex in present {
            if tex >= self.catalog.len() {
                continue;
            }
            memory += self
                .catalog
                .texture(tex)
                .placements
                .iter()
                .filter_map(|p| p.patch.and_then(|pi| self.catalog.patch(pi)))
                .map(|p| p.size())
                .sum::<usize>();
            if !self.cache.is_built(tex) {
                self.cache.build(&self.catalog, tex);
            }
        }
        debug!("R_PrecacheLevel: {} textures, {} bytes", present.len(), memory);
        memory
    }

    pub fn evict(&mut self, tex: usize) -> usize {
        self.cache.evict(tex)
    }

    pub fn reclaim(&mut self) -> usize {
        self.cache.reclaim()
    }

    pub fn build_count(&self, tex: usize) -> usize {
        self.cache.build_count(tex)
    }

    pub fn total_builds(&self) -> usize {
        self.cache.total_builds()
    }

    pub fn composite_bytes(&self, tex: usize) -> Option<&[u8]> {
        self.cache.composite_bytes(tex)
    }
}
