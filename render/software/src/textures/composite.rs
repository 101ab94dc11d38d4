//! Composite textures: the column lookup built at load, and the lazily built
//! column cache that merges overlapping patches.

#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::{debug, warn};
use wad::posts::{POST_HEADER, PostIter, PostWriter};

use super::catalog::{Texture, TextureCatalog};

/// Where the pixels of one texture column come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLookup {
    /// Exactly one patch covers the column. `patch_offset` is the offset of
    /// the column's first post in the patch lump.
    Direct {
        patch: usize,
        patch_offset: usize,
        composite_offset: usize,
    },
    /// Several patches overlap here. `posts` is the upper bound used to size
    /// the column's region in the composite.
    Composite { composite_offset: usize, posts: usize },
    /// No patch covers the column
    Missing { composite_offset: usize },
}

impl ColumnLookup {
    /// Offset of the column's first pixel in the composite buffer
    #[inline]
    pub fn composite_offset(&self) -> usize {
        match *self {
            ColumnLookup::Direct {
                composite_offset, ..
            }
            | ColumnLookup::Composite {
                composite_offset, ..
            }
            | ColumnLookup::Missing { composite_offset } => composite_offset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextureLookup {
    pub columns: Vec<ColumnLookup>,
    /// Bytes needed for the whole composite
    pub composite_size: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    #[default]
    Absent,
    /// Patches are being drawn in to the buffer
    Building,
    /// All patches drawn, posts not yet rebuilt
    Resident,
    /// Complete, may be evicted at any time
    Purgeable,
}

#[derive(Default, Clone, Copy)]
struct ColumnCount {
    patches: usize,
    posts: usize,
}

/// Clip the x extent of a placed patch against the texture width
#[inline]
fn placement_range(origin_x: i32, patch_width: i32, texture_width: i32) -> (i32, i32) {
    let x1 = origin_x.max(0);
    let x2 = (origin_x + patch_width).min(texture_width);
    (x1, x2)
}

/// Doom function name `R_GenerateLookup`
pub fn generate_lookup(catalog: &TextureCatalog, texture: &Texture) -> TextureLookup {
    let width = texture.width.max(0) as usize;
    let height = texture.height.max(0) as usize;
    let mut count = vec![ColumnCount::default(); width];
    let mut direct = vec![(0usize, 0usize); width];

    for placement in &texture.placements {
        let Some((pi, patch)) = placement
            .patch
            .and_then(|pi| catalog.patch(pi).map(|p| (pi, p)))
        else {
            continue;
        };
        let (x1, x2) = placement_range(placement.origin_x, patch.width as i32, texture.width);
        for x in x1..x2 {
            let Some(ofs) = patch.column_offset((x - placement.origin_x) as usize) else {
                continue;
            };
            count[x as usize].patches += 1;
            direct[x as usize] = (pi, ofs);
        }
    }

    // Post counts only matter for columns made of several patches. Tall
    // textures are assumed to be one post per column.
    if texture.placements.len() > 1 && height < 256 {
        let limit = height * 3 + 3;
        let mut badcol = catalog.config().dev_parm;

        for placement in &texture.placements {
            let Some(patch) = placement.patch.and_then(|pi| catalog.patch(pi)) else {
                continue;
            };
            let (x1, x2) = placement_range(placement.origin_x, patch.width as i32, texture.width);
            for x in x1..x2 {
                let c = &mut count[x as usize];
                if c.patches <= 1 {
                    continue;
                }
                let Some(base) = patch.column_offset((x - placement.origin_x) as usize) else {
                    continue;
                };
                for post in PostIter::new(patch.data(), base) {
                    if post.offset - base > limit {
                        if badcol {
                            badcol = false;
                            warn!(
                                "Texture {} (height {}) has bad column(s) starting at x = {}",
                                texture.name, texture.height, x
                            );
                        }
                        break;
                    }
                    c.posts += 1;
                }
            }
        }
    }

    let mut columns = vec![ColumnLookup::Missing { composite_offset: 0 }; width];
    let mut csize = 0;
    let mut err = false;
    for x in (0..width).rev() {
        let c = count[x];
        columns[x] = match c.patches {
            0 => {
                if catalog.config().dev_parm {
                    warn!(
                        "R_GenerateLookup: Column {} is without a patch in texture {}",
                        x, texture.name
                    );
                } else {
                    err = true;
                }
                ColumnLookup::Missing {
                    composite_offset: csize,
                }
            }
            1 => ColumnLookup::Direct {
                patch: direct[x].0,
                patch_offset: direct[x].1,
                composite_offset: csize,
            },
            _ => {
                // Room for a header and trailer per post plus one extra post
                let lookup = ColumnLookup::Composite {
                    composite_offset: csize + POST_HEADER,
                    posts: c.posts,
                };
                csize += 4 * c.posts + 5;
                lookup
            }
        };
        csize += height;
    }

    if err {
        debug!(
            "R_GenerateLookup: Column without a patch in texture {}",
            texture.name
        );
    }

    TextureLookup {
        columns,
        composite_size: csize,
    }
}

/// Doom function name `R_DrawColumnInCache`. Copies the posts of a patch
/// column in to `cache`, clipped to `cache.len()`, marking each byte written.
fn draw_column_in_cache(posts: PostIter, cache: &mut [u8], origin_y: i32, marks: &mut [bool]) {
    let cache_height = cache.len() as i32;
    for post in posts {
        let mut count = post.pixels.len() as i32;
        let mut position = origin_y + post.top_delta as i32;

        if position < 0 {
            count += position;
            position = 0;
        }
        if position + count > cache_height {
            count = cache_height - position;
        }

        if count > 0 {
            let (p, c) = (position as usize, count as usize);
            cache[p..p + c].copy_from_slice(&post.pixels[..c]);
            marks[p..p + c].fill(true);
        }
    }
}

/// Turn the flat pixels of a multi-patch column back in to posts, one per run
/// of marked cells, so transparent gaps stay transparent.
fn rebuild_posts(block: &mut [u8], region_start: usize, region_end: usize, marks: &[bool], source: &mut [u8]) {
    let height = source.len();
    let pixels = region_start + POST_HEADER;
    source.copy_from_slice(&block[pixels..pixels + height]);

    let mut writer = PostWriter::new(block, region_start, region_end);
    let mut j = 0;
    loop {
        while j < height && !marks[j] {
            j += 1;
        }
        // a top delta of 0xFF would read as the end of the column
        if j >= height || j > u8::MAX as usize - 1 {
            break;
        }
        let top = j;
        while j < height && marks[j] {
            j += 1;
        }
        if !writer.push(top as u8, &source[top..j]) {
            break;
        }
    }
    writer.finish();
}

/// The composite buffers of every texture plus their column lookups
pub struct CompositeCache {
    lookups: Vec<TextureLookup>,
    composites: Vec<Option<Vec<u8>>>,
    states: Vec<CacheState>,
    builds: Vec<usize>,
}

impl CompositeCache {
    pub fn new(catalog: &TextureCatalog) -> Self {
        let lookups: Vec<TextureLookup> = catalog
            .textures()
            .iter()
            .map(|t| generate_lookup(catalog, t))
            .collect();
        let len = lookups.len();
        Self {
            lookups,
            composites: vec![None; len],
            states: vec![CacheState::Absent; len],
            builds: vec![0; len],
        }
    }

    pub fn lookup(&self, tex: usize) -> &TextureLookup {
        &self.lookups[tex]
    }

    pub fn state(&self, tex: usize) -> CacheState {
        self.states[tex]
    }

    pub fn is_built(&self, tex: usize) -> bool {
        self.composites[tex].is_some()
    }

    /// Doom function name `R_GenerateComposite`
    pub fn build(&mut self, catalog: &TextureCatalog, tex: usize) {
        #[cfg(feature = "hprof")]
        profile!("build_composite");
        let texture = catalog.texture(tex);
        let lookup = &self.lookups[tex];
        let width = texture.width.max(0) as usize;
        let height = texture.height.max(0) as usize;

        self.states[tex] = CacheState::Building;
        let mut block = vec![0u8; lookup.composite_size];
        let mut marks = vec![false; width * height];

        for placement in &texture.placements {
            let Some(patch) = placement.patch.and_then(|pi| catalog.patch(pi)) else {
                continue;
            };
            let (x1, x2) = placement_range(placement.origin_x, patch.width as i32, texture.width);
            for x in x1..x2 {
                let column = patch.posts((x - placement.origin_x) as usize);
                let x = x as usize;
                let ofs = lookup.columns[x].composite_offset();
                draw_column_in_cache(
                    column,
                    &mut block[ofs..ofs + height],
                    placement.origin_y,
                    &mut marks[x * height..(x + 1) * height],
                );
            }
        }
        self.states[tex] = CacheState::Resident;

        let mut source = vec![0u8; height];
        for (x, column) in lookup.columns.iter().enumerate() {
            if let ColumnLookup::Composite {
                composite_offset,
                posts,
            } = *column
            {
                let start = composite_offset - POST_HEADER;
                let end = start + 4 * posts + 5 + height;
                rebuild_posts(
                    &mut block,
                    start,
                    end,
                    &marks[x * height..(x + 1) * height],
                    &mut source,
                );
            }
        }

        self.composites[tex] = Some(block);
        self.states[tex] = CacheState::Purgeable;
        self.builds[tex] += 1;
        debug!("Built composite {} ({} bytes)", texture.name, lookup.composite_size);
    }

    /// The built composite of `tex`, if resident
    pub fn composite_bytes(&self, tex: usize) -> Option<&[u8]> {
        self.composites[tex].as_deref()
    }

    /// Drop a purgeable composite. Returns the bytes freed.
    pub fn evict(&mut self, tex: usize) -> usize {
        if self.states[tex] != CacheState::Purgeable {
            return 0;
        }
        self.states[tex] = CacheState::Absent;
        self.composites[tex].take().map_or(0, |c| c.len())
    }

    /// Evict everything that can be. Returns the bytes freed.
    pub fn reclaim(&mut self) -> usize {
        (0..self.composites.len()).map(|tex| self.evict(tex)).sum()
    }

    pub fn build_count(&self, tex: usize) -> usize {
        self.builds[tex]
    }

    pub fn total_builds(&self) -> usize {
        self.builds.iter().sum()
    }

    /// Bytes held by resident composites
    pub fn resident_bytes(&self) -> usize {
        self.composites.iter().flatten().map(|c| c.len()).sum()
    }
}
