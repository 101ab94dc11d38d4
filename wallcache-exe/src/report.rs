//! Texture listings and the composite consistency check.

use std::fmt;
use std::io::{self, Write};

use log::{debug, info, warn};
use render_soft::TextureData;
use render_soft::textures::ColumnLookup;
use wad::posts::{POST_END, POST_HEADER};

/// A composite column whose rebuilt posts are not what the lookup promised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFault {
    /// A post reaches below the texture
    PostOutOfRange {
        x: usize,
        top_delta: u8,
        length: u8,
        height: usize,
    },
    /// A post runs past the end of the column's region
    Overflow { x: usize, offset: usize },
    /// The region ends without a terminator
    Unterminated { x: usize },
}

impl fmt::Display for ColumnFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnFault::PostOutOfRange {
                x,
                top_delta,
                length,
                height,
            } => write!(
                f,
                "column {x}: post at {top_delta} of length {length} is outside height {height}"
            ),
            ColumnFault::Overflow { x, offset } => {
                write!(f, "column {x}: post at byte {offset} overflows its region")
            }
            ColumnFault::Unterminated { x } => write!(f, "column {x}: no end of column marker"),
        }
    }
}

impl std::error::Error for ColumnFault {}

/// Walk the posts of column `x`, held in `block[start..end]`
pub fn check_column(block: &[u8], start: usize, end: usize, height: usize, x: usize) -> Option<ColumnFault> {
    let end = end.min(block.len());
    let mut pos = start;
    loop {
        let Some(&top_delta) = block.get(pos).filter(|_| pos < end) else {
            return Some(ColumnFault::Unterminated { x });
        };
        if top_delta == POST_END {
            return None;
        }
        let Some(&length) = block.get(pos + 1).filter(|_| pos + 1 < end) else {
            return Some(ColumnFault::Overflow { x, offset: pos });
        };
        if pos + length as usize + 4 > end {
            return Some(ColumnFault::Overflow { x, offset: pos });
        }
        if top_delta as usize + length as usize > height {
            return Some(ColumnFault::PostOutOfRange {
                x,
                top_delta,
                length,
                height,
            });
        }
        pos += length as usize + 4;
    }
}

/// Check every multi-patch column of a built composite. An unbuilt texture
/// has nothing to check.
pub fn verify_composite(textures: &TextureData, tex: usize) -> Vec<ColumnFault> {
    let Some(block) = textures.composite_bytes(tex) else {
        return Vec::new();
    };
    let height = textures.catalog().texture(tex).height.max(0) as usize;
    textures
        .cache()
        .lookup(tex)
        .columns
        .iter()
        .enumerate()
        .filter_map(|(x, column)| match *column {
            ColumnLookup::Composite {
                composite_offset,
                posts,
            } => {
                let start = composite_offset - POST_HEADER;
                let end = start + 4 * posts + 5 + height;
                check_column(block, start, end, height, x)
            }
            _ => None,
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct CheckSummary {
    pub textures: usize,
    /// Textures with at least one multi-patch column
    pub composites: usize,
    pub faults: Vec<(String, ColumnFault)>,
    /// Textures that built different bytes the second time
    pub unstable: Vec<String>,
    pub resident_bytes: usize,
}

impl CheckSummary {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && self.unstable.is_empty()
    }
}

/// Build every texture, verify the multi-patch columns, then evict and build
/// each again to make sure the result does not change.
pub fn check_all(textures: &mut TextureData) -> CheckSummary {
    let count = textures.catalog().len();
    // Texture 0 is the "no texture" marker
    let all: Vec<usize> = (1..count).collect();
    let patch_bytes = textures.precache(&all);
    debug!("Precached {} textures from {patch_bytes} patch bytes", all.len());

    let mut summary = CheckSummary {
        textures: all.len(),
        ..Default::default()
    };
    for &tex in &all {
        let name = textures.catalog().texture(tex).name.clone();
        let composite = textures
            .cache()
            .lookup(tex)
            .columns
            .iter()
            .any(|c| matches!(c, ColumnLookup::Composite { .. }));
        if !composite {
            continue;
        }
        summary.composites += 1;

        for fault in verify_composite(textures, tex) {
            warn!("{name}: {fault}");
            summary.faults.push((name.clone(), fault));
        }

        let first = textures.composite_bytes(tex).map(<[u8]>::to_vec);
        textures.evict(tex);
        textures.precache(&[tex]);
        if first.as_deref() != textures.composite_bytes(tex) {
            warn!("{name}: composite differs after a rebuild");
            summary.unstable.push(name);
        }
    }
    summary.resident_bytes = textures.cache().resident_bytes();
    info!(
        "Checked {} textures, {} composite, {} faults, {} resident bytes",
        summary.textures,
        summary.composites,
        summary.faults.len(),
        summary.resident_bytes
    );
    summary
}

/// Print the definition of `tex` and where each of its columns comes from
pub fn describe_texture(textures: &TextureData, tex: usize, out: &mut impl Write) -> io::Result<()> {
    let catalog = textures.catalog();
    let texture = catalog.texture(tex);
    writeln!(
        out,
        "{} #{tex}: {}x{}, width mask {}",
        texture.name, texture.width, texture.height, texture.width_mask
    )?;
    if let Some(brightmap) = texture.brightmap {
        writeln!(out, "  brightmap {brightmap:?}")?;
    }
    if catalog.translation(tex) != tex {
        writeln!(out, "  animated, currently drawn as #{}", catalog.translation(tex))?;
    }

    for placement in &texture.placements {
        let name = placement
            .patch
            .and_then(|pi| catalog.patch(pi))
            .map_or("<missing>", |p| p.name.as_str());
        writeln!(
            out,
            "  patch {name:<8} at ({}, {})",
            placement.origin_x, placement.origin_y
        )?;
    }

    let lookup = textures.cache().lookup(tex);
    let (mut direct, mut composite, mut missing) = (0, 0, 0);
    for (x, column) in lookup.columns.iter().enumerate() {
        match *column {
            ColumnLookup::Direct {
                patch,
                composite_offset,
                ..
            } => {
                direct += 1;
                let name = catalog.patch(patch).map_or("<missing>", |p| p.name.as_str());
                writeln!(out, "  {x:>4} direct    {name:<8} @{composite_offset}")?;
            }
            ColumnLookup::Composite {
                composite_offset,
                posts,
            } => {
                composite += 1;
                writeln!(out, "  {x:>4} composite {posts} posts @{composite_offset}")?;
            }
            ColumnLookup::Missing { .. } => {
                missing += 1;
                writeln!(out, "  {x:>4} missing")?;
            }
        }
    }
    writeln!(
        out,
        "{direct} direct, {composite} composite, {missing} missing, {} composite bytes",
        lookup.composite_size
    )
}
