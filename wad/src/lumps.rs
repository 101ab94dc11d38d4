use crate::posts::{POST_END, PostIter, PostWriter};
use crate::wad::{WadError, read_2_bytes, read_4_bytes};

/// A picture made of columns of posts, used for wall patches and sprites
///
/// The data in the WAD lump is structured as follows:
///
/// | Field Size | Data Type   | Content                                        |
/// |------------|-------------|------------------------------------------------|
/// |  0x00-0x01 |    i16      | Width                                          |
/// |  0x02-0x03 |    i16      | Height                                         |
/// |  0x04-0x05 |    i16      | Left offset                                    |
/// |  0x06-0x07 |    i16      | Top offset                                     |
/// |  0x08-...  | u32 * width | Byte offset of each column from the lump start |
///
/// The column data follows, see [`crate::posts`]. The raw lump is kept so
/// column offsets can be used directly.
#[derive(Debug, Clone)]
pub struct WadPatch {
    pub name: String,
    pub width: i16,
    pub height: i16,
    pub left_offset: i16,
    pub top_offset: i16,
    columnofs: Vec<u32>,
    data: Vec<u8>,
}

impl WadPatch {
    pub fn from_lump(name: &str, lump: &[u8]) -> Result<Self, WadError> {
        let bad = || WadError::BadPatch {
            name: name.to_owned(),
        };
        let width = read_2_bytes(lump, 0).ok_or_else(bad)? as i16;
        let height = read_2_bytes(lump, 2).ok_or_else(bad)? as i16;
        let left_offset = read_2_bytes(lump, 4).ok_or_else(bad)? as i16;
        let top_offset = read_2_bytes(lump, 6).ok_or_else(bad)? as i16;
        if width < 0 || height < 0 {
            return Err(bad());
        }

        let mut columnofs = Vec::with_capacity(width as usize);
        for x in 0..width as usize {
            let ofs = read_4_bytes(lump, 8 + x * 4).ok_or_else(bad)?;
            if ofs as usize >= lump.len() {
                return Err(bad());
            }
            columnofs.push(ofs);
        }

        Ok(Self {
            name: name.to_owned(),
            width,
            height,
            left_offset,
            top_offset,
            columnofs,
            data: lump.to_vec(),
        })
    }

    /// Encode a patch from columns of `(top_delta, pixels)` posts
    pub fn from_columns(name: &str, height: i16, columns: &[Vec<(u8, Vec<u8>)>]) -> Self {
        let width = columns.len();
        let mut data = vec![0u8; 8 + width * 4];
        data[0..2].copy_from_slice(&(width as i16).to_le_bytes());
        data[2..4].copy_from_slice(&height.to_le_bytes());

        let mut columnofs = Vec::with_capacity(width);
        for (x, posts) in columns.iter().enumerate() {
            let start = data.len();
            columnofs.push(start as u32);
            data[8 + x * 4..12 + x * 4].copy_from_slice(&(start as u32).to_le_bytes());

            let size: usize = posts.iter().map(|(_, p)| p.len() + 4).sum::<usize>() + 1;
            data.resize(start + size, 0);
            let end = data.len();
            let mut writer = PostWriter::new(&mut data, start, end);
            for (top, pixels) in posts {
                writer.push(*top, pixels);
            }
            writer.finish();
        }

        Self {
            name: name.to_owned(),
            width: width as i16,
            height,
            left_offset: 0,
            top_offset: 0,
            columnofs,
            data,
        }
    }

    /// Byte offset of column `x` within [`Self::data`]
    #[inline]
    pub fn column_offset(&self, x: usize) -> Option<usize> {
        self.columnofs.get(x).map(|&o| o as usize)
    }

    /// Posts of column `x`, empty if out of range
    pub fn posts(&self, x: usize) -> PostIter<'_> {
        match self.column_offset(x) {
            Some(ofs) => PostIter::new(&self.data, ofs),
            None => PostIter::new(&[POST_END], 0),
        }
    }

    /// The raw lump
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes held in memory for this patch
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One patch placement in a texture definition
///
/// | Field Size | Data Type | Content                          |
/// |------------|-----------|----------------------------------|
/// |  0x00-0x01 |    i16    | Origin X                         |
/// |  0x02-0x03 |    i16    | Origin Y                         |
/// |  0x04-0x05 |    i16    | Index in to `PNAMES`             |
/// |  0x06-0x07 |    i16    | Step dir, unused                 |
/// |  0x08-0x09 |    i16    | Colourmap, unused                |
#[derive(Debug, Clone)]
pub struct WadTexPatch {
    pub origin_x: i32,
    pub origin_y: i32,
    pub patch_index: usize,
}

/// A wall texture definition from `TEXTURE1` or `TEXTURE2`
///
/// | Field Size | Data Type | Content                          |
/// |------------|-----------|----------------------------------|
/// |  0x00-0x07 | 8 * u8    | Name                             |
/// |  0x08-0x0b |    u32    | Masked flag                      |
/// |  0x0c-0x0d |    i16    | Width                            |
/// |  0x0e-0x0f |    i16    | Height                           |
/// |  0x10-0x13 |    u32    | Column directory, unused         |
/// |  0x14-0x15 |    i16    | Patch count                      |
/// |  0x16-...  | 10 * n    | [`WadTexPatch`] records          |
#[derive(Debug, Clone)]
pub struct WadTexture {
    pub name: String,
    pub masked: bool,
    pub width: i16,
    pub height: i16,
    pub patches: Vec<WadTexPatch>,
}

pub(crate) const TEXTURE_HEADER_SIZE: usize = 22;
pub(crate) const TEXTURE_PATCH_SIZE: usize = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WadColour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// One of the 14 palettes in `PLAYPAL`
#[derive(Debug, Clone)]
pub struct WadPalette(pub [WadColour; 256]);
