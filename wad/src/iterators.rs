use crate::lumps::*;
use crate::wad::{WadData, WadError, read_2_bytes, read_4_bytes, read_name};
use std::marker::PhantomData;

/// Yields `item_count` records, handing the transformer the byte offset of
/// each record in turn
pub struct LumpIter<T, F: Fn(usize) -> T> {
    item_size:   usize,
    item_count:  usize,
    lump_offset: usize,
    current:     usize,
    transformer: F,
    _phantom:    PhantomData<T>,
}

impl<T, F> Iterator for LumpIter<T, F>
where
    F: Fn(usize) -> T,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current < self.item_count {
            let offset = self.lump_offset + self.current * self.item_size;
            let item = (self.transformer)(offset);
            self.current += 1;
            return Some(item);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.item_count - self.current;
        (left, Some(left))
    }
}

impl<T, F> ExactSizeIterator for LumpIter<T, F> where F: Fn(usize) -> T {}

fn parse_texture(lump: &str, data: &[u8], dir_offset: usize) -> Result<WadTexture, WadError> {
    let truncated = || WadError::TruncatedLump {
        name: lump.to_owned(),
    };
    let offset = read_4_bytes(data, dir_offset).ok_or_else(truncated)? as usize;
    let bad = || WadError::BadTextureDirectory {
        lump: lump.to_owned(),
        offset,
    };
    if offset + TEXTURE_HEADER_SIZE > data.len() {
        return Err(bad());
    }

    let name = read_name(data, offset).ok_or_else(bad)?;
    let masked = read_4_bytes(data, offset + 8).ok_or_else(bad)? != 0;
    let width = read_2_bytes(data, offset + 12).ok_or_else(bad)? as i16;
    let height = read_2_bytes(data, offset + 14).ok_or_else(bad)? as i16;
    let patch_count = read_2_bytes(data, offset + 20).ok_or_else(bad)? as i16;
    let patch_count = patch_count.max(0) as usize;
    if offset + TEXTURE_HEADER_SIZE + patch_count * TEXTURE_PATCH_SIZE > data.len() {
        return Err(bad());
    }

    let patches = (0..patch_count)
        .map(|i| {
            let p = offset + TEXTURE_HEADER_SIZE + i * TEXTURE_PATCH_SIZE;
            WadTexPatch {
                origin_x: read_2_bytes(data, p).unwrap_or_default() as i16 as i32,
                origin_y: read_2_bytes(data, p + 2).unwrap_or_default() as i16 as i32,
                patch_index: read_2_bytes(data, p + 4).unwrap_or_default() as usize,
            }
        })
        .collect();

    Ok(WadTexture {
        name,
        masked,
        width,
        height,
        patches,
    })
}

impl WadData {
    /// The patch names in `PNAMES`, in order. Texture definitions refer to
    /// patches by their position in this list.
    pub fn pnames_iter(&self) -> Result<LumpIter<String, impl Fn(usize) -> String + '_>, WadError> {
        let info = self.find_lump_or_err("PNAMES")?;
        let data = &self.file_data[info.offset..info.offset + info.size];
        let item_count = read_4_bytes(data, 0).ok_or_else(|| WadError::TruncatedLump {
            name: info.name.clone(),
        })? as usize;
        if 4 + item_count * 8 > data.len() {
            return Err(WadError::TruncatedLump {
                name: info.name.clone(),
            });
        }

        Ok(LumpIter {
            item_size: 8,
            item_count,
            lump_offset: 4,
            current: 0,
            transformer: move |offset| read_name(data, offset).unwrap_or_default(),
            _phantom: Default::default(),
        })
    }

    /// Texture definitions from `TEXTURE1` or `TEXTURE2`. A definition whose
    /// directory offset points outside the lump comes out as an error.
    pub fn texture_iter(
        &self,
        name: &str,
    ) -> Result<
        LumpIter<Result<WadTexture, WadError>, impl Fn(usize) -> Result<WadTexture, WadError> + '_>,
        WadError,
    > {
        let info = self.find_lump_or_err(name)?;
        let data = &self.file_data[info.offset..info.offset + info.size];
        let lump = info.name.as_str();
        let item_count = read_4_bytes(data, 0).ok_or_else(|| WadError::TruncatedLump {
            name: lump.to_owned(),
        })? as usize;
        if 4 + item_count * 4 > data.len() {
            return Err(WadError::TruncatedLump {
                name: lump.to_owned(),
            });
        }

        Ok(LumpIter {
            item_size: 4,
            item_count,
            lump_offset: 4,
            current: 0,
            transformer: move |offset| parse_texture(lump, data, offset),
            _phantom: Default::default(),
        })
    }

    /// Load a patch by lump name. `Ok(None)` if there is no such lump.
    pub fn patch(&self, name: &str) -> Result<Option<WadPatch>, WadError> {
        match self.lump_index(name) {
            Some(index) => WadPatch::from_lump(name, self.lump_data(index)).map(Some),
            None => Ok(None),
        }
    }

    pub fn playpal_iter(&self) -> Result<LumpIter<WadPalette, impl Fn(usize) -> WadPalette + '_>, WadError> {
        let info = self.find_lump_or_err("PLAYPAL")?;
        let data = &self.file_data[info.offset..info.offset + info.size];

        Ok(LumpIter {
            item_size: 768,
            item_count: info.size / 768,
            lump_offset: 0,
            current: 0,
            transformer: move |offset| {
                let mut palette = [WadColour::default(); 256];
                for (i, c) in palette.iter_mut().enumerate() {
                    let p = offset + i * 3;
                    *c = WadColour {
                        r: data[p],
                        g: data[p + 1],
                        b: data[p + 2],
                    };
                }
                WadPalette(palette)
            },
            _phantom: Default::default(),
        })
    }

    /// `COLORMAP` as a flat run of bytes, 256 per light level
    pub fn colourmap_iter(&self) -> Result<LumpIter<u8, impl Fn(usize) -> u8 + '_>, WadError> {
        let info = self.find_lump_or_err("COLORMAP")?;
        let data = &self.file_data[info.offset..info.offset + info.size];

        Ok(LumpIter {
            item_size: 1,
            item_count: info.size,
            lump_offset: 0,
            current: 0,
            transformer: move |offset| data[offset],
            _phantom: Default::default(),
        })
    }
}
