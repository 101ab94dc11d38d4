use log::{debug, info};
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::{error, fmt, str};

/// Everything that can go wrong while reading a WAD or one of its lumps
#[derive(Debug)]
pub enum WadError {
    Io(PathBuf, std::io::Error),
    /// The first four bytes were not `IWAD` or `PWAD`, or the file is shorter
    /// than a header
    BadHeader,
    /// A directory entry points outside of the file
    DirectoryOutOfRange { name: String },
    MissingLump(String),
    /// A lump ended before a record it declares
    TruncatedLump { name: String },
    /// A texture directory offset points past the end of its lump
    BadTextureDirectory { lump: String, offset: usize },
    /// A patch column offset points outside the patch
    BadPatch { name: String },
}

impl fmt::Display for WadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WadError::Io(path, err) => write!(f, "Could not read {path:?}: {err}"),
            WadError::BadHeader => write!(f, "Not a WAD, header must start with IWAD or PWAD"),
            WadError::DirectoryOutOfRange { name } => {
                write!(f, "Directory entry for {name} points outside the WAD")
            }
            WadError::MissingLump(name) => write!(f, "Lump {name} not found"),
            WadError::TruncatedLump { name } => write!(f, "Lump {name} is truncated"),
            WadError::BadTextureDirectory { lump, offset } => {
                write!(f, "Bad texture directory in {lump} at offset {offset}")
            }
            WadError::BadPatch { name } => write!(f, "Patch {name} has a bad column table"),
        }
    }
}

impl error::Error for WadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            WadError::Io(_, err) => Some(err),
            _ => None,
        }
    }
}

/// Header which tells us the WAD type and where the data is
///
/// The header structure in the WAD is as follows:
///
/// | Field Size | Data Type    | Content                                              |
/// |------------|--------------|------------------------------------------------------|
/// | 0x00-0x03  | 4 ASCII char | *Must* be an ASCII string (either "IWAD" or "PWAD")  |
/// | 0x04-0x07  | unsigned int | The number entries in the directory                  |
/// | 0x08-0x0b  | unsigned int | Offset in bytes to the directory in the WAD file     |
///
struct WadHeader {
    /// Will be either `IWAD` for game, or `PWAD` for patch
    wad_type: [u8; 4],
    /// The count of "lumps" of data
    dir_count: u32,
    /// Offset in bytes that the lump data starts at
    dir_offset: u32,
}

impl fmt::Debug for WadHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\nWadHeader {{\n  wad_type: {},\n  dir_count: {},\n  dir_offset: {},\n}}",
            String::from_utf8_lossy(&self.wad_type),
            self.dir_count,
            self.dir_offset
        )
    }
}

/// Contains the details for a lump of data: where it starts, the size of it, and the name
///
/// The directory structure in the WAD is as follows:
///
/// | Field Size | Data Type    | Content                                                    |
/// |------------|--------------|------------------------------------------------------------|
/// | 0x00-0x03  | unsigned int | Offset value to the start of the lump data in the WAD file |
/// | 0x04-0x07  | unsigned int | The size of the lump in bytes                              |
/// | 0x08-0x0f  | 8 ASCII char | ASCII holding the name of the lump                         |
///
#[derive(Clone)]
pub struct LumpInfo {
    /// Name for the lump data, trailing NULs removed
    pub name: String,
    /// The offset in bytes where the lump data starts
    pub offset: usize,
    /// The size in bytes of the lump referenced
    pub size: usize,
}

impl fmt::Debug for LumpInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\nLumpInfo {{\n  name: {},\n  size: {},\n  offset: {},\n}}",
            &self.name, self.size, self.offset
        )
    }
}

/// Read a little-endian `u16`, `None` if the slice is too short
#[inline]
pub fn read_2_bytes(data: &[u8], offset: usize) -> Option<u16> {
    let b = data.get(offset..offset + 2)?;
    Some((b[1] as u16) << 8 | (b[0] as u16))
}

/// Read a little-endian `u32`, `None` if the slice is too short
#[inline]
pub fn read_4_bytes(data: &[u8], offset: usize) -> Option<u32> {
    let b = data.get(offset..offset + 4)?;
    Some((b[3] as u32) << 24 | (b[2] as u32) << 16 | (b[1] as u32) << 8 | (b[0] as u32))
}

/// An 8 byte, NUL padded lump or texture name
pub(crate) fn read_name(data: &[u8], offset: usize) -> Option<String> {
    let raw = data.get(offset..offset + 8)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(8);
    Some(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Compare two names the way lump names are compared: at most 8 characters,
/// ignoring ASCII case, stopping at a NUL.
pub fn names_match(a: &str, b: &str) -> bool {
    let a = a.bytes().take_while(|&c| c != 0).take(8);
    let b = b.bytes().take_while(|&c| c != 0).take(8);
    a.map(|c| c.to_ascii_uppercase())
        .eq(b.map(|c| c.to_ascii_uppercase()))
}

/// `W_LumpNameHash`: djb2 variant over at most 8 upper-cased characters.
/// Used to bucket texture names.
pub fn lump_name_hash(name: &str) -> u32 {
    let mut result: u32 = 5381;
    for c in name.bytes().take(8).take_while(|&c| c != 0) {
        result = ((result << 5) ^ result) ^ c.to_ascii_uppercase() as u32;
    }
    result
}

/// "Where's All (the) Data": contains the WAD in memory, plus an array of directories
/// telling us where each data lump starts
pub struct WadData {
    wad_file_path: Option<PathBuf>,
    /// The WAD as an array of bytes read in to memory
    pub(crate) file_data: Vec<u8>,
    /// Tells us where each lump of data is
    lumps: Vec<LumpInfo>,
}

impl fmt::Debug for WadData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\nWadData {{\n  wad_file_path: {:?},\n  lumps: {},\n}}",
            self.wad_file_path,
            self.lumps.len()
        )
    }
}

impl WadData {
    pub fn new<A>(file_path: A) -> Result<WadData, WadError>
    where
        A: Into<PathBuf>,
    {
        let path: PathBuf = file_path.into();
        let mut file = File::open(&path).map_err(|e| WadError::Io(path.clone(), e))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| WadError::Io(path.clone(), e))?;

        let mut wad = Self::from_bytes(data)?;
        info!("Loaded {:?} with {} lumps", path, wad.lumps.len());
        wad.wad_file_path = Some(path);
        Ok(wad)
    }

    /// Parse a WAD that is already in memory
    pub fn from_bytes(file_data: Vec<u8>) -> Result<WadData, WadError> {
        let header = Self::read_header(&file_data)?;
        debug!("{:?}", header);
        if &header.wad_type != b"IWAD" && &header.wad_type != b"PWAD" {
            return Err(WadError::BadHeader);
        }

        let mut lumps = Vec::with_capacity(header.dir_count as usize);
        for i in 0..header.dir_count as usize {
            let offset = header.dir_offset as usize + i * 16;
            let dir = Self::read_dir_data(&file_data, offset).ok_or_else(|| {
                WadError::DirectoryOutOfRange {
                    name: format!("#{i}"),
                }
            })?;
            if dir.offset + dir.size > file_data.len() {
                return Err(WadError::DirectoryOutOfRange { name: dir.name });
            }
            lumps.push(dir);
        }

        Ok(WadData {
            wad_file_path: None,
            file_data,
            lumps,
        })
    }

    /// Assemble a PWAD in memory from named lumps, in directory order
    pub fn from_lumps(lumps: &[(&str, Vec<u8>)]) -> WadData {
        let mut file_data = Vec::new();
        file_data.extend_from_slice(b"PWAD");
        file_data.extend_from_slice(&(lumps.len() as u32).to_le_bytes());
        file_data.extend_from_slice(&[0; 4]);

        let mut infos = Vec::with_capacity(lumps.len());
        for (name, bytes) in lumps {
            infos.push(LumpInfo {
                name: name.chars().take(8).collect(),
                offset: file_data.len(),
                size: bytes.len(),
            });
            file_data.extend_from_slice(bytes);
        }

        let dir_offset = file_data.len() as u32;
        file_data[8..12].copy_from_slice(&dir_offset.to_le_bytes());
        for info in &infos {
            file_data.extend_from_slice(&(info.offset as u32).to_le_bytes());
            file_data.extend_from_slice(&(info.size as u32).to_le_bytes());
            let mut name = [0u8; 8];
            for (n, b) in name.iter_mut().zip(info.name.bytes()) {
                *n = b;
            }
            file_data.extend_from_slice(&name);
        }

        WadData {
            wad_file_path: None,
            file_data,
            lumps: infos,
        }
    }

    fn read_header(file: &[u8]) -> Result<WadHeader, WadError> {
        let t = file.get(0..4).ok_or(WadError::BadHeader)?;
        Ok(WadHeader {
            wad_type: [t[0], t[1], t[2], t[3]],
            dir_count: read_4_bytes(file, 4).ok_or(WadError::BadHeader)?,
            dir_offset: read_4_bytes(file, 8).ok_or(WadError::BadHeader)?,
        })
    }

    fn read_dir_data(file: &[u8], offset: usize) -> Option<LumpInfo> {
        Some(LumpInfo {
            offset: read_4_bytes(file, offset)? as usize,
            size: read_4_bytes(file, offset + 4)? as usize,
            name: read_name(file, offset + 8)?,
        })
    }

    pub fn lump_count(&self) -> usize {
        self.lumps.len()
    }

    pub fn lump_info(&self, index: usize) -> &LumpInfo {
        &self.lumps[index]
    }

    /// Find a lump by name. Later lumps override earlier ones, which is how
    /// a PWAD replaces IWAD content.
    pub fn lump_index(&self, name: &str) -> Option<usize> {
        self.lumps.iter().rposition(|l| names_match(&l.name, name))
    }

    pub fn lump_exists(&self, name: &str) -> bool {
        self.lump_index(name).is_some()
    }

    /// The raw bytes of lump `index`
    pub fn lump_data(&self, index: usize) -> &[u8] {
        let info = &self.lumps[index];
        &self.file_data[info.offset..info.offset + info.size]
    }

    pub fn lump_by_name(&self, name: &str) -> Result<&[u8], WadError> {
        self.lump_index(name)
            .map(|i| self.lump_data(i))
            .ok_or_else(|| WadError::MissingLump(name.to_owned()))
    }

    pub(crate) fn find_lump_or_err(&self, name: &str) -> Result<&LumpInfo, WadError> {
        self.lump_index(name)
            .map(|i| &self.lumps[i])
            .ok_or_else(|| WadError::MissingLump(name.to_owned()))
    }

    pub fn path(&self) -> Option<&Path> {
        self.wad_file_path.as_deref()
    }
}
