// src/texture/wad2.rs

use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::str;

use byteorder::{ReadBytesExt, LE};
use log::warn;

use crate::error::{BuildError, Result};

/// Where raw texture data comes from, keyed by texture name.
///
/// `find` returns the complete miptex blob (header plus mip levels) for a
/// name, or `None` when the source has no such texture.
pub trait TextureSource {
    fn find(&mut self, name: &str) -> io::Result<Option<Vec<u8>>>;
}

/// A single lump entry from the WAD2 directory.
#[derive(Debug, Clone)]
pub struct Wad2Entry {
    pub offset: i32,
    pub size: i32,
    pub name: String,
}

const WAD2_ENTRY_SIZE: usize = 32; // filepos, disksize, size, type, compression, pad[2], name[16]

/// An in-memory WAD2 archive.
pub struct Wad2 {
    data: Vec<u8>,
    directory: Vec<Wad2Entry>,
    by_name: HashMap<String, usize>,
}

impl Wad2 {
    /// Opens the texture wad. A missing file is fatal for the whole build.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BuildError::MissingResource {
                path: path.to_path_buf(),
            });
        }
        let mut file = fs::File::open(path)?;
        Ok(Self::from_reader(&mut file)?)
    }

    /// Reads the header and directory. The whole file is kept in memory so
    /// entries can be copied out on demand.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> io::Result<Self> {
        let total_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let mut full_data = Vec::with_capacity(total_size as usize);
        reader.read_to_end(&mut full_data)?;
        let mut cursor = Cursor::new(&full_data[..]);

        // --- Read Header ---
        let mut ident = [0u8; 4];
        cursor.read_exact(&mut ident)?;
        if &ident != b"WAD2" {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid WAD2 identifier: {}", String::from_utf8_lossy(&ident)),
            ));
        }
        let num_lumps = cursor.read_i32::<LE>()?;
        let infotableofs = cursor.read_i32::<LE>()?;
        if num_lumps < 0 || infotableofs < 0 || (infotableofs as u64) > total_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Directory offset exceeds total file size",
            ));
        }

        if num_lumps as u64 * WAD2_ENTRY_SIZE as u64 > total_size - infotableofs as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("WAD2 directory of {} lumps runs past the end of the file", num_lumps),
            ));
        }

        // --- Read Directory ---
        cursor.seek(SeekFrom::Start(infotableofs as u64))?;
        let mut directory = Vec::with_capacity(num_lumps as usize);
        let mut by_name = HashMap::new();
        for _ in 0..num_lumps {
            let mut raw = [0u8; WAD2_ENTRY_SIZE];
            cursor.read_exact(&mut raw)?;
            let mut fields = &raw[..];
            let offset = fields.read_i32::<LE>()?;
            let disk_size = fields.read_i32::<LE>()?;
            let _size = fields.read_i32::<LE>()?;
            let _kind = fields.read_u8()?;
            let compression = fields.read_u8()?;
            // names are NUL terminated, anything after the NUL is junk
            let name_field = &raw[16..32];
            let name_len = name_field.iter().position(|&b| b == 0).unwrap_or(16);
            let name = str::from_utf8(&name_field[..name_len])
                .unwrap_or("")
                .to_lowercase();

            if offset < 0
                || disk_size < 0
                || (offset as u64) + (disk_size as u64) > total_size
            {
                warn!(
                    "WAD2 lump '{}' has invalid offset/size ({}+{} > {})",
                    name, offset, disk_size, total_size
                );
                continue;
            }
            if compression != 0 {
                warn!("WAD2 lump '{}' is compressed, skipping", name);
                continue;
            }

            by_name.insert(name.clone(), directory.len());
            directory.push(Wad2Entry { offset, size: disk_size, name });
        }

        Ok(Wad2 { data: full_data, directory, by_name })
    }

    pub fn entries(&self) -> &[Wad2Entry] {
        &self.directory
    }

    pub fn find_entry(&self, name: &str) -> Option<&Wad2Entry> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.directory[index])
    }

    pub fn entry_data(&self, entry: &Wad2Entry) -> &[u8] {
        let start = entry.offset as usize;
        &self.data[start..start + entry.size as usize]
    }
}

impl TextureSource for Wad2 {
    fn find(&mut self, name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.find_entry(name).map(|entry| self.entry_data(entry).to_vec()))
    }
}

/// A texture source backed by a plain map, for tests and headless builds
/// without a texture wad.
#[derive(Debug, Default, Clone)]
pub struct MemoryTextures {
    textures: HashMap<String, Vec<u8>>,
}

impl MemoryTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, data: Vec<u8>) {
        self.textures.insert(name.to_lowercase(), data);
    }
}

impl TextureSource for MemoryTextures {
    fn find(&mut self, name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.textures.get(&name.to_lowercase()).cloned())
    }
}
