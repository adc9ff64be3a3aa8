// src/texture/miptex.rs

use std::collections::HashMap;
use std::io::{self, Write};

use byteorder::{WriteBytesExt, LE};
use log::{debug, warn};

use crate::error::{BuildError, Result};
use crate::level::{Lump, LumpKind, LumpRecord};
use crate::texture::TextureSource;

/// Texture names longer than this do not fit the on-disk name field.
pub const MAX_TEXTURE_NAME: usize = 15;

pub const MIP_LEVELS: usize = 5;

/// Side length of every generated placeholder texture.
const PLACEHOLDER_SIZE: u32 = 64;

pub const ERROR_TEXTURE: &str = "error";
pub const MISSING_TEXTURE: &str = "missing";
pub const CARVE_TEXTURE: &str = "o_carve";

/// Texture names to stable indices.
///
/// The three built-in names always occupy indices 0, 1 and 2.
#[derive(Debug, Clone)]
pub struct MipTexTable {
    names: Vec<String>,
    index: HashMap<String, i32>,
}

impl Default for MipTexTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MipTexTable {
    pub fn new() -> Self {
        let mut table = MipTexTable {
            names: Vec::new(),
            index: HashMap::new(),
        };
        table.reset();
        table
    }

    /// Forget every texture, then re-add the built-ins.
    pub fn reset(&mut self) {
        self.names.clear();
        self.index.clear();

        for name in [ERROR_TEXTURE, MISSING_TEXTURE, CARVE_TEXTURE] {
            self.push(name);
        }
    }

    /// Index for `name`, appending it on first use.
    pub fn intern(&mut self, name: &str) -> Result<i32> {
        if let Some(&index) = self.index.get(name) {
            return Ok(index);
        }
        if name.len() > MAX_TEXTURE_NAME {
            return Err(BuildError::TextureNameTooLong(name.to_string()));
        }
        Ok(self.push(name))
    }

    fn push(&mut self, name: &str) -> i32 {
        let index = self.names.len() as i32;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), index);
        index
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Header in front of each texture's pixel data.
///
/// Layout (all little-endian):
///
/// ```text
/// offset  field    type / size
/// ------  -------  ------------
///  0-15   name     [u8; 16], NUL padded
/// 16-19   width    u32
/// 20-23   height   u32
/// 24-43   offsets  [u32; 5], relative to the header start
/// ```
#[derive(Debug, Clone)]
pub struct MipTexHeader {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub offsets: [u32; MIP_LEVELS],
}

impl MipTexHeader {
    /// Header for a square texture whose mips directly follow it.
    pub fn square(name: &str, size: u32) -> Self {
        let mut offsets = [0u32; MIP_LEVELS];
        let mut offset = Self::SIZE as u32;
        let mut level_size = size;
        for slot in offsets.iter_mut() {
            *slot = offset;
            offset += level_size * level_size;
            level_size /= 2;
        }
        MipTexHeader {
            name: name.to_string(),
            width: size,
            height: size,
            offsets,
        }
    }
}

impl LumpRecord for MipTexHeader {
    const SIZE: usize = 16 + 4 + 4 + 4 * MIP_LEVELS;

    fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut name_buf = [0u8; 16];
        for (i, &b) in self.name.as_bytes().iter().take(MAX_TEXTURE_NAME).enumerate() {
            name_buf[i] = b;
        }
        writer.write_all(&name_buf)?;
        writer.write_u32::<LE>(self.width)?;
        writer.write_u32::<LE>(self.height)?;
        for offset in &self.offsets {
            writer.write_u32::<LE>(*offset)?;
        }
        Ok(())
    }
}

/// Two-colour checkerboard, with squares a quarter of each mip's size.
fn write_dummy_mip(lump: &mut Lump, name: &str, pix1: u8, pix2: u8) -> io::Result<()> {
    lump.append_record(&MipTexHeader::square(name, PLACEHOLDER_SIZE))?;

    let mut size = PLACEHOLDER_SIZE;
    for _ in 0..MIP_LEVELS {
        for y in 0..size {
            for x in 0..size {
                let pixel = if (x ^ y) & (size / 4) != 0 { pix2 } else { pix1 };
                lump.append(&[pixel]);
            }
        }
        size /= 2;
    }
    Ok(())
}

/// Height field for the carve logo, 0..=255, row 0 at the bottom.
fn carve_relief(x: u32, y: u32) -> u8 {
    let edge = x.min(y).min(63 - x).min(63 - y);
    match edge {
        0..=3 => 255,
        4..=7 => 48,
        _ => ((x + y) * 2).min(255) as u8,
    }
}

fn write_logo_mip(lump: &mut Lump, name: &str) -> io::Result<()> {
    const COLORMAP: [u8; 8] = [16, 97, 103, 109, 243, 243, 243, 243];

    lump.append_record(&MipTexHeader::square(name, PLACEHOLDER_SIZE))?;

    let mut size = PLACEHOLDER_SIZE;
    let mut scale = 1;
    for _ in 0..MIP_LEVELS {
        for y in 0..size {
            for x in 0..size {
                let height = carve_relief(x * scale, 63 - y * scale);
                lump.append(&[COLORMAP[(height >> 5) as usize]]);
            }
        }
        size /= 2;
        scale *= 2;
    }
    Ok(())
}

fn transfer_one_miptex<S: TextureSource + ?Sized>(
    lump: &mut Lump,
    source: &mut S,
    name: &str,
) -> Result<()> {
    match name {
        ERROR_TEXTURE => return Ok(write_dummy_mip(lump, name, 210, 231)?),
        MISSING_TEXTURE => return Ok(write_dummy_mip(lump, name, 4, 12)?),
        CARVE_TEXTURE => return Ok(write_logo_mip(lump, name)?),
        _ => {}
    }

    if let Some(data) = source.find(name)? {
        lump.append(&data);
        return Ok(());
    }

    warn!("texture '{}' not found in texture wad!", name);
    write_dummy_mip(lump, name, 4, 12)?;
    Ok(())
}

/// Builds the texture lump: a count, one offset per texture (measured from
/// the lump start), then every texture's header and mip data.
pub fn write_texture_lump<S: TextureSource + ?Sized>(
    table: &MipTexTable,
    source: &mut S,
) -> Result<Lump> {
    let mut lump = Lump::new(LumpKind::Textures);

    let num_miptex = table.len() as u32;
    let dir_size = 4 * num_miptex + 4;

    let mut offsets = Vec::with_capacity(table.len());
    for name in table.names() {
        offsets.push(dir_size + lump.len() as u32);
        transfer_one_miptex(&mut lump, source, name)?;
    }

    let mut directory = Vec::with_capacity(dir_size as usize);
    directory.write_u32::<LE>(num_miptex)?;
    for offset in offsets {
        directory.write_u32::<LE>(offset)?;
    }
    lump.prepend(&directory);

    debug!("texture lump: {} textures, {} bytes", num_miptex, lump.len());
    Ok(lump)
}
