// src/texture/texinfo.rs

use std::io::{self, Write};

use byteorder::{WriteBytesExt, LE};

use crate::error::{BuildError, Result};
use crate::level::{Lump, LumpKind, LumpRecord};
use crate::texture::MipTexTable;

pub const MAX_MAP_TEXINFO: usize = 4096;

/// Sky and liquid surfaces: not lightmapped, warped or scrolled by the engine.
pub const TEX_SPECIAL: i32 = 1;

/// Two entries closer than this on every axis component are the same mapping.
pub const TEXINFO_EPSILON: f32 = 0.01;

const NUM_TEXINFO_HASH: usize = 32;

/// Flags implied by a texture's name.
pub fn texture_flags(name: &str) -> i32 {
    if name.starts_with("sky") || name.starts_with('*') {
        TEX_SPECIAL
    } else {
        0
    }
}

/// Texture projection for a set of faces (40 bytes on disk).
///
/// Layout (all little-endian):
///
/// ```text
/// offset  field    type / size
/// ------  -------  ------------
///  0-15   s        [f32; 4]  (x, y, z, offset)
/// 16-31   t        [f32; 4]
/// 32-35   miptex   i32
/// 36-39   flags    i32
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexInfo {
    pub s: [f32; 4],
    pub t: [f32; 4],
    pub miptex: i32,
    pub flags: i32,
}

impl TexInfo {
    /// Same texture and flags, and every axis component within tolerance.
    pub fn matches(&self, other: &TexInfo) -> bool {
        if self.miptex != other.miptex || self.flags != other.flags {
            return false;
        }
        self.s
            .iter()
            .zip(other.s.iter())
            .chain(self.t.iter().zip(other.t.iter()))
            .all(|(a, b)| (a - b).abs() <= TEXINFO_EPSILON)
    }
}

impl LumpRecord for TexInfo {
    const SIZE: usize = 40;

    fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for v in self.s.iter().chain(self.t.iter()) {
            writer.write_f32::<LE>(*v)?;
        }
        writer.write_i32::<LE>(self.miptex)?;
        writer.write_i32::<LE>(self.flags)?;
        Ok(())
    }
}

/// Deduplicating table of texture mappings.
///
/// Candidates are bucketed by `miptex % 32` and only that bucket is scanned,
/// so lookups cost one pass over the mappings sharing a texture slot.
#[derive(Debug, Clone)]
pub struct TexInfoTable {
    entries: Vec<TexInfo>,
    buckets: Vec<Vec<u16>>,
}

impl Default for TexInfoTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TexInfoTable {
    pub fn new() -> Self {
        TexInfoTable {
            entries: Vec::new(),
            buckets: vec![Vec::new(); NUM_TEXINFO_HASH],
        }
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
    }

    /// Index of the mapping, adding a new entry if nothing close enough exists.
    pub fn intern(
        &mut self,
        miptex: &mut MipTexTable,
        texture: &str,
        flags: i32,
        s: &[f64; 4],
        t: &[f64; 4],
    ) -> Result<u16> {
        let tin = TexInfo {
            s: s.map(|v| v as f32),
            t: t.map(|v| v as f32),
            miptex: miptex.intern(texture)?,
            flags,
        };

        let hash = tin.miptex as usize % NUM_TEXINFO_HASH;
        let bucket = &mut self.buckets[hash];

        for &index in bucket.iter() {
            if tin.matches(&self.entries[index as usize]) {
                return Ok(index);
            }
        }

        let index = self.entries.len();
        if index >= MAX_MAP_TEXINFO {
            return Err(BuildError::LimitExceeded {
                what: "TEXINFOS",
                limit: MAX_MAP_TEXINFO,
            });
        }

        self.entries.push(tin);
        bucket.push(index as u16);
        Ok(index as u16)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<&TexInfo> {
        self.entries.get(index as usize)
    }

    /// Every entry in table order.
    pub fn write_lump(&self) -> Result<Lump> {
        let mut lump = Lump::new(LumpKind::TexInfo);
        for tin in &self.entries {
            lump.append_record(tin)?;
        }
        Ok(lump)
    }
}
