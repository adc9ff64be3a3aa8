// src/bsp/bsp_records.rs

use std::io::{self, Write};

use byteorder::{WriteBytesExt, LE};

use crate::bsp::Contents;
use crate::level::LumpRecord;

/// Light style meaning "no lightmap for this slot".
pub const NO_LIGHT_STYLE: u8 = 255;

/// A face in the 20-byte on-disk format.
///
/// Layout (all little-endian):
///
/// ```text
/// offset  field       type / size
/// ------  ----------  ------------
///  0-1    planenum    i16
///  2-3    side        i16
///  4-7    firstedge   i32   (into the surf edge list)
///  8-9    numedges    i16
/// 10-11   texinfo     i16
/// 12-15   styles      [u8; 4]
/// 16-19   lightofs    i32   (-1 = no lightmap)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DFace {
    pub planenum: i16,
    pub side: i16,
    pub first_edge: i32,
    pub num_edges: i16,
    pub texinfo: i16,
    pub styles: [u8; 4],
    pub light_ofs: i32,
}

impl LumpRecord for DFace {
    const SIZE: usize = 20;

    fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.planenum)?;
        writer.write_i16::<LE>(self.side)?;
        writer.write_i32::<LE>(self.first_edge)?;
        writer.write_i16::<LE>(self.num_edges)?;
        writer.write_i16::<LE>(self.texinfo)?;
        writer.write_all(&self.styles)?;
        writer.write_i32::<LE>(self.light_ofs)?;
        Ok(())
    }
}

/// A node in the 24-byte on-disk format.
///
/// ```text
///  0-3    planenum    i32
///  4-7    children    [i16; 2]  (>= 0 node, < 0 is -(leaf + 1))
///  8-13   mins        [i16; 3]
/// 14-19   maxs        [i16; 3]
/// 20-21   firstface   u16
/// 22-23   numfaces    u16
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DNode {
    pub planenum: i32,
    pub children: [i16; 2],
    pub mins: [i16; 3],
    pub maxs: [i16; 3],
    pub first_face: u16,
    pub num_faces: u16,
}

impl LumpRecord for DNode {
    const SIZE: usize = 24;

    fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i32::<LE>(self.planenum)?;
        for c in &self.children {
            writer.write_i16::<LE>(*c)?;
        }
        for v in self.mins.iter().chain(self.maxs.iter()) {
            writer.write_i16::<LE>(*v)?;
        }
        writer.write_u16::<LE>(self.first_face)?;
        writer.write_u16::<LE>(self.num_faces)?;
        Ok(())
    }
}

/// A leaf in the 28-byte on-disk format.
///
/// ```text
///  0-3    contents        i32
///  4-7    visofs          i32   (-1 = no vis data)
///  8-13   mins            [i16; 3]
/// 14-19   maxs            [i16; 3]
/// 20-21   firstmarksurf   u16
/// 22-23   nummarksurfs    u16
/// 24-27   ambient levels  [u8; 4]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DLeaf {
    pub contents: i32,
    pub vis_ofs: i32,
    pub mins: [i16; 3],
    pub maxs: [i16; 3],
    pub first_mark_surf: u16,
    pub num_mark_surfs: u16,
    pub ambient: [u8; 4],
}

impl DLeaf {
    /// The record every solid child slot points at (leaf 0).
    pub fn solid() -> Self {
        DLeaf {
            contents: Contents::Solid as i32,
            vis_ofs: -1,
            mins: [0; 3],
            maxs: [0; 3],
            first_mark_surf: 0,
            num_mark_surfs: 0,
            ambient: [0; 4],
        }
    }
}

impl LumpRecord for DLeaf {
    const SIZE: usize = 28;

    fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i32::<LE>(self.contents)?;
        writer.write_i32::<LE>(self.vis_ofs)?;
        for v in self.mins.iter().chain(self.maxs.iter()) {
            writer.write_i16::<LE>(*v)?;
        }
        writer.write_u16::<LE>(self.first_mark_surf)?;
        writer.write_u16::<LE>(self.num_mark_surfs)?;
        writer.write_all(&self.ambient)?;
        Ok(())
    }
}
