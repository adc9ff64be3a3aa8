// src/light/atlas.rs
//
// The lighting lump: a ladder of constant-brightness blocks, then every
// non-flat lightmap in bake order.

use log::{debug, warn};

use crate::level::{Lump, LumpKind};
use crate::light::Lightmap;

/// Luxels in one constant-brightness block (the largest face lightmap).
pub const FLAT_LIGHTMAP_SIZE: usize = 18 * 18;

/// Engine capacity of the lighting lump in bytes.
pub const MAX_LIGHTING_SIZE: usize = 0x100000;

/// Offset of the ladder block matching `value`.
///
/// Levels 0-128 each have a block; above that only even levels do, so the
/// overbright range maps to half as many blocks.
pub fn flat_light_offset(value: u8, color: bool) -> i32 {
    let mut index = value as i32;

    if index > 128 {
        index = 64 + index / 2;
    }

    if color {
        index *= 3;
    }

    index * FLAT_LIGHTMAP_SIZE as i32
}

fn write_flat_block(lump: &mut Lump, level: u8, count: usize) {
    lump.append(&vec![level; count]);
}

/// Builds the lighting lump and records each written lightmap's offset.
pub fn write_lighting_lump(lightmaps: &mut [Lightmap], color: bool) -> Lump {
    let mut lump = Lump::new(LumpKind::Lighting);

    let flat_size = FLAT_LIGHTMAP_SIZE * if color { 3 } else { 1 };

    for level in 0..128u8 {
        write_flat_block(&mut lump, level, flat_size);
    }
    for level in (128..=254u8).step_by(2) {
        write_flat_block(&mut lump, level, flat_size);
    }

    let ladder = lump.len();

    for lmap in lightmaps.iter_mut() {
        lmap.write(&mut lump, color);
    }

    debug!(
        "lighting lump: {} bytes of flat blocks, {} bytes of face lightmaps",
        ladder,
        lump.len() - ladder
    );

    if lump.len() > MAX_LIGHTING_SIZE {
        warn!(
            "lighting lump is {} bytes, engine limit is {}",
            lump.len(),
            MAX_LIGHTING_SIZE
        );
    }

    lump
}
