// src/texture/mod.rs
pub mod miptex;
pub mod texinfo;
pub mod wad2;

pub use miptex::{write_texture_lump, MipTexHeader, MipTexTable};
pub use texinfo::{texture_flags, TexInfo, TexInfoTable};
pub use wad2::{MemoryTextures, TextureSource, Wad2};
