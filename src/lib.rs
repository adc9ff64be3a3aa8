// src/lib.rs
//! # q1bake
//!
//! Turns an in-memory Quake 1 BSP tree into the structural lumps of a BSP29
//! level, with deduplicated texture tables and a baked lightmap atlas.

pub mod bsp;
pub mod config;
pub mod error;
pub mod level;
pub mod light;
pub mod texture;
pub mod utils;

pub use config::{BuildOptions, LightingQuality};
pub use error::{BuildError, Result};
pub use level::{build_level, BuildContext, LevelInput, LevelLumps};
