// src/level/mod.rs
pub mod build_context;
pub mod level_build;
pub mod lump;

pub use build_context::BuildContext;
pub use level_build::{build_level, LevelInput, LevelLumps};
pub use lump::{Lump, LumpKind, LumpRecord};
