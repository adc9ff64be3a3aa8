// src/bsp/mod.rs
pub mod bsp_node;
pub mod bsp_procedural;
pub mod bsp_records;
pub mod bsp_tables;
mod bsp_util; // Re-exported below
pub mod bsp_writer;

pub use bsp_node::{BspTree, Child, Contents, Face, FaceId, Leaf, LeafId, Node, NodeId};
pub use bsp_procedural::{GeneratedLevel, GeneratorConfig, RoomGenerator};
pub use bsp_records::{DFace, DLeaf, DNode};
pub use bsp_tables::{BspTables, GeometryTables};
pub use bsp_util::{BoundingBox, Plane, Vec3}; // Re-export geometry types
pub use bsp_writer::{write_bsp, BspWriter, StructuralLumps};

/// Size of one lightmap luxel in texture units.
pub const TEXEL_SIZE: f64 = 16.0;
