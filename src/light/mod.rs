// src/light/mod.rs
pub mod atlas;
pub mod light_baker;
pub mod light_grid;
pub mod light_source;
pub mod lightmap;

pub use atlas::{flat_light_offset, write_lighting_lump, FLAT_LIGHTMAP_SIZE};
pub use light_baker::{light_all_faces, light_face, light_map_model, LightScratch};
pub use light_grid::{face_extents, FaceVectors, SampleGrid};
pub use light_source::{find_lights, Entity, LightKind, LightSource};
pub use lightmap::{Lightmap, LightmapId};

use crate::bsp::Vec3;

/// Ambient floor every luxel starts from.
pub const LOW_LIGHT: i32 = 20;

/// Point-to-point visibility.
pub trait RayTracer {
    /// True when nothing solid lies between `from` and `to`.
    fn trace_ray(&self, from: Vec3, to: Vec3) -> bool;
}

impl<F> RayTracer for F
where
    F: Fn(Vec3, Vec3) -> bool,
{
    fn trace_ray(&self, from: Vec3, to: Vec3) -> bool {
        self(from, to)
    }
}

/// A tracer that sees everything. Good enough for convex rooms.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSky;

impl RayTracer for OpenSky {
    fn trace_ray(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}
