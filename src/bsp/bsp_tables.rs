// src/bsp/bsp_tables.rs
//
// Plane, vertex and edge tables. The writer only ever asks these for indices;
// the tables own the deduplication and the final lump formatting.

use std::collections::HashMap;
use std::io::{self, Write};

use byteorder::{WriteBytesExt, LE};

use crate::bsp::{Plane, Vec3};
use crate::error::{check_limit, Result};
use crate::level::{Lump, LumpKind, LumpRecord};

pub const MAX_MAP_PLANES: usize = 32767;
pub const MAX_MAP_VERTS: usize = 65535;
pub const MAX_MAP_EDGES: usize = 256000;

/// Vertices closer than this snap together.
const VERTEX_GRID: f64 = 1024.0;

/// The index services the BSP writer needs from the rest of the compiler.
pub trait GeometryTables {
    /// Index of the plane in canonical orientation, plus whether `plane` had
    /// to be flipped to get there.
    fn add_plane(&mut self, plane: &Plane) -> Result<(i32, bool)>;

    fn add_vertex(&mut self, point: Vec3) -> Result<u16>;

    /// Signed edge index: negative when the stored edge runs `v2 -> v1`.
    fn add_edge(&mut self, v1: u16, v2: u16) -> Result<i32>;

    fn write_planes(&self) -> Result<Lump>;
    fn write_vertices(&self) -> Result<Lump>;
    fn write_edges(&self) -> Result<Lump>;
}

/// Plane record (20 bytes): normal, distance and axial type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DPlane {
    pub normal: [f32; 3],
    pub dist: f32,
    pub kind: i32,
}

impl LumpRecord for DPlane {
    const SIZE: usize = 20;

    fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for n in &self.normal {
            writer.write_f32::<LE>(*n)?;
        }
        writer.write_f32::<LE>(self.dist)?;
        writer.write_i32::<LE>(self.kind)?;
        Ok(())
    }
}

struct DVertex(Vec3);

impl LumpRecord for DVertex {
    const SIZE: usize = 12;

    fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LE>(self.0.x as f32)?;
        writer.write_f32::<LE>(self.0.y as f32)?;
        writer.write_f32::<LE>(self.0.z as f32)?;
        Ok(())
    }
}

struct DEdge(u16, u16);

impl LumpRecord for DEdge {
    const SIZE: usize = 4;

    fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LE>(self.0)?;
        writer.write_u16::<LE>(self.1)?;
        Ok(())
    }
}

fn dominant_axis(normal: Vec3) -> usize {
    let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    if ax >= ay && ax >= az {
        0
    } else if ay >= az {
        1
    } else {
        2
    }
}

/// Positive dominant axis; returns the canonical plane and the flip flag.
pub fn canonical_plane(plane: &Plane) -> (Plane, bool) {
    let axis = dominant_axis(plane.normal);
    if plane.normal.component(axis) < 0.0 {
        (plane.flipped(), true)
    } else {
        (*plane, false)
    }
}

/// 0-2 for planes perpendicular to X/Y/Z, 3-5 for "mostly" X/Y/Z.
pub fn plane_type(normal: Vec3) -> i32 {
    let axis = dominant_axis(normal);
    if (normal.component(axis).abs() - 1.0).abs() < 1e-6 {
        axis as i32
    } else {
        3 + axis as i32
    }
}

#[derive(Debug, Default)]
pub struct BspTables {
    planes: Vec<DPlane>,
    plane_map: HashMap<[i64; 4], i32>,
    vertices: Vec<Vec3>,
    vertex_map: HashMap<[i64; 3], u16>,
    edges: Vec<(u16, u16)>,
    edge_map: HashMap<(u16, u16), i32>,
}

impl BspTables {
    pub fn new() -> Self {
        let mut tables = BspTables::default();
        tables.reset();
        tables
    }

    pub fn reset(&mut self) {
        self.planes.clear();
        self.plane_map.clear();
        self.vertices.clear();
        self.vertex_map.clear();
        self.edges.clear();
        self.edge_map.clear();

        // edge 0 can't be referenced with a sign, so it is a dummy
        self.edges.push((0, 0));
    }

    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Includes the dummy edge 0.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, index: usize) -> Option<(u16, u16)> {
        self.edges.get(index).copied()
    }
}

impl GeometryTables for BspTables {
    fn add_plane(&mut self, plane: &Plane) -> Result<(i32, bool)> {
        let (canon, flipped) = canonical_plane(plane);
        let key = [
            (canon.normal.x * 65536.0).round() as i64,
            (canon.normal.y * 65536.0).round() as i64,
            (canon.normal.z * 65536.0).round() as i64,
            (canon.dist * 100.0).round() as i64,
        ];

        if let Some(&index) = self.plane_map.get(&key) {
            return Ok((index, flipped));
        }

        check_limit("PLANES", self.planes.len() + 1, MAX_MAP_PLANES)?;

        let index = self.planes.len() as i32;
        self.planes.push(DPlane {
            normal: [canon.normal.x as f32, canon.normal.y as f32, canon.normal.z as f32],
            dist: canon.dist as f32,
            kind: plane_type(canon.normal),
        });
        self.plane_map.insert(key, index);
        Ok((index, flipped))
    }

    fn add_vertex(&mut self, point: Vec3) -> Result<u16> {
        let key = [
            (point.x * VERTEX_GRID).round() as i64,
            (point.y * VERTEX_GRID).round() as i64,
            (point.z * VERTEX_GRID).round() as i64,
        ];

        if let Some(&index) = self.vertex_map.get(&key) {
            return Ok(index);
        }

        check_limit("VERTEXES", self.vertices.len() + 1, MAX_MAP_VERTS)?;

        let index = self.vertices.len() as u16;
        self.vertices.push(point);
        self.vertex_map.insert(key, index);
        Ok(index)
    }

    fn add_edge(&mut self, v1: u16, v2: u16) -> Result<i32> {
        if let Some(&index) = self.edge_map.get(&(v1, v2)) {
            return Ok(index);
        }
        if let Some(&index) = self.edge_map.get(&(v2, v1)) {
            return Ok(-index);
        }

        check_limit("EDGES", self.edges.len() + 1, MAX_MAP_EDGES)?;

        let index = self.edges.len() as i32;
        self.edges.push((v1, v2));
        self.edge_map.insert((v1, v2), index);
        Ok(index)
    }

    fn write_planes(&self) -> Result<Lump> {
        let mut lump = Lump::new(LumpKind::Planes);
        for plane in &self.planes {
            lump.append_record(plane)?;
        }
        Ok(lump)
    }

    fn write_vertices(&self) -> Result<Lump> {
        let mut lump = Lump::new(LumpKind::Vertexes);
        for v in &self.vertices {
            lump.append_record(&DVertex(*v))?;
        }
        Ok(lump)
    }

    fn write_edges(&self) -> Result<Lump> {
        let mut lump = Lump::new(LumpKind::Edges);
        for &(v1, v2) in &self.edges {
            lump.append_record(&DEdge(v1, v2))?;
        }
        Ok(lump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_flip_shares_index() {
        let mut tables = BspTables::new();
        let up = Plane::new(Vec3::new(0.0, 0.0, 1.0), 64.0);
        let (a, flip_a) = tables.add_plane(&up).unwrap();
        let (b, flip_b) = tables.add_plane(&up.flipped()).unwrap();
        assert_eq!(a, b);
        assert!(!flip_a);
        assert!(flip_b);
        assert_eq!(tables.num_planes(), 1);
    }

    #[test]
    fn test_plane_type() {
        assert_eq!(plane_type(Vec3::new(1.0, 0.0, 0.0)), 0);
        assert_eq!(plane_type(Vec3::new(0.0, 0.0, 1.0)), 2);
        let slope = Vec3::new(0.0, 0.6, 0.8);
        assert_eq!(plane_type(slope), 5);
    }

    #[test]
    fn test_vertex_dedup() {
        let mut tables = BspTables::new();
        let a = tables.add_vertex(Vec3::new(16.0, 32.0, 0.0)).unwrap();
        let b = tables.add_vertex(Vec3::new(16.0001, 32.0, 0.0)).unwrap();
        let c = tables.add_vertex(Vec3::new(16.0, 48.0, 0.0)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(tables.num_vertices(), 2);
    }

    #[test]
    fn test_edge_signs() {
        let mut tables = BspTables::new();
        let e = tables.add_edge(3, 7).unwrap();
        assert_eq!(e, 1);
        assert_eq!(tables.add_edge(3, 7).unwrap(), 1);
        assert_eq!(tables.add_edge(7, 3).unwrap(), -1);
        assert_eq!(tables.edge(1), Some((3, 7)));
        assert_eq!(tables.num_edges(), 2);
    }

    #[test]
    fn test_lump_sizes() {
        let mut tables = BspTables::new();
        tables.add_plane(&Plane::new(Vec3::new(1.0, 0.0, 0.0), 0.0)).unwrap();
        tables.add_vertex(Vec3::ZERO).unwrap();
        tables.add_vertex(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        tables.add_edge(0, 1).unwrap();
        assert_eq!(tables.write_planes().unwrap().len(), 20);
        assert_eq!(tables.write_vertices().unwrap().len(), 24);
        assert_eq!(tables.write_edges().unwrap().len(), 8);
    }
}
