// src/light/light_grid.rs
//
// Texture-space sample grid for one face. Positions are world-space points
// one unit in front of the face, one per accumulation cell.

use crate::bsp::{Face, Plane, Vec3, TEXEL_SIZE};
use crate::config::LightingQuality;

/// Below this the texture axes are treated as lying in the face plane.
const PARALLEL_EPSILON: f64 = 1e-6;

/// World/texture transforms of a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceVectors {
    pub plane: Plane,
    pub texorg: Vec3,
    pub textoworld: [Vec3; 2],
}

impl FaceVectors {
    /// `plane` is the plane the face looks along (side already applied).
    pub fn new(face: &Face, plane: Plane) -> Self {
        let worldtotex = [Vec3::from_axis(&face.s), Vec3::from_axis(&face.t)];

        // points can slide along this without changing their S/T
        let mut texnormal = worldtotex[0].cross(worldtotex[1]).normalize();

        let mut distscale = texnormal.dot(plane.normal);
        if distscale.abs() < PARALLEL_EPSILON {
            texnormal = plane.normal;
            distscale = 1.0;
        }
        if distscale < 0.0 {
            distscale = -distscale;
            texnormal = -texnormal;
        }

        // ratio of distance along the texture normal to distance along the plane normal
        let distscale = 1.0 / distscale;

        let mut textoworld = [Vec3::ZERO; 2];
        for i in 0..2 {
            let len_sq = worldtotex[i].dot(worldtotex[i]);
            let dist = worldtotex[i].dot(plane.normal) * distscale;
            textoworld[i] = (worldtotex[i] - texnormal * dist) * (1.0 / len_sq);
        }

        let mut texorg = -(textoworld[0] * face.s[3]) - textoworld[1] * face.t[3];

        // back onto the face plane, then 1 unit off it
        let o_dist = (texorg.dot(plane.normal) - plane.dist - 1.0) * distscale;
        texorg = texorg - texnormal * o_dist;

        FaceVectors { plane, texorg, textoworld }
    }

    /// World position of texture coordinate (us, ut).
    pub fn point_at(&self, us: f64, ut: f64) -> Vec3 {
        self.texorg + self.textoworld[0] * us + self.textoworld[1] * ut
    }
}

/// Lightmap extents of a face: min luxel and size, at least 2x2.
pub fn face_extents(face: &Face) -> ([i32; 2], usize, usize) {
    let (min_s, min_t, max_s, max_t) = face.st_bounds();

    let bmin_s = (min_s / TEXEL_SIZE).floor() as i32;
    let bmin_t = (min_t / TEXEL_SIZE).floor() as i32;
    let bmax_s = (max_s / TEXEL_SIZE).ceil() as i32;
    let bmax_t = (max_t / TEXEL_SIZE).ceil() as i32;

    let width = (bmax_s - bmin_s + 1).max(2) as usize;
    let height = (bmax_t - bmin_t + 1).max(2) as usize;

    ([bmin_s, bmin_t], width, height)
}

/// Sample positions for the face currently being lit.
///
/// The position buffer is kept between faces and only grows.
#[derive(Debug, Clone)]
pub struct SampleGrid {
    pub vectors: FaceVectors,
    pub tex_mins: [i32; 2],
    /// Stored lightmap size.
    pub width: usize,
    pub height: usize,
    /// Accumulation grid size: doubled at best quality.
    pub grid_width: usize,
    pub grid_height: usize,
    points: Vec<Vec3>,
}

impl Default for SampleGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleGrid {
    pub fn new() -> Self {
        SampleGrid {
            vectors: FaceVectors {
                plane: Plane::new(Vec3::ZERO, 0.0),
                texorg: Vec3::ZERO,
                textoworld: [Vec3::ZERO; 2],
            },
            tex_mins: [0, 0],
            width: 0,
            height: 0,
            grid_width: 0,
            grid_height: 0,
            points: Vec::new(),
        }
    }

    pub fn build(&mut self, face: &Face, plane: Plane, quality: LightingQuality) {
        self.vectors = FaceVectors::new(face, plane);

        let (tex_mins, width, height) = face_extents(face);
        self.tex_mins = tex_mins;
        self.width = width;
        self.height = height;

        let (origin_s, origin_t, step) = if quality == LightingQuality::Best {
            self.grid_width = width * 2;
            self.grid_height = height * 2;
            // 2x2 samples straddle each luxel centre, half a step either side
            let half = TEXEL_SIZE / 4.0;
            (
                tex_mins[0] as f64 * TEXEL_SIZE - half,
                tex_mins[1] as f64 * TEXEL_SIZE - half,
                TEXEL_SIZE / 2.0,
            )
        } else {
            self.grid_width = width;
            self.grid_height = height;
            (
                tex_mins[0] as f64 * TEXEL_SIZE,
                tex_mins[1] as f64 * TEXEL_SIZE,
                TEXEL_SIZE,
            )
        };

        self.points.clear();
        for t in 0..self.grid_height {
            for s in 0..self.grid_width {
                let us = origin_s + s as f64 * step;
                let ut = origin_t + t as f64 * step;
                self.points.push(self.vectors.point_at(us, ut));
            }
        }
    }

    pub fn point(&self, s: usize, t: usize) -> Vec3 {
        self.points[t * self.grid_width + s]
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn plane(&self) -> &Plane {
        &self.vectors.plane
    }
}
