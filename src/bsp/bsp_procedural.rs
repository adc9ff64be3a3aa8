// src/bsp/bsp_procedural.rs
//
// Generates a single lit box room as a ready-made BSP tree. Used by the
// command line tool and as a realistic fixture for the level build.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::bsp::{BoundingBox, BspTree, Child, Contents, Face, Leaf, Node, NodeId, Plane, Vec3};
use crate::light::Entity;

/// Room dimensions snap to this grid so lightmap extents stay whole.
const ROOM_GRID: i32 = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub min_room_size: i32,
    pub max_room_size: i32,
    pub min_room_height: i32,
    pub max_room_height: i32,
    pub light_count: usize,
    /// Sky ceiling plus a sun entity.
    pub sun: bool,
    /// Floating boxes lit as brush models.
    pub map_models: usize,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            min_room_size: 128,
            max_room_size: 512,
            min_room_height: 128,
            max_room_height: 256,
            light_count: 2,
            sun: false,
            map_models: 1,
            seed: None,
        }
    }
}

/// Everything the level build needs from a generated room.
#[derive(Debug, Clone)]
pub struct GeneratedLevel {
    pub tree: BspTree,
    pub entities: Vec<Entity>,
    pub map_models: Vec<BoundingBox>,
    pub bounds: BoundingBox,
}

pub struct RoomGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

/// One wall of the room: inward plane, corners, texture axes.
struct Wall {
    plane: Plane,
    corners: [Vec3; 4],
    texture: &'static str,
    s: [f64; 4],
    t: [f64; 4],
}

impl RoomGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        RoomGenerator { config, rng }
    }

    pub fn generate(&mut self) -> GeneratedLevel {
        let w = self.snapped(self.config.min_room_size, self.config.max_room_size);
        let d = self.snapped(self.config.min_room_size, self.config.max_room_size);
        let h = self.snapped(self.config.min_room_height, self.config.max_room_height);

        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::new(w, d, h));
        debug!("generated room {}x{}x{}", w, d, h);

        let tree = self.build_tree(&bounds);
        let entities = self.place_entities(&bounds);
        let map_models = self.place_map_models(&bounds);

        GeneratedLevel { tree, entities, map_models, bounds }
    }

    fn snapped(&mut self, min: i32, max: i32) -> f64 {
        let lo = (min / ROOM_GRID).max(1);
        let hi = (max / ROOM_GRID).max(lo);
        (self.rng.random_range(lo..=hi) * ROOM_GRID) as f64
    }

    fn walls(&self, bounds: &BoundingBox) -> Vec<Wall> {
        let (w, d, h) = (bounds.maxs.x, bounds.maxs.y, bounds.maxs.z);
        let v = Vec3::new;

        let ceiling = if self.config.sun { "sky1" } else { "ceil1" };

        vec![
            Wall {
                plane: Plane::new(v(0.0, 0.0, 1.0), 0.0),
                corners: [v(0.0, 0.0, 0.0), v(0.0, d, 0.0), v(w, d, 0.0), v(w, 0.0, 0.0)],
                texture: "floor1",
                s: [1.0, 0.0, 0.0, 0.0],
                t: [0.0, -1.0, 0.0, 0.0],
            },
            Wall {
                plane: Plane::new(v(0.0, 0.0, -1.0), -h),
                corners: [v(0.0, 0.0, h), v(w, 0.0, h), v(w, d, h), v(0.0, d, h)],
                texture: ceiling,
                s: [1.0, 0.0, 0.0, 0.0],
                t: [0.0, -1.0, 0.0, 0.0],
            },
            Wall {
                plane: Plane::new(v(1.0, 0.0, 0.0), 0.0),
                corners: [v(0.0, 0.0, 0.0), v(0.0, 0.0, h), v(0.0, d, h), v(0.0, d, 0.0)],
                texture: "wall1",
                s: [0.0, 1.0, 0.0, 0.0],
                t: [0.0, 0.0, -1.0, 0.0],
            },
            Wall {
                plane: Plane::new(v(-1.0, 0.0, 0.0), -w),
                corners: [v(w, 0.0, 0.0), v(w, d, 0.0), v(w, d, h), v(w, 0.0, h)],
                texture: "wall1",
                s: [0.0, 1.0, 0.0, 0.0],
                t: [0.0, 0.0, -1.0, 0.0],
            },
            Wall {
                plane: Plane::new(v(0.0, 1.0, 0.0), 0.0),
                corners: [v(0.0, 0.0, 0.0), v(w, 0.0, 0.0), v(w, 0.0, h), v(0.0, 0.0, h)],
                texture: "wall2",
                s: [1.0, 0.0, 0.0, 0.0],
                t: [0.0, 0.0, -1.0, 0.0],
            },
            Wall {
                plane: Plane::new(v(0.0, -1.0, 0.0), -d),
                corners: [v(0.0, d, 0.0), v(0.0, d, h), v(w, d, h), v(w, d, 0.0)],
                texture: "wall2",
                s: [1.0, 0.0, 0.0, 0.0],
                t: [0.0, 0.0, -1.0, 0.0],
            },
        ]
    }

    /// A convex chain: each wall node keeps the room in front and solid
    /// behind, the last front child is the room's empty leaf.
    fn build_tree(&self, bounds: &BoundingBox) -> BspTree {
        let mut tree = BspTree::new();
        let mut faces = Vec::new();
        let mut prev: Option<NodeId> = None;

        for wall in self.walls(bounds) {
            let node = tree.add_node(Node::new(wall.plane, *bounds));

            faces.push(tree.add_face(Face {
                vertices: wall.corners.to_vec(),
                node,
                side: 0,
                texture: wall.texture.to_string(),
                s: wall.s,
                t: wall.t,
            }));

            match prev {
                Some(p) => tree.node_mut(p).front = Child::Node(node),
                None => tree.root = node,
            }
            prev = Some(node);
        }

        let mut room = Leaf::new(Contents::Empty, *bounds);
        room.faces = faces;
        let leaf = tree.add_leaf(room);

        if let Some(last) = prev {
            tree.node_mut(last).front = Child::Leaf(leaf);
        }
        tree
    }

    fn random_point(&mut self, bounds: &BoundingBox, margin: f64) -> Vec3 {
        let mut coord = |lo: f64, hi: f64| {
            if hi - lo <= 2.0 * margin {
                (lo + hi) / 2.0
            } else {
                self.rng.random_range(lo + margin..hi - margin)
            }
        };
        let x = coord(bounds.mins.x, bounds.maxs.x);
        let y = coord(bounds.mins.y, bounds.maxs.y);
        let z = coord(bounds.mins.z, bounds.maxs.z);
        Vec3::new(x, y, z)
    }

    fn place_entities(&mut self, bounds: &BoundingBox) -> Vec<Entity> {
        let mut entities = Vec::new();

        let centre = bounds.center();
        entities.push(Entity::new(
            "info_player_start",
            Vec3::new(centre.x, centre.y, bounds.mins.z + 24.0),
        ));

        for _ in 0..self.config.light_count {
            let origin = self.random_point(bounds, 16.0);
            let level = self.rng.random_range(150..=300);
            entities.push(Entity::new("light", origin).with_prop("light", level));
        }

        if self.config.sun {
            let origin = Vec3::new(centre.x, centre.y, bounds.maxs.z + 1024.0);
            entities.push(Entity::new("oblige_sun", origin).with_prop("light", 40));
        }

        entities
    }

    fn place_map_models(&mut self, bounds: &BoundingBox) -> Vec<BoundingBox> {
        (0..self.config.map_models)
            .map(|_| {
                let centre = self.random_point(bounds, 24.0);
                let half = Vec3::new(16.0, 16.0, 16.0);
                BoundingBox::new(centre - half, centre + half)
            })
            .collect()
    }
}
