// src/light/light_baker.rs
//
// Accumulates light into the scratch buffer for one face at a time and hands
// the result to the lightmap filters.

use log::info;

use crate::bsp::{BoundingBox, BspTree, Face, FaceId, Plane};
use crate::config::LightingQuality;
use crate::level::BuildContext;
use crate::light::lightmap::{compact_index, is_interp};
use crate::light::{LightKind, LightSource, Lightmap, RayTracer, SampleGrid, LOW_LIGHT};
use crate::utils::util::{clamp, i_round};

/// Faces lit between progress ticks.
pub const TICKER_INTERVAL: usize = 400;

/// Per-face working state, reused from one face to the next.
#[derive(Debug, Clone, Default)]
pub struct LightScratch {
    pub grid: SampleGrid,
    /// 16.8 fixed point accumulation, laid out per quality (see `Lightmap::store`).
    pub blocklights: Vec<i32>,
}

impl LightScratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_light_buffer(&mut self, quality: LightingQuality) {
        let (gw, gh) = (self.grid.grid_width, self.grid.grid_height);
        let total = match quality {
            LightingQuality::Fast => (1 + gw / 2) * (1 + gh / 2),
            _ => gw * gh,
        };

        self.blocklights.clear();
        self.blocklights.resize(total, LOW_LIGHT << 8);
    }

    /// Drop the buffers entirely.
    pub fn release(&mut self) {
        *self = LightScratch::default();
    }
}

fn process_light<T: RayTracer + ?Sized>(
    scratch: &mut LightScratch,
    quality: LightingQuality,
    light: &LightSource,
    tracer: &T,
) {
    let grid = &scratch.grid;

    // skip lights which are behind the face
    let perp = grid.plane().distance_to(light.origin);
    if perp <= 0.0 {
        return;
    }

    // skip lights which are too far away
    if light.kind != LightKind::Sun && perp > light.radius {
        return;
    }

    let gw = grid.grid_width;
    let gh = grid.grid_height;

    // only the corners in the fastest mode
    let (s_step, t_step) = match quality {
        LightingQuality::Fastest => (gw - 1, gh - 1),
        _ => (1, 1),
    };
    let compact_w = 1 + gw / 2;

    for t in (0..gh).step_by(t_step) {
        for s in (0..gw).step_by(s_step) {
            let slot = if quality == LightingQuality::Fast {
                // every second row and column, the gaps get interpolated
                if is_interp(s, gw) || is_interp(t, gh) {
                    continue;
                }
                compact_index(t) * compact_w + compact_index(s)
            } else {
                t * gw + s
            };

            let point = grid.point(s, t);

            if !tracer.trace_ray(point, light.origin) {
                continue;
            }

            if let Some(value) = light.contribution(point) {
                let cell = &mut scratch.blocklights[slot];
                *cell = cell.saturating_add(value);
            }
        }
    }
}

/// Bakes one face. `plane` is the plane the face looks along.
pub fn light_face<T: RayTracer + ?Sized>(
    scratch: &mut LightScratch,
    quality: LightingQuality,
    face: &Face,
    plane: Plane,
    lights: &[LightSource],
    tracer: &T,
) -> Lightmap {
    scratch.grid.build(face, plane, quality);
    scratch.clear_light_buffer(quality);

    for light in lights {
        process_light(scratch, quality, light, tracer);
    }

    let mut lmap = Lightmap::new(scratch.grid.width, scratch.grid.height);
    lmap.store(quality, &scratch.blocklights);
    lmap
}

/// Bakes every non-sky face of the tree into the context.
pub fn light_all_faces<T: RayTracer + ?Sized>(
    ctx: &mut BuildContext,
    tree: &BspTree,
    lights: &[LightSource],
    tracer: &T,
) {
    info!("Lighting World... ({} lights)", lights.len());

    let total = tree.faces.len();
    ctx.prepare_faces(total);

    for (i, face) in tree.faces.iter().enumerate() {
        // sky is drawn fullbright
        if face.is_sky() {
            continue;
        }

        let id = FaceId(i);
        let quality = ctx.options.quality;

        let mut lmap = light_face(&mut ctx.scratch, quality, face, tree.face_plane(id), lights, tracer);

        if ctx.options.flatten_uniform && lmap.is_uniform() {
            lmap.flatten();
        }

        ctx.add_face_lightmap(id, lmap);

        if i % TICKER_INTERVAL == 0 {
            ctx.tick(i, total);
        }
    }
}

/// Scalar light for a brush model, sampled at its bbox centre.
pub fn light_map_model<T: RayTracer + ?Sized>(
    bbox: &BoundingBox,
    lights: &[LightSource],
    tracer: &T,
) -> u8 {
    let mid = bbox.center();
    let mut value = LOW_LIGHT << 8;

    for light in lights {
        if !tracer.trace_ray(mid, light.origin) {
            continue;
        }
        if let Some(add) = light.contribution(mid) {
            value = value.saturating_add(add);
        }
    }

    clamp(i_round(value as f64 / 256.0), 0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::{NodeId, Vec3};
    use crate::config::BuildOptions;
    use crate::light::{find_lights, Entity, OpenSky};

    /// 128x128 floor at z=0 facing up, texture axes aligned with X/Y.
    fn floor_face() -> Face {
        Face {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 128.0, 0.0),
                Vec3::new(128.0, 128.0, 0.0),
                Vec3::new(128.0, 0.0, 0.0),
            ],
            node: NodeId(0),
            side: 0,
            texture: "floor1".to_string(),
            s: [1.0, 0.0, 0.0, 0.0],
            t: [0.0, 1.0, 0.0, 0.0],
        }
    }

    fn up() -> Plane {
        Plane::new(Vec3::new(0.0, 0.0, 1.0), 0.0)
    }

    fn point_light(x: f64, y: f64, z: f64, level: i32, radius: f64) -> LightSource {
        LightSource {
            kind: LightKind::Point,
            origin: Vec3::new(x, y, z),
            radius,
            level: level << 8,
        }
    }

    #[test]
    fn test_light_above_centre_peaks_there() {
        let mut scratch = LightScratch::new();
        let light = point_light(64.0, 64.0, 64.0, 200, 300.0);
        let lmap = light_face(&mut scratch, LightingQuality::Normal, &floor_face(), up(), &[light], &OpenSky);

        assert_eq!((lmap.width(), lmap.height()), (9, 9));

        let centre = lmap.sample(4, 4);
        let max = *lmap.samples().iter().max().unwrap();
        assert_eq!(centre, max);
        assert!(centre > lmap.sample(0, 0));
        assert!(centre > lmap.sample(8, 4));
        assert!(centre > lmap.sample(4, 0));
    }

    #[test]
    fn test_light_behind_face_gives_floor() {
        let mut scratch = LightScratch::new();
        let lights = [
            point_light(64.0, 64.0, -32.0, 300, 300.0),
            point_light(0.0, 0.0, 0.0, 300, 300.0),
            LightSource {
                kind: LightKind::Sun,
                origin: Vec3::new(0.0, 0.0, -4096.0),
                radius: 30.0,
                level: 30 << 8,
            },
        ];
        for quality in [
            LightingQuality::Fastest,
            LightingQuality::Fast,
            LightingQuality::Normal,
            LightingQuality::Best,
        ] {
            let lmap = light_face(&mut scratch, quality, &floor_face(), up(), &lights, &OpenSky);
            assert!(lmap.samples().iter().all(|&v| v == LOW_LIGHT as u8), "{:?}", quality);
        }
    }

    #[test]
    fn test_radius_cutoff_uses_perpendicular_distance() {
        let mut scratch = LightScratch::new();
        let far = point_light(64.0, 64.0, 400.0, 300, 300.0);
        let lmap = light_face(&mut scratch, LightingQuality::Normal, &floor_face(), up(), &[far], &OpenSky);
        assert!(lmap.samples().iter().all(|&v| v == LOW_LIGHT as u8));
    }

    #[test]
    fn test_sun_ignores_distance() {
        let mut scratch = LightScratch::new();
        let sun = LightSource {
            kind: LightKind::Sun,
            origin: Vec3::new(0.0, 0.0, 8192.0),
            radius: 30.0,
            level: 30 << 8,
        };
        let lmap = light_face(&mut scratch, LightingQuality::Best, &floor_face(), up(), &[sun], &OpenSky);
        assert!(lmap.samples().iter().all(|&v| v == 50));
    }

    #[test]
    fn test_tracer_blocks_light() {
        let mut scratch = LightScratch::new();
        let light = point_light(64.0, 64.0, 64.0, 200, 300.0);
        // a wall along x = 64 shadows the low-x half
        let tracer = |from: Vec3, _to: Vec3| from.x >= 64.0;
        let lmap = light_face(&mut scratch, LightingQuality::Normal, &floor_face(), up(), &[light], &tracer);
        assert_eq!(lmap.sample(0, 4), LOW_LIGHT as u8);
        assert!(lmap.sample(6, 4) > LOW_LIGHT as u8);
    }

    #[test]
    fn test_fast_quality_matches_normal_on_samples() {
        let mut scratch = LightScratch::new();
        let light = point_light(30.0, 90.0, 50.0, 250, 400.0);
        let normal = light_face(&mut scratch, LightingQuality::Normal, &floor_face(), up(), &[light], &OpenSky);
        let fast = light_face(&mut scratch, LightingQuality::Fast, &floor_face(), up(), &[light], &OpenSky);

        assert_eq!((fast.width(), fast.height()), (9, 9));
        for t in (0..9).step_by(2) {
            for s in (0..9).step_by(2) {
                assert_eq!(fast.sample(s, t), normal.sample(s, t));
            }
        }
    }

    #[test]
    fn test_fastest_corners_match_normal() {
        let mut scratch = LightScratch::new();
        let light = point_light(30.0, 90.0, 50.0, 250, 400.0);
        let normal = light_face(&mut scratch, LightingQuality::Normal, &floor_face(), up(), &[light], &OpenSky);
        let fastest = light_face(&mut scratch, LightingQuality::Fastest, &floor_face(), up(), &[light], &OpenSky);
        for (s, t) in [(0, 0), (8, 0), (0, 8), (8, 8)] {
            assert_eq!(fastest.sample(s, t), normal.sample(s, t));
        }
    }

    #[test]
    fn test_light_all_faces_skips_sky_and_flattens() {
        let mut tree = BspTree::new();
        let node = tree.add_node(crate::bsp::Node::new(up(), BoundingBox::new_empty()));
        let mut face = floor_face();
        face.node = node;
        let lit = tree.add_face(face.clone());
        face.texture = "sky4".to_string();
        let sky = tree.add_face(face);

        let mut ctx = BuildContext::new(BuildOptions::default());
        light_all_faces(&mut ctx, &tree, &[], &OpenSky);

        assert!(ctx.face_lightmap(sky).is_none());
        let lmap = ctx.face_lightmap(lit).unwrap();
        assert!(lmap.is_flat());
        assert_eq!(lmap.samples(), &[LOW_LIGHT as u8]);
    }

    #[test]
    fn test_flatten_can_be_disabled() {
        let mut tree = BspTree::new();
        let node = tree.add_node(crate::bsp::Node::new(up(), BoundingBox::new_empty()));
        let mut face = floor_face();
        face.node = node;
        let id = tree.add_face(face);

        let options = BuildOptions { flatten_uniform: false, ..BuildOptions::default() };
        let mut ctx = BuildContext::new(options);
        light_all_faces(&mut ctx, &tree, &[], &OpenSky);
        assert_eq!(ctx.face_lightmap(id).unwrap().width(), 9);
    }

    #[test]
    fn test_ticker_called() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut tree = BspTree::new();
        let node = tree.add_node(crate::bsp::Node::new(up(), BoundingBox::new_empty()));
        for _ in 0..401 {
            let mut face = floor_face();
            face.node = node;
            tree.add_face(face);
        }

        let ticks = Rc::new(Cell::new(0));
        let seen = ticks.clone();
        let mut ctx = BuildContext::new(BuildOptions {
            quality: LightingQuality::Fastest,
            ..BuildOptions::default()
        });
        ctx.set_ticker(move |_, _| seen.set(seen.get() + 1));
        light_all_faces(&mut ctx, &tree, &[], &OpenSky);
        assert_eq!(ticks.get(), 2);
    }

    #[test]
    fn test_sky_faces_do_not_tick() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut tree = BspTree::new();
        let node = tree.add_node(crate::bsp::Node::new(up(), BoundingBox::new_empty()));
        let mut face = floor_face();
        face.node = node;
        face.texture = "sky1".to_string();
        tree.add_face(face.clone());
        face.texture = "floor1".to_string();
        tree.add_face(face);

        let ticks = Rc::new(Cell::new(0));
        let seen = ticks.clone();
        let mut ctx = BuildContext::new(BuildOptions::default());
        ctx.set_ticker(move |_, _| seen.set(seen.get() + 1));
        light_all_faces(&mut ctx, &tree, &[], &OpenSky);
        assert_eq!(ticks.get(), 0);
    }

    #[test]
    fn test_very_bright_suns_saturate() {
        let entities = [
            Entity::new("oblige_sun", Vec3::new(64.0, 64.0, 4096.0)).with_prop("light", 5000000),
            Entity::new("oblige_sun", Vec3::new(32.0, 32.0, 4096.0)).with_prop("light", 5000000),
        ];
        let lights = find_lights(&entities);
        assert_eq!(lights.len(), 2);

        let mut scratch = LightScratch::new();
        for quality in [
            LightingQuality::Fastest,
            LightingQuality::Fast,
            LightingQuality::Normal,
            LightingQuality::Best,
        ] {
            let lmap = light_face(&mut scratch, quality, &floor_face(), up(), &lights, &OpenSky);
            assert!(lmap.samples().iter().all(|&v| v == 255), "{:?}", quality);
        }

        let bbox = BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(32.0, 32.0, 32.0));
        assert_eq!(light_map_model(&bbox, &lights, &OpenSky), 255);
    }

    #[test]
    fn test_map_model_light() {
        let bbox = BoundingBox::new(Vec3::new(-16.0, -16.0, 0.0), Vec3::new(16.0, 16.0, 32.0));
        assert_eq!(light_map_model(&bbox, &[], &OpenSky), LOW_LIGHT as u8);

        let light = point_light(0.0, 0.0, 116.0, 100, 200.0);
        // 100 units away from the centre: half of 100
        assert_eq!(light_map_model(&bbox, &[light], &OpenSky), 70);

        let blocked = |_: Vec3, _: Vec3| false;
        assert_eq!(light_map_model(&bbox, &[light], &blocked), LOW_LIGHT as u8);

        let bright = point_light(0.0, 0.0, 16.0, 1000, 200.0);
        assert_eq!(light_map_model(&bbox, &[bright], &OpenSky), 255);
    }
}
