// src/level/level_build.rs
//
// One complete level pass: bake lighting, lay out the lighting lump, write
// the tree and then the tables the tree writer filled in.

use log::info;

use crate::bsp::{write_bsp, BoundingBox, BspTree, GeometryTables};
use crate::error::Result;
use crate::level::{BuildContext, Lump};
use crate::light::{find_lights, light_all_faces, light_map_model, write_lighting_lump, Entity, RayTracer};
use crate::texture::{write_texture_lump, TextureSource};

/// What the front end hands over for one level.
#[derive(Debug, Clone)]
pub struct LevelInput {
    pub tree: BspTree,
    pub entities: Vec<Entity>,
    /// Bounding boxes of brush models that need a scalar light value.
    pub map_models: Vec<BoundingBox>,
}

/// Every lump this crate produces, plus the map model light values.
#[derive(Debug, Clone)]
pub struct LevelLumps {
    pub planes: Lump,
    pub textures: Lump,
    pub vertexes: Lump,
    pub nodes: Lump,
    pub texinfo: Lump,
    pub faces: Lump,
    pub lighting: Lump,
    pub leafs: Lump,
    pub mark_surfs: Lump,
    pub edges: Lump,
    pub surf_edges: Lump,
    pub model_lights: Vec<u8>,
}

impl LevelLumps {
    /// In directory order.
    pub fn lumps(&self) -> [&Lump; 11] {
        [
            &self.planes,
            &self.textures,
            &self.vertexes,
            &self.nodes,
            &self.texinfo,
            &self.faces,
            &self.lighting,
            &self.leafs,
            &self.mark_surfs,
            &self.edges,
            &self.surf_edges,
        ]
    }
}

/// Runs the full build. The context is reset first; any error abandons the
/// level and no lumps come back.
pub fn build_level<G, S, T>(
    ctx: &mut BuildContext,
    input: &LevelInput,
    tables: &mut G,
    textures: &mut S,
    tracer: &T,
) -> Result<LevelLumps>
where
    G: GeometryTables + ?Sized,
    S: TextureSource + ?Sized,
    T: RayTracer + ?Sized,
{
    ctx.reset();

    info!(
        "Building level: {} nodes, {} leafs, {} faces (quality {:?})",
        input.tree.nodes.len(),
        input.tree.leafs.len().saturating_sub(1),
        input.tree.faces.len(),
        ctx.options.quality
    );

    let lights = find_lights(&input.entities);

    light_all_faces(ctx, &input.tree, &lights, tracer);

    let model_lights = input
        .map_models
        .iter()
        .map(|bbox| light_map_model(bbox, &lights, tracer))
        .collect();

    let color = ctx.options.color_lighting;
    let lighting = write_lighting_lump(&mut ctx.lightmaps, color);

    let structural = write_bsp(&input.tree, ctx, tables)?;

    let texinfo = ctx.texinfo.write_lump()?;
    let textures = write_texture_lump(&ctx.miptex, textures)?;

    let planes = tables.write_planes()?;
    let vertexes = tables.write_vertices()?;
    let edges = tables.write_edges()?;

    info!(
        "Level done: {} faces, {} lightmaps, {} texinfos, {} textures, {} bytes of lighting",
        ctx.total_faces,
        ctx.lightmaps.len(),
        ctx.texinfo.len(),
        ctx.miptex.len(),
        lighting.len()
    );

    Ok(LevelLumps {
        planes,
        textures,
        vertexes,
        nodes: structural.nodes,
        texinfo,
        faces: structural.faces,
        lighting,
        leafs: structural.leafs,
        mark_surfs: structural.mark_surfs,
        edges,
        surf_edges: structural.surf_edges,
        model_lights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::{
        BspTables, Child, Contents, DFace, DLeaf, DNode, Face, GeneratorConfig, Leaf, Node, Plane,
        RoomGenerator, Vec3,
    };
    use crate::config::{BuildOptions, LightingQuality};
    use crate::error::BuildError;
    use crate::level::LumpRecord;
    use crate::light::{OpenSky, FLAT_LIGHTMAP_SIZE, LOW_LIGHT};
    use crate::texture::{MemoryTextures, TexInfo};
    use crate::utils::captured_log;
    use byteorder::{ReadBytesExt, LE};

    const LADDER: usize = (128 + 64) * FLAT_LIGHTMAP_SIZE;

    /// A 128x128 floor facing up, one empty leaf above it.
    fn floor_level(texture: &str, entities: Vec<Entity>) -> LevelInput {
        let bbox = BoundingBox::new(Vec3::ZERO, Vec3::new(128.0, 128.0, 128.0));
        let mut tree = BspTree::new();
        let root = tree.add_node(Node::new(Plane::new(Vec3::new(0.0, 0.0, 1.0), 0.0), bbox));
        let face = tree.add_face(Face {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 128.0, 0.0),
                Vec3::new(128.0, 128.0, 0.0),
                Vec3::new(128.0, 0.0, 0.0),
            ],
            node: root,
            side: 0,
            texture: texture.to_string(),
            s: [1.0, 0.0, 0.0, 0.0],
            t: [0.0, 1.0, 0.0, 0.0],
        });
        let mut leaf = Leaf::new(Contents::Empty, bbox);
        leaf.faces.push(face);
        let leaf = tree.add_leaf(leaf);
        tree.node_mut(root).front = Child::Leaf(leaf);
        tree.root = root;

        LevelInput { tree, entities, map_models: Vec::new() }
    }

    fn face_light_ofs(lumps: &LevelLumps, index: usize) -> i32 {
        let mut rec = &lumps.faces.as_bytes()[index * DFace::SIZE + 16..];
        rec.read_i32::<LE>().unwrap()
    }

    fn options(quality: LightingQuality) -> BuildOptions {
        BuildOptions { quality, ..BuildOptions::default() }
    }

    #[test]
    fn test_lit_floor_peaks_under_light() {
        let light = Entity::new("light", Vec3::new(64.0, 64.0, 64.0)).with_prop("light", 200);
        let input = floor_level("floor1", vec![light]);

        let mut ctx = BuildContext::new(options(LightingQuality::Normal));
        let mut tables = BspTables::new();
        let mut textures = MemoryTextures::new();
        let lumps = build_level(&mut ctx, &input, &mut tables, &mut textures, &OpenSky).unwrap();

        let ofs = face_light_ofs(&lumps, 0);
        assert_eq!(ofs as usize, LADDER);

        let lmap = &lumps.lighting.as_bytes()[LADDER..LADDER + 81];
        let brightest = (0..81).max_by_key(|&i| lmap[i]).unwrap();
        assert_eq!(brightest, 4 * 9 + 4);
        assert!(lmap[40] > lmap[0]);
        assert!(lmap[40] > lmap[8]);
        assert!(lmap[40] > lmap[80]);
        assert_eq!(lumps.lighting.len(), LADDER + 81);
    }

    #[test]
    fn test_unlit_floor_is_flat_ambient() {
        let behind = Entity::new("light", Vec3::new(64.0, 64.0, -64.0));
        let input = floor_level("floor1", vec![behind]);

        let mut ctx = BuildContext::new(options(LightingQuality::Best));
        let lumps = build_level(
            &mut ctx,
            &input,
            &mut BspTables::new(),
            &mut MemoryTextures::new(),
            &OpenSky,
        )
        .unwrap();

        assert_eq!(face_light_ofs(&lumps, 0), LOW_LIGHT * FLAT_LIGHTMAP_SIZE as i32);
        assert_eq!(lumps.lighting.len(), LADDER);
    }

    #[test]
    fn test_ambient_samples_without_flattening() {
        let input = floor_level("floor1", Vec::new());
        let opts = BuildOptions { flatten_uniform: false, ..options(LightingQuality::Fast) };
        let mut ctx = BuildContext::new(opts);
        let lumps = build_level(
            &mut ctx,
            &input,
            &mut BspTables::new(),
            &mut MemoryTextures::new(),
            &OpenSky,
        )
        .unwrap();

        let samples = &lumps.lighting.as_bytes()[LADDER..];
        assert_eq!(samples.len(), 81);
        assert!(samples.iter().all(|&v| v == LOW_LIGHT as u8));
    }

    #[test]
    fn test_sky_face_is_unlit() {
        let input = floor_level("sky1", Vec::new());
        let mut ctx = BuildContext::new(BuildOptions::default());
        let lumps = build_level(
            &mut ctx,
            &input,
            &mut BspTables::new(),
            &mut MemoryTextures::new(),
            &OpenSky,
        )
        .unwrap();

        assert_eq!(face_light_ofs(&lumps, 0), -1);
        assert_eq!(&lumps.faces.as_bytes()[12..16], &[255; 4]);

        let mut rec = &lumps.texinfo.as_bytes()[36..40];
        assert_eq!(rec.read_i32::<LE>().unwrap(), 1);
    }

    #[test]
    fn test_unknown_texture_still_builds() {
        captured_log::start();
        let input = floor_level("nosuchtex", Vec::new());
        let mut ctx = BuildContext::new(BuildOptions::default());
        let lumps = build_level(
            &mut ctx,
            &input,
            &mut BspTables::new(),
            &mut MemoryTextures::new(),
            &OpenSky,
        )
        .unwrap();

        let mut bytes = lumps.textures.as_bytes();
        assert_eq!(bytes.read_u32::<LE>().unwrap(), 4);
        let offsets: Vec<u32> = (0..4).map(|_| bytes.read_u32::<LE>().unwrap()).collect();
        let tex = &lumps.textures.as_bytes()[offsets[3] as usize..];
        assert_eq!(&tex[..9], b"nosuchtex");
        // same pixels as the built-in "missing" texture
        let missing = &lumps.textures.as_bytes()[offsets[1] as usize + 16..offsets[2] as usize];
        assert_eq!(&tex[16..16 + missing.len()], missing);

        let warnings = captured_log::warnings();
        assert!(
            warnings.iter().any(|w| w.contains("nosuchtex") && w.contains("not found")),
            "{:?}",
            warnings
        );
    }

    #[test]
    fn test_texinfo_overflow_fails_build() {
        let bbox = BoundingBox::new(Vec3::ZERO, Vec3::new(64.0, 64.0, 64.0));
        let mut tree = BspTree::new();
        let root = tree.add_node(Node::new(Plane::new(Vec3::new(0.0, 0.0, 1.0), 0.0), bbox));
        for i in 0..4097 {
            tree.add_face(Face {
                vertices: vec![
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(0.0, 16.0, 0.0),
                    Vec3::new(16.0, 16.0, 0.0),
                ],
                node: root,
                side: 0,
                texture: "floor1".to_string(),
                s: [1.0, 0.0, 0.0, i as f64],
                t: [0.0, 1.0, 0.0, 0.0],
            });
        }
        tree.root = root;
        let input = LevelInput { tree, entities: Vec::new(), map_models: Vec::new() };

        let mut ctx = BuildContext::new(options(LightingQuality::Fastest));
        let err = build_level(
            &mut ctx,
            &input,
            &mut BspTables::new(),
            &mut MemoryTextures::new(),
            &OpenSky,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::LimitExceeded { what: "TEXINFOS", .. }));
    }

    #[test]
    fn test_generated_room_end_to_end() {
        let config = GeneratorConfig {
            seed: Some(99),
            light_count: 3,
            sun: true,
            map_models: 2,
            ..GeneratorConfig::default()
        };
        let level = RoomGenerator::new(config).generate();
        let input = LevelInput {
            tree: level.tree,
            entities: level.entities,
            map_models: level.map_models,
        };

        let mut ctx = BuildContext::new(BuildOptions {
            color_lighting: true,
            ..options(LightingQuality::Normal)
        });
        let mut tables = BspTables::new();
        let lumps = build_level(
            &mut ctx,
            &input,
            &mut tables,
            &mut MemoryTextures::new(),
            &OpenSky,
        )
        .unwrap();

        assert_eq!(lumps.faces.record_count::<DFace>(), 6);
        assert_eq!(lumps.nodes.record_count::<DNode>(), 6);
        assert_eq!(lumps.leafs.record_count::<DLeaf>(), 2);
        assert_eq!(lumps.mark_surfs.len(), 6 * 2);
        assert_eq!(lumps.surf_edges.len(), 24 * 4);
        assert_eq!(ctx.total_surf_edges, 24);
        // a closed box: 8 corners, 12 edges plus the dummy
        assert_eq!(lumps.vertexes.len(), 8 * 12);
        assert_eq!(lumps.edges.len(), 13 * 4);
        // opposite walls are parallel but not coplanar
        assert_eq!(lumps.planes.len(), 6 * 20);

        // floor, ceiling (sky) and two wall mappings
        assert_eq!(lumps.texinfo.record_count::<TexInfo>(), 4);
        assert_eq!(lumps.model_lights.len(), 2);
        assert!(lumps.model_lights.iter().all(|&v| v >= LOW_LIGHT as u8));

        // five lit faces, sky is not
        assert_eq!(ctx.lightmaps.len(), 5);
        assert_eq!(face_light_ofs(&lumps, 1), -1);
        assert!(lumps.lighting.len() >= LADDER * 3);
    }

    #[test]
    fn test_second_build_starts_clean() {
        let input = floor_level("floor1", Vec::new());
        let mut ctx = BuildContext::new(BuildOptions::default());

        let first = build_level(
            &mut ctx,
            &input,
            &mut BspTables::new(),
            &mut MemoryTextures::new(),
            &OpenSky,
        )
        .unwrap();
        let second = build_level(
            &mut ctx,
            &input,
            &mut BspTables::new(),
            &mut MemoryTextures::new(),
            &OpenSky,
        )
        .unwrap();

        assert_eq!(first.faces.as_bytes(), second.faces.as_bytes());
        assert_eq!(first.texinfo.as_bytes(), second.texinfo.as_bytes());
        assert_eq!(ctx.total_faces, 1);
    }
}
