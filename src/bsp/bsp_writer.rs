// src/bsp/bsp_writer.rs
//
// Serializes the BSP tree into the faces, nodes, leafs, mark surface and
// surf edge lumps. The walk is depth-first and pre-order: a node's record
// and its faces are emitted before either child, front child first.

use byteorder::{WriteBytesExt, LE};
use log::debug;

use crate::bsp::bsp_records::{DFace, DLeaf, DNode, NO_LIGHT_STYLE};
use crate::bsp::{BspTree, Child, FaceId, GeometryTables, LeafId, NodeId, Vec3};
use crate::error::{check_limit, BuildError, Result};
use crate::level::{BuildContext, Lump, LumpKind};
use crate::texture::texture_flags;
use crate::utils::util::{clamp, i_round};

pub const NODE_BBOX_PAD: i32 = 32;
pub const LEAF_BBOX_PAD: i32 = 4;

pub const MAX_MAP_NODES: usize = 32767;
pub const MAX_MAP_LEAFS: usize = 32767;
pub const MAX_MAP_FACES: usize = 65535;
pub const MAX_MAP_MARKSURFACES: usize = 65535;
pub const MAX_MAP_SURFEDGES: usize = 512000;

/// Child slot value for the shared solid leaf.
pub const SOLID_CHILD: i16 = -1;

/// The lumps produced by one tree walk.
#[derive(Debug, Clone)]
pub struct StructuralLumps {
    pub faces: Lump,
    pub nodes: Lump,
    pub leafs: Lump,
    pub mark_surfs: Lump,
    pub surf_edges: Lump,
}

impl StructuralLumps {
    /// Empty lumps, except leafs which starts with the shared solid leaf.
    pub fn new() -> Result<Self> {
        let mut leafs = Lump::new(LumpKind::Leafs);
        leafs.append_record(&DLeaf::solid())?;
        Ok(StructuralLumps {
            faces: Lump::new(LumpKind::Faces),
            nodes: Lump::new(LumpKind::Nodes),
            leafs,
            mark_surfs: Lump::new(LumpKind::MarkSurfaces),
            surf_edges: Lump::new(LumpKind::SurfEdges),
        })
    }
}

fn padded_bounds(mins: Vec3, maxs: Vec3, pad: i32) -> ([i16; 3], [i16; 3]) {
    let mut lo = [0i16; 3];
    let mut hi = [0i16; 3];
    for b in 0..3 {
        lo[b] = clamp(i_round(mins.component(b)) - pad, i16::MIN as i32, i16::MAX as i32) as i16;
        hi[b] = clamp(i_round(maxs.component(b)) + pad, i16::MIN as i32, i16::MAX as i32) as i16;
    }
    (lo, hi)
}

/// Output numbers for every node and leaf, in the exact order the writer
/// will visit them. Leaf 0 is the solid leaf.
struct TreeNumbering {
    nodes: Vec<i16>,
    leafs: Vec<i16>,
    num_nodes: usize,
    num_leafs: usize,
}

impl TreeNumbering {
    fn build(tree: &BspTree) -> Result<Self> {
        let mut numbering = TreeNumbering {
            nodes: vec![-1; tree.nodes.len()],
            leafs: vec![-1; tree.leafs.len()],
            num_nodes: 0,
            num_leafs: 1,
        };
        numbering.leafs[LeafId::SOLID.0] = 0;
        numbering.visit(tree, Child::Node(tree.root))?;
        Ok(numbering)
    }

    fn visit(&mut self, tree: &BspTree, child: Child) -> Result<()> {
        match child {
            Child::Node(id) => {
                check_limit("NODES", self.num_nodes + 1, MAX_MAP_NODES)?;
                self.nodes[id.0] = self.num_nodes as i16;
                self.num_nodes += 1;

                let node = tree.node(id);
                self.visit(tree, node.front)?;
                self.visit(tree, node.back)?;
            }
            Child::Leaf(id) if id.is_solid() => {}
            Child::Leaf(id) => {
                check_limit("LEAFS", self.num_leafs + 1, MAX_MAP_LEAFS)?;
                self.leafs[id.0] = self.num_leafs as i16;
                self.num_leafs += 1;
            }
        }
        Ok(())
    }

    fn child_value(&self, child: Child) -> i16 {
        match child {
            Child::Node(id) => self.nodes[id.0],
            Child::Leaf(id) if id.is_solid() => SOLID_CHILD,
            Child::Leaf(id) => -(self.leafs[id.0] + 1),
        }
    }
}

pub struct BspWriter<'a, G: GeometryTables + ?Sized> {
    tree: &'a BspTree,
    ctx: &'a mut BuildContext,
    tables: &'a mut G,
    numbering: TreeNumbering,
    lumps: StructuralLumps,
}

impl<'a, G: GeometryTables + ?Sized> BspWriter<'a, G> {
    pub fn new(tree: &'a BspTree, ctx: &'a mut BuildContext, tables: &'a mut G) -> Result<Self> {
        let numbering = TreeNumbering::build(tree)?;
        ctx.prepare_faces(tree.faces.len());
        Ok(BspWriter {
            tree,
            ctx,
            tables,
            numbering,
            lumps: StructuralLumps::new()?,
        })
    }

    pub fn write(mut self) -> Result<StructuralLumps> {
        self.write_node(self.tree.root)?;
        debug!(
            "wrote {} nodes, {} leafs, {} faces, {} surf edges, {} mark surfs",
            self.numbering.num_nodes,
            self.numbering.num_leafs,
            self.ctx.total_faces,
            self.ctx.total_surf_edges,
            self.ctx.total_mark_surfs
        );
        Ok(self.lumps)
    }

    fn write_child(&mut self, child: Child) -> Result<()> {
        match child {
            Child::Node(id) => self.write_node(id),
            Child::Leaf(id) => self.write_leaf(id),
        }
    }

    fn write_node(&mut self, id: NodeId) -> Result<()> {
        let tree = self.tree;
        let node = tree.node(id);

        let (planenum, flipped) = self.tables.add_plane(&node.plane)?;

        let mut children = [
            self.numbering.child_value(node.front),
            self.numbering.child_value(node.back),
        ];
        if flipped {
            children.swap(0, 1);
        }

        let first_face = self.ctx.total_faces;
        for &face in &node.faces {
            self.write_face(face)?;
        }

        let (mins, maxs) = padded_bounds(node.bbox.mins, node.bbox.maxs, NODE_BBOX_PAD);

        let raw_node = DNode {
            planenum,
            children,
            mins,
            maxs,
            first_face: first_face as u16,
            num_faces: node.faces.len() as u16,
        };
        self.lumps.nodes.append_record(&raw_node)?;

        // recurse now, AFTER adding the current node
        self.write_child(node.front)?;
        self.write_child(node.back)?;
        Ok(())
    }

    fn write_face(&mut self, id: FaceId) -> Result<()> {
        let tree = self.tree;
        let face = tree.face(id);

        self.ctx.assign_face_index(id)?;

        let (planenum, flipped) = self.tables.add_plane(&tree.node(face.node).plane)?;
        let side = (face.side == 1) != flipped;

        let first_edge = self.ctx.total_surf_edges;
        let total_v = face.vertices.len();
        for i in 0..total_v {
            self.write_edge(face.vertices[i], face.vertices[(i + 1) % total_v])?;
        }

        let texinfo = self.ctx.intern_texinfo(
            &face.texture,
            texture_flags(&face.texture),
            &face.s,
            &face.t,
        )?;

        let color = self.ctx.options.color_lighting;
        let (styles, light_ofs) = match self.ctx.face_lightmap(id) {
            Some(lmap) => (
                [0, NO_LIGHT_STYLE, NO_LIGHT_STYLE, NO_LIGHT_STYLE],
                lmap.calc_offset(color),
            ),
            None => ([NO_LIGHT_STYLE; 4], -1),
        };

        let raw_face = DFace {
            planenum: planenum as i16,
            side: side as i16,
            first_edge: first_edge as i32,
            num_edges: total_v as i16,
            texinfo: texinfo as i16,
            styles,
            light_ofs,
        };
        self.lumps.faces.append_record(&raw_face)?;
        Ok(())
    }

    fn write_edge(&mut self, a: Vec3, b: Vec3) -> Result<()> {
        let v1 = self.tables.add_vertex(a)?;
        let v2 = self.tables.add_vertex(b)?;

        if v1 == v2 {
            return Err(BuildError::ZeroLengthEdge { x: a.x, y: a.y, z: a.z });
        }

        let index = self.tables.add_edge(v1, v2)?;

        check_limit("SURFEDGES", self.ctx.total_surf_edges + 1, MAX_MAP_SURFEDGES)?;
        self.lumps.surf_edges.write_i32::<LE>(index)?;
        self.ctx.total_surf_edges += 1;
        Ok(())
    }

    fn write_leaf(&mut self, id: LeafId) -> Result<()> {
        if id.is_solid() {
            return Ok(());
        }

        let tree = self.tree;
        let leaf = tree.leaf(id);
        let first_mark_surf = self.ctx.total_mark_surfs;

        for &face in &leaf.faces {
            let index = self
                .ctx
                .face_index(face)
                .ok_or(BuildError::FaceNotWritten(face.0))?;

            check_limit("MARKSURFACES", self.ctx.total_mark_surfs + 1, MAX_MAP_MARKSURFACES)?;
            self.lumps.mark_surfs.write_u16::<LE>(index)?;
            self.ctx.total_mark_surfs += 1;
        }

        let (mins, maxs) = padded_bounds(leaf.bbox.mins, leaf.bbox.maxs, LEAF_BBOX_PAD);

        let raw_leaf = DLeaf {
            contents: leaf.contents as i32,
            vis_ofs: -1, // no visibility info
            mins,
            maxs,
            first_mark_surf: first_mark_surf as u16,
            num_mark_surfs: leaf.faces.len() as u16,
            ambient: [0; 4],
        };
        self.lumps.leafs.append_record(&raw_leaf)?;
        Ok(())
    }
}

/// Writes the whole tree starting at its root.
pub fn write_bsp<G: GeometryTables + ?Sized>(
    tree: &BspTree,
    ctx: &mut BuildContext,
    tables: &mut G,
) -> Result<StructuralLumps> {
    BspWriter::new(tree, ctx, tables)?.write()
}
