//! src/bsp/bsp_node.rs
//!
//! The BSP tree handed to the writer and the light baker. Nodes, leafs and
//! faces live in flat vectors inside [`BspTree`] and refer to each other by
//! index, so the whole tree can be borrowed immutably while a level is built.

use crate::bsp::{BoundingBox, Plane, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub usize);

impl LeafId {
    /// The shared "solid" leaf. It never gets a record of its own.
    pub const SOLID: LeafId = LeafId(0);

    pub fn is_solid(&self) -> bool {
        *self == LeafId::SOLID
    }
}

/// One side of a node: either another node or a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Node(NodeId),
    Leaf(LeafId),
}

/// Leaf content classification, using the engine's numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contents {
    Empty = -1,
    Solid = -2,
    Water = -3,
    Slime = -4,
    Lava = -5,
    Sky = -6,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub plane: Plane,
    pub front: Child,
    pub back: Child,
    pub bbox: BoundingBox,
    /// Faces lying on this node's plane.
    pub faces: Vec<FaceId>,
}

impl Node {
    /// Create a node with both children pointing at the solid leaf.
    pub fn new(plane: Plane, bbox: BoundingBox) -> Self {
        Node {
            plane,
            front: Child::Leaf(LeafId::SOLID),
            back: Child::Leaf(LeafId::SOLID),
            bbox,
            faces: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Leaf {
    pub contents: Contents,
    pub bbox: BoundingBox,
    /// Faces bordering this leaf.
    pub faces: Vec<FaceId>,
}

impl Leaf {
    pub fn new(contents: Contents, bbox: BoundingBox) -> Self {
        Leaf { contents, bbox, faces: Vec::new() }
    }
}

/// A convex polygon lying on a node's plane.
#[derive(Debug, Clone)]
pub struct Face {
    /// Closed ring, at least three points; order defines the winding.
    pub vertices: Vec<Vec3>,
    pub node: NodeId,
    /// 0 when the face points along the node's plane normal, 1 when it points away.
    pub side: u8,
    pub texture: String,
    /// S texture axis: xyz direction plus offset.
    pub s: [f64; 4],
    /// T texture axis: xyz direction plus offset.
    pub t: [f64; 4],
}

impl Face {
    /// Texture coordinates of every vertex.
    pub fn st_coords(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let s_axis = Vec3::from_axis(&self.s);
        let t_axis = Vec3::from_axis(&self.t);
        self.vertices
            .iter()
            .map(move |v| (v.dot(s_axis) + self.s[3], v.dot(t_axis) + self.t[3]))
    }

    /// (min_s, min_t, max_s, max_t) over all vertices.
    pub fn st_bounds(&self) -> (f64, f64, f64, f64) {
        let mut bounds = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (s, t) in self.st_coords() {
            bounds.0 = bounds.0.min(s);
            bounds.1 = bounds.1.min(t);
            bounds.2 = bounds.2.max(s);
            bounds.3 = bounds.3.max(t);
        }
        bounds
    }

    pub fn is_sky(&self) -> bool {
        self.texture.starts_with("sky")
    }
}

/// Owner of every node, leaf and face of one level.
#[derive(Debug, Clone)]
pub struct BspTree {
    pub nodes: Vec<Node>,
    pub leafs: Vec<Leaf>,
    pub faces: Vec<Face>,
    pub root: NodeId,
}

impl Default for BspTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BspTree {
    /// An empty tree holding only the solid sentinel leaf.
    pub fn new() -> Self {
        BspTree {
            nodes: Vec::new(),
            leafs: vec![Leaf::new(Contents::Solid, BoundingBox::new_empty())],
            faces: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_leaf(&mut self, leaf: Leaf) -> LeafId {
        self.leafs.push(leaf);
        LeafId(self.leafs.len() - 1)
    }

    /// Adds a face and registers it with the node it lies on.
    pub fn add_face(&mut self, face: Face) -> FaceId {
        let id = FaceId(self.faces.len());
        let node = face.node;
        self.faces.push(face);
        self.nodes[node.0].faces.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn leaf(&self, id: LeafId) -> &Leaf {
        &self.leafs[id.0]
    }

    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.0]
    }

    /// The plane a face actually faces along (its node plane, flipped for side 1).
    pub fn face_plane(&self, id: FaceId) -> Plane {
        let face = self.face(id);
        let plane = self.node(face.node).plane;
        if face.side == 1 {
            plane.flipped()
        } else {
            plane
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_face(node: NodeId) -> Face {
        Face {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 64.0, 0.0),
                Vec3::new(128.0, 64.0, 0.0),
                Vec3::new(128.0, 0.0, 0.0),
            ],
            node,
            side: 0,
            texture: "floor1".to_string(),
            s: [1.0, 0.0, 0.0, 8.0],
            t: [0.0, -1.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_new_tree_has_solid_leaf() {
        let tree = BspTree::new();
        assert_eq!(tree.leafs.len(), 1);
        assert_eq!(tree.leaf(LeafId::SOLID).contents, Contents::Solid);
        assert!(LeafId::SOLID.is_solid());
        assert!(!LeafId(1).is_solid());
    }

    #[test]
    fn test_add_face_registers_with_node() {
        let mut tree = BspTree::new();
        let plane = Plane::new(Vec3::new(0.0, 0.0, 1.0), 0.0);
        let node = tree.add_node(Node::new(plane, BoundingBox::new_empty()));
        let face = tree.add_face(floor_face(node));
        assert_eq!(tree.node(node).faces, vec![face]);
    }

    #[test]
    fn test_st_bounds() {
        let face = floor_face(NodeId(0));
        let (min_s, min_t, max_s, max_t) = face.st_bounds();
        assert_eq!((min_s, max_s), (8.0, 136.0));
        assert_eq!((min_t, max_t), (-64.0, 0.0));
    }

    #[test]
    fn test_face_plane_respects_side() {
        let mut tree = BspTree::new();
        let plane = Plane::new(Vec3::new(0.0, 0.0, 1.0), 32.0);
        let node = tree.add_node(Node::new(plane, BoundingBox::new_empty()));
        let mut face = floor_face(node);
        face.side = 1;
        let id = tree.add_face(face);
        let fp = tree.face_plane(id);
        assert_eq!(fp.normal, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(fp.dist, -32.0);
    }
}
