// src/level/lump.rs

use std::io::{self, Write};

/// The lump slots of a version 29 BSP file this crate fills, numbered by
/// their directory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LumpKind {
    Planes = 1,
    Textures = 2,
    Vertexes = 3,
    Nodes = 5,
    TexInfo = 6,
    Faces = 7,
    Lighting = 8,
    Leafs = 10,
    MarkSurfaces = 11,
    Edges = 12,
    SurfEdges = 13,
}

impl LumpKind {
    pub fn name(&self) -> &'static str {
        match self {
            LumpKind::Planes => "planes",
            LumpKind::Textures => "textures",
            LumpKind::Vertexes => "vertexes",
            LumpKind::Nodes => "nodes",
            LumpKind::TexInfo => "texinfo",
            LumpKind::Faces => "faces",
            LumpKind::Lighting => "lighting",
            LumpKind::Leafs => "leafs",
            LumpKind::MarkSurfaces => "marksurfaces",
            LumpKind::Edges => "edges",
            LumpKind::SurfEdges => "surfedges",
        }
    }
}

/// A fixed-size on-disk record.
///
/// `write_le` must emit exactly `SIZE` bytes, converting every multi-byte
/// field to little-endian as it is written.
pub trait LumpRecord {
    const SIZE: usize;

    fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()>;
}

/// A growable byte buffer holding one lump's contents.
#[derive(Debug, Clone)]
pub struct Lump {
    kind: LumpKind,
    data: Vec<u8>,
}

impl Lump {
    pub fn new(kind: LumpKind) -> Self {
        Lump { kind, data: Vec::new() }
    }

    pub fn kind(&self) -> LumpKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn prepend(&mut self, bytes: &[u8]) {
        self.data.splice(0..0, bytes.iter().copied());
    }

    pub fn append_record<R: LumpRecord>(&mut self, record: &R) -> io::Result<()> {
        let before = self.data.len();
        record.write_le(&mut self.data)?;
        debug_assert_eq!(self.data.len() - before, R::SIZE);
        Ok(())
    }

    /// Number of whole records of type `R` in this lump.
    pub fn record_count<R: LumpRecord>(&self) -> usize {
        self.data.len() / R::SIZE
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Write for Lump {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
