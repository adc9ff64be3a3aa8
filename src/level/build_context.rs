// src/level/build_context.rs
//
// Everything one level build owns: options, dedup tables, lightmaps, the
// per-face outputs and the running counters of the tree writer.

use log::debug;

use crate::bsp::bsp_writer::MAX_MAP_FACES;
use crate::bsp::FaceId;
use crate::config::BuildOptions;
use crate::error::{check_limit, Result};
use crate::light::{LightScratch, Lightmap, LightmapId};
use crate::texture::{MipTexTable, TexInfoTable};

type Ticker = Box<dyn FnMut(usize, usize)>;

pub struct BuildContext {
    pub options: BuildOptions,
    pub miptex: MipTexTable,
    pub texinfo: TexInfoTable,

    /// Every baked lightmap, in bake order.
    pub lightmaps: Vec<Lightmap>,
    face_lightmaps: Vec<Option<LightmapId>>,
    face_indices: Vec<Option<u16>>,

    pub total_faces: usize,
    pub total_surf_edges: usize,
    pub total_mark_surfs: usize,

    pub(crate) scratch: LightScratch,
    ticker: Option<Ticker>,
}

impl BuildContext {
    pub fn new(options: BuildOptions) -> Self {
        BuildContext {
            options,
            miptex: MipTexTable::new(),
            texinfo: TexInfoTable::new(),
            lightmaps: Vec::new(),
            face_lightmaps: Vec::new(),
            face_indices: Vec::new(),
            total_faces: 0,
            total_surf_edges: 0,
            total_mark_surfs: 0,
            scratch: LightScratch::new(),
            ticker: None,
        }
    }

    /// Level begin: empty tables (built-in textures re-added), no lightmaps,
    /// counters at zero.
    pub fn reset(&mut self) {
        self.miptex.reset();
        self.texinfo.reset();
        self.lightmaps.clear();
        self.face_lightmaps.clear();
        self.face_indices.clear();
        self.total_faces = 0;
        self.total_surf_edges = 0;
        self.total_mark_surfs = 0;
    }

    /// Level end: also hands back the memory held by lightmaps and scratch buffers.
    pub fn dispose(&mut self) {
        self.reset();
        self.lightmaps.shrink_to_fit();
        self.face_lightmaps.shrink_to_fit();
        self.face_indices.shrink_to_fit();
        self.scratch.release();
    }

    /// Called with (faces done, total faces) during lighting.
    pub fn set_ticker<F: FnMut(usize, usize) + 'static>(&mut self, ticker: F) {
        self.ticker = Some(Box::new(ticker));
    }

    pub(crate) fn tick(&mut self, done: usize, total: usize) {
        debug!("lighting: {}/{} faces", done, total);
        if let Some(ticker) = self.ticker.as_mut() {
            ticker(done, total);
        }
    }

    /// Make room for per-face outputs of `count` faces.
    pub fn prepare_faces(&mut self, count: usize) {
        if self.face_lightmaps.len() < count {
            self.face_lightmaps.resize(count, None);
        }
        if self.face_indices.len() < count {
            self.face_indices.resize(count, None);
        }
    }

    pub fn add_face_lightmap(&mut self, face: FaceId, lmap: Lightmap) -> LightmapId {
        self.prepare_faces(face.0 + 1);
        let id = LightmapId(self.lightmaps.len());
        self.lightmaps.push(lmap);
        self.face_lightmaps[face.0] = Some(id);
        id
    }

    pub fn face_lightmap(&self, face: FaceId) -> Option<&Lightmap> {
        let id = self.face_lightmaps.get(face.0).copied().flatten()?;
        self.lightmaps.get(id.0)
    }

    /// Output index of a written face.
    pub fn face_index(&self, face: FaceId) -> Option<u16> {
        self.face_indices.get(face.0).copied().flatten()
    }

    /// Gives `face` the next output index.
    pub(crate) fn assign_face_index(&mut self, face: FaceId) -> Result<u16> {
        check_limit("FACES", self.total_faces + 1, MAX_MAP_FACES)?;
        self.prepare_faces(face.0 + 1);
        let index = self.total_faces;
        self.total_faces += 1;
        self.face_indices[face.0] = Some(index as u16);
        Ok(index as u16)
    }

    /// Texinfo index for a face mapping, interning the texture on the way.
    pub fn intern_texinfo(
        &mut self,
        texture: &str,
        flags: i32,
        s: &[f64; 4],
        t: &[f64; 4],
    ) -> Result<u16> {
        self.texinfo.intern(&mut self.miptex, texture, flags, s, t)
    }
}
