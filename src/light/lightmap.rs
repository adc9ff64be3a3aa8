// src/light/lightmap.rs
//
// A face's baked lightmap and the filters that turn an accumulation buffer
// into stored luxels.

use smallvec::{smallvec, SmallVec};

use crate::config::LightingQuality;
use crate::level::Lump;
use crate::light::atlas::flat_light_offset;
use crate::utils::util::{clamp, fixed_to_byte, i_round};

/// Lightmaps up to this many luxels keep their samples inline.
pub const SMALL_LIGHTMAP: usize = 64;

/// Index of a lightmap inside the build context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightmapId(pub usize);

#[derive(Debug, Clone)]
pub struct Lightmap {
    width: usize,
    height: usize,
    samples: SmallVec<[u8; SMALL_LIGHTMAP]>,
    /// Byte offset in the lighting lump, -1 until written.
    offset: i32,
    score: i32,
    average: i32,
}

impl Lightmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Lightmap {
            width,
            height,
            samples: smallvec![value; width * height],
            offset: -1,
            score: -1,
            average: -1,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn sample(&self, s: usize, t: usize) -> u8 {
        self.samples[t * self.width + s]
    }

    pub fn is_flat(&self) -> bool {
        self.width == 1 && self.height == 1
    }

    /// True when every sample holds the same value.
    pub fn is_uniform(&self) -> bool {
        self.samples.windows(2).all(|w| w[0] == w[1])
    }

    /// Stores a 16.8 fixed-point value, clamped to a byte.
    fn set(&mut self, s: usize, t: usize, value: i32) {
        let w = self.width;
        self.samples[t * w + s] = fixed_to_byte(value);
    }

    pub fn calc_score(&mut self) {
        let low = self.samples.iter().copied().min().unwrap_or(0) as i32;
        let high = self.samples.iter().copied().max().unwrap_or(0) as i32;

        let total: f64 = self.samples.iter().map(|&v| v as f64).sum();
        let avg = total / self.samples.len().max(1) as f64;

        self.average = clamp(i_round(avg), 0, 255);
        self.score = (self.width * self.height) as i32 * 2 + (high - low);
    }

    /// Diagnostic ranking; -1 until calculated.
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Rounded mean of the samples; -1 until calculated.
    pub fn average(&self) -> i32 {
        self.average
    }

    /// Collapse to a single luxel holding the average.
    pub fn flatten(&mut self) {
        if self.is_flat() {
            return;
        }
        if self.score < 0 {
            self.calc_score();
        }

        self.width = 1;
        self.height = 1;
        self.samples = smallvec![self.average as u8];
    }

    /// Offset the face record should point at.
    pub fn calc_offset(&self, color: bool) -> i32 {
        if self.is_flat() {
            flat_light_offset(self.samples[0], color)
        } else {
            self.offset
        }
    }

    /// Lump offset assigned by the atlas writer, -1 before that.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Appends the samples (as R/G/B triplets in color mode) and records
    /// where they went. Flat lightmaps write nothing.
    pub fn write(&mut self, lump: &mut Lump, color: bool) {
        if self.is_flat() {
            return;
        }

        self.offset = lump.len() as i32;

        if !color {
            lump.append(&self.samples);
            return;
        }

        for &v in self.samples.iter() {
            lump.append(&[v, v, v]);
        }
    }

    /// Reduce an accumulation buffer into the stored samples.
    ///
    /// `blocklights` must have the layout the light baker produces for
    /// `quality`: corners of a full-size grid, a half-resolution compact grid,
    /// a full-size grid, or a double-resolution grid respectively.
    pub fn store(&mut self, quality: LightingQuality, blocklights: &[i32]) {
        match quality {
            LightingQuality::Fastest => self.store_fastest(blocklights),
            LightingQuality::Fast => self.store_interp(blocklights),
            LightingQuality::Normal => self.store_normal(blocklights),
            LightingQuality::Best => self.store_best(blocklights),
        }
    }

    fn store_normal(&mut self, blocklights: &[i32]) {
        for (dest, &raw) in self.samples.iter_mut().zip(blocklights.iter()) {
            *dest = fixed_to_byte(raw);
        }
    }

    /// Bilinear fill from the four corner accumulations.
    fn store_fastest(&mut self, blocklights: &[i32]) {
        let w = self.width;
        let h = self.height;

        let a = blocklights[0] as f32;
        let b = blocklights[w - 1] as f32;
        let c = blocklights[(h - 1) * w] as f32;
        let d = blocklights[(h - 1) * w + w - 1] as f32;

        for t in 0..h {
            for s in 0..w {
                let xc = s as f32 / (w - 1) as f32;
                let yc = t as f32 / (h - 1) as f32;

                let value = a * (1.0 - xc) * (1.0 - yc)
                    + b * xc * (1.0 - yc)
                    + c * (1.0 - xc) * yc
                    + d * xc * yc;

                self.set(s, t, value.round() as i32);
            }
        }
    }

    /// Fill from a half-resolution grid: sampled rows/columns copy directly,
    /// the others average their sampled neighbours.
    fn store_interp(&mut self, blocklights: &[i32]) {
        let w = self.width;
        let h = self.height;
        let bw = 1 + w / 2;

        for t in 0..h {
            let row = InterpSource::new(t, h);
            for s in 0..w {
                let col = InterpSource::new(s, w);

                // widened so four saturated samples still average cleanly
                let at = |k: usize, j: usize| blocklights[j * bw + k] as i64;

                let value = match (col, row) {
                    (InterpSource::Direct(k), InterpSource::Direct(j)) => at(k, j),
                    (InterpSource::Between(k), InterpSource::Direct(j)) => {
                        (at(k, j) + at(k + 1, j)) >> 1
                    }
                    (InterpSource::Direct(k), InterpSource::Between(j)) => {
                        (at(k, j) + at(k, j + 1)) >> 1
                    }
                    (InterpSource::Between(k), InterpSource::Between(j)) => {
                        (at(k, j) + at(k + 1, j) + at(k, j + 1) + at(k + 1, j + 1)) >> 2
                    }
                };

                self.set(s, t, value as i32);
            }
        }
    }

    /// Average each 2x2 block of a double-resolution grid.
    fn store_best(&mut self, blocklights: &[i32]) {
        let w = self.width;
        let h = self.height;
        let gw = w * 2;

        for t in 0..h {
            for s in 0..w {
                let at = |k: usize, j: usize| blocklights[j * gw + k] as i64;
                let value = at(s * 2, t * 2)
                    + at(s * 2 + 1, t * 2)
                    + at(s * 2, t * 2 + 1)
                    + at(s * 2 + 1, t * 2 + 1);

                self.set(s, t, (value >> 2) as i32);
            }
        }
    }
}

/// Where a luxel's value comes from in the half-resolution grid.
#[derive(Debug, Clone, Copy, PartialEq)]
enum InterpSource {
    /// Sampled: compact index.
    Direct(usize),
    /// Not sampled: average of compact indices `k` and `k + 1`.
    Between(usize),
}

impl InterpSource {
    fn new(pos: usize, size: usize) -> Self {
        if is_interp(pos, size) {
            InterpSource::Between(pos / 2)
        } else {
            InterpSource::Direct((pos + 1) / 2)
        }
    }
}

/// Odd rows/columns are skipped by the fast bake, except the last one.
pub fn is_interp(pos: usize, size: usize) -> bool {
    pos & 1 == 1 && pos != size - 1
}

/// Compact index of a sampled row/column in the half-resolution grid.
pub fn compact_index(pos: usize) -> usize {
    (pos + 1) / 2
}
