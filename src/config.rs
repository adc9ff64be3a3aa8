// src/config.rs
//! Build options for one level build.
//!
//! Options are plain serde structs so they can come from a JSON file, and the
//! command line can override individual fields afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// Trades bake speed against sampling density.
///
/// The numeric values are the ones users pass on the command line and in
/// config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum LightingQuality {
    /// Four corner samples, bilinear fill.
    Fastest = 0,
    /// Every second row and column, averaged fill.
    Fast = 1,
    /// One sample per luxel.
    Normal = 2,
    /// Four samples per luxel, box filtered.
    Best = 3,
}

impl TryFrom<i32> for LightingQuality {
    type Error = BuildError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(LightingQuality::Fastest),
            1 => Ok(LightingQuality::Fast),
            2 => Ok(LightingQuality::Normal),
            3 => Ok(LightingQuality::Best),
            other => Err(BuildError::InvalidQuality(other)),
        }
    }
}

impl From<LightingQuality> for i32 {
    fn from(quality: LightingQuality) -> i32 {
        quality as i32
    }
}

impl Default for LightingQuality {
    fn default() -> Self {
        LightingQuality::Best
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub quality: LightingQuality,
    /// Store lightmaps as RGB triplets instead of single bytes.
    pub color_lighting: bool,
    /// Collapse lightmaps whose samples are all equal to a single value.
    pub flatten_uniform: bool,
    /// WAD2 file supplying texture data. `None` means built-ins only.
    pub texture_wad: Option<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            quality: LightingQuality::default(),
            color_lighting: false,
            flatten_uniform: true,
            texture_wad: None,
        }
    }
}

impl BuildOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BuildError::MissingResource {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_from_int() {
        assert_eq!(LightingQuality::try_from(0).unwrap(), LightingQuality::Fastest);
        assert_eq!(LightingQuality::try_from(3).unwrap(), LightingQuality::Best);
        assert!(matches!(
            LightingQuality::try_from(4),
            Err(BuildError::InvalidQuality(4))
        ));
        assert!(matches!(
            LightingQuality::try_from(-1),
            Err(BuildError::InvalidQuality(-1))
        ));
    }

    #[test]
    fn test_options_defaults() {
        let opts = BuildOptions::from_json("{}").unwrap();
        assert_eq!(opts.quality, LightingQuality::Best);
        assert!(!opts.color_lighting);
        assert!(opts.flatten_uniform);
        assert!(opts.texture_wad.is_none());
    }

    #[test]
    fn test_options_from_json() {
        let opts = BuildOptions::from_json(
            r#"{ "quality": 1, "color_lighting": true, "texture_wad": "data/quake_tex.wd2" }"#,
        )
        .unwrap();
        assert_eq!(opts.quality, LightingQuality::Fast);
        assert!(opts.color_lighting);
        assert_eq!(opts.texture_wad, Some(PathBuf::from("data/quake_tex.wd2")));
    }

    #[test]
    fn test_options_reject_bad_quality() {
        assert!(BuildOptions::from_json(r#"{ "quality": 7 }"#).is_err());
    }

    #[test]
    fn test_options_missing_file() {
        let err = BuildOptions::load(Path::new("/nonexistent/q1bake.json")).unwrap_err();
        assert!(matches!(err, BuildError::MissingResource { .. }));
    }
}
