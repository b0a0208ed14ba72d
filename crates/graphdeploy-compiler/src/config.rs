use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What to compile and how hard the external compiler should try.
///
/// Defaults reproduce the reference deployment: ResNet-18, batch 1, NCHW
/// 3x224x224 input, full optimization, native CPU codegen.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    pub num_layers: u32,
    pub batch_size: usize,
    pub image_shape: [usize; 3],
    pub opt_level: u8,
    pub target: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            num_layers: 18,
            batch_size: 1,
            image_shape: [3, 224, 224],
            opt_level: 3,
            target: "llvm".to_string(),
        }
    }
}

impl BuildConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Full input shape including the batch dimension.
    pub fn data_shape(&self) -> Vec<usize> {
        let mut shape = vec![self.batch_size];
        shape.extend_from_slice(&self.image_shape);
        shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = BuildConfig::default();
        assert_eq!(config.num_layers, 18);
        assert_eq!(config.data_shape(), vec![1, 3, 224, 224]);
        assert_eq!(config.opt_level, 3);
        assert_eq!(config.target, "llvm");
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(&path, r#"{"batch_size": 4, "opt_level": 2}"#).unwrap();

        let config = BuildConfig::from_file(&path).unwrap();
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.opt_level, 2);
        // Unspecified fields keep their defaults.
        assert_eq!(config.num_layers, 18);
        assert_eq!(config.data_shape(), vec![4, 3, 224, 224]);
    }

    #[test]
    fn garbage_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(&path, "not json").unwrap();
        assert!(BuildConfig::from_file(&path).is_err());
    }
}
