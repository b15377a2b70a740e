//! Fixed asset layout of the scene, resolved against a root directory.

use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::shader::ShaderDialect;

pub const MODEL_PATH: &str = "resources/models/watermill.obj";
pub const DIFFUSE_PATH: &str = "resources/models/watermill_diffuse.png";
pub const SHADER_DIR: &str = "resources/shaders";
pub const LIGHTING_SHADER: &str = "lighting.wgsl";

#[derive(Clone, Debug, PartialEq)]
pub struct SceneManifest {
    pub root: PathBuf,
    pub dialect: ShaderDialect,
}

impl Default for SceneManifest {
    fn default() -> Self {
        Self::new(".", ShaderDialect::for_target())
    }
}

impl SceneManifest {
    pub fn new(root: impl Into<PathBuf>, dialect: ShaderDialect) -> Self {
        Self {
            root: root.into(),
            dialect,
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join(MODEL_PATH)
    }

    pub fn diffuse_path(&self) -> PathBuf {
        self.root.join(DIFFUSE_PATH)
    }

    /// Lighting fragment shader for the selected dialect.
    pub fn lighting_shader_path(&self) -> PathBuf {
        self.root
            .join(SHADER_DIR)
            .join(self.dialect.dir_name())
            .join(LIGHTING_SHADER)
    }

    pub fn all_paths(&self) -> [PathBuf; 3] {
        [
            self.model_path(),
            self.diffuse_path(),
            self.lighting_shader_path(),
        ]
    }

    /// Fail with every missing file listed, before any GPU work starts.
    pub fn check(&self) -> Result<()> {
        let missing: Vec<String> = self
            .all_paths()
            .iter()
            .filter(|p| !p.is_file())
            .map(|p| p.display().to_string())
            .collect();
        if !missing.is_empty() {
            bail!(
                "Missing scene assets under {}: {}",
                self.root.display(),
                missing.join(", ")
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn paths_follow_layout() {
        let m = SceneManifest::new("/data", ShaderDialect::Desktop);
        assert_eq!(m.model_path(), Path::new("/data/resources/models/watermill.obj"));
        assert_eq!(
            m.diffuse_path(),
            Path::new("/data/resources/models/watermill_diffuse.png")
        );
        assert_eq!(
            m.lighting_shader_path(),
            Path::new("/data/resources/shaders/desktop/lighting.wgsl")
        );
        let m = SceneManifest::new("/data", ShaderDialect::Embedded);
        assert_eq!(
            m.lighting_shader_path(),
            Path::new("/data/resources/shaders/embedded/lighting.wgsl")
        );
    }

    #[test]
    fn check_lists_missing_files() {
        let m = SceneManifest::new("/definitely/not/here", ShaderDialect::Desktop);
        let msg = m.check().unwrap_err().to_string();
        assert!(msg.contains("watermill.obj"));
        assert!(msg.contains("watermill_diffuse.png"));
        assert!(msg.contains("lighting.wgsl"));
    }

    #[test]
    fn check_reports_only_what_is_missing() {
        // The shaders ship with the repository, the model does not.
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let m = SceneManifest::new(root, ShaderDialect::Desktop);
        let msg = m.check().map(|_| String::new()).unwrap_or_else(|e| e.to_string());
        assert!(!msg.contains("lighting.wgsl"));
    }
}
