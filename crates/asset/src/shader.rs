//! Shader sources and the dialect switch.
//!
//! A shader program is an optional vertex stage plus an optional fragment
//! stage, both WGSL. A missing stage means "use the renderer's built-in one".
//! Lighting shaders ship in two variants: a full one for desktop backends and
//! a downlevel one for GLES/WebGL class targets.

use std::{fmt, fs, path::Path, str::FromStr};

use anyhow::{Context, Result, bail, ensure};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderDialect {
    /// Vulkan/Metal/DX12 class backends.
    Desktop,
    /// GLES 2/3, WebGL: downlevel limits, simpler lighting.
    Embedded,
}

impl ShaderDialect {
    /// Compile-time choice for the current target.
    pub const fn for_target() -> Self {
        if cfg!(any(target_arch = "wasm32", target_os = "android")) {
            Self::Embedded
        } else {
            Self::Desktop
        }
    }

    /// Directory under `resources/shaders/` holding this dialect's sources.
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Embedded => "embedded",
        }
    }
}

impl Default for ShaderDialect {
    fn default() -> Self {
        Self::for_target()
    }
}

impl fmt::Display for ShaderDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for ShaderDialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "desktop" | "glsl330" | "330" => Ok(Self::Desktop),
            "embedded" | "es" | "web" | "glsl100" | "100" => Ok(Self::Embedded),
            other => bail!("Unknown shader dialect '{other}' (expected desktop|embedded)"),
        }
    }
}

/// WGSL text for each stage of a program.
#[derive(Clone, Debug, Default)]
pub struct ShaderSource {
    pub label: String,
    pub vertex: Option<String>,
    pub fragment: Option<String>,
}

impl ShaderSource {
    /// Read a program from disk; `None` paths fall back to built-in stages.
    pub fn load(vertex: Option<&Path>, fragment: Option<&Path>) -> Result<Self> {
        let label = fragment
            .or(vertex)
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "default".to_owned());

        let source = Self {
            label,
            vertex: vertex.map(|p| read_stage(p, "@vertex")).transpose()?,
            fragment: fragment.map(|p| read_stage(p, "@fragment")).transpose()?,
        };
        log::info!(
            "Loaded shader '{}' (vertex: {}, fragment: {})",
            source.label,
            stage_name(vertex),
            stage_name(fragment)
        );
        Ok(source)
    }
}

fn stage_name(path: Option<&Path>) -> String {
    path.map_or_else(|| "built-in".to_owned(), |p| p.display().to_string())
}

fn read_stage(path: &Path, entry_attr: &str) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read shader {}", path.display()))?;
    ensure!(
        text.contains(entry_attr),
        "Shader {} has no {entry_attr} entry point",
        path.display()
    );
    Ok(text)
}
