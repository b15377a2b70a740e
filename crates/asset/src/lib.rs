//! Asset loading/parsers (meshes, textures, shaders).
//! Everything here is CPU-side; GPU upload lives in the renderer.

pub mod manifest;
pub mod mesh;
pub mod obj;
pub mod shader;
pub mod texture;

pub use manifest::SceneManifest;
pub use mesh::{MeshData, MeshVertex};
pub use shader::{ShaderDialect, ShaderSource};
pub use texture::TextureData;
