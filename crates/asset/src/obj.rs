//! Wavefront OBJ loader: positions, normals, texture coordinates, n-gon faces.
//!
//! Faces are fan-triangulated and `v/vt/vn` triples deduplicated into a single
//! index buffer. Texture `v` is flipped so (0,0) is the top-left texel, which
//! is how the renderer samples. Missing normals are rebuilt from the faces.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};

use crate::mesh::{MeshData, MeshVertex};

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<MeshData> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    let mesh = load_obj_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse OBJ file: {}", path.display()))?;
    log::info!(
        "Loaded mesh {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    if let Some((lo, hi)) = mesh.bounds() {
        log::debug!("Mesh bounds: {lo} .. {hi}");
    }
    Ok(mesh)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> Result<MeshData> {
    let mut parser = ObjParser::default();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
        parser.line(&line, line_no)?;
    }
    parser.finish()
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> Result<MeshData> {
    load_obj_from_reader(io::Cursor::new(contents))
}

/// Resolved `v/vt/vn` triple (0-based).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct Corner {
    pos: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

#[derive(Default)]
struct ObjParser {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    unique: HashMap<Corner, u32>,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    missing_normals: bool,
    face: Vec<u32>,
}

impl ObjParser {
    fn line(&mut self, raw: &str, line_no: usize) -> Result<()> {
        let line = raw.split('#').next().unwrap_or_default().trim();
        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            return Ok(());
        };

        match tag {
            "v" => {
                let p = floats::<3>(&mut parts, line_no, "vertex position")?;
                self.positions.push(p);
            }
            "vn" => {
                let n = floats::<3>(&mut parts, line_no, "vertex normal")?;
                self.normals.push(n);
            }
            "vt" => {
                // `v` defaults to 0; `w` is optional and unused.
                let [u] = floats::<1>(&mut parts, line_no, "texture coordinate")?;
                let v = match parts.next() {
                    Some(token) => token.parse::<f32>().with_context(|| {
                        format!("Failed to parse texture coordinate '{token}' on line {line_no}")
                    })?,
                    None => 0.0,
                };
                self.texcoords.push([u, 1.0 - v]);
            }
            "f" => self.face(parts, line_no)?,
            // Groups, smoothing, materials: one material slot is bound by the caller.
            "o" | "g" | "s" | "usemtl" | "mtllib" | "l" | "p" => {}
            other => log::trace!("OBJ line {line_no}: ignoring '{other}'"),
        }
        Ok(())
    }

    fn face<'a>(&mut self, parts: impl Iterator<Item = &'a str>, line_no: usize) -> Result<()> {
        self.face.clear();
        for token in parts {
            let corner = self.corner(token, line_no)?;
            let index = self.vertex_index(corner, line_no)?;
            self.face.push(index);
        }

        if self.face.len() < 3 {
            log::warn!(
                "OBJ line {line_no}: face with {} corners skipped",
                self.face.len()
            );
            return Ok(());
        }
        for i in 1..self.face.len() - 1 {
            self.indices
                .extend_from_slice(&[self.face[0], self.face[i], self.face[i + 1]]);
        }
        Ok(())
    }

    fn corner(&self, token: &str, line_no: usize) -> Result<Corner> {
        let mut fields = token.split('/');
        let pos = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Malformed face element '{token}' on line {line_no}"))?;
        let optional = |field: Option<&str>, len: usize| -> Result<Option<usize>> {
            match field {
                Some(s) if !s.is_empty() => resolve_index(s, len, line_no).map(Some),
                _ => Ok(None),
            }
        };
        Ok(Corner {
            pos: resolve_index(pos, self.positions.len(), line_no)?,
            uv: optional(fields.next(), self.texcoords.len())?,
            normal: optional(fields.next(), self.normals.len())?,
        })
    }

    fn vertex_index(&mut self, corner: Corner, line_no: usize) -> Result<u32> {
        if let Some(&idx) = self.unique.get(&corner) {
            return Ok(idx);
        }
        let idx = u32::try_from(self.vertices.len())
            .map_err(|_| anyhow!("Too many vertices in OBJ (line {line_no})"))?;
        let normal = match corner.normal {
            Some(i) => self.normals[i],
            None => {
                self.missing_normals = true;
                [0.0, 0.0, 0.0]
            }
        };
        let uv = corner.uv.map_or([0.0, 0.0], |i| self.texcoords[i]);
        self.vertices
            .push(MeshVertex::new(self.positions[corner.pos], normal, uv));
        self.unique.insert(corner, idx);
        Ok(idx)
    }

    fn finish(self) -> Result<MeshData> {
        if self.indices.is_empty() {
            bail!("OBJ contained no triangles");
        }
        let mut mesh = MeshData::new(self.vertices, self.indices);
        if self.missing_normals {
            log::debug!("OBJ has corners without normals, rebuilding from faces");
            mesh.recompute_normals();
        }
        Ok(mesh)
    }
}

fn floats<'a, const N: usize>(
    parts: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
    what: &str,
) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let token = parts
            .next()
            .ok_or_else(|| anyhow!("Missing component {i} of {what} on line {line_no}"))?;
        *slot = token
            .parse::<f32>()
            .with_context(|| format!("Failed to parse {what} '{token}' on line {line_no}"))?;
    }
    Ok(out)
}

/// OBJ indices are 1-based; negative values count back from the end.
fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize> {
    let raw = token
        .parse::<i64>()
        .with_context(|| format!("Invalid index '{token}' on line {line_no}"))?;
    let idx = match raw {
        0 => bail!("OBJ indices are 1-based; found 0 on line {line_no}"),
        r if r > 0 => r - 1,
        r => len as i64 + r,
    };
    if idx < 0 || idx as usize >= len {
        bail!("OBJ index {raw} resolved out of bounds (len={len}) on line {line_no}");
    }
    Ok(idx as usize)
}
