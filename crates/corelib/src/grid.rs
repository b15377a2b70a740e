//! Reference floor grid on the XZ plane.

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

const EDGE_GRAY: [f32; 3] = [0.5, 0.5, 0.5];
const LINE_GRAY: [f32; 3] = [0.75, 0.75, 0.75];

/// Line-list vertices for `slices + 1` lines per axis, centred on the origin.
/// The first line in each direction is drawn darker.
pub fn grid_lines(slices: u32, spacing: f32) -> Vec<GridVertex> {
    let half = slices as f32 * spacing * 0.5;
    let mut verts = Vec::with_capacity(4 * (slices as usize + 1));

    for i in 0..=slices {
        let color = if i == 0 { EDGE_GRAY } else { LINE_GRAY };
        let offset = -half + i as f32 * spacing;

        // Parallel to Z.
        verts.push(GridVertex { position: [offset, 0.0, -half], color });
        verts.push(GridVertex { position: [offset, 0.0, half], color });
        // Parallel to X.
        verts.push(GridVertex { position: [-half, 0.0, offset], color });
        verts.push(GridVertex { position: [half, 0.0, offset], color });
    }
    verts
}
