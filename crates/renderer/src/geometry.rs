//! Static cube mesh data.
//!
//! The cube is the only geometry in the program: 6 faces, 4 unique vertices
//! per face so normals and texture coordinates stay flat across each face,
//! indexed as two triangles per face.

/// Cube vertex data as separate attribute arrays plus index topology.
#[derive(Debug, Clone)]
pub struct CubeMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl CubeMesh {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

// Outward normal and the four corners of each face, listed counter-clockwise
// when viewed from outside the cube.
#[rustfmt::skip]
const FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
    // front
    ([ 0.0,  0.0,  1.0], [[-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0]]),
    // back
    ([ 0.0,  0.0, -1.0], [[-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0]]),
    // top
    ([ 0.0,  1.0,  0.0], [[-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0]]),
    // bottom
    ([ 0.0, -1.0,  0.0], [[-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0]]),
    // right
    ([ 1.0,  0.0,  0.0], [[ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0]]),
    // left
    ([-1.0,  0.0,  0.0], [[-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0]]),
];

const FACE_TEXCOORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Builds the unit cube: 24 vertices, 36 indices.
pub fn cube_mesh() -> CubeMesh {
    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut texcoords = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, corners) in FACES {
        let base = positions.len() as u16;
        for corner in corners {
            positions.push(corner);
            normals.push(normal);
        }
        texcoords.extend_from_slice(&FACE_TEXCOORDS);
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    CubeMesh {
        positions,
        normals,
        texcoords,
        indices,
    }
}
