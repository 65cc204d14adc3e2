//! Fixed cube geometry.
//!
//! The cube is built once, immutably, as 24 vertices (4 per face, duplicated
//! at the seams so every face corner carries its own attribute) and 36
//! indices. Triangles wind counter-clockwise seen from outside, so backface
//! culling keeps the outward faces.

/// Which attribute set the renderer draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Position + texture coordinate, sampled from a registered texture.
    Textured,
    /// Position + per-vertex RGBA color, no texture bound.
    VertexColored,
}

/// Position + texture coordinate, tightly packed for the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TexturedVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

/// Position + RGBA color, tightly packed for the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ColoredVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

pub struct Mesh<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u16>,
}

/// Corner positions of each cube face, wound counter-clockwise from
/// outside: bottom-left, bottom-right, top-right, top-left.
const FACES: [[[f32; 3]; 4]; 6] = [
    // Front (+z)
    [
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ],
    // Back (-z)
    [
        [0.5, -0.5, -0.5],
        [-0.5, -0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [0.5, 0.5, -0.5],
    ],
    // Top (+y)
    [
        [-0.5, 0.5, 0.5],
        [0.5, 0.5, 0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
    ],
    // Bottom (-y)
    [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, -0.5, 0.5],
        [-0.5, -0.5, 0.5],
    ],
    // Right (+x)
    [
        [0.5, -0.5, 0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [0.5, 0.5, 0.5],
    ],
    // Left (-x)
    [
        [-0.5, -0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [-0.5, 0.5, 0.5],
        [-0.5, 0.5, -0.5],
    ],
];

/// One quad's worth of texture coordinates, top of the image at v = 0.
const FACE_TEX_COORDS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

/// One opaque color per face.
const FACE_COLORS: [[f32; 4]; 6] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
    [1.0, 1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, 1.0],
];

fn cube_indices() -> Vec<u16> {
    (0..6u16)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect()
}

impl Mesh<TexturedVertex> {
    #[must_use]
    pub fn textured_cube() -> Self {
        let vertices = FACES
            .iter()
            .flat_map(|corners| {
                corners.iter().zip(FACE_TEX_COORDS).map(|(&position, tex_coord)| {
                    TexturedVertex {
                        position,
                        tex_coord,
                    }
                })
            })
            .collect();

        Self {
            vertices,
            indices: cube_indices(),
        }
    }
}

impl Mesh<ColoredVertex> {
    #[must_use]
    pub fn colored_cube() -> Self {
        let vertices = FACES
            .iter()
            .zip(FACE_COLORS)
            .flat_map(|(corners, color)| {
                corners
                    .iter()
                    .map(move |&position| ColoredVertex { position, color })
            })
            .collect();

        Self {
            vertices,
            indices: cube_indices(),
        }
    }
}
