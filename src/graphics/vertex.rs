use serde::{Deserialize, Serialize};

use crate::math::prelude::{Color, Vector2};

/// A point with a color and texture coordinates, laid out exactly the way it is
/// streamed to the graphics API.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vector2<f32>,
    pub color: Color,
    pub tex_coords: Vector2<f32>,
}

impl Vertex {
    pub fn new<P, T>(position: P, color: Color, tex_coords: T) -> Self
    where
        P: Into<Vector2<f32>>,
        T: Into<Vector2<f32>>,
    {
        Vertex {
            position: position.into(),
            color,
            tex_coords: tex_coords.into(),
        }
    }

    pub fn with_color<P>(position: P, color: Color) -> Self
    where
        P: Into<Vector2<f32>>,
    {
        Vertex::new(position, color, [0.0, 0.0])
    }

    /// Size of a vertex in bytes, as handed to the API as the stride.
    pub const STRIDE: usize = 20;
    /// Byte offset of the position.
    pub const POSITION_OFFSET: usize = 0;
    /// Byte offset of the color.
    pub const COLOR_OFFSET: usize = 8;
    /// Byte offset of the texture coordinates.
    pub const TEX_COORDS_OFFSET: usize = 12;
}

impl Default for Vertex {
    fn default() -> Self {
        Vertex::new([0.0, 0.0], Color::white(), [0.0, 0.0])
    }
}

/// The kind of primitive the vertices of a draw call are assembled into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    /// Only available on desktop OpenGL.
    Quads,
}

/// The components of a `Vertex` that are streamed separately.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexComponent {
    Position,
    Color,
    TexCoords,
}

impl VertexComponent {
    /// Returns `(components, byte offset)` of this component inside a `Vertex`.
    pub fn layout(self) -> (usize, usize) {
        match self {
            VertexComponent::Position => (2, Vertex::POSITION_OFFSET),
            VertexComponent::Color => (4, Vertex::COLOR_OFFSET),
            VertexComponent::TexCoords => (2, Vertex::TEX_COORDS_OFFSET),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::mem;

    #[test]
    fn layout() {
        assert_eq!(mem::size_of::<Vertex>(), Vertex::STRIDE);

        let v = Vertex::default();
        let base = &v as *const Vertex as usize;
        assert_eq!(&v.position as *const _ as usize - base, Vertex::POSITION_OFFSET);
        assert_eq!(&v.color as *const _ as usize - base, Vertex::COLOR_OFFSET);
        assert_eq!(&v.tex_coords as *const _ as usize - base, Vertex::TEX_COORDS_OFFSET);
    }
}
