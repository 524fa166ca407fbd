use ::gl;
use ::gl::types::*;

use crate::errors::ShaderStage;

use super::super::super::blend::{BlendFactor, Equation};
use super::super::super::vertex::PrimitiveType;
use super::super::{BufferUsage, Capability, ClientArray, MatrixMode};
use super::legacy;

impl From<BlendFactor> for GLenum {
    fn from(factor: BlendFactor) -> Self {
        match factor {
            BlendFactor::Zero => gl::ZERO,
            BlendFactor::One => gl::ONE,
            BlendFactor::SrcColor => gl::SRC_COLOR,
            BlendFactor::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
            BlendFactor::DstColor => gl::DST_COLOR,
            BlendFactor::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
            BlendFactor::SrcAlpha => gl::SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DstAlpha => gl::DST_ALPHA,
            BlendFactor::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
        }
    }
}

impl From<Equation> for GLenum {
    fn from(eq: Equation) -> Self {
        match eq {
            Equation::Add => gl::FUNC_ADD,
            Equation::Subtract => gl::FUNC_SUBTRACT,
            Equation::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
            Equation::Min => gl::MIN,
            Equation::Max => gl::MAX,
        }
    }
}

impl From<PrimitiveType> for GLenum {
    fn from(primitive: PrimitiveType) -> Self {
        match primitive {
            PrimitiveType::Points => gl::POINTS,
            PrimitiveType::Lines => gl::LINES,
            PrimitiveType::LineStrip => gl::LINE_STRIP,
            PrimitiveType::Triangles => gl::TRIANGLES,
            PrimitiveType::TriangleStrip => gl::TRIANGLE_STRIP,
            PrimitiveType::TriangleFan => gl::TRIANGLE_FAN,
            PrimitiveType::Quads => legacy::QUADS,
        }
    }
}

impl From<BufferUsage> for GLenum {
    fn from(usage: BufferUsage) -> Self {
        match usage {
            BufferUsage::Static => gl::STATIC_DRAW,
            BufferUsage::Dynamic => gl::DYNAMIC_DRAW,
            BufferUsage::Stream => gl::STREAM_DRAW,
        }
    }
}

impl From<ShaderStage> for GLenum {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Geometry => gl::GEOMETRY_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl From<Capability> for GLenum {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::Blend => gl::BLEND,
            Capability::CullFace => gl::CULL_FACE,
            Capability::DepthTest => gl::DEPTH_TEST,
            Capability::AlphaTest => legacy::ALPHA_TEST,
            Capability::Lighting => legacy::LIGHTING,
            Capability::Texture2D => gl::TEXTURE_2D,
            Capability::FramebufferSrgb => gl::FRAMEBUFFER_SRGB,
        }
    }
}

impl From<ClientArray> for GLenum {
    fn from(array: ClientArray) -> Self {
        match array {
            ClientArray::Vertex => legacy::VERTEX_ARRAY,
            ClientArray::Color => legacy::COLOR_ARRAY,
            ClientArray::TexCoord => legacy::TEXTURE_COORD_ARRAY,
        }
    }
}

impl From<MatrixMode> for GLenum {
    fn from(mode: MatrixMode) -> Self {
        match mode {
            MatrixMode::ModelView => legacy::MODELVIEW,
            MatrixMode::Projection => legacy::PROJECTION,
            MatrixMode::Texture => legacy::TEXTURE,
        }
    }
}

impl Capability {
    /// Whether the capability only exists in the fixed-function pipeline.
    pub fn is_legacy(self) -> bool {
        match self {
            Capability::AlphaTest | Capability::Lighting | Capability::Texture2D => true,
            _ => false,
        }
    }
}
