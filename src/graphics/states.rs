use crate::math::prelude::Transform;

use super::blend::BlendMode;
use super::shader::Shader;
use super::texture::Texture;

/// The states used for drawing to a render target.
#[derive(Clone, Copy)]
pub struct RenderStates<'a> {
    pub blend_mode: BlendMode,
    pub transform: Transform,
    pub texture: Option<&'a Texture>,
    pub shader: Option<&'a Shader>,
}

impl<'a> Default for RenderStates<'a> {
    fn default() -> Self {
        RenderStates {
            blend_mode: BlendMode::ALPHA,
            transform: Transform::identity(),
            texture: None,
            shader: None,
        }
    }
}

impl<'a> RenderStates<'a> {
    pub fn new(
        blend_mode: BlendMode,
        transform: Transform,
        texture: Option<&'a Texture>,
        shader: Option<&'a Shader>,
    ) -> Self {
        RenderStates {
            blend_mode,
            transform,
            texture,
            shader,
        }
    }
}

impl<'a> From<BlendMode> for RenderStates<'a> {
    fn from(blend_mode: BlendMode) -> Self {
        RenderStates {
            blend_mode,
            ..RenderStates::default()
        }
    }
}

impl<'a> From<Transform> for RenderStates<'a> {
    fn from(transform: Transform) -> Self {
        RenderStates {
            transform,
            ..RenderStates::default()
        }
    }
}

impl<'a> From<&'a Texture> for RenderStates<'a> {
    fn from(texture: &'a Texture) -> Self {
        RenderStates {
            texture: Some(texture),
            ..RenderStates::default()
        }
    }
}

impl<'a> From<&'a Shader> for RenderStates<'a> {
    fn from(shader: &'a Shader) -> Self {
        RenderStates {
            shader: Some(shader),
            ..RenderStates::default()
        }
    }
}
