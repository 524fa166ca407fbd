//! The two ways a draw call reaches the graphics API.
//!
//! The render target runs one draw procedure for every backend, and delegates the
//! steps that differ to a `Pipeline`:
//!
//! * `FixedFunction` drives the legacy desktop pipeline: matrix stacks for the
//! transform and the projection, client-side arrays for the vertices, and programs
//! only when the caller supplies one.
//! * `Programmable` draws everything through a program. Without a user program, one
//! of the built-in programs emulates the fixed-function transform, color and texture
//! stages, and the matrices are uploaded as uniforms.

use std::ops::Deref;
use std::sync::Arc;

use crate::errors::*;
use crate::math::prelude::{Rect, Transform};
use crate::settings::PipelineKind;

use super::backends::{Capability, ClientArray, Device, Handle, MatrixMode, VertexSource};
use super::cache::{AttributeLocations, StateCache};
use super::shader::{BuiltinShader, Shader, UniformVariable};
use super::states::RenderStates;
use super::texture::{CoordinateType, Texture};
use super::vertex::{Vertex, VertexComponent};
use super::Graphics;

/// The program a draw call goes through.
pub enum ActiveShader<'a> {
    User(&'a Shader),
    Builtin(Arc<Shader>),
}

impl<'a> Deref for ActiveShader<'a> {
    type Target = Shader;

    fn deref(&self) -> &Shader {
        match *self {
            ActiveShader::User(v) => v,
            ActiveShader::Builtin(ref v) => v.as_ref(),
        }
    }
}

/// The backend specific steps of a draw call.
pub trait Pipeline {
    fn kind(&self) -> PipelineKind;

    /// Establishes the baseline states of the backend: texture unit 0 active, no
    /// culling or depth testing, blending enabled, and the default vertex wiring.
    fn reset(&self, graphics: &Graphics, cache: &mut StateCache) -> Result<()>;

    /// Picks the program the draw call goes through, if any.
    fn select<'a>(&self, graphics: &Graphics, states: &RenderStates<'a>)
        -> Option<ActiveShader<'a>>;

    /// Applies the model-view transform. Pre-transformed vertices are drawn with the
    /// identity.
    fn apply_transform(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        shader: Option<&Shader>,
        use_vertex_cache: bool,
        transform: &Transform,
    ) -> Result<()>;

    /// Applies the viewport (in window coordinates) and the projection of the view.
    fn apply_view(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        shader: Option<&Shader>,
        viewport: Rect<i32>,
        projection: &Transform,
    ) -> Result<()>;

    /// Binds the program of the draw call. `texture_set` tells whether `texture` has
    /// just been bound.
    fn apply_shader(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        shader: Option<&ActiveShader>,
        texture: Option<&Texture>,
        texture_set: bool,
    ) -> Result<()>;

    /// Points the vertex arrays at client memory: either `vertices`, or the vertex
    /// cache of the render target when `use_vertex_cache` is set.
    fn stream_vertices(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        vertices: &[Vertex],
        use_vertex_cache: bool,
        tex_coords: bool,
    ) -> Result<()>;

    /// Points the vertex arrays at the vertex buffer currently bound.
    fn stream_buffer(&self, graphics: &Graphics, cache: &mut StateCache) -> Result<()>;

    /// Unbinds the program of the draw call.
    fn cleanup(&self, graphics: &Graphics, states: &RenderStates) -> Result<()>;

    fn push_states(&self, graphics: &Graphics) -> Result<()>;

    fn pop_states(&self, graphics: &Graphics) -> Result<()>;
}

fn baseline(device: &dyn Device) -> Result<()> {
    device.set_capability(Capability::CullFace, false)?;
    device.set_capability(Capability::DepthTest, false)?;
    device.set_capability(Capability::Blend, true)
}

/// Sets the pointers of `components` at `source`, with the attribute locations of
/// `attributes` or the fixed-function client arrays.
unsafe fn point(
    device: &dyn Device,
    attributes: Option<AttributeLocations>,
    components: &[VertexComponent],
    source: VertexSource,
) -> Result<()> {
    for &component in components {
        match attributes {
            Some(locations) => {
                let location = match component {
                    VertexComponent::Position => locations.position,
                    VertexComponent::Color => locations.color,
                    VertexComponent::TexCoords => locations.tex_coords,
                };

                if location >= 0 {
                    device.vertex_attrib_pointer(location as u32, component, source)?;
                }
            }
            None => device.vertex_pointer(component, source)?,
        }
    }

    Ok(())
}

const POSITION_COLOR: [VertexComponent; 2] = [VertexComponent::Position, VertexComponent::Color];

const ALL_COMPONENTS: [VertexComponent; 3] = [
    VertexComponent::Position,
    VertexComponent::Color,
    VertexComponent::TexCoords,
];

/// The legacy desktop pipeline.
pub struct FixedFunction;

impl Pipeline for FixedFunction {
    fn kind(&self) -> PipelineKind {
        PipelineKind::FixedFunction
    }

    fn reset(&self, graphics: &Graphics, _: &mut StateCache) -> Result<()> {
        let driver = graphics.driver();
        let device = driver.device();

        if driver.features().multitexture {
            device.client_active_texture(0)?;
            device.active_texture(0)?;
        }

        baseline(device)?;

        device.set_capability(Capability::AlphaTest, false)?;
        device.set_capability(Capability::Lighting, false)?;
        device.set_capability(Capability::Texture2D, true)?;
        device.load_matrix(MatrixMode::ModelView, None)?;
        device.set_client_array(ClientArray::Vertex, true)?;
        device.set_client_array(ClientArray::Color, true)?;
        device.set_client_array(ClientArray::TexCoord, true)
    }

    fn select<'a>(&self, _: &Graphics, states: &RenderStates<'a>) -> Option<ActiveShader<'a>> {
        states.shader.map(ActiveShader::User)
    }

    fn apply_transform(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        _: Option<&Shader>,
        use_vertex_cache: bool,
        transform: &Transform,
    ) -> Result<()> {
        let device = graphics.driver().device();

        if use_vertex_cache {
            if !cache.use_vertex_cache {
                device.load_matrix(MatrixMode::ModelView, None)?;
            }

            return Ok(());
        }

        if transform.is_identity() {
            device.load_matrix(MatrixMode::ModelView, None)
        } else {
            device.load_matrix(MatrixMode::ModelView, Some(&transform.matrix()))
        }
    }

    fn apply_view(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        _: Option<&Shader>,
        viewport: Rect<i32>,
        projection: &Transform,
    ) -> Result<()> {
        if cache.valid && !cache.view_changed {
            return Ok(());
        }

        let device = graphics.driver().device();
        device.viewport(viewport)?;
        device.load_matrix(MatrixMode::Projection, Some(&projection.matrix()))?;

        cache.view_changed = false;
        Ok(())
    }

    fn apply_shader(
        &self,
        graphics: &Graphics,
        _: &mut StateCache,
        shader: Option<&ActiveShader>,
        _: Option<&Texture>,
        _: bool,
    ) -> Result<()> {
        match shader {
            Some(v) => Shader::bind_with(graphics.driver(), Some(&**v)),
            None => Ok(()),
        }
    }

    fn stream_vertices(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        vertices: &[Vertex],
        use_vertex_cache: bool,
        tex_coords: bool,
    ) -> Result<()> {
        let device = graphics.driver().device();

        if tex_coords != cache.tex_coords_enabled {
            device.set_client_array(ClientArray::TexCoord, tex_coords)?;
        }

        let cached = VertexSource::Client(cache.vertex_cache.as_ptr());

        // The pointers stay valid until the draw call: `vertices` is borrowed for the
        // whole call, and the vertex cache is never reallocated.
        unsafe {
            if !use_vertex_cache || !cache.use_vertex_cache {
                let source = if use_vertex_cache {
                    cached
                } else {
                    VertexSource::Client(vertices.as_ptr())
                };

                let components = if tex_coords {
                    &ALL_COMPONENTS[..]
                } else {
                    &POSITION_COLOR[..]
                };

                point(device, None, components, source)
            } else if tex_coords && !cache.tex_coords_enabled {
                point(device, None, &[VertexComponent::TexCoords], cached)
            } else {
                Ok(())
            }
        }
    }

    fn stream_buffer(&self, graphics: &Graphics, cache: &mut StateCache) -> Result<()> {
        let device = graphics.driver().device();

        if !cache.tex_coords_enabled {
            device.set_client_array(ClientArray::TexCoord, true)?;
        }

        unsafe { point(device, None, &ALL_COMPONENTS, VertexSource::Buffer) }
    }

    fn cleanup(&self, graphics: &Graphics, states: &RenderStates) -> Result<()> {
        if states.shader.is_some() {
            Shader::bind_with(graphics.driver(), None)?;
        }

        Ok(())
    }

    fn push_states(&self, graphics: &Graphics) -> Result<()> {
        graphics.driver().device().push_states()
    }

    fn pop_states(&self, graphics: &Graphics) -> Result<()> {
        graphics.driver().device().pop_states()
    }
}

/// The shader-only pipeline of embedded systems.
pub struct Programmable;

impl Programmable {
    fn query_attributes(device: &dyn Device, program: Handle) -> Result<AttributeLocations> {
        if program == 0 {
            return Ok(AttributeLocations::default());
        }

        Ok(AttributeLocations {
            position: device.attrib_location(program, "position")?,
            color: device.attrib_location(program, "color")?,
            tex_coords: device.attrib_location(program, "texCoord")?,
        })
    }
}

impl Pipeline for Programmable {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Programmable
    }

    fn reset(&self, graphics: &Graphics, cache: &mut StateCache) -> Result<()> {
        let driver = graphics.driver();
        let device = driver.device();

        if driver.features().multitexture {
            device.active_texture(0)?;
        }

        baseline(device)?;

        for location in cache.attributes.iter() {
            device.set_vertex_attrib_array(location, false)?;
        }

        // The arrays were just disabled, the locations are queried and enabled again
        // by the next draw call.
        cache.last_program = 0;
        cache.attributes = AttributeLocations::default();
        Ok(())
    }

    fn select<'a>(&self, graphics: &Graphics, states: &RenderStates<'a>) -> Option<ActiveShader<'a>> {
        let shader = match (states.shader, states.texture) {
            (Some(v), _) => ActiveShader::User(v),
            (None, Some(_)) => ActiveShader::Builtin(graphics.builtins().get(BuiltinShader::Textured)),
            (None, None) => ActiveShader::Builtin(graphics.builtins().get(BuiltinShader::Untextured)),
        };

        Some(shader)
    }

    fn apply_transform(
        &self,
        _: &Graphics,
        _: &mut StateCache,
        shader: Option<&Shader>,
        use_vertex_cache: bool,
        transform: &Transform,
    ) -> Result<()> {
        let modelview = if use_vertex_cache {
            Transform::identity()
        } else {
            *transform
        };

        match shader {
            Some(v) => v.try_set_uniform("sf_modelview", &modelview.into()),
            None => Ok(()),
        }
    }

    fn apply_view(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        shader: Option<&Shader>,
        viewport: Rect<i32>,
        projection: &Transform,
    ) -> Result<()> {
        graphics.driver().device().viewport(viewport)?;

        // Every program has its own projection, which is uploaded on every draw.
        if let Some(v) = shader {
            v.try_set_uniform("sf_projection", &(*projection).into())?;
        }

        cache.view_changed = false;
        Ok(())
    }

    fn apply_shader(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        shader: Option<&ActiveShader>,
        texture: Option<&Texture>,
        texture_set: bool,
    ) -> Result<()> {
        let (shader, user): (&Shader, bool) = match shader {
            Some(ActiveShader::User(v)) => (*v, true),
            Some(ActiveShader::Builtin(v)) => (v.as_ref(), false),
            None => return Ok(()),
        };

        let driver = graphics.driver();
        let program = shader.native_handle();

        if let Some(texture) = texture {
            if texture_set || cache.last_program != program {
                let matrix = texture.texture_matrix(CoordinateType::Pixels);
                shader.try_set_uniform("sf_texture", &UniformVariable::Matrix4f(matrix))?;

                // Lets user shaders scale texture coordinates by the size of the
                // texture rather than the padded size of its storage.
                let (size, actual) = (texture.size(), texture.actual_size());
                if user && actual.x != 0 && actual.y != 0 {
                    let factor = [
                        size.x as f32 / actual.x as f32,
                        size.y as f32 / actual.y as f32,
                    ];

                    shader.try_set_uniform("factor_npot", &factor.into())?;
                }
            }
        }

        Shader::bind_with(driver, Some(shader))?;

        if cache.last_program != program {
            let device = driver.device();
            cache.last_program = program;
            cache.attributes = Programmable::query_attributes(device, program)?;

            for location in cache.attributes.iter() {
                device.set_vertex_attrib_array(location, true)?;
            }
        }

        Ok(())
    }

    fn stream_vertices(
        &self,
        graphics: &Graphics,
        cache: &mut StateCache,
        vertices: &[Vertex],
        use_vertex_cache: bool,
        tex_coords: bool,
    ) -> Result<()> {
        let device = graphics.driver().device();
        let source = if use_vertex_cache {
            VertexSource::Client(cache.vertex_cache.as_ptr())
        } else {
            VertexSource::Client(vertices.as_ptr())
        };

        let components = if tex_coords {
            &ALL_COMPONENTS[..]
        } else {
            &POSITION_COLOR[..]
        };

        // See `FixedFunction::stream_vertices`.
        unsafe { point(device, Some(cache.attributes), components, source) }
    }

    fn stream_buffer(&self, graphics: &Graphics, cache: &mut StateCache) -> Result<()> {
        let device = graphics.driver().device();

        if !cache.tex_coords_enabled && cache.attributes.tex_coords >= 0 {
            device.set_vertex_attrib_array(cache.attributes.tex_coords as u32, true)?;
        }

        unsafe {
            point(
                device,
                Some(cache.attributes),
                &ALL_COMPONENTS,
                VertexSource::Buffer,
            )
        }
    }

    fn cleanup(&self, graphics: &Graphics, _: &RenderStates) -> Result<()> {
        Shader::bind_with(graphics.driver(), None)
    }

    fn push_states(&self, _: &Graphics) -> Result<()> {
        Ok(())
    }

    fn pop_states(&self, _: &Graphics) -> Result<()> {
        Ok(())
    }
}

/// Returns the implementation of `kind`.
pub fn pipeline(kind: PipelineKind) -> &'static dyn Pipeline {
    match kind {
        PipelineKind::FixedFunction => &FixedFunction,
        PipelineKind::Programmable => &Programmable,
    }
}
