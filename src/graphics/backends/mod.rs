//! The backend of renderer, which should be responsible for only one thing:
//! forwarding state changes and draw-calls to the graphics API of the context that
//! is current on the calling thread.

pub mod headless;

#[cfg(not(target_arch = "wasm32"))]
pub mod gl;

use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::math::prelude::{Rect, Vector2};

use super::blend::{BlendFactor, Equation};
use super::shader::{UniformArray, UniformVariable};
use super::vertex::{PrimitiveType, Vertex, VertexComponent};

/// Identifier of a hardware context, `0` meaning that no context is active.
pub type ContextId = u64;

/// Name of an object living in a graphics context (texture, buffer, shader or program),
/// `0` meaning "none".
pub type Handle = u32;

/// Server-side capabilities that can be switched on and off.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    Blend,
    CullFace,
    DepthTest,
    /// Fixed-function only.
    AlphaTest,
    /// Fixed-function only.
    Lighting,
    /// Fixed-function only.
    Texture2D,
    FramebufferSrgb,
}

/// Client-side vertex arrays of the fixed-function pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClientArray {
    Vertex,
    Color,
    TexCoord,
}

/// The matrix stacks of the fixed-function pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MatrixMode {
    ModelView,
    Projection,
    Texture,
}

/// Expected usage pattern of a vertex buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferUsage {
    Static,
    Dynamic,
    Stream,
}

impl Default for BufferUsage {
    fn default() -> Self {
        BufferUsage::Stream
    }
}

/// Where vertex data is read from when the primitives are assembled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VertexSource {
    /// Client memory. The pointer must stay valid until the following draw call.
    Client(*const Vertex),
    /// The vertex buffer currently bound, starting at offset zero.
    Buffer,
}

/// The windowing layer's side of hardware contexts.
pub trait ContextProvider: Send + Sync {
    /// Returns the identifier of the context current on the calling thread.
    fn active_context_id(&self) -> ContextId;

    /// Makes sure that some context is current until the matching `release_transient`.
    fn acquire_transient(&self) -> Result<()>;

    fn release_transient(&self) -> Result<()>;
}

/// The narrow slice of the graphics API the render targets and shaders are built on.
///
/// Every call applies to the context current on the calling thread.
pub trait Device: Send + Sync {
    fn active_context_id(&self) -> ContextId;
    fn acquire_transient_context(&self) -> Result<()>;
    fn release_transient_context(&self) -> Result<()>;

    /// The version string of the API, e.g. `"4.1 Metal - 76.3"` or `"OpenGL ES 2.0"`.
    fn version(&self) -> Result<String>;
    fn extensions(&self) -> Result<Vec<String>>;
    fn max_combined_texture_units(&self) -> Result<u32>;
    /// Whether the matrix stacks and client-side arrays of the fixed-function pipeline
    /// exist. Core profiles and OpenGL ES 2+ do not expose them.
    fn fixed_function_available(&self) -> Result<bool>;

    fn set_capability(&self, capability: Capability, enabled: bool) -> Result<()>;
    fn set_client_array(&self, array: ClientArray, enabled: bool) -> Result<()>;
    fn active_texture(&self, unit: u32) -> Result<()>;
    fn client_active_texture(&self, unit: u32) -> Result<()>;

    /// Clears the color buffer with a normalized color.
    fn clear(&self, color: [f32; 4]) -> Result<()>;
    /// Sets the viewport in window coordinates (origin at the bottom-left corner).
    fn viewport(&self, rect: Rect<i32>) -> Result<()>;
    /// Loads a column-major matrix (or the identity) into `mode`, and leaves the
    /// model-view stack selected.
    fn load_matrix(&self, mode: MatrixMode, matrix: Option<&[f32; 16]>) -> Result<()>;
    /// Saves every attribute, client attribute and matrix on the API stacks.
    fn push_states(&self) -> Result<()>;
    fn pop_states(&self) -> Result<()>;

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) -> Result<()>;
    fn blend_func_separate(
        &self,
        color_src: BlendFactor,
        color_dst: BlendFactor,
        alpha_src: BlendFactor,
        alpha_dst: BlendFactor,
    ) -> Result<()>;
    fn blend_equation(&self, equation: Equation) -> Result<()>;
    fn blend_equation_separate(&self, color: Equation, alpha: Equation) -> Result<()>;

    fn create_texture(&self, size: Vector2<u32>) -> Result<Handle>;
    /// Uploads RGBA8 pixels into `area` of the texture.
    fn update_texture(&self, handle: Handle, area: Rect<u32>, pixels: &[u8]) -> Result<()>;
    fn bind_texture(&self, handle: Handle) -> Result<()>;
    fn delete_texture(&self, handle: Handle) -> Result<()>;

    fn create_buffer(&self, vertices: &[Vertex], usage: BufferUsage) -> Result<Handle>;
    fn update_buffer(&self, handle: Handle, offset: usize, vertices: &[Vertex]) -> Result<()>;
    fn bind_buffer(&self, handle: Handle) -> Result<()>;
    fn delete_buffer(&self, handle: Handle) -> Result<()>;

    /// Points a fixed-function client array at `component` of the vertices in `source`.
    unsafe fn vertex_pointer(&self, component: VertexComponent, source: VertexSource)
        -> Result<()>;

    fn set_vertex_attrib_array(&self, location: u32, enabled: bool) -> Result<()>;

    /// Points a generic vertex attribute at `component` of the vertices in `source`.
    unsafe fn vertex_attrib_pointer(
        &self,
        location: u32,
        component: VertexComponent,
        source: VertexSource,
    ) -> Result<()>;

    fn draw_arrays(&self, primitive: PrimitiveType, first: usize, count: usize) -> Result<()>;

    /// Forces the execution of the issued commands in finite time.
    fn flush(&self) -> Result<()>;

    fn create_program(&self) -> Result<Handle>;
    /// Compiles a shader object, failing with `Error::Compile` and the compiler log.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Handle>;
    fn attach_shader(&self, program: Handle, shader: Handle) -> Result<()>;
    fn delete_shader(&self, shader: Handle) -> Result<()>;
    /// Links a program, failing with `Error::Link` and the linker log.
    fn link_program(&self, program: Handle) -> Result<()>;
    fn delete_program(&self, program: Handle) -> Result<()>;
    fn use_program(&self, program: Handle) -> Result<()>;
    fn current_program(&self) -> Result<Handle>;
    fn uniform_location(&self, program: Handle, name: &str) -> Result<i32>;
    fn attrib_location(&self, program: Handle, name: &str) -> Result<i32>;
    fn uniform(&self, location: i32, variable: &UniformVariable) -> Result<()>;
    fn uniform_array(&self, location: i32, array: &UniformArray) -> Result<()>;
}
