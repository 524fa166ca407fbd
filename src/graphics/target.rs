//! Render targets: drawable surfaces, and the cache of the pipeline states they
//! applied to the context.
//!
//! Several render targets may share a context, and a context may be made current
//! behind our back. Before every operation, a render target makes sure it is the one
//! that was last active in the context current on the calling thread, and forgets
//! everything it cached otherwise. The next draw call then starts from the baseline
//! states again.
//!
//! Redundant state changes are skipped:
//!
//! * The view is applied again only after `set_view`, or after a reset.
//! * Small batches of vertices are transformed on the CPU into the vertex cache, so
//! they are all drawn with the identity transform.
//! * Blend modes and textures are applied only if they differ from the last ones.
//! Textures are compared with their cache identifiers, since handles are recycled.
//! Textures of off-screen render targets are bound on every draw, so that the
//! writes of other contexts become visible.

use std::cmp;
use std::sync::Arc;

use crate::errors::*;
use crate::math::prelude::{Color, Rect, Vector2};

use super::backends::Capability;
use super::blend::{BlendMode, Equation};
use super::cache::StateCache;
use super::capabilities::Features;
use super::context::Activation;
use super::pipeline::Pipeline;
use super::shader::Shader;
use super::states::RenderStates;
use super::texture::{CoordinateType, Texture, VertexBuffer};
use super::vertex::{PrimitiveType, Vertex};
use super::view::View;
use super::{Graphics, Warning};

/// The windowing layer's side of a render target.
pub trait Surface: Send {
    /// The size of the surface in pixels.
    fn size(&self) -> Vector2<u32>;

    /// Whether the surface stores colors in the sRGB color space.
    fn is_srgb(&self) -> bool {
        false
    }

    /// Makes the context of the surface current, or releases it. Returns false if
    /// that is not possible.
    fn activate(&mut self, _active: bool) -> bool {
        true
    }
}

/// Objects that know how to draw themselves to a render target.
pub trait Drawable {
    fn draw(&self, target: &mut RenderTarget, states: &RenderStates);
}

pub struct RenderTarget {
    graphics: Arc<Graphics>,
    surface: Box<dyn Surface>,
    id: u64,
    default_view: View,
    view: View,
    cache: StateCache,
}

impl RenderTarget {
    pub fn new(graphics: Arc<Graphics>, surface: Box<dyn Surface>) -> Self {
        let vertex_cache_size = graphics.driver().params().vertex_cache_size;
        let mut target = RenderTarget {
            graphics,
            surface,
            id: 0,
            default_view: View::default(),
            view: View::default(),
            cache: StateCache::new(vertex_cache_size),
        };

        target.initialize();
        target
    }

    /// Sets the default and the current view up for the size of the surface, and
    /// takes a new identifier. The states are applied by the first draw call, so the
    /// states of the user are left untouched until then.
    pub fn initialize(&mut self) {
        let size = self.surface.size();
        self.default_view
            .reset(Rect::new(0.0, 0.0, size.x as f32, size.y as f32));
        self.view = self.default_view;

        self.cache.applied_once = false;
        self.cache.invalidate();

        let tracker = self.graphics.tracker();
        if self.id != 0 {
            tracker.forget(self.id);
        }

        self.id = tracker.get_unique_id();
    }

    /// Clears the whole target with a single color.
    pub fn clear(&mut self, color: Color) {
        if !self.ensure_active() {
            return;
        }

        let graphics = self.graphics.clone();
        let result = self
            .apply_texture(&graphics, None)
            .and_then(|_| graphics.driver().device().clear(color.normalized()));

        if let Err(err) = result {
            error!("Failed to clear render target {}. {}", self.id, err);
        }
    }

    /// Changes the current view. It is applied by the next draw call.
    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.cache.view_changed = true;
    }

    #[inline]
    pub fn view(&self) -> &View {
        &self.view
    }

    /// The view that shows the whole surface, with world units in pixels.
    #[inline]
    pub fn default_view(&self) -> &View {
        &self.default_view
    }

    /// The area of the surface `view` is drawn to, in pixels.
    pub fn viewport(&self, view: &View) -> Rect<i32> {
        let size = self.size();
        let (width, height) = (size.x as f32, size.y as f32);
        let viewport = view.viewport();

        let round = |v: f32| (0.5 + v).floor() as i32;
        Rect::new(
            round(width * viewport.left),
            round(height * viewport.top),
            round(width * viewport.width),
            round(height * viewport.height),
        )
    }

    /// Converts a pixel of the surface into world coordinates, with the current view.
    pub fn map_pixel_to_coords<P: Into<Vector2<i32>>>(&self, point: P) -> Vector2<f32> {
        self.map_pixel_to_coords_with(point, &self.view)
    }

    pub fn map_pixel_to_coords_with<P>(&self, point: P, view: &View) -> Vector2<f32>
    where
        P: Into<Vector2<i32>>,
    {
        let point = point.into();
        let viewport: Rect<f32> = self.viewport(view).into();

        let normalized = Vector2::new(
            -1.0 + 2.0 * (point.x as f32 - viewport.left) / viewport.width,
            1.0 - 2.0 * (point.y as f32 - viewport.top) / viewport.height,
        );

        view.inverse_transform().transform_point(normalized)
    }

    /// Converts world coordinates into a pixel of the surface, with the current view.
    pub fn map_coords_to_pixel<P: Into<Vector2<f32>>>(&self, point: P) -> Vector2<i32> {
        self.map_coords_to_pixel_with(point, &self.view)
    }

    pub fn map_coords_to_pixel_with<P>(&self, point: P, view: &View) -> Vector2<i32>
    where
        P: Into<Vector2<f32>>,
    {
        let normalized = view.transform().transform_point(point);
        let viewport: Rect<f32> = self.viewport(view).into();

        Vector2::new(
            ((normalized.x + 1.0) / 2.0 * viewport.width + viewport.left) as i32,
            ((-normalized.y + 1.0) / 2.0 * viewport.height + viewport.top) as i32,
        )
    }

    /// Draws a drawable object.
    pub fn draw(&mut self, drawable: &dyn Drawable, states: &RenderStates) {
        drawable.draw(self, states);
    }

    /// Draws primitives defined by an array of vertices.
    pub fn draw_vertices(
        &mut self,
        vertices: &[Vertex],
        primitive: PrimitiveType,
        states: &RenderStates,
    ) {
        if vertices.is_empty() {
            return;
        }

        if !self.check_primitive(primitive) {
            return;
        }

        if !self.ensure_active() {
            return;
        }

        let use_vertex_cache = vertices.len() <= self.cache.vertex_cache.len();
        if use_vertex_cache {
            let transform = states.transform;
            for (v, dst) in vertices.iter().zip(self.cache.vertex_cache.iter_mut()) {
                *dst = Vertex {
                    position: transform.transform_point(v.position),
                    ..*v
                };
            }
        }

        let graphics = self.graphics.clone();
        if let Err(err) = self.draw_client(&graphics, vertices, primitive, states, use_vertex_cache)
        {
            error!("Failed to draw vertices to render target {}. {}", self.id, err);
            self.cache.invalidate();
        }
    }

    /// Draws the whole vertex buffer.
    pub fn draw_buffer(&mut self, buffer: &VertexBuffer, states: &RenderStates) {
        self.draw_buffer_range(buffer, 0, buffer.len(), states);
    }

    /// Draws `count` vertices of the buffer, starting at `first`. The range is
    /// clamped to the vertices of the buffer.
    pub fn draw_buffer_range(
        &mut self,
        buffer: &VertexBuffer,
        first: usize,
        count: usize,
        states: &RenderStates,
    ) {
        let graphics = self.graphics.clone();
        if !graphics.driver().vertex_buffers_available() {
            if graphics.warnings().raise(Warning::VertexBuffers) {
                warn!("Vertex buffers are not available, drawing skipped.");
            }

            return;
        }

        if first > buffer.len() {
            return;
        }

        let count = cmp::min(count, buffer.len() - first);
        if count == 0 || buffer.native_handle() == 0 {
            return;
        }

        if !self.check_primitive(buffer.primitive()) {
            return;
        }

        if !self.ensure_active() {
            return;
        }

        if let Err(err) = self.draw_buffered(&graphics, buffer, first, count, states) {
            error!("Failed to draw vertex buffer to render target {}. {}", self.id, err);
            self.cache.invalidate();
        }
    }

    /// Saves the states of the graphics API, so that external code can mess with them
    /// until `pop_gl_states` is called. The states of the target are reset.
    pub fn push_gl_states(&mut self) {
        if self.ensure_active() {
            let graphics = self.graphics.clone();
            if let Err(err) = graphics.pipeline().push_states(&graphics) {
                error!("Failed to push render states. {}", err);
            }
        }

        self.reset_gl_states();
    }

    /// Restores the states saved by `push_gl_states`.
    pub fn pop_gl_states(&mut self) {
        if self.ensure_active() {
            let graphics = self.graphics.clone();
            if let Err(err) = graphics.pipeline().pop_states(&graphics) {
                error!("Failed to pop render states. {}", err);
            }
        }
    }

    /// Applies the baseline states, which makes the state cache valid again.
    pub fn reset_gl_states(&mut self) {
        if !self.ensure_active() {
            return;
        }

        let graphics = self.graphics.clone();
        if let Err(err) = self.reset(&graphics) {
            error!("Failed to reset render states of target {}. {}", self.id, err);
        }
    }

    /// Marks the target as active, or no longer active, in the current context.
    pub fn set_active(&mut self, active: bool) -> bool {
        if !self.surface.activate(active) {
            return false;
        }

        let context = self.graphics.driver().device().active_context_id();
        match self.graphics.tracker().set_active(self.id, active, context) {
            Activation::Fresh => {
                self.cache.applied_once = false;
                self.cache.invalidate();
            }
            Activation::Switched | Activation::Released => self.cache.invalidate(),
            Activation::Unchanged => {}
        }

        true
    }

    #[inline]
    pub fn state_cache(&self) -> &StateCache {
        &self.cache
    }

    #[inline]
    pub fn size(&self) -> Vector2<u32> {
        self.surface.size()
    }

    #[inline]
    pub fn is_srgb(&self) -> bool {
        self.surface.is_srgb()
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    fn ensure_active(&mut self) -> bool {
        let context = self.graphics.driver().device().active_context_id();
        self.graphics.tracker().is_active(self.id, context) || self.set_active(true)
    }

    fn check_primitive(&self, primitive: PrimitiveType) -> bool {
        if primitive == PrimitiveType::Quads && !self.graphics.driver().features().quads {
            if self.graphics.warnings().raise(Warning::Quads) {
                warn!("Quads are not supported by the context, drawing skipped.");
            }

            return false;
        }

        true
    }

    fn draw_client(
        &mut self,
        graphics: &Graphics,
        vertices: &[Vertex],
        primitive: PrimitiveType,
        states: &RenderStates,
        use_vertex_cache: bool,
    ) -> Result<()> {
        let pipeline = graphics.pipeline();
        self.setup_draw(graphics, pipeline, use_vertex_cache, states)?;

        let tex_coords = states.texture.is_some() || states.shader.is_some();
        pipeline.stream_vertices(
            graphics,
            &mut self.cache,
            vertices,
            use_vertex_cache,
            tex_coords,
        )?;

        graphics
            .driver()
            .device()
            .draw_arrays(primitive, 0, vertices.len())?;

        self.cleanup_draw(graphics, pipeline, states)?;

        self.cache.use_vertex_cache = use_vertex_cache;
        self.cache.tex_coords_enabled = tex_coords;
        Ok(())
    }

    fn draw_buffered(
        &mut self,
        graphics: &Graphics,
        buffer: &VertexBuffer,
        first: usize,
        count: usize,
        states: &RenderStates,
    ) -> Result<()> {
        let pipeline = graphics.pipeline();
        let driver = graphics.driver();
        self.setup_draw(graphics, pipeline, false, states)?;

        VertexBuffer::bind(driver, Some(buffer))?;
        pipeline.stream_buffer(graphics, &mut self.cache)?;
        driver
            .device()
            .draw_arrays(buffer.primitive(), first, count)?;
        VertexBuffer::bind(driver, None)?;

        self.cleanup_draw(graphics, pipeline, states)?;

        self.cache.use_vertex_cache = false;
        self.cache.tex_coords_enabled = true;
        Ok(())
    }

    /// Applies every state a draw call needs, skipping the ones that are already
    /// applied.
    fn setup_draw(
        &mut self,
        graphics: &Graphics,
        pipeline: &dyn Pipeline,
        use_vertex_cache: bool,
        states: &RenderStates,
    ) -> Result<()> {
        let driver = graphics.driver();

        if !self.cache.valid {
            // Some drivers apply the sRGB conversion whatever the format of the surface.
            if driver.features().framebuffer_srgb {
                driver
                    .device()
                    .set_capability(Capability::FramebufferSrgb, self.surface.is_srgb())?;
            }

            self.reset(graphics)?;
        }

        let shader = pipeline.select(graphics, states);
        let active = shader.as_ref().map(|v| &**v);

        pipeline.apply_transform(
            graphics,
            &mut self.cache,
            active,
            use_vertex_cache,
            &states.transform,
        )?;

        let viewport = self.viewport(&self.view);
        let top = self.size().y as i32 - (viewport.top + viewport.height);
        let viewport = Rect::new(viewport.left, top, viewport.width, viewport.height);
        let projection = self.view.transform();
        pipeline.apply_view(graphics, &mut self.cache, active, viewport, &projection)?;

        if states.blend_mode != self.cache.last_blend_mode {
            self.apply_blend_mode(graphics, states.blend_mode)?;
        }

        let texture_id = states.texture.map(|v| v.cache_id()).unwrap_or(0);
        let attachment = states.texture.map(|v| v.is_fbo_attachment()).unwrap_or(false);

        let mut texture_set = false;
        if attachment || texture_id != self.cache.last_texture_id {
            self.apply_texture(graphics, states.texture)?;
            texture_set = states.texture.is_some();
        }

        pipeline.apply_shader(
            graphics,
            &mut self.cache,
            shader.as_ref(),
            states.texture,
            texture_set,
        )
    }

    fn cleanup_draw(
        &mut self,
        graphics: &Graphics,
        pipeline: &dyn Pipeline,
        states: &RenderStates,
    ) -> Result<()> {
        pipeline.cleanup(graphics, states)?;

        // Some drivers do not clear off-screen targets whose texture is still bound.
        if states.texture.map(|v| v.is_fbo_attachment()).unwrap_or(false) {
            self.apply_texture(graphics, None)?;
        }

        self.cache.valid = true;
        Ok(())
    }

    fn reset(&mut self, graphics: &Graphics) -> Result<()> {
        let driver = graphics.driver();
        let shaders = driver.shaders_available();
        let vertex_buffers = driver.vertex_buffers_available();

        graphics.pipeline().reset(graphics, &mut self.cache)?;

        self.apply_blend_mode(graphics, BlendMode::ALPHA)?;
        self.apply_texture(graphics, None)?;

        if shaders {
            Shader::bind_with(driver, None)?;
        }

        if vertex_buffers {
            VertexBuffer::bind(driver, None)?;
        }

        self.cache.tex_coords_enabled = true;
        self.cache.use_vertex_cache = false;
        self.cache.view_changed = true;

        self.cache.applied_once = true;
        self.cache.valid = true;
        Ok(())
    }

    fn apply_blend_mode(&mut self, graphics: &Graphics, mode: BlendMode) -> Result<()> {
        let features = graphics.driver().features();
        let device = graphics.driver().device();

        if features.blend_func_separate {
            device.blend_func_separate(
                mode.color_src_factor,
                mode.color_dst_factor,
                mode.alpha_src_factor,
                mode.alpha_dst_factor,
            )?;
        } else {
            device.blend_func(mode.color_src_factor, mode.color_dst_factor)?;
        }

        if features.blend_minmax || features.blend_subtract {
            let color = equation(graphics, &features, mode.color_equation);
            let alpha = equation(graphics, &features, mode.alpha_equation);

            if features.blend_equation_separate {
                device.blend_equation_separate(color, alpha)?;
            } else {
                device.blend_equation(color)?;
            }
        } else if !mode.is_additive() && graphics.warnings().raise(Warning::BlendEquation) {
            warn!(
                "Blend equations {:?}/{:?} are not supported by the context, falling back to \
                 additive blending. Ensure that hardware acceleration is enabled if available.",
                mode.color_equation, mode.alpha_equation
            );
        }

        self.cache.last_blend_mode = mode;
        Ok(())
    }

    fn apply_texture(&mut self, graphics: &Graphics, texture: Option<&Texture>) -> Result<()> {
        Texture::bind(graphics.driver(), texture, CoordinateType::Pixels)?;
        self.cache.last_texture_id = texture.map(|v| v.cache_id()).unwrap_or(0);
        Ok(())
    }
}

/// Returns `equation` if the context supports it, the additive one otherwise.
fn equation(graphics: &Graphics, features: &Features, equation: Equation) -> Equation {
    let supported = match equation {
        Equation::Add => true,
        Equation::Subtract | Equation::ReverseSubtract => features.blend_subtract,
        Equation::Min | Equation::Max => features.blend_minmax,
    };

    if supported {
        return equation;
    }

    if graphics.warnings().raise(Warning::BlendEquation) {
        warn!(
            "Blend equation {:?} is not supported by the context, falling back to additive \
             blending.",
            equation
        );
    }

    Equation::Add
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        self.graphics.tracker().forget(self.id);
    }
}
