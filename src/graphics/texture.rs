//! The texture and vertex buffer objects render targets draw with.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::errors::*;
use crate::math::prelude::{Rect, Vector2};
use crate::settings::PipelineKind;

use super::backends::{BufferUsage, Handle, MatrixMode};
use super::context::TransientContextLock;
use super::driver::Driver;
use super::states::RenderStates;
use super::target::{Drawable, RenderTarget};
use super::vertex::{PrimitiveType, Vertex};
use super::Graphics;

/// How texture coordinates are expressed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordinateType {
    /// Texture coordinates in range [0 .. 1].
    Normalized,
    /// Texture coordinates in range [0 .. size].
    Pixels,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureParams {
    pub size: Vector2<u32>,
    /// The texture is the color attachment of an off-screen render target.
    pub fbo_attachment: bool,
    /// The pixel rows are stored bottom to top.
    pub pixels_flipped: bool,
}

impl Default for TextureParams {
    fn default() -> Self {
        TextureParams {
            size: Vector2::new(0, 0),
            fbo_attachment: false,
            pixels_flipped: false,
        }
    }
}

/// The shared part of a texture, which shaders refer to weakly.
pub struct TextureObject {
    driver: Arc<Driver>,
    handle: Handle,
    size: Vector2<u32>,
    actual_size: Vector2<u32>,
    fbo_attachment: bool,
    pixels_flipped: bool,
    cache_id: AtomicU64,
}

impl TextureObject {
    #[inline]
    pub fn cache_id(&self) -> u64 {
        self.cache_id.load(Ordering::SeqCst)
    }

    /// Binds the texture to the active unit. On the fixed-function pipeline, the
    /// texture matrix is loaded so that `coords` and flipped rows are handled
    /// transparently.
    pub(crate) fn bind(
        driver: &Driver,
        texture: Option<&TextureObject>,
        coords: CoordinateType,
    ) -> Result<()> {
        let device = driver.device();
        let fixed = driver.pipeline_kind() == PipelineKind::FixedFunction;

        match texture {
            Some(v) if v.handle != 0 => {
                device.bind_texture(v.handle)?;

                if fixed && (coords == CoordinateType::Pixels || v.pixels_flipped) {
                    device.load_matrix(MatrixMode::Texture, Some(&v.texture_matrix(coords)))?;
                }
            }
            _ => {
                device.bind_texture(0)?;

                if fixed {
                    device.load_matrix(MatrixMode::Texture, None)?;
                }
            }
        }

        Ok(())
    }

    /// The matrix that maps the texture coordinates of vertices to normalized ones.
    pub fn texture_matrix(&self, coords: CoordinateType) -> [f32; 16] {
        let mut m = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];

        if coords == CoordinateType::Pixels {
            m[0] = 1.0 / self.actual_size.x as f32;
            m[5] = 1.0 / self.actual_size.y as f32;
        }

        if self.pixels_flipped {
            m[5] = -m[5];
            m[13] = self.size.y as f32 / self.actual_size.y as f32;
        }

        m
    }
}

impl Drop for TextureObject {
    fn drop(&mut self) {
        let device = self.driver.device();
        let result = TransientContextLock::new(device).and_then(|_lock| device.delete_texture(self.handle));

        if let Err(err) = result {
            error!("Failed to delete texture {}. {}", self.handle, err);
        }
    }
}

/// A RGBA8 image living on the graphics card.
#[derive(Clone)]
pub struct Texture {
    raw: Arc<TextureObject>,
}

impl Texture {
    pub fn new(graphics: &Graphics, params: TextureParams) -> Result<Self> {
        Texture::with_driver(graphics.driver().clone(), params)
    }

    pub(crate) fn with_driver(driver: Arc<Driver>, params: TextureParams) -> Result<Self> {
        if params.size.x == 0 || params.size.y == 0 {
            return Err(Error::InvalidParameter(format!(
                "Texture size ({}x{})",
                params.size.x, params.size.y
            )));
        }

        let actual_size = if driver.features().texture_npot {
            params.size
        } else {
            Vector2::new(
                params.size.x.next_power_of_two(),
                params.size.y.next_power_of_two(),
            )
        };

        let handle = {
            let device = driver.device();
            let _lock = TransientContextLock::new(device)?;
            device.create_texture(actual_size)?
        };

        let cache_id = driver.next_texture_cache_id();
        Ok(Texture {
            raw: Arc::new(TextureObject {
                driver,
                handle,
                size: params.size,
                actual_size,
                fbo_attachment: params.fbo_attachment,
                pixels_flipped: params.pixels_flipped,
                cache_id: AtomicU64::new(cache_id),
            }),
        })
    }

    /// Uploads the whole image.
    pub fn update(&self, pixels: &[u8]) -> Result<()> {
        let size = self.raw.size;
        self.update_area(Rect::new(0, 0, size.x, size.y), pixels)
    }

    /// Uploads pixels into `area`. Every upload mints a new cache identifier, so that
    /// render targets notice the change.
    pub fn update_area(&self, area: Rect<u32>, pixels: &[u8]) -> Result<()> {
        let size = self.raw.size;
        if area.left + area.width > size.x || area.top + area.height > size.y {
            return Err(Error::InvalidParameter(format!("Texture area {:?}", area)));
        }

        let driver = &self.raw.driver;
        let device = driver.device();
        let _lock = TransientContextLock::new(device)?;
        device.update_texture(self.raw.handle, area, pixels)?;

        self.raw
            .cache_id
            .store(driver.next_texture_cache_id(), Ordering::SeqCst);
        Ok(())
    }

    /// Binds `texture` to the active texture unit, or unbinds any texture.
    pub fn bind(driver: &Driver, texture: Option<&Texture>, coords: CoordinateType) -> Result<()> {
        TextureObject::bind(driver, texture.map(|v| v.raw.as_ref()), coords)
    }

    #[inline]
    pub fn size(&self) -> Vector2<u32> {
        self.raw.size
    }

    /// The size of the allocation, which is padded to powers of two if the context
    /// does not support arbitrary sizes.
    #[inline]
    pub fn actual_size(&self) -> Vector2<u32> {
        self.raw.actual_size
    }

    #[inline]
    pub fn is_fbo_attachment(&self) -> bool {
        self.raw.fbo_attachment
    }

    #[inline]
    pub fn is_pixels_flipped(&self) -> bool {
        self.raw.pixels_flipped
    }

    #[inline]
    pub fn cache_id(&self) -> u64 {
        self.raw.cache_id()
    }

    #[inline]
    pub fn native_handle(&self) -> Handle {
        self.raw.handle
    }

    #[inline]
    pub fn texture_matrix(&self, coords: CoordinateType) -> [f32; 16] {
        self.raw.texture_matrix(coords)
    }

    pub(crate) fn downgrade(&self) -> Weak<TextureObject> {
        Arc::downgrade(&self.raw)
    }
}

/// Vertices stored in the memory of the graphics card.
pub struct VertexBuffer {
    driver: Arc<Driver>,
    handle: Handle,
    len: usize,
    primitive: PrimitiveType,
    usage: BufferUsage,
}

impl VertexBuffer {
    pub fn new(
        graphics: &Graphics,
        primitive: PrimitiveType,
        usage: BufferUsage,
        vertices: &[Vertex],
    ) -> Result<Self> {
        let driver = graphics.driver().clone();
        if !driver.vertex_buffers_available() {
            return Err(Error::Requirement("vertex buffer objects".into()));
        }

        let handle = {
            let device = driver.device();
            let _lock = TransientContextLock::new(device)?;
            device.create_buffer(vertices, usage)?
        };

        Ok(VertexBuffer {
            driver,
            handle,
            len: vertices.len(),
            primitive,
            usage,
        })
    }

    /// Checks if the context supports vertex buffers.
    pub fn is_available(graphics: &Graphics) -> bool {
        graphics.driver().vertex_buffers_available()
    }

    /// Writes `vertices` starting at vertex `offset`. Writing past the end grows the
    /// buffer, as long as the write starts at the very beginning.
    pub fn update(&mut self, vertices: &[Vertex], offset: usize) -> Result<()> {
        if offset > self.len || (offset > 0 && offset + vertices.len() > self.len) {
            return Err(Error::InvalidParameter(format!(
                "Vertex buffer range {}..{}",
                offset,
                offset + vertices.len()
            )));
        }

        let device = self.driver.device();
        let _lock = TransientContextLock::new(device)?;

        if vertices.len() > self.len {
            let handle = device.create_buffer(vertices, self.usage)?;
            device.delete_buffer(self.handle)?;
            self.handle = handle;
            self.len = vertices.len();
            return Ok(());
        }

        device.update_buffer(self.handle, offset, vertices)
    }

    /// Binds `buffer`, or unbinds any vertex buffer.
    pub fn bind(driver: &Driver, buffer: Option<&VertexBuffer>) -> Result<()> {
        driver.device().bind_buffer(buffer.map(|v| v.handle).unwrap_or(0))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    #[inline]
    pub fn set_primitive(&mut self, primitive: PrimitiveType) {
        self.primitive = primitive;
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    #[inline]
    pub fn native_handle(&self) -> Handle {
        self.handle
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        let device = self.driver.device();
        let result = TransientContextLock::new(device).and_then(|_lock| device.delete_buffer(self.handle));

        if let Err(err) = result {
            error!("Failed to delete vertex buffer {}. {}", self.handle, err);
        }
    }
}

impl Drawable for VertexBuffer {
    fn draw(&self, target: &mut RenderTarget, states: &RenderStates) {
        target.draw_buffer(self, states);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphics::backends::headless::{Command, HeadlessDevice, HeadlessParams};
    use crate::settings::Settings;

    fn graphics(npot: bool) -> (Arc<HeadlessDevice>, Arc<Graphics>) {
        let version = if npot { "2.1 Headless" } else { "1.5 Headless" };
        let device = Arc::new(HeadlessDevice::with_params(HeadlessParams {
            version: version.into(),
            ..HeadlessParams::default()
        }));

        (device.clone(), Graphics::new(device, Settings::default()))
    }

    #[test]
    fn padding() {
        let (_, graphics) = graphics(false);
        let texture = Texture::new(
            &graphics,
            TextureParams {
                size: Vector2::new(100, 30),
                pixels_flipped: true,
                ..TextureParams::default()
            },
        )
        .unwrap();

        assert_eq!(texture.size(), Vector2::new(100, 30));
        assert_eq!(texture.actual_size(), Vector2::new(128, 32));

        let m = texture.texture_matrix(CoordinateType::Pixels);
        assert_eq!(m[0], 1.0 / 128.0);
        assert_eq!(m[5], -1.0 / 32.0);
        assert_eq!(m[13], 30.0 / 32.0);

        let m = texture.texture_matrix(CoordinateType::Normalized);
        assert_eq!(m[0], 1.0);
        assert_eq!(m[5], -1.0);
    }

    #[test]
    fn cache_ids() {
        let (device, graphics) = graphics(true);
        let params = TextureParams {
            size: Vector2::new(2, 2),
            ..TextureParams::default()
        };

        let a = Texture::new(&graphics, params).unwrap();
        let b = Texture::new(&graphics, params).unwrap();
        assert_eq!(a.actual_size(), a.size());
        assert_ne!(a.cache_id(), b.cache_id());

        let id = a.cache_id();
        a.update(&[255; 16]).unwrap();
        assert!(a.cache_id() > id);
        assert!(a.update(&[255; 4]).is_err());
        assert!(a.update_area(Rect::new(1, 1, 2, 2), &[255; 16]).is_err());

        let handle = b.native_handle();
        drop(b);
        assert!(device.commands().contains(&Command::DeleteTexture(handle)));
        assert_eq!(device.live_textures(), 1);
        assert!(Texture::new(&graphics, TextureParams::default()).is_err());
    }

    #[test]
    fn vertex_buffer() {
        let (device, graphics) = graphics(true);
        let vertices = [Vertex::default(); 3];
        let mut buffer =
            VertexBuffer::new(&graphics, PrimitiveType::Triangles, BufferUsage::Static, &vertices)
                .unwrap();

        assert_eq!(buffer.len(), 3);
        assert_ne!(buffer.native_handle(), 0);

        buffer.update(&vertices[..2], 1).unwrap();
        assert!(buffer.update(&vertices, 1).is_err());

        buffer.update(&[Vertex::default(); 6], 0).unwrap();
        assert_eq!(buffer.len(), 6);

        let handle = buffer.native_handle();
        drop(buffer);
        assert!(device.commands().contains(&Command::DeleteBuffer(handle)));

        let device = Arc::new(HeadlessDevice::with_params(HeadlessParams {
            version: "1.4 Headless".into(),
            ..HeadlessParams::default()
        }));

        let graphics = Graphics::new(device, Settings::default());
        assert!(!VertexBuffer::is_available(&graphics));
        assert!(
            VertexBuffer::new(&graphics, PrimitiveType::Points, BufferUsage::Stream, &vertices)
                .is_err()
        );
    }
}
