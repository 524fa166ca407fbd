//! Render targets with a cache of the pipeline states they pushed to the graphics
//! API, and the programs, textures and vertex buffers they draw with.
//!
//! Everything is built on top of `Graphics`, the process-wide services shared by the
//! render targets and resources: the device and its memoized capabilities, the
//! tracker of which render target is active in which context, the built-in programs
//! and a handful of warn-once flags.

pub mod backends;
pub mod blend;
pub mod cache;
pub mod capabilities;
pub mod context;
pub mod driver;
pub mod pipeline;
pub mod shader;
pub mod states;
pub mod target;
pub mod texture;
pub mod vertex;
pub mod view;

pub use self::backends::{BufferUsage, ContextId, Device, Handle};
pub use self::blend::{BlendFactor, BlendMode, Equation};
pub use self::cache::StateCache;
pub use self::capabilities::{Capabilities, Features, Version};
pub use self::context::{ContextTracker, TransientContextLock};
pub use self::driver::Driver;
pub use self::shader::{Shader, UniformArray, UniformVariable};
pub use self::states::RenderStates;
pub use self::target::{Drawable, RenderTarget, Surface};
pub use self::texture::{CoordinateType, Texture, TextureParams, VertexBuffer};
pub use self::vertex::{PrimitiveType, Vertex};
pub use self::view::View;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::settings::Settings;

use self::pipeline::Pipeline;
use self::shader::BuiltinShaders;

/// Conditions that are reported only once per process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A blend equation was requested but the context can not select one.
    BlendEquation,
    /// Quads were drawn on a context without native support.
    Quads,
    /// A vertex buffer was drawn on a context without vertex buffer objects.
    VertexBuffers,
}

#[derive(Default)]
pub struct Warnings {
    blend_equation: AtomicBool,
    quads: AtomicBool,
    vertex_buffers: AtomicBool,
}

impl Warnings {
    fn flag(&self, warning: Warning) -> &AtomicBool {
        match warning {
            Warning::BlendEquation => &self.blend_equation,
            Warning::Quads => &self.quads,
            Warning::VertexBuffers => &self.vertex_buffers,
        }
    }

    /// Raises `warning`, returning true if it was not raised before.
    pub fn raise(&self, warning: Warning) -> bool {
        !self.flag(warning).swap(true, Ordering::SeqCst)
    }

    pub fn is_raised(&self, warning: Warning) -> bool {
        self.flag(warning).load(Ordering::SeqCst)
    }
}

/// The process-wide services of the render targets and resources.
pub struct Graphics {
    driver: Arc<Driver>,
    tracker: ContextTracker,
    builtins: BuiltinShaders,
    warnings: Warnings,
    settings: Settings,
}

impl Graphics {
    pub fn new(device: Arc<dyn Device>, settings: Settings) -> Arc<Self> {
        let driver = Arc::new(Driver::new(device, settings.render));

        Arc::new(Graphics {
            builtins: BuiltinShaders::new(driver.clone()),
            driver,
            tracker: ContextTracker::new(),
            warnings: Warnings::default(),
            settings,
        })
    }

    #[inline]
    pub fn driver(&self) -> &Arc<Driver> {
        &self.driver
    }

    #[inline]
    pub fn tracker(&self) -> &ContextTracker {
        &self.tracker
    }

    #[inline]
    pub fn builtins(&self) -> &BuiltinShaders {
        &self.builtins
    }

    #[inline]
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The pipeline draw calls go through.
    #[inline]
    pub fn pipeline(&self) -> &'static dyn Pipeline {
        pipeline::pipeline(self.driver.pipeline_kind())
    }
}
