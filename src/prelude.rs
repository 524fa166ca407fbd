pub use crate::math;
pub use crate::math::prelude::{Color, Rect, Transform, Vector2};

pub use crate::errors::{Error, Result, ShaderStage};
pub use crate::settings::{PipelineKind, RenderParams, Settings};

pub use crate::graphics;
pub use crate::graphics::backends::headless::{HeadlessDevice, HeadlessSurface};
pub use crate::graphics::{BlendFactor, BlendMode, Equation};
pub use crate::graphics::{BufferUsage, CoordinateType, Texture, TextureParams, VertexBuffer};
pub use crate::graphics::{Drawable, Graphics, RenderStates, RenderTarget, Surface, View};
pub use crate::graphics::{PrimitiveType, Vertex};
pub use crate::graphics::{Shader, UniformArray, UniformVariable};
