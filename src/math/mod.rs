//! This module contains the math utils that mainly comes from `cgmath`, plus the
//! small 2D value types the render targets work with.

pub use cgmath::*;

pub mod color;
pub use self::color::Color;

pub mod rect;
pub use self::rect::Rect;

pub mod transform;
pub use self::transform::Transform;

pub mod prelude {
    pub use super::color::Color;
    pub use super::rect::Rect;
    pub use super::transform::Transform;
    pub use cgmath::{InnerSpace, Matrix, One, SquareMatrix, Vector2, Vector3, Zero};
}
