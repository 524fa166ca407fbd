//! The OpenGL and OpenGL ES backend.

pub mod device;
pub mod legacy;
pub mod types;

pub use self::device::GLDevice;
