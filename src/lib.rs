//! # What is This?
//!
//! `crayon-canvas` is the 2D drawing core of crayon: render targets that keep a
//! per-target cache of the pipeline state they pushed to the graphics API, and
//! shader programs with cached uniform locations and texture-unit assignment.
//!
//! Draw calls go through a `RenderTarget`, which only emits the state changes
//! that are really needed. Several render targets may share one hardware
//! context (and several contexts may be driven from different threads), so
//! every target tracks whether it is still the one that was last active in the
//! calling thread's context, and reapplies everything when it is not.
//!
//! The same procedure drives two backends: the desktop fixed-function pipeline,
//! and a shader-emulated pipeline for OpenGL ES class hardware. The backend is
//! selected once from the probed capabilities of the context.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use crayon_canvas::prelude::*;
//!
//! let device = Arc::new(HeadlessDevice::new());
//! let graphics = Graphics::new(device, Settings::default());
//!
//! let mut target = RenderTarget::new(graphics, Box::new(HeadlessSurface::new(640, 480)));
//! target.initialize();
//! target.clear(Color::black());
//! ```

#[macro_use]
pub extern crate failure;
#[macro_use]
pub extern crate log;
extern crate serde;
extern crate serde_json;

pub extern crate cgmath;
extern crate smallvec;

#[cfg(not(target_arch = "wasm32"))]
extern crate gl;

pub mod errors;
pub mod graphics;
pub mod math;
pub mod settings;
pub mod utils;

pub mod prelude;
