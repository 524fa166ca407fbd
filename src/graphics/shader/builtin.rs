//! Programs that emulate the fixed-function transform, color and texture stages, for
//! contexts that can only draw through program objects.
//!
//! Vertices are fed through the `position`, `color` and `texCoord` attributes. The
//! render target uploads `sf_modelview`, `sf_projection` and, for textured draws,
//! `sf_texture` (the texture matrix).

use std::sync::{Arc, Mutex, PoisonError};

use super::super::driver::Driver;
use super::Shader;

const VERTEX: &str = "
attribute vec2 position;
attribute vec4 color;
varying vec4 sf_color;
uniform mat4 sf_modelview;
uniform mat4 sf_projection;

void main() {
    sf_color = color;
    gl_Position = sf_projection * sf_modelview * vec4(position, 0.0, 1.0);
}
";

const FRAGMENT: &str = "
varying vec4 sf_color;

void main() {
    gl_FragColor = sf_color;
}
";

const TEXTURED_VERTEX: &str = "
attribute vec2 position;
attribute vec4 color;
attribute vec2 texCoord;
varying vec4 sf_color;
varying vec2 sf_texCoord;
uniform mat4 sf_modelview;
uniform mat4 sf_projection;

void main() {
    sf_color = color;
    sf_texCoord = texCoord;
    gl_Position = sf_projection * sf_modelview * vec4(position, 0.0, 1.0);
}
";

const TEXTURED_FRAGMENT: &str = "
varying vec4 sf_color;
varying vec2 sf_texCoord;
uniform sampler2D sf_sampler;
uniform mat4 sf_texture;

void main() {
    vec4 coord = sf_texture * vec4(sf_texCoord, 0.0, 1.0);
    gl_FragColor = texture2D(sf_sampler, coord.xy) * sf_color;
}
";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuiltinShader {
    /// Vertex colors only.
    Untextured,
    /// Vertex colors modulated by the texture bound to unit 0.
    Textured,
}

/// The built-in programs, compiled on first use and kept for the lifetime of the
/// process. A program that fails to compile is kept too (without a native handle),
/// so the failure is reported only once.
pub struct BuiltinShaders {
    driver: Arc<Driver>,
    untextured: Mutex<Option<Arc<Shader>>>,
    textured: Mutex<Option<Arc<Shader>>>,
}

impl BuiltinShaders {
    pub fn new(driver: Arc<Driver>) -> Self {
        BuiltinShaders {
            driver,
            untextured: Mutex::new(None),
            textured: Mutex::new(None),
        }
    }

    pub fn get(&self, kind: BuiltinShader) -> Arc<Shader> {
        let slot = match kind {
            BuiltinShader::Untextured => &self.untextured,
            BuiltinShader::Textured => &self.textured,
        };

        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ref shader) = *slot {
            return shader.clone();
        }

        let (vs, fs) = match kind {
            BuiltinShader::Untextured => (VERTEX, FRAGMENT),
            BuiltinShader::Textured => (TEXTURED_VERTEX, TEXTURED_FRAGMENT),
        };

        let embedded = self
            .driver
            .capabilities()
            .map(|v| v.version.is_embedded())
            .unwrap_or(false);

        let vs = format!("{}{}", header(embedded, false), vs);
        let fs = format!("{}{}", header(embedded, true), fs);

        let mut shader = Shader::with_driver(self.driver.clone());
        if let Err(err) = shader.compile(Some(&vs), None, Some(&fs)) {
            error!("Failed to compile built-in {:?} shader. {}", kind, err);
        }

        let shader = Arc::new(shader);
        *slot = Some(shader.clone());
        shader
    }
}

fn header(embedded: bool, fragment: bool) -> &'static str {
    match (embedded, fragment) {
        (true, true) => "#version 100\nprecision mediump float;\n",
        (true, false) => "#version 100\n",
        (false, _) => "#version 120\n",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphics::backends::headless::HeadlessDevice;
    use crate::settings::RenderParams;

    #[test]
    fn compiled_once() {
        let device = Arc::new(HeadlessDevice::embedded());
        let driver = Arc::new(Driver::new(device.clone(), RenderParams::default()));
        let builtins = BuiltinShaders::new(driver);

        let a = builtins.get(BuiltinShader::Textured);
        let b = builtins.get(BuiltinShader::Textured);
        assert!(Arc::ptr_eq(&a, &b));
        assert_ne!(a.native_handle(), 0);

        let c = builtins.get(BuiltinShader::Untextured);
        assert_ne!(a.native_handle(), c.native_handle());
        assert_eq!(device.live_programs(), 2);
    }
}
