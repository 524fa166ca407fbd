//! The feature table of a graphics context. It is probed once per process by the
//! `Driver`, and never changes afterwards.

use std::cmp;

use crate::errors::*;
use crate::settings::PipelineKind;

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

impl Version {
    /// Parses the version string reported by the API, e.g. `"2.1 Mesa 18.0.5"`,
    /// `"OpenGL ES 2.0 build 1.8"` or `"OpenGL ES-CM 1.1"`.
    pub fn parse(desc: &str) -> Result<Version> {
        let desc = desc.trim();
        let (es, desc) = if desc.starts_with("OpenGL ES") {
            // Skips the profile suffix of ES 1.x strings.
            let v = desc[9..].trim_start_matches(|c: char| !c.is_ascii_digit());
            (true, v)
        } else {
            (false, desc)
        };

        let number = desc
            .split(' ')
            .next()
            .ok_or_else(|| Error::Backend(format!("Version \"{}\" is unformaled.", desc)))?;

        let mut iter = number.split('.');
        let major = Self::parse_number(iter.next(), desc)?;
        let minor = Self::parse_number(iter.next(), desc)?;

        if es {
            Ok(Version::ES(major, minor))
        } else {
            Ok(Version::GL(major, minor))
        }
    }

    fn parse_number(v: Option<&str>, desc: &str) -> Result<u8> {
        v.and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::Backend(format!("Version \"{}\" is unformaled.", desc)))
    }

    #[inline]
    pub fn is_embedded(self) -> bool {
        match self {
            Version::ES(_, _) => true,
            Version::GL(_, _) => false,
        }
    }
}

macro_rules! extensions {
    ($($string:expr => $field:ident,)+) => {
        /// Contains data about the list of extensions.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
        }

        impl Extensions {
            /// Picks the known extensions out of the list reported by the backend.
            pub fn parse<T: AsRef<str>>(strings: &[T]) -> Extensions {
                let mut extensions = Extensions {
                    $(
                        $field: false,
                    )+
                };

                for extension in strings {
                    match extension.as_ref().trim() {
                        $(
                            $string => extensions.$field = true,
                        )+
                        _ => ()
                    }
                }

                extensions
            }
        }
    }
}

extensions! {
    "GL_ARB_multitexture" => gl_arb_multitexture,
    "GL_ARB_vertex_buffer_object" => gl_arb_vertex_buffer_object,
    "GL_ARB_shader_objects" => gl_arb_shader_objects,
    "GL_ARB_vertex_shader" => gl_arb_vertex_shader,
    "GL_ARB_fragment_shader" => gl_arb_fragment_shader,
    "GL_ARB_geometry_shader4" => gl_arb_geometry_shader4,
    "GL_ARB_texture_non_power_of_two" => gl_arb_texture_non_power_of_two,
    "GL_ARB_framebuffer_object" => gl_arb_framebuffer_object,
    "GL_ARB_framebuffer_sRGB" => gl_arb_framebuffer_srgb,
    "GL_EXT_framebuffer_object" => gl_ext_framebuffer_object,
    "GL_EXT_framebuffer_sRGB" => gl_ext_framebuffer_srgb,
    "GL_EXT_blend_func_separate" => gl_ext_blend_func_separate,
    "GL_EXT_blend_equation_separate" => gl_ext_blend_equation_separate,
    "GL_EXT_blend_subtract" => gl_ext_blend_subtract,
    "GL_EXT_blend_minmax" => gl_ext_blend_minmax,
    "GL_OES_blend_func_separate" => gl_oes_blend_func_separate,
    "GL_OES_blend_equation_separate" => gl_oes_blend_equation_separate,
    "GL_OES_blend_subtract" => gl_oes_blend_subtract,
    "GL_OES_framebuffer_object" => gl_oes_framebuffer_object,
    "GL_OES_texture_npot" => gl_oes_texture_npot,
    "GL_EXT_sRGB_write_control" => gl_ext_srgb_write_control,
}

/// The optional features the render targets and shaders care about, resolved from
/// the version (core functionality) and the extensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub multitexture: bool,
    pub vertex_buffer_object: bool,
    pub blend_func_separate: bool,
    pub blend_equation_separate: bool,
    pub blend_subtract: bool,
    pub blend_minmax: bool,
    pub framebuffer_object: bool,
    pub shader_objects: bool,
    pub geometry_shader: bool,
    pub framebuffer_srgb: bool,
    pub texture_npot: bool,
    /// Whether `PrimitiveType::Quads` can be drawn natively.
    pub quads: bool,
    /// Matrix stacks and client-side vertex arrays.
    pub fixed_function: bool,
}

impl Features {
    pub fn resolve(version: Version, ext: &Extensions) -> Features {
        match version {
            Version::ES(major, _) => {
                let es2 = major >= 2;
                Features {
                    multitexture: true,
                    vertex_buffer_object: true,
                    blend_func_separate: es2 || ext.gl_oes_blend_func_separate,
                    blend_equation_separate: es2 || ext.gl_oes_blend_equation_separate,
                    blend_subtract: es2 || ext.gl_oes_blend_subtract,
                    blend_minmax: major >= 3 || ext.gl_ext_blend_minmax,
                    framebuffer_object: es2 || ext.gl_oes_framebuffer_object,
                    shader_objects: es2,
                    geometry_shader: false,
                    framebuffer_srgb: ext.gl_ext_srgb_write_control,
                    texture_npot: major >= 3 || ext.gl_oes_texture_npot,
                    quads: false,
                    fixed_function: !es2,
                }
            }
            Version::GL(_, _) => {
                let core = |major, minor| version >= Version::GL(major, minor);
                let shader_objects = core(2, 0)
                    || (ext.gl_arb_shader_objects
                        && ext.gl_arb_vertex_shader
                        && ext.gl_arb_fragment_shader);

                Features {
                    multitexture: core(1, 3) || ext.gl_arb_multitexture,
                    vertex_buffer_object: core(1, 5) || ext.gl_arb_vertex_buffer_object,
                    blend_func_separate: core(1, 4) || ext.gl_ext_blend_func_separate,
                    blend_equation_separate: core(2, 0) || ext.gl_ext_blend_equation_separate,
                    blend_subtract: core(1, 4) || ext.gl_ext_blend_subtract,
                    blend_minmax: core(1, 4) || ext.gl_ext_blend_minmax,
                    framebuffer_object: core(3, 0)
                        || ext.gl_arb_framebuffer_object
                        || ext.gl_ext_framebuffer_object,
                    shader_objects,
                    geometry_shader: shader_objects
                        && (core(3, 2) || ext.gl_arb_geometry_shader4),
                    framebuffer_srgb: core(3, 0)
                        || ext.gl_arb_framebuffer_srgb
                        || ext.gl_ext_framebuffer_srgb,
                    texture_npot: core(2, 0) || ext.gl_arb_texture_non_power_of_two,
                    quads: true,
                    fixed_function: true,
                }
            }
        }
    }
}

/// Represents the capabilities of the context.
///
/// Contrary to the state, these values never change.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub version: Version,
    pub extensions: Extensions,
    pub features: Features,
    /// Maximum number of textures that can be bound to a program.
    pub max_combined_texture_units: u32,
}

impl Capabilities {
    /// `fixed_function` tells whether the implementation actually exposes the
    /// fixed-function entry points, which core profiles drop whatever their version.
    pub fn new(
        version: Version,
        extensions: Extensions,
        max_combined_texture_units: u32,
        fixed_function: bool,
    ) -> Self {
        let mut features = Features::resolve(version, &extensions);
        features.fixed_function &= fixed_function;

        Capabilities {
            version,
            extensions,
            features,
            max_combined_texture_units,
        }
    }

    /// The pipeline draw calls can go through. Shader emulation is used on embedded
    /// systems that support programs, and wherever the fixed-function entry points
    /// are missing. Everything else uses the fixed-function pipeline, which is also
    /// the fallback of contexts with neither.
    pub fn pipeline(&self) -> PipelineKind {
        let features = &self.features;
        if features.shader_objects && (self.version.is_embedded() || !features.fixed_function) {
            PipelineKind::Programmable
        } else {
            PipelineKind::FixedFunction
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version() {
        assert_eq!(Version::parse("2.1 Mesa 18.0.5").unwrap(), Version::GL(2, 1));
        assert_eq!(Version::parse("4.1 Metal - 76.3").unwrap(), Version::GL(4, 1));
        assert_eq!(Version::parse("4.6.0 NVIDIA 390.77").unwrap(), Version::GL(4, 6));
        assert_eq!(Version::parse("OpenGL ES 2.0 build 1.8").unwrap(), Version::ES(2, 0));
        assert_eq!(Version::parse("OpenGL ES-CM 1.1").unwrap(), Version::ES(1, 1));
        assert!(Version::parse("Unknown").is_err());
        assert!(Version::parse("").is_err());

        assert!(Version::GL(3, 2) > Version::GL(3, 1));
        assert!(Version::GL(4, 0) > Version::GL(3, 3));
        assert!(!(Version::GL(3, 0) >= Version::ES(3, 0)));
        assert!(!(Version::ES(3, 0) >= Version::GL(3, 0)));
    }

    #[test]
    fn features() {
        let ext = Extensions::parse(&["GL_EXT_blend_minmax", "GL_ARB_multitexture"]);
        assert!(ext.gl_ext_blend_minmax);
        assert!(!ext.gl_ext_blend_subtract);

        let gl = Features::resolve(Version::GL(1, 2), &ext);
        assert!(gl.multitexture);
        assert!(gl.blend_minmax);
        assert!(!gl.blend_subtract);
        assert!(!gl.shader_objects);
        assert!(gl.quads);

        let gl = Features::resolve(Version::GL(2, 1), &Extensions::default());
        assert!(gl.shader_objects);
        assert!(!gl.geometry_shader);
        assert!(Features::resolve(Version::GL(3, 2), &Extensions::default()).geometry_shader);

        let es = Features::resolve(Version::ES(2, 0), &Extensions::default());
        assert!(es.shader_objects);
        assert!(es.blend_subtract);
        assert!(!es.blend_minmax);
        assert!(!es.geometry_shader);
        assert!(!es.quads);
    }

    #[test]
    fn pipeline() {
        let ext = Extensions::default();

        let caps = Capabilities::new(Version::GL(2, 1), ext, 8, true);
        assert_eq!(caps.pipeline(), PipelineKind::FixedFunction);

        let caps = Capabilities::new(Version::ES(2, 0), ext, 8, false);
        assert_eq!(caps.pipeline(), PipelineKind::Programmable);

        // Core profiles.
        let caps = Capabilities::new(Version::GL(3, 3), ext, 8, false);
        assert!(!caps.features.fixed_function);
        assert_eq!(caps.pipeline(), PipelineKind::Programmable);

        // OpenGL ES 1.x has no programs.
        let caps = Capabilities::new(Version::ES(1, 1), ext, 8, true);
        assert!(caps.features.fixed_function);
        assert!(!caps.features.shader_objects);
        assert_eq!(caps.pipeline(), PipelineKind::FixedFunction);

        // Whatever the implementation reports, ES 2+ has no fixed-function pipeline.
        let caps = Capabilities::new(Version::ES(3, 0), ext, 8, true);
        assert!(!caps.features.fixed_function);
        assert_eq!(caps.pipeline(), PipelineKind::Programmable);

        let caps = Capabilities::new(Version::GL(1, 4), ext, 8, false);
        assert_eq!(caps.pipeline(), PipelineKind::FixedFunction);
    }
}
