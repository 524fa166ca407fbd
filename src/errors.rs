use std::fmt;

/// The stage of a program object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        };

        write!(f, "{}", name)
    }
}

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "[GL] {}", _0)]
    Backend(String),
    #[fail(display = "OpenGL implementation doesn\'t support {}.", _0)]
    Requirement(String),
    #[fail(display = "Failed to compile {} shader:\n{}", _0, _1)]
    Compile(ShaderStage, String),
    #[fail(display = "Failed to link shader:\n{}", _0)]
    Link(String),
    #[fail(display = "Failed to read shader source {}: {}", _0, _1)]
    Source(String, String),
    #[fail(
        display = "Impossible to use texture \"{}\" for shader: all available texture units are used.",
        _0
    )]
    TextureUnitsExhausted(String),
    #[fail(display = "{} is invalid.", _0)]
    InvalidParameter(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<::std::io::Error> for Error {
    fn from(err: ::std::io::Error) -> Error {
        Error::Source("stream".into(), format!("{}", err))
    }
}

impl From<::serde_json::Error> for Error {
    fn from(err: ::serde_json::Error) -> Error {
        Error::InvalidParameter(format!("settings ({})", err))
    }
}
