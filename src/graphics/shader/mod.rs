//! Program objects: compilation and linkage of vertex, geometry and fragment stages,
//! cached uniform locations, and the assignment of textures to texture units.
//!
//! Uniforms are set through a scoped binding: the program is made current for the
//! duration of the call if it is not already, and the previous program is restored
//! afterwards.
//!
//! ```rust,ignore
//! let mut shader = Shader::new(&graphics);
//! shader.load_from_memory_pair(VERTEX, FRAGMENT)?;
//!
//! shader.set_uniform("offset", [0.5f32, 0.0]);
//! shader.set_uniform_texture("overlay", &texture);
//! shader.set_uniform_current_texture("diffuse");
//!
//! target.draw_vertices(&vertices, PrimitiveType::Triangles, &RenderStates::from(&shader));
//! ```

pub mod builtin;
pub mod source;
pub mod uniform;

pub use self::builtin::{BuiltinShader, BuiltinShaders};
pub use self::source::InputStream;
pub use self::uniform::{UniformArray, UniformVariable, UniformVariableType};

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use smallvec::SmallVec;

use crate::errors::*;
use crate::utils::prelude::finally;

use super::backends::{Device, Handle};
use super::context::TransientContextLock;
use super::driver::Driver;
use super::texture::{CoordinateType, Texture, TextureObject};
use super::Graphics;

#[derive(Default)]
struct ShaderState {
    uniforms: HashMap<String, i32>,
    // Sorted by location, which decides the texture unit of every entry.
    textures: SmallVec<[(i32, Weak<TextureObject>); 8]>,
    current_texture: Option<i32>,
}

/// A linked program object.
pub struct Shader {
    driver: Arc<Driver>,
    program: Handle,
    state: Mutex<ShaderState>,
}

impl Shader {
    /// Creates an empty shader, without any native program.
    pub fn new(graphics: &Graphics) -> Self {
        Shader::with_driver(graphics.driver().clone())
    }

    pub(crate) fn with_driver(driver: Arc<Driver>) -> Self {
        Shader {
            driver,
            program: 0,
            state: Mutex::new(ShaderState::default()),
        }
    }

    /// Checks if the context supports shaders.
    pub fn is_available(graphics: &Graphics) -> bool {
        graphics.driver().shaders_available()
    }

    /// Checks if the context supports geometry shaders.
    pub fn is_geometry_available(graphics: &Graphics) -> bool {
        graphics.driver().geometry_shaders_available()
    }

    /// The native program object, `0` if nothing was compiled successfully.
    #[inline]
    pub fn native_handle(&self) -> Handle {
        self.program
    }

    /// Compiles and links the given stages into a new program, replacing the current
    /// one. The current program is destroyed even if the new one fails to build.
    pub fn compile(
        &mut self,
        vertex: Option<&str>,
        geometry: Option<&str>,
        fragment: Option<&str>,
    ) -> Result<()> {
        let result = self.compile_program(vertex, geometry, fragment);
        if let Err(ref err) = result {
            error!("{}", err);
        }

        result
    }

    fn compile_program(
        &mut self,
        vertex: Option<&str>,
        geometry: Option<&str>,
        fragment: Option<&str>,
    ) -> Result<()> {
        let driver = self.driver.clone();
        let device = driver.device();
        let _lock = TransientContextLock::new(device)?;

        if !driver.shaders_available() {
            return Err(Error::Requirement("shaders".into()));
        }

        if geometry.is_some() && !driver.geometry_shaders_available() {
            return Err(Error::Requirement("geometry shaders".into()));
        }

        if self.program != 0 {
            let program = self.program;
            self.program = 0;
            device.delete_program(program)?;
        }

        *self.lock() = ShaderState::default();

        let program = device.create_program()?;
        let guard = finally(program, |v| {
            if let Err(err) = device.delete_program(*v) {
                error!("Failed to delete program {}. {}", v, err);
            }
        });

        let stages = [
            (ShaderStage::Vertex, vertex),
            (ShaderStage::Geometry, geometry),
            (ShaderStage::Fragment, fragment),
        ];

        for &(stage, source) in &stages {
            if let Some(source) = source {
                let shader = device.compile_shader(stage, source)?;
                let attached = device.attach_shader(program, shader);
                device.delete_shader(shader)?;
                attached?;
            }
        }

        device.link_program(program)?;

        // Makes the new program visible to the other contexts right away.
        device.flush()?;

        self.program = guard.forget();
        Ok(())
    }

    /// Loads a single stage from memory.
    pub fn load_from_memory(&mut self, source: &str, stage: ShaderStage) -> Result<()> {
        match stage {
            ShaderStage::Vertex => self.compile(Some(source), None, None),
            ShaderStage::Geometry => self.compile(None, Some(source), None),
            ShaderStage::Fragment => self.compile(None, None, Some(source)),
        }
    }

    pub fn load_from_memory_pair(&mut self, vertex: &str, fragment: &str) -> Result<()> {
        self.compile(Some(vertex), None, Some(fragment))
    }

    pub fn load_from_memory_triple(
        &mut self,
        vertex: &str,
        geometry: &str,
        fragment: &str,
    ) -> Result<()> {
        self.compile(Some(vertex), Some(geometry), Some(fragment))
    }

    /// Loads a single stage from a source file.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P, stage: ShaderStage) -> Result<()> {
        let source = Self::read(source::read_file(path))?;
        self.load_from_memory(&source, stage)
    }

    pub fn load_from_file_pair<P1, P2>(&mut self, vertex: P1, fragment: P2) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        let vs = Self::read(source::read_file(vertex))?;
        let fs = Self::read(source::read_file(fragment))?;
        self.load_from_memory_pair(&vs, &fs)
    }

    pub fn load_from_file_triple<P1, P2, P3>(
        &mut self,
        vertex: P1,
        geometry: P2,
        fragment: P3,
    ) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let vs = Self::read(source::read_file(vertex))?;
        let gs = Self::read(source::read_file(geometry))?;
        let fs = Self::read(source::read_file(fragment))?;
        self.load_from_memory_triple(&vs, &gs, &fs)
    }

    /// Loads a single stage from a stream.
    pub fn load_from_stream(&mut self, stream: &mut dyn InputStream, stage: ShaderStage) -> Result<()> {
        let source = Self::read(source::read_stream(stream))?;
        self.load_from_memory(&source, stage)
    }

    pub fn load_from_stream_pair(
        &mut self,
        vertex: &mut dyn InputStream,
        fragment: &mut dyn InputStream,
    ) -> Result<()> {
        let vs = Self::read(source::read_stream(vertex))?;
        let fs = Self::read(source::read_stream(fragment))?;
        self.load_from_memory_pair(&vs, &fs)
    }

    pub fn load_from_stream_triple(
        &mut self,
        vertex: &mut dyn InputStream,
        geometry: &mut dyn InputStream,
        fragment: &mut dyn InputStream,
    ) -> Result<()> {
        let vs = Self::read(source::read_stream(vertex))?;
        let gs = Self::read(source::read_stream(geometry))?;
        let fs = Self::read(source::read_stream(fragment))?;
        self.load_from_memory_triple(&vs, &gs, &fs)
    }

    fn read(source: Result<String>) -> Result<String> {
        if let Err(ref err) = source {
            error!("{}", err);
        }

        source
    }

    /// Sets the value of uniform variable `name`. Unknown names are reported once, and
    /// ignored.
    pub fn set_uniform<T: Into<UniformVariable>>(&self, name: &str, value: T) {
        if let Err(err) = self.try_set_uniform(name, &value.into()) {
            error!("Failed to set uniform \"{}\". {}", name, err);
        }
    }

    /// Sets the value of uniform array `name`.
    pub fn set_uniform_array<T: Into<UniformArray>>(&self, name: &str, values: T) {
        if let Err(err) = self.try_set_uniform_array(name, &values.into()) {
            error!("Failed to set uniform array \"{}\". {}", name, err);
        }
    }

    /// Binds `texture` to the sampler uniform `name`. The texture is only referenced
    /// weakly, and is bound to its own texture unit whenever the shader is bound.
    pub fn set_uniform_texture(&self, name: &str, texture: &Texture) {
        if let Err(err) = self.try_set_uniform_texture(name, texture) {
            error!("{}", err);
        }
    }

    /// Makes the sampler uniform `name` use the texture of the draw call itself, which
    /// lives in texture unit 0.
    pub fn set_uniform_current_texture(&self, name: &str) {
        if self.program == 0 {
            return;
        }

        let result = TransientContextLock::new(self.driver.device())
            .and_then(|_lock| self.uniform_location(name));

        match result {
            Ok(location) => {
                self.lock().current_texture = if location != -1 { Some(location) } else { None };
            }
            Err(err) => error!("Failed to set uniform \"{}\". {}", name, err),
        }
    }

    pub(crate) fn try_set_uniform(&self, name: &str, variable: &UniformVariable) -> Result<()> {
        if self.program == 0 {
            return Ok(());
        }

        let binder = UniformBinder::new(self.driver.device(), self.program)?;
        let location = self.uniform_location(name)?;
        if location != -1 {
            binder.device.uniform(location, variable)?;
        }

        Ok(())
    }

    fn try_set_uniform_array(&self, name: &str, array: &UniformArray) -> Result<()> {
        if self.program == 0 {
            return Ok(());
        }

        let binder = UniformBinder::new(self.driver.device(), self.program)?;
        let location = self.uniform_location(name)?;
        if location != -1 {
            binder.device.uniform_array(location, array)?;
        }

        Ok(())
    }

    fn try_set_uniform_texture(&self, name: &str, texture: &Texture) -> Result<()> {
        if self.program == 0 {
            return Ok(());
        }

        let _lock = TransientContextLock::new(self.driver.device())?;
        let location = self.uniform_location(name)?;
        if location == -1 {
            return Ok(());
        }

        let mut state = self.lock();
        match state.textures.binary_search_by_key(&location, |v| v.0) {
            Ok(index) => state.textures[index].1 = texture.downgrade(),
            Err(index) => {
                let max = self.driver.max_texture_units();
                let reserved = self.driver.params().reserved_texture_units;
                if state.textures.len() + reserved >= max {
                    return Err(Error::TextureUnitsExhausted(name.into()));
                }

                state.textures.insert(index, (location, texture.downgrade()));
            }
        }

        Ok(())
    }

    /// Resolves the location of uniform `name`, asking the graphics API only once.
    fn uniform_location(&self, name: &str) -> Result<i32> {
        if let Some(&location) = self.lock().uniforms.get(name) {
            return Ok(location);
        }

        let location = self.driver.device().uniform_location(self.program, name)?;
        if location == -1 {
            warn!("Uniform \"{}\" not found in shader {}.", name, self.program);
        }

        self.lock().uniforms.insert(name.to_owned(), location);
        Ok(location)
    }

    /// Binds `shader` for rendering, or unbinds any program. The textures referenced
    /// by the shader are bound to units 1 and above, leaving unit 0 active.
    pub fn bind(graphics: &Graphics, shader: Option<&Shader>) {
        if let Err(err) = Shader::bind_with(graphics.driver(), shader) {
            error!("Failed to bind or unbind shader. {}", err);
        }
    }

    pub(crate) fn bind_with(driver: &Driver, shader: Option<&Shader>) -> Result<()> {
        let device = driver.device();
        let _lock = TransientContextLock::new(device)?;

        if !driver.shaders_available() {
            return Err(Error::Requirement("shaders".into()));
        }

        match shader {
            Some(v) if v.program != 0 => {
                device.use_program(v.program)?;
                v.bind_textures()?;

                if let Some(location) = v.lock().current_texture {
                    device.uniform(location, &UniformVariable::I32(0))?;
                }
            }
            _ => device.use_program(0)?,
        }

        Ok(())
    }

    fn bind_textures(&self) -> Result<()> {
        let device = self.driver.device();
        let state = self.lock();

        for (i, &(location, ref texture)) in state.textures.iter().enumerate() {
            let unit = i as u32 + 1;
            device.uniform(location, &UniformVariable::I32(unit as i32))?;
            device.active_texture(unit)?;

            let texture = texture.upgrade();
            if texture.is_none() {
                warn!("Texture of sampler {} in shader {} has been destroyed.", location, self.program);
            }

            TextureObject::bind(
                &self.driver,
                texture.as_ref().map(|v| v.as_ref()),
                CoordinateType::Normalized,
            )?;
        }

        device.active_texture(0)
    }

    fn lock(&self) -> MutexGuard<ShaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        if self.program == 0 {
            return;
        }

        let device = self.driver.device();
        let result = TransientContextLock::new(device).and_then(|_lock| device.delete_program(self.program));

        if let Err(err) = result {
            error!("Failed to delete program {}. {}", self.program, err);
        }
    }
}

/// Makes a program current for as long as it lives, and restores the previous one.
struct UniformBinder<'a> {
    device: &'a dyn Device,
    saved: Handle,
    current: Handle,
    _lock: TransientContextLock<'a>,
}

impl<'a> UniformBinder<'a> {
    fn new(device: &'a dyn Device, program: Handle) -> Result<Self> {
        let lock = TransientContextLock::new(device)?;
        let saved = device.current_program()?;
        if saved != program {
            device.use_program(program)?;
        }

        Ok(UniformBinder {
            device,
            saved,
            current: program,
            _lock: lock,
        })
    }
}

impl<'a> Drop for UniformBinder<'a> {
    fn drop(&mut self) {
        if self.saved != self.current {
            if let Err(err) = self.device.use_program(self.saved) {
                error!("Failed to restore program {}. {}", self.saved, err);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphics::backends::headless::{Command, HeadlessDevice};
    use crate::settings::Settings;

    const VS: &str = "attribute vec2 position; uniform mat4 mvp; void main() { gl_Position = mvp * vec4(position, 0.0, 1.0); }";
    const FS: &str = "uniform vec4 tint; uniform sampler2D a; uniform sampler2D b; void main() { gl_FragColor = tint; }";

    fn setup() -> (Arc<HeadlessDevice>, Arc<Graphics>) {
        let device = Arc::new(HeadlessDevice::new());
        (device.clone(), Graphics::new(device, Settings::default()))
    }

    #[test]
    fn scoped_binding() {
        let (device, graphics) = setup();
        let mut shader = Shader::new(&graphics);
        shader.load_from_memory_pair(VS, FS).unwrap();
        let program = shader.native_handle();

        device.take_commands();
        shader.set_uniform("tint", [1.0f32, 0.0, 0.0, 1.0]);
        assert_eq!(
            device.take_commands(),
            vec![
                Command::CurrentProgram,
                Command::UseProgram(program),
                Command::UniformLocation(program, "tint".into()),
                Command::Uniform(1, UniformVariable::Vector4f([1.0, 0.0, 0.0, 1.0])),
                Command::UseProgram(0),
            ]
        );

        device.use_program(program).unwrap();
        device.take_commands();
        shader.set_uniform("tint", [0.0f32; 4]);
        assert_eq!(device.count(|v| match *v {
            Command::UseProgram(_) => true,
            Command::UniformLocation(_, _) => true,
            _ => false,
        }), 0);
    }

    #[test]
    fn textures() {
        let (device, graphics) = setup();
        let mut shader = Shader::new(&graphics);
        shader.load_from_memory_pair(VS, FS).unwrap();

        let params = crate::graphics::texture::TextureParams {
            size: crate::math::Vector2::new(1, 1),
            ..Default::default()
        };

        let a = Texture::new(&graphics, params).unwrap();
        let b = Texture::new(&graphics, params).unwrap();
        shader.set_uniform_texture("b", &b);
        shader.set_uniform_texture("a", &a);
        shader.set_uniform_current_texture("tint");

        device.take_commands();
        Shader::bind(&graphics, Some(&shader));

        let commands = device.take_commands();
        let units: Vec<_> = commands
            .iter()
            .filter_map(|v| match *v {
                Command::ActiveTexture(unit) => Some(unit),
                _ => None,
            })
            .collect();

        assert_eq!(units, vec![1, 2, 0]);
        assert!(commands.contains(&Command::BindTexture(b.native_handle())));
        assert!(commands.contains(&Command::BindTexture(a.native_handle())));
        assert!(commands.contains(&Command::Uniform(2, UniformVariable::I32(1))));
        assert!(commands.contains(&Command::Uniform(3, UniformVariable::I32(2))));
        assert_eq!(commands.last(), Some(&Command::Uniform(1, UniformVariable::I32(0))));

        drop(a);
        device.take_commands();
        Shader::bind(&graphics, Some(&shader));
        assert!(device.commands().contains(&Command::BindTexture(0)));
    }

    #[test]
    fn failed_compile() {
        let (device, graphics) = setup();
        let mut shader = Shader::new(&graphics);
        shader.load_from_memory_pair(VS, FS).unwrap();
        assert_ne!(shader.native_handle(), 0);

        assert!(shader.load_from_memory_pair(VS, "void main() {").is_err());
        assert_eq!(shader.native_handle(), 0);
        assert_eq!(device.live_programs(), 0);
        assert_eq!(device.live_shaders(), 0);

        // Binding a shader without program unbinds any program.
        device.take_commands();
        Shader::bind(&graphics, Some(&shader));
        assert_eq!(device.take_commands(), vec![Command::UseProgram(0)]);

        device.set_link_failure(true);
        assert!(shader.load_from_memory_pair(VS, FS).is_err());
        assert_eq!(device.live_programs(), 0);
    }
}
