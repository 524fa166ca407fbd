use std::ffi;
use std::os::raw::c_void;
use std::ptr;

use ::gl;
use ::gl::types::*;

use crate::errors::*;
use crate::math::prelude::{Rect, Vector2};

use super::super::super::blend::{BlendFactor, Equation};
use super::super::super::shader::{UniformArray, UniformVariable};
use super::super::super::vertex::{PrimitiveType, Vertex, VertexComponent};
use super::super::*;
use super::legacy::Legacy;

/// The OpenGL (ES) implementation of `Device`. Function pointers are process-wide,
/// every call applies to the context current on the calling thread.
pub struct GLDevice {
    contexts: Box<dyn ContextProvider>,
    legacy: Legacy,
}

impl GLDevice {
    /// Loads the entry points with `loader`, which usually comes from the windowing
    /// layer (e.g. `get_proc_address` of a `glutin` context).
    ///
    /// # Unsafe
    ///
    /// A context must be current on the calling thread, and the returned pointers must
    /// belong to it.
    pub unsafe fn new<F>(contexts: Box<dyn ContextProvider>, mut loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        gl::load_with(|symbol| loader(symbol));
        let legacy = Legacy::load(|symbol| loader(symbol));

        if !legacy.is_available() {
            info!("[GL] Fixed-function entry points are not available.");
        }

        GLDevice { contexts, legacy }
    }

    unsafe fn parse_str(id: GLenum) -> Result<String> {
        let s = gl::GetString(id);
        if s.is_null() {
            return Err(Error::Backend(format!("String of {} is null.", id)));
        }

        String::from_utf8(ffi::CStr::from_ptr(s as *const _).to_bytes().to_vec())
            .map_err(|_| Error::Backend(format!("String of {} is unformaled.", id)))
    }

    unsafe fn shader_log(shader: GLuint) -> String {
        let mut len = 0;
        gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        if len <= 1 {
            return String::new();
        }

        let mut buf = vec![0u8; len as usize];
        gl::GetShaderInfoLog(
            shader,
            len,
            ptr::null_mut(),
            buf.as_mut_ptr() as *mut GLchar,
        );

        // Skips the trailing null character.
        buf.truncate((len as usize) - 1);
        String::from_utf8_lossy(&buf).into_owned()
    }

    unsafe fn program_log(program: GLuint) -> String {
        let mut len = 0;
        gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
        if len <= 1 {
            return String::new();
        }

        let mut buf = vec![0u8; len as usize];
        gl::GetProgramInfoLog(
            program,
            len,
            ptr::null_mut(),
            buf.as_mut_ptr() as *mut GLchar,
        );

        buf.truncate((len as usize) - 1);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn c_name(name: &str) -> Result<ffi::CString> {
        ffi::CString::new(name.as_bytes())
            .map_err(|_| Error::InvalidParameter(format!("Name \"{}\"", name)))
    }

    unsafe fn source_ptr(source: VertexSource, offset: usize) -> *const c_void {
        match source {
            VertexSource::Client(vertices) => (vertices as *const u8).add(offset) as *const c_void,
            VertexSource::Buffer => offset as *const c_void,
        }
    }

    /// Runs `func` with the 2D texture binding saved and restored around it.
    unsafe fn with_saved_texture<T, F>(func: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut saved = 0;
        gl::GetIntegerv(gl::TEXTURE_BINDING_2D, &mut saved);
        let v = func();
        gl::BindTexture(gl::TEXTURE_2D, saved as GLuint);
        check()?;
        v
    }
}

impl Device for GLDevice {
    fn active_context_id(&self) -> ContextId {
        self.contexts.active_context_id()
    }

    fn acquire_transient_context(&self) -> Result<()> {
        self.contexts.acquire_transient()
    }

    fn release_transient_context(&self) -> Result<()> {
        self.contexts.release_transient()
    }

    fn version(&self) -> Result<String> {
        unsafe { Self::parse_str(gl::VERSION) }
    }

    fn extensions(&self) -> Result<Vec<String>> {
        unsafe {
            let mut major = 0;
            gl::GetIntegerv(gl::MAJOR_VERSION, &mut major);
            if gl::GetError() != gl::NO_ERROR {
                major = 0;
            }

            if major >= 3 {
                let mut num_extensions = 0;
                gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut num_extensions);

                let mut extensions = Vec::with_capacity(num_extensions as usize);
                for i in 0..num_extensions {
                    let ext = gl::GetStringi(gl::EXTENSIONS, i as GLuint);
                    if !ext.is_null() {
                        let ext = ffi::CStr::from_ptr(ext as *const _);
                        extensions.push(ext.to_string_lossy().into_owned());
                    }
                }

                check()?;
                Ok(extensions)
            } else {
                let list = Self::parse_str(gl::EXTENSIONS)?;
                Ok(list.split(' ').filter(|v| !v.is_empty()).map(|v| v.to_owned()).collect())
            }
        }
    }

    fn fixed_function_available(&self) -> Result<bool> {
        Ok(self.legacy.is_available())
    }

    fn max_combined_texture_units(&self) -> Result<u32> {
        unsafe {
            let mut val = 0;
            gl::GetIntegerv(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut val);
            check()?;
            Ok(val as u32)
        }
    }

    fn set_capability(&self, capability: Capability, enabled: bool) -> Result<()> {
        if capability.is_legacy() && !self.legacy.is_available() {
            return Err(Error::Requirement(format!("fixed-function capability {:?}", capability)));
        }

        unsafe {
            if enabled {
                gl::Enable(capability.into());
            } else {
                gl::Disable(capability.into());
            }

            check()
        }
    }

    fn set_client_array(&self, array: ClientArray, enabled: bool) -> Result<()> {
        unsafe {
            self.legacy.set_client_state(array.into(), enabled)?;
            check()
        }
    }

    fn active_texture(&self, unit: u32) -> Result<()> {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            check()
        }
    }

    fn client_active_texture(&self, unit: u32) -> Result<()> {
        unsafe {
            self.legacy.client_active_texture(gl::TEXTURE0 + unit)?;
            check()
        }
    }

    fn clear(&self, color: [f32; 4]) -> Result<()> {
        unsafe {
            gl::ClearColor(color[0], color[1], color[2], color[3]);
            gl::Clear(gl::COLOR_BUFFER_BIT);
            check()
        }
    }

    fn viewport(&self, rect: Rect<i32>) -> Result<()> {
        unsafe {
            gl::Viewport(rect.left, rect.top, rect.width, rect.height);
            check()
        }
    }

    fn load_matrix(&self, mode: MatrixMode, matrix: Option<&[f32; 16]>) -> Result<()> {
        unsafe {
            self.legacy.load_matrix(mode.into(), matrix)?;
            check()
        }
    }

    fn push_states(&self) -> Result<()> {
        unsafe {
            self.legacy.push()?;
            check()
        }
    }

    fn pop_states(&self) -> Result<()> {
        unsafe {
            self.legacy.pop()?;
            check()
        }
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) -> Result<()> {
        unsafe {
            gl::BlendFunc(src.into(), dst.into());
            check()
        }
    }

    fn blend_func_separate(
        &self,
        color_src: BlendFactor,
        color_dst: BlendFactor,
        alpha_src: BlendFactor,
        alpha_dst: BlendFactor,
    ) -> Result<()> {
        unsafe {
            gl::BlendFuncSeparate(
                color_src.into(),
                color_dst.into(),
                alpha_src.into(),
                alpha_dst.into(),
            );
            check()
        }
    }

    fn blend_equation(&self, equation: Equation) -> Result<()> {
        unsafe {
            gl::BlendEquation(equation.into());
            check()
        }
    }

    fn blend_equation_separate(&self, color: Equation, alpha: Equation) -> Result<()> {
        unsafe {
            gl::BlendEquationSeparate(color.into(), alpha.into());
            check()
        }
    }

    fn create_texture(&self, size: Vector2<u32>) -> Result<Handle> {
        unsafe {
            Self::with_saved_texture(|| {
                let mut id = 0;
                gl::GenTextures(1, &mut id);
                if id == 0 {
                    return Err(Error::Backend("Failed to create texture object.".into()));
                }

                gl::BindTexture(gl::TEXTURE_2D, id);
                gl::TexImage2D(
                    gl::TEXTURE_2D,
                    0,
                    gl::RGBA as GLint,
                    size.x as GLsizei,
                    size.y as GLsizei,
                    0,
                    gl::RGBA,
                    gl::UNSIGNED_BYTE,
                    ptr::null(),
                );

                let wrap = gl::CLAMP_TO_EDGE as GLint;
                gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap);
                gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap);
                gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
                gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
                check()?;
                Ok(id)
            })
        }
    }

    fn update_texture(&self, handle: Handle, area: Rect<u32>, pixels: &[u8]) -> Result<()> {
        if pixels.len() < (area.width * area.height * 4) as usize {
            return Err(Error::InvalidParameter("Pixel data".into()));
        }

        unsafe {
            Self::with_saved_texture(|| {
                gl::BindTexture(gl::TEXTURE_2D, handle);
                gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
                gl::TexSubImage2D(
                    gl::TEXTURE_2D,
                    0,
                    area.left as GLint,
                    area.top as GLint,
                    area.width as GLsizei,
                    area.height as GLsizei,
                    gl::RGBA,
                    gl::UNSIGNED_BYTE,
                    pixels.as_ptr() as *const c_void,
                );
                check()
            })
        }
    }

    fn bind_texture(&self, handle: Handle) -> Result<()> {
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, handle);
            check()
        }
    }

    fn delete_texture(&self, handle: Handle) -> Result<()> {
        unsafe {
            gl::DeleteTextures(1, &handle);
            check()
        }
    }

    fn create_buffer(&self, vertices: &[Vertex], usage: BufferUsage) -> Result<Handle> {
        unsafe {
            let mut id = 0;
            gl::GenBuffers(1, &mut id);
            if id == 0 {
                return Err(Error::Backend("Failed to create vertex buffer.".into()));
            }

            let value = if vertices.is_empty() {
                ptr::null()
            } else {
                vertices.as_ptr() as *const c_void
            };

            gl::BindBuffer(gl::ARRAY_BUFFER, id);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (vertices.len() * Vertex::STRIDE) as isize,
                value,
                usage.into(),
            );
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
            check()?;
            Ok(id)
        }
    }

    fn update_buffer(&self, handle: Handle, offset: usize, vertices: &[Vertex]) -> Result<()> {
        if vertices.is_empty() {
            return Ok(());
        }

        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, handle);
            gl::BufferSubData(
                gl::ARRAY_BUFFER,
                (offset * Vertex::STRIDE) as isize,
                (vertices.len() * Vertex::STRIDE) as isize,
                vertices.as_ptr() as *const c_void,
            );
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
            check()
        }
    }

    fn bind_buffer(&self, handle: Handle) -> Result<()> {
        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, handle);
            check()
        }
    }

    fn delete_buffer(&self, handle: Handle) -> Result<()> {
        unsafe {
            gl::DeleteBuffers(1, &handle);
            check()
        }
    }

    unsafe fn vertex_pointer(&self, component: VertexComponent, source: VertexSource)
        -> Result<()> {
        let stride = Vertex::STRIDE as GLsizei;
        let (size, offset) = component.layout();
        let data = Self::source_ptr(source, offset);

        match component {
            VertexComponent::Position => {
                self.legacy.vertex_pointer(size as GLint, gl::FLOAT, stride, data)?
            }
            VertexComponent::Color => {
                self.legacy.color_pointer(size as GLint, gl::UNSIGNED_BYTE, stride, data)?
            }
            VertexComponent::TexCoords => {
                self.legacy.tex_coord_pointer(size as GLint, gl::FLOAT, stride, data)?
            }
        }

        check()
    }

    fn set_vertex_attrib_array(&self, location: u32, enabled: bool) -> Result<()> {
        unsafe {
            if enabled {
                gl::EnableVertexAttribArray(location);
            } else {
                gl::DisableVertexAttribArray(location);
            }

            check()
        }
    }

    unsafe fn vertex_attrib_pointer(
        &self,
        location: u32,
        component: VertexComponent,
        source: VertexSource,
    ) -> Result<()> {
        let (size, offset) = component.layout();
        let data = Self::source_ptr(source, offset);

        let (format, normalized) = match component {
            VertexComponent::Color => (gl::UNSIGNED_BYTE, gl::TRUE),
            _ => (gl::FLOAT, gl::FALSE),
        };

        gl::VertexAttribPointer(
            location,
            size as GLint,
            format,
            normalized,
            Vertex::STRIDE as GLsizei,
            data,
        );

        check()
    }

    fn draw_arrays(&self, primitive: PrimitiveType, first: usize, count: usize) -> Result<()> {
        unsafe {
            gl::DrawArrays(primitive.into(), first as GLint, count as GLsizei);
            check()
        }
    }

    fn flush(&self) -> Result<()> {
        unsafe {
            gl::Flush();
            check()
        }
    }

    fn create_program(&self) -> Result<Handle> {
        unsafe {
            let program = gl::CreateProgram();
            check()?;

            if program == 0 {
                return Err(Error::Backend("Failed to create program object.".into()));
            }

            Ok(program)
        }
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Handle> {
        let c_str = ffi::CString::new(source.as_bytes())
            .map_err(|_| Error::Compile(stage, "Source contains a null character.".into()))?;

        unsafe {
            let shader = gl::CreateShader(stage.into());
            gl::ShaderSource(shader, 1, &c_str.as_ptr(), ptr::null());
            gl::CompileShader(shader);

            let mut status = GLint::from(gl::FALSE);
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);

            if status != GLint::from(gl::TRUE) {
                let log = Self::shader_log(shader);
                gl::DeleteShader(shader);
                check()?;
                return Err(Error::Compile(stage, log));
            }

            check()?;
            Ok(shader)
        }
    }

    fn attach_shader(&self, program: Handle, shader: Handle) -> Result<()> {
        unsafe {
            gl::AttachShader(program, shader);
            check()
        }
    }

    fn delete_shader(&self, shader: Handle) -> Result<()> {
        unsafe {
            gl::DeleteShader(shader);
            check()
        }
    }

    fn link_program(&self, program: Handle) -> Result<()> {
        unsafe {
            gl::LinkProgram(program);

            let mut status = GLint::from(gl::FALSE);
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

            if status != GLint::from(gl::TRUE) {
                return Err(Error::Link(Self::program_log(program)));
            }

            check()
        }
    }

    fn delete_program(&self, program: Handle) -> Result<()> {
        unsafe {
            gl::DeleteProgram(program);
            check()
        }
    }

    fn use_program(&self, program: Handle) -> Result<()> {
        unsafe {
            gl::UseProgram(program);
            check()
        }
    }

    fn current_program(&self) -> Result<Handle> {
        unsafe {
            let mut program = 0;
            gl::GetIntegerv(gl::CURRENT_PROGRAM, &mut program);
            check()?;
            Ok(program as Handle)
        }
    }

    fn uniform_location(&self, program: Handle, name: &str) -> Result<i32> {
        let c_name = Self::c_name(name)?;
        unsafe {
            let location = gl::GetUniformLocation(program, c_name.as_ptr());
            check()?;
            Ok(location)
        }
    }

    fn attrib_location(&self, program: Handle, name: &str) -> Result<i32> {
        let c_name = Self::c_name(name)?;
        unsafe {
            let location = gl::GetAttribLocation(program, c_name.as_ptr());
            check()?;
            Ok(location)
        }
    }

    fn uniform(&self, location: i32, variable: &UniformVariable) -> Result<()> {
        unsafe {
            match *variable {
                UniformVariable::F32(v) => gl::Uniform1f(location, v),
                UniformVariable::Vector2f(v) => gl::Uniform2f(location, v[0], v[1]),
                UniformVariable::Vector3f(v) => gl::Uniform3f(location, v[0], v[1], v[2]),
                UniformVariable::Vector4f(v) => gl::Uniform4f(location, v[0], v[1], v[2], v[3]),
                UniformVariable::I32(v) => gl::Uniform1i(location, v),
                UniformVariable::Vector2i(v) => gl::Uniform2i(location, v[0], v[1]),
                UniformVariable::Vector3i(v) => gl::Uniform3i(location, v[0], v[1], v[2]),
                UniformVariable::Vector4i(v) => gl::Uniform4i(location, v[0], v[1], v[2], v[3]),
                UniformVariable::Matrix3f(ref v) => {
                    gl::UniformMatrix3fv(location, 1, gl::FALSE, v.as_ptr())
                }
                UniformVariable::Matrix4f(ref v) => {
                    gl::UniformMatrix4fv(location, 1, gl::FALSE, v.as_ptr())
                }
            }

            check()
        }
    }

    fn uniform_array(&self, location: i32, array: &UniformArray) -> Result<()> {
        if array.is_empty() {
            return Ok(());
        }

        let len = array.len() as GLsizei;
        let contiguous = array.flatten();
        let data = contiguous.as_ptr();

        unsafe {
            match *array {
                UniformArray::F32(_) => gl::Uniform1fv(location, len, data),
                UniformArray::Vector2f(_) => gl::Uniform2fv(location, len, data),
                UniformArray::Vector3f(_) => gl::Uniform3fv(location, len, data),
                UniformArray::Vector4f(_) => gl::Uniform4fv(location, len, data),
                UniformArray::Matrix3f(_) => gl::UniformMatrix3fv(location, len, gl::FALSE, data),
                UniformArray::Matrix4f(_) => gl::UniformMatrix4fv(location, len, gl::FALSE, data),
            }

            check()
        }
    }
}

unsafe fn check() -> Result<()> {
    let msg = match gl::GetError() {
        gl::NO_ERROR => return Ok(()),
        gl::INVALID_ENUM => "An unacceptable value is specified for an enumerated argument.",
        gl::INVALID_VALUE => "A numeric argument is out of range.",
        gl::INVALID_OPERATION => "The specified operation is not allowed in the current state.",
        gl::INVALID_FRAMEBUFFER_OPERATION => {
            "The command is trying to render to or read from the framebuffer while the \
             currently bound framebuffer is not framebuffer complete."
        }
        gl::OUT_OF_MEMORY => "There is not enough memory left to execute the command.",
        _ => "Oops, Unknown OpenGL error.",
    };

    Err(Error::Backend(msg.into()))
}
