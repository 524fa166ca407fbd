//! A device without any graphics API behind it. Every call is recorded as a
//! `Command`, which makes it possible to observe exactly what the render targets
//! and shaders emit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::*;
use crate::math::prelude::{Rect, Vector2};

use super::super::blend::{BlendFactor, Equation};
use super::super::shader::{UniformArray, UniformVariable};
use super::super::target::Surface;
use super::super::vertex::{PrimitiveType, Vertex, VertexComponent};
use super::*;

/// A recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetCapability(Capability, bool),
    SetClientArray(ClientArray, bool),
    ActiveTexture(u32),
    ClientActiveTexture(u32),
    Clear([f32; 4]),
    Viewport(Rect<i32>),
    LoadMatrix(MatrixMode, Option<[f32; 16]>),
    PushStates,
    PopStates,
    BlendFunc(BlendFactor, BlendFactor),
    BlendFuncSeparate(BlendFactor, BlendFactor, BlendFactor, BlendFactor),
    BlendEquation(Equation),
    BlendEquationSeparate(Equation, Equation),
    CreateTexture(Handle, Vector2<u32>),
    UpdateTexture(Handle, Rect<u32>),
    BindTexture(Handle),
    DeleteTexture(Handle),
    CreateBuffer(Handle, usize),
    UpdateBuffer(Handle, usize, usize),
    BindBuffer(Handle),
    DeleteBuffer(Handle),
    /// The component, and whether it points into client memory.
    VertexPointer(VertexComponent, bool),
    SetVertexAttribArray(u32, bool),
    VertexAttribPointer(u32, VertexComponent, bool),
    DrawArrays(PrimitiveType, usize, usize),
    Flush,
    CreateProgram(Handle),
    CompileShader(ShaderStage, Handle),
    AttachShader(Handle, Handle),
    DeleteShader(Handle),
    LinkProgram(Handle),
    DeleteProgram(Handle),
    UseProgram(Handle),
    CurrentProgram,
    UniformLocation(Handle, String),
    AttribLocation(Handle, String),
    Uniform(i32, UniformVariable),
    UniformArray(i32, usize),
}

/// What the headless device pretends to be.
#[derive(Debug, Clone)]
pub struct HeadlessParams {
    pub version: String,
    pub extensions: Vec<String>,
    pub max_texture_units: u32,
    /// Whether the fixed-function entry points are exposed.
    pub fixed_function: bool,
}

impl Default for HeadlessParams {
    fn default() -> Self {
        HeadlessParams {
            version: "2.1 Headless".into(),
            extensions: Vec::new(),
            max_texture_units: 8,
            fixed_function: true,
        }
    }
}

struct HeadlessShader {
    stage: ShaderStage,
    source: String,
}

#[derive(Default)]
struct HeadlessProgram {
    attached: Vec<Handle>,
    uniforms: Vec<String>,
    attributes: Vec<String>,
}

struct HeadlessState {
    commands: Vec<Command>,
    drawn: Vec<Vec<Vertex>>,
    next_handle: Handle,
    shaders: HashMap<Handle, HeadlessShader>,
    programs: HashMap<Handle, HeadlessProgram>,
    textures: HashMap<Handle, Vector2<u32>>,
    buffers: HashMap<Handle, Vec<Vertex>>,
    current_program: Handle,
    bound_buffer: Handle,
    // Address of the client vertices positions are read from, if any.
    positions: Option<usize>,
    transient_depth: usize,
}

impl HeadlessState {
    fn alloc(&mut self) -> Handle {
        self.next_handle += 1;
        self.next_handle
    }
}

pub struct HeadlessDevice {
    params: HeadlessParams,
    context: AtomicU64,
    fail_link: AtomicBool,
    state: Mutex<HeadlessState>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        HeadlessDevice::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        HeadlessDevice::with_params(HeadlessParams::default())
    }

    pub fn with_params(params: HeadlessParams) -> Self {
        HeadlessDevice {
            params,
            context: AtomicU64::new(1),
            fail_link: AtomicBool::new(false),
            state: Mutex::new(HeadlessState {
                commands: Vec::new(),
                drawn: Vec::new(),
                next_handle: 0,
                shaders: HashMap::new(),
                programs: HashMap::new(),
                textures: HashMap::new(),
                buffers: HashMap::new(),
                current_program: 0,
                bound_buffer: 0,
                positions: None,
                transient_depth: 0,
            }),
        }
    }

    /// Pretends to be an OpenGL ES 2.0 implementation.
    pub fn embedded() -> Self {
        HeadlessDevice::with_params(HeadlessParams {
            version: "OpenGL ES 2.0 Headless".into(),
            fixed_function: false,
            ..HeadlessParams::default()
        })
    }

    /// Changes the context reported as current on the calling thread.
    pub fn set_active_context(&self, id: ContextId) {
        self.context.store(id, Ordering::SeqCst);
    }

    /// Makes every following link fail.
    pub fn set_link_failure(&self, fail: bool) {
        self.fail_link.store(fail, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.lock().commands.clone()
    }

    /// Returns and forgets the commands recorded so far.
    pub fn take_commands(&self) -> Vec<Command> {
        let mut state = self.lock();
        ::std::mem::replace(&mut state.commands, Vec::new())
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Command) -> bool,
    {
        self.lock().commands.iter().filter(|v| predicate(v)).count()
    }

    /// The vertices (as seen by the API) of every draw call issued so far.
    pub fn drawn(&self) -> Vec<Vec<Vertex>> {
        self.lock().drawn.clone()
    }

    pub fn live_programs(&self) -> usize {
        self.lock().programs.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.lock().shaders.len()
    }

    pub fn live_textures(&self) -> usize {
        self.lock().textures.len()
    }

    pub fn transient_depth(&self) -> usize {
        self.lock().transient_depth
    }

    fn lock(&self) -> MutexGuard<HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, cmd: Command) -> Result<()> {
        self.lock().commands.push(cmd);
        Ok(())
    }
}

/// Checks that braces and parentheses are balanced, and that an entry point exists.
fn check_syntax(source: &str) -> ::std::result::Result<(), String> {
    let mut braces = 0i32;
    let mut parens = 0i32;
    for (line, text) in source.lines().enumerate() {
        for c in text.chars() {
            match c {
                '{' => braces += 1,
                '}' => braces -= 1,
                '(' => parens += 1,
                ')' => parens -= 1,
                _ => {}
            }

            if braces < 0 || parens < 0 {
                return Err(format!("0:{}(1): error: syntax error, unexpected '{}'", line + 1, c));
            }
        }
    }

    if braces != 0 || parens != 0 {
        return Err("0:1(1): error: syntax error, unexpected end of file".into());
    }

    if !source.contains("main") {
        return Err("0:1(1): error: missing entry point `main`".into());
    }

    Ok(())
}

/// Collects the names declared with `qualifier`, in declaration order.
fn declarations(source: &str, qualifiers: &[&str]) -> Vec<String> {
    let tokens: Vec<&str> = source
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|v| !v.is_empty())
        .collect();

    let mut names = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if qualifiers.contains(&tokens[i]) {
            let mut j = i + 1;
            while j < tokens.len() && ["lowp", "mediump", "highp"].contains(&tokens[j]) {
                j += 1;
            }

            // Skips the type.
            j += 1;
            if j < tokens.len() {
                let name = tokens[j].split('[').next().unwrap_or("").to_owned();
                if !name.is_empty() && !names.contains(&name) {
                    names.push(name);
                }
            }

            i = j;
        }

        i += 1;
    }

    names
}

impl Device for HeadlessDevice {
    fn active_context_id(&self) -> ContextId {
        self.context.load(Ordering::SeqCst)
    }

    fn acquire_transient_context(&self) -> Result<()> {
        self.lock().transient_depth += 1;
        Ok(())
    }

    fn release_transient_context(&self) -> Result<()> {
        let mut state = self.lock();
        if state.transient_depth == 0 {
            return Err(Error::Backend("Unbalanced transient context release.".into()));
        }

        state.transient_depth -= 1;
        Ok(())
    }

    fn version(&self) -> Result<String> {
        Ok(self.params.version.clone())
    }

    fn extensions(&self) -> Result<Vec<String>> {
        Ok(self.params.extensions.clone())
    }

    fn max_combined_texture_units(&self) -> Result<u32> {
        Ok(self.params.max_texture_units)
    }

    fn fixed_function_available(&self) -> Result<bool> {
        Ok(self.params.fixed_function)
    }

    fn set_capability(&self, capability: Capability, enabled: bool) -> Result<()> {
        self.record(Command::SetCapability(capability, enabled))
    }

    fn set_client_array(&self, array: ClientArray, enabled: bool) -> Result<()> {
        self.record(Command::SetClientArray(array, enabled))
    }

    fn active_texture(&self, unit: u32) -> Result<()> {
        self.record(Command::ActiveTexture(unit))
    }

    fn client_active_texture(&self, unit: u32) -> Result<()> {
        self.record(Command::ClientActiveTexture(unit))
    }

    fn clear(&self, color: [f32; 4]) -> Result<()> {
        self.record(Command::Clear(color))
    }

    fn viewport(&self, rect: Rect<i32>) -> Result<()> {
        self.record(Command::Viewport(rect))
    }

    fn load_matrix(&self, mode: MatrixMode, matrix: Option<&[f32; 16]>) -> Result<()> {
        self.record(Command::LoadMatrix(mode, matrix.cloned()))
    }

    fn push_states(&self) -> Result<()> {
        self.record(Command::PushStates)
    }

    fn pop_states(&self) -> Result<()> {
        self.record(Command::PopStates)
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) -> Result<()> {
        self.record(Command::BlendFunc(src, dst))
    }

    fn blend_func_separate(
        &self,
        color_src: BlendFactor,
        color_dst: BlendFactor,
        alpha_src: BlendFactor,
        alpha_dst: BlendFactor,
    ) -> Result<()> {
        self.record(Command::BlendFuncSeparate(
            color_src, color_dst, alpha_src, alpha_dst,
        ))
    }

    fn blend_equation(&self, equation: Equation) -> Result<()> {
        self.record(Command::BlendEquation(equation))
    }

    fn blend_equation_separate(&self, color: Equation, alpha: Equation) -> Result<()> {
        self.record(Command::BlendEquationSeparate(color, alpha))
    }

    fn create_texture(&self, size: Vector2<u32>) -> Result<Handle> {
        let mut state = self.lock();
        let handle = state.alloc();
        state.textures.insert(handle, size);
        state.commands.push(Command::CreateTexture(handle, size));
        Ok(handle)
    }

    fn update_texture(&self, handle: Handle, area: Rect<u32>, pixels: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if !state.textures.contains_key(&handle) {
            return Err(Error::Backend(format!("Texture {} does not exist.", handle)));
        }

        if pixels.len() < (area.width * area.height * 4) as usize {
            return Err(Error::InvalidParameter("Pixel data".into()));
        }

        state.commands.push(Command::UpdateTexture(handle, area));
        Ok(())
    }

    fn bind_texture(&self, handle: Handle) -> Result<()> {
        self.record(Command::BindTexture(handle))
    }

    fn delete_texture(&self, handle: Handle) -> Result<()> {
        let mut state = self.lock();
        state.textures.remove(&handle);
        state.commands.push(Command::DeleteTexture(handle));
        Ok(())
    }

    fn create_buffer(&self, vertices: &[Vertex], _: BufferUsage) -> Result<Handle> {
        let mut state = self.lock();
        let handle = state.alloc();
        state.buffers.insert(handle, vertices.to_vec());
        state.commands.push(Command::CreateBuffer(handle, vertices.len()));
        Ok(handle)
    }

    fn update_buffer(&self, handle: Handle, offset: usize, vertices: &[Vertex]) -> Result<()> {
        let mut state = self.lock();
        {
            let buffer = state
                .buffers
                .get_mut(&handle)
                .ok_or_else(|| Error::Backend(format!("Buffer {} does not exist.", handle)))?;

            if offset + vertices.len() > buffer.len() {
                buffer.resize(offset + vertices.len(), Vertex::default());
            }

            buffer[offset..offset + vertices.len()].copy_from_slice(vertices);
        }

        state
            .commands
            .push(Command::UpdateBuffer(handle, offset, vertices.len()));
        Ok(())
    }

    fn bind_buffer(&self, handle: Handle) -> Result<()> {
        let mut state = self.lock();
        state.bound_buffer = handle;
        state.commands.push(Command::BindBuffer(handle));
        Ok(())
    }

    fn delete_buffer(&self, handle: Handle) -> Result<()> {
        let mut state = self.lock();
        state.buffers.remove(&handle);
        state.commands.push(Command::DeleteBuffer(handle));
        Ok(())
    }

    unsafe fn vertex_pointer(&self, component: VertexComponent, source: VertexSource)
        -> Result<()> {
        let mut state = self.lock();
        let client = match source {
            VertexSource::Client(ptr) => {
                if component == VertexComponent::Position {
                    state.positions = Some(ptr as usize);
                }
                true
            }
            VertexSource::Buffer => {
                if component == VertexComponent::Position {
                    state.positions = None;
                }
                false
            }
        };

        state.commands.push(Command::VertexPointer(component, client));
        Ok(())
    }

    fn set_vertex_attrib_array(&self, location: u32, enabled: bool) -> Result<()> {
        self.record(Command::SetVertexAttribArray(location, enabled))
    }

    unsafe fn vertex_attrib_pointer(
        &self,
        location: u32,
        component: VertexComponent,
        source: VertexSource,
    ) -> Result<()> {
        let mut state = self.lock();
        let client = match source {
            VertexSource::Client(ptr) => {
                if component == VertexComponent::Position {
                    state.positions = Some(ptr as usize);
                }
                true
            }
            VertexSource::Buffer => {
                if component == VertexComponent::Position {
                    state.positions = None;
                }
                false
            }
        };

        state
            .commands
            .push(Command::VertexAttribPointer(location, component, client));
        Ok(())
    }

    fn draw_arrays(&self, primitive: PrimitiveType, first: usize, count: usize) -> Result<()> {
        let mut state = self.lock();
        let vertices = match state.positions {
            Some(address) => {
                // The caller guarantees that the client pointer is alive until this call.
                let ptr = address as *const Vertex;
                unsafe { ::std::slice::from_raw_parts(ptr.add(first), count).to_vec() }
            }
            None => {
                let bound = state.bound_buffer;
                state
                    .buffers
                    .get(&bound)
                    .map(|v| v.iter().skip(first).take(count).cloned().collect())
                    .unwrap_or_default()
            }
        };

        state.drawn.push(vertices);
        state
            .commands
            .push(Command::DrawArrays(primitive, first, count));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.record(Command::Flush)
    }

    fn create_program(&self) -> Result<Handle> {
        let mut state = self.lock();
        let handle = state.alloc();
        state.programs.insert(handle, HeadlessProgram::default());
        state.commands.push(Command::CreateProgram(handle));
        Ok(handle)
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Handle> {
        let mut state = self.lock();
        let handle = state.alloc();
        state.commands.push(Command::CompileShader(stage, handle));

        // A shader that failed to compile is deleted right away, like the GL device does.
        check_syntax(source).map_err(|log| Error::Compile(stage, log))?;

        state.shaders.insert(
            handle,
            HeadlessShader {
                stage,
                source: source.to_owned(),
            },
        );

        Ok(handle)
    }

    fn attach_shader(&self, program: Handle, shader: Handle) -> Result<()> {
        let mut state = self.lock();
        if !state.shaders.contains_key(&shader) {
            return Err(Error::Backend(format!("Shader {} does not exist.", shader)));
        }

        state
            .programs
            .get_mut(&program)
            .ok_or_else(|| Error::Backend(format!("Program {} does not exist.", program)))?
            .attached
            .push(shader);

        state.commands.push(Command::AttachShader(program, shader));
        Ok(())
    }

    fn delete_shader(&self, shader: Handle) -> Result<()> {
        let mut state = self.lock();
        let attached = state
            .programs
            .values()
            .any(|v| v.attached.contains(&shader));

        // Attached objects are flagged for deletion, and live as long as the program.
        if !attached {
            state.shaders.remove(&shader);
        }

        state.commands.push(Command::DeleteShader(shader));
        Ok(())
    }

    fn link_program(&self, program: Handle) -> Result<()> {
        let mut state = self.lock();
        state.commands.push(Command::LinkProgram(program));

        let attached = state
            .programs
            .get(&program)
            .map(|v| v.attached.clone())
            .ok_or_else(|| Error::Backend(format!("Program {} does not exist.", program)))?;

        if attached.is_empty() {
            return Err(Error::Link("error: no shaders attached to the program".into()));
        }

        if self.fail_link.load(Ordering::SeqCst) {
            return Err(Error::Link("error: linking with uncompiled shader".into()));
        }

        let mut uniforms = Vec::new();
        let mut attributes = Vec::new();
        for shader in &attached {
            if let Some(v) = state.shaders.get(shader) {
                for name in declarations(&v.source, &["uniform"]) {
                    if !uniforms.contains(&name) {
                        uniforms.push(name);
                    }
                }

                if v.stage == ShaderStage::Vertex {
                    for name in declarations(&v.source, &["attribute", "in"]) {
                        if !attributes.contains(&name) {
                            attributes.push(name);
                        }
                    }
                }
            }
        }

        if let Some(v) = state.programs.get_mut(&program) {
            v.uniforms = uniforms;
            v.attributes = attributes;
        }

        Ok(())
    }

    fn delete_program(&self, program: Handle) -> Result<()> {
        let mut state = self.lock();
        if let Some(v) = state.programs.remove(&program) {
            for shader in v.attached {
                state.shaders.remove(&shader);
            }
        }

        if state.current_program == program {
            state.current_program = 0;
        }

        state.commands.push(Command::DeleteProgram(program));
        Ok(())
    }

    fn use_program(&self, program: Handle) -> Result<()> {
        let mut state = self.lock();
        if program != 0 && !state.programs.contains_key(&program) {
            return Err(Error::Backend(format!("Program {} does not exist.", program)));
        }

        state.current_program = program;
        state.commands.push(Command::UseProgram(program));
        Ok(())
    }

    fn current_program(&self) -> Result<Handle> {
        let mut state = self.lock();
        state.commands.push(Command::CurrentProgram);
        Ok(state.current_program)
    }

    fn uniform_location(&self, program: Handle, name: &str) -> Result<i32> {
        let mut state = self.lock();
        state
            .commands
            .push(Command::UniformLocation(program, name.to_owned()));

        let location = state
            .programs
            .get(&program)
            .and_then(|v| v.uniforms.iter().position(|n| n == name))
            .map(|v| v as i32)
            .unwrap_or(-1);

        Ok(location)
    }

    fn attrib_location(&self, program: Handle, name: &str) -> Result<i32> {
        let mut state = self.lock();
        state
            .commands
            .push(Command::AttribLocation(program, name.to_owned()));

        let location = state
            .programs
            .get(&program)
            .and_then(|v| v.attributes.iter().position(|n| n == name))
            .map(|v| v as i32)
            .unwrap_or(-1);

        Ok(location)
    }

    fn uniform(&self, location: i32, variable: &UniformVariable) -> Result<()> {
        self.record(Command::Uniform(location, *variable))
    }

    fn uniform_array(&self, location: i32, array: &UniformArray) -> Result<()> {
        self.record(Command::UniformArray(location, array.len()))
    }
}

/// A surface with nothing behind it.
#[derive(Debug, Copy, Clone)]
pub struct HeadlessSurface {
    size: Vector2<u32>,
    srgb: bool,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        HeadlessSurface {
            size: Vector2::new(width, height),
            srgb: false,
        }
    }

    pub fn srgb(mut self, srgb: bool) -> Self {
        self.srgb = srgb;
        self
    }
}

impl Surface for HeadlessSurface {
    fn size(&self) -> Vector2<u32> {
        self.size
    }

    fn is_srgb(&self) -> bool {
        self.srgb
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn syntax() {
        assert!(check_syntax("void main() { gl_FragColor = vec4(1.0); }").is_ok());
        assert!(check_syntax("void main() { gl_FragColor = vec4(1.0; }").is_err());
        assert!(check_syntax("void main() { ").is_err());
        assert!(check_syntax("float x;").is_err());
    }

    #[test]
    fn scan_declarations() {
        let src = "uniform mat4 sf_modelview;\nuniform lowp vec4 colors[4];\n\
                   attribute vec2 position;\nuniform mat4 sf_modelview;";
        assert_eq!(declarations(src, &["uniform"]), vec!["sf_modelview", "colors"]);
        assert_eq!(declarations(src, &["attribute", "in"]), vec!["position"]);
    }

    #[test]
    fn locations() {
        let device = HeadlessDevice::new();
        let program = device.create_program().unwrap();
        let vs = device
            .compile_shader(ShaderStage::Vertex, "attribute vec2 position; void main() {}")
            .unwrap();
        let fs = device
            .compile_shader(ShaderStage::Fragment, "uniform vec4 tint; void main() {}")
            .unwrap();

        device.attach_shader(program, vs).unwrap();
        device.attach_shader(program, fs).unwrap();
        device.delete_shader(vs).unwrap();
        device.delete_shader(fs).unwrap();
        device.link_program(program).unwrap();

        assert_eq!(device.uniform_location(program, "tint").unwrap(), 0);
        assert_eq!(device.uniform_location(program, "missing").unwrap(), -1);
        assert_eq!(device.attrib_location(program, "position").unwrap(), 0);
        assert_eq!(device.live_shaders(), 2);

        device.delete_program(program).unwrap();
        assert_eq!(device.live_programs(), 0);
        assert_eq!(device.live_shaders(), 0);
    }
}
