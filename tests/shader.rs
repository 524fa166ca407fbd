extern crate crayon_canvas;
extern crate log;

use std::fs;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{Level, LevelFilter, Log, Metadata, Record};

use crayon_canvas::graphics::backends::headless::{Command, HeadlessParams};
use crayon_canvas::prelude::*;

const VS: &str = "
attribute vec2 position;
uniform mat4 mvp;

void main() {
    gl_Position = mvp * vec4(position, 0.0, 1.0);
}
";

const FS: &str = "
uniform vec4 tint;
uniform float weights[3];

void main() {
    gl_FragColor = tint * weights[0];
}
";

const SAMPLERS: &str = "
uniform sampler2D s0;
uniform sampler2D s1;
uniform sampler2D s2;
uniform sampler2D s3;

void main() {
    gl_FragColor = texture2D(s0, vec2(0.0)) + texture2D(s1, vec2(0.0));
}
";

/// Counts the warnings about the uniform named `missing`.
struct WarningCounter;

static MISSING_WARNINGS: AtomicUsize = AtomicUsize::new(0);
static LOGGER: WarningCounter = WarningCounter;

impl Log for WarningCounter {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if record.level() == Level::Warn && format!("{}", record.args()).contains("\"missing\"") {
            MISSING_WARNINGS.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn flush(&self) {}
}

fn setup(params: HeadlessParams) -> (Arc<HeadlessDevice>, Arc<Graphics>) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Warn);

    let device = Arc::new(HeadlessDevice::with_params(params));
    let graphics = Graphics::new(device.clone(), Settings::default());
    (device, graphics)
}

fn version(version: &str) -> HeadlessParams {
    HeadlessParams {
        version: version.into(),
        ..HeadlessParams::default()
    }
}

fn lookups(device: &HeadlessDevice, name: &str) -> usize {
    device.count(|v| match *v {
        Command::UniformLocation(_, ref n) => n == name,
        _ => false,
    })
}

#[test]
fn uniform_locations() {
    let (device, graphics) = setup(HeadlessParams::default());
    let mut shader = Shader::new(&graphics);
    shader.load_from_memory_pair(VS, FS).unwrap();

    shader.set_uniform("tint", Color::red());
    shader.set_uniform("tint", Color::green());
    assert_eq!(lookups(&device, "tint"), 1);

    shader.set_uniform("missing", 1.0f32);
    shader.set_uniform("missing", 2.0f32);
    shader.set_uniform("missing", Color::blue());
    assert_eq!(lookups(&device, "missing"), 1);
    assert_eq!(MISSING_WARNINGS.load(Ordering::SeqCst), 1);

    device.take_commands();
    shader.set_uniform_array("weights", &[0.5f32, 0.25, 0.25][..]);
    assert!(device.commands().contains(&Command::UniformArray(2, 3)));
}

#[test]
fn compile_errors() {
    let (device, graphics) = setup(HeadlessParams::default());
    let mut shader = Shader::new(&graphics);
    assert_eq!(shader.native_handle(), 0);

    match shader.load_from_memory_pair(VS, "void main() {") {
        Err(Error::Compile(ShaderStage::Fragment, _)) => {}
        other => panic!("unexpected result {:?}", other),
    }

    assert_eq!(shader.native_handle(), 0);
    assert_eq!(device.live_programs(), 0);
    assert_eq!(device.transient_depth(), 0);

    // Uniforms of a shader without program are ignored.
    device.take_commands();
    shader.set_uniform("tint", 1.0f32);
    assert!(device.commands().is_empty());

    shader.load_from_memory(FS, ShaderStage::Fragment).unwrap();
    assert_ne!(shader.native_handle(), 0);
}

#[test]
fn requirements() {
    let (_, graphics) = setup(version("1.4 Headless"));
    assert!(!Shader::is_available(&graphics));
    assert!(!Shader::is_geometry_available(&graphics));

    let mut shader = Shader::new(&graphics);
    match shader.load_from_memory_pair(VS, FS) {
        Err(Error::Requirement(_)) => {}
        other => panic!("unexpected result {:?}", other),
    }

    let gs = "void main() { EmitVertex(); }";

    let (_, graphics) = setup(HeadlessParams::default());
    assert!(Shader::is_available(&graphics));
    assert!(!Shader::is_geometry_available(&graphics));

    let mut shader = Shader::new(&graphics);
    match shader.load_from_memory_triple(VS, gs, FS) {
        Err(Error::Requirement(_)) => {}
        other => panic!("unexpected result {:?}", other),
    }

    let (device, graphics) = setup(version("3.3 Headless"));
    assert!(Shader::is_geometry_available(&graphics));

    let mut shader = Shader::new(&graphics);
    shader.load_from_memory_triple(VS, gs, FS).unwrap();
    assert_eq!(
        device.count(|v| match *v {
            Command::CompileShader(ShaderStage::Geometry, _) => true,
            _ => false,
        }),
        1
    );
}

#[test]
fn texture_units() {
    let (device, graphics) = setup(HeadlessParams {
        max_texture_units: 4,
        ..HeadlessParams::default()
    });

    let mut shader = Shader::new(&graphics);
    shader.load_from_memory(SAMPLERS, ShaderStage::Fragment).unwrap();

    let params = TextureParams {
        size: Vector2::new(4, 4),
        ..TextureParams::default()
    };

    let textures: Vec<_> = (0..4)
        .map(|_| Texture::new(&graphics, params).unwrap())
        .collect();

    for (i, texture) in textures.iter().enumerate() {
        shader.set_uniform_texture(&format!("s{}", i), texture);
    }

    // The first sampler can be pointed at another texture even when every unit is used.
    shader.set_uniform_texture("s0", &textures[3]);

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

    assert_eq!(units, vec![1, 2, 3, 0]);
    assert_eq!(
        commands
            .iter()
            .filter(|v| **v == Command::BindTexture(textures[3].native_handle()))
            .count(),
        1
    );
    assert!(!commands.contains(&Command::BindTexture(textures[0].native_handle())));
}

#[test]
fn sources() {
    let (_, graphics) = setup(HeadlessParams::default());
    let mut shader = Shader::new(&graphics);

    let mut vertex = Cursor::new(VS.as_bytes().to_vec());
    let mut fragment = Cursor::new(FS.as_bytes().to_vec());
    shader.load_from_stream_pair(&mut vertex, &mut fragment).unwrap();
    assert_ne!(shader.native_handle(), 0);

    let mut fragment = Cursor::new(FS.as_bytes().to_vec());
    shader.load_from_stream(&mut fragment, ShaderStage::Fragment).unwrap();

    let path = std::env::temp_dir().join(format!("crayon-canvas-{}.frag", std::process::id()));
    fs::write(&path, FS).unwrap();
    shader.load_from_file(&path, ShaderStage::Fragment).unwrap();
    fs::remove_file(&path).unwrap();

    match shader.load_from_file(&path, ShaderStage::Fragment) {
        Err(Error::Source(_, _)) => {}
        other => panic!("unexpected result {:?}", other),
    }
}
