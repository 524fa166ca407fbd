extern crate crayon_canvas;
extern crate env_logger;

use std::sync::Arc;

use crayon_canvas::graphics::backends::headless::{Command, HeadlessParams};
use crayon_canvas::graphics::backends::{Capability, ClientArray, MatrixMode};
use crayon_canvas::graphics::vertex::VertexComponent;
use crayon_canvas::graphics::Warning;
use crayon_canvas::prelude::*;

fn setup(params: HeadlessParams, settings: Settings) -> (Arc<HeadlessDevice>, Arc<Graphics>) {
    let _ = env_logger::try_init();
    let device = Arc::new(HeadlessDevice::with_params(params));
    let graphics = Graphics::new(device.clone(), settings);
    (device, graphics)
}

fn version(version: &str) -> HeadlessParams {
    HeadlessParams {
        version: version.into(),
        ..HeadlessParams::default()
    }
}

fn render_target(graphics: &Arc<Graphics>) -> RenderTarget {
    RenderTarget::new(graphics.clone(), Box::new(HeadlessSurface::new(320, 240)))
}

fn vertices(n: usize) -> Vec<Vertex> {
    (0..n)
        .map(|i| Vertex::new([i as f32, 1.0], Color::white(), [0.0, i as f32]))
        .collect()
}

fn new_texture(graphics: &Graphics, fbo_attachment: bool) -> Texture {
    let params = TextureParams {
        size: Vector2::new(16, 16),
        fbo_attachment,
        ..TextureParams::default()
    };

    Texture::new(graphics, params).unwrap()
}

fn funcs(device: &HeadlessDevice) -> usize {
    device.count(|v| match *v {
        Command::BlendFuncSeparate(_, _, _, _) => true,
        _ => false,
    })
}

fn binds(device: &HeadlessDevice, handle: u32) -> usize {
    device.count(|v| *v == Command::BindTexture(handle))
}

#[test]
fn vertex_cache_threshold() {
    let (device, graphics) = setup(HeadlessParams::default(), Settings::default());
    let mut target = render_target(&graphics);
    let mut states = RenderStates::default();
    states.transform.translate(10.0, 20.0);

    target.draw_vertices(&vertices(4), PrimitiveType::Points, &states);
    assert!(target.state_cache().uses_vertex_cache());
    assert_eq!(device.drawn()[0][3].position, Vector2::new(13.0, 21.0));

    target.draw_vertices(&vertices(5), PrimitiveType::Points, &states);
    assert!(!target.state_cache().uses_vertex_cache());
    assert_eq!(device.drawn()[1][4].position, Vector2::new(4.0, 1.0));

    let settings = Settings::from_json(r#"{ "render": { "vertex_cache_size": 8 } }"#).unwrap();
    let (_, graphics) = setup(HeadlessParams::default(), settings);
    let mut target = render_target(&graphics);
    assert_eq!(target.state_cache().vertex_cache_size(), 8);

    target.draw_vertices(&vertices(5), PrimitiveType::Points, &states);
    assert!(target.state_cache().uses_vertex_cache());
}

#[test]
fn identity_transform_is_loaded_once() {
    let (device, graphics) = setup(HeadlessParams::default(), Settings::default());
    let mut target = render_target(&graphics);
    let states = RenderStates::default();

    target.draw_vertices(&vertices(3), PrimitiveType::Triangles, &states);
    target.draw_vertices(&vertices(5), PrimitiveType::Points, &states);
    device.take_commands();

    // Switching back to the vertex cache loads the identity again.
    target.draw_vertices(&vertices(3), PrimitiveType::Triangles, &states);
    target.draw_vertices(&vertices(2), PrimitiveType::Lines, &states);
    let identities = device.count(|v| *v == Command::LoadMatrix(MatrixMode::ModelView, None));
    assert_eq!(identities, 1);
}

#[test]
fn blend_memoization() {
    let (device, graphics) = setup(HeadlessParams::default(), Settings::default());
    let mut target = render_target(&graphics);
    let v = vertices(3);

    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(BlendMode::ALPHA));
    device.take_commands();
    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(BlendMode::ALPHA));
    assert_eq!(funcs(&device), 0);

    let base = BlendMode::ALPHA;
    let variants = [
        BlendMode { color_src_factor: BlendFactor::One, ..base },
        BlendMode { color_dst_factor: BlendFactor::Zero, ..base },
        BlendMode { color_equation: Equation::Subtract, ..base },
        BlendMode { alpha_src_factor: BlendFactor::DstAlpha, ..base },
        BlendMode { alpha_dst_factor: BlendFactor::Zero, ..base },
        BlendMode { alpha_equation: Equation::Max, ..base },
    ];

    for mode in &variants {
        target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(base));
        device.take_commands();

        target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(*mode));
        assert_eq!(funcs(&device), 1);
        assert!(device.commands().contains(&Command::BlendEquationSeparate(
            mode.color_equation,
            mode.alpha_equation
        )));

        device.take_commands();
        target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(*mode));
        assert_eq!(funcs(&device), 0);
    }

    assert_eq!(target.state_cache().last_blend_mode(), variants[5]);
}

#[test]
fn blend_equation_fallback() {
    let (device, graphics) = setup(version("1.3 Headless"), Settings::default());
    let mut target = render_target(&graphics);

    target.draw_vertices(&vertices(3), PrimitiveType::Triangles, &RenderStates::from(BlendMode::MIN));
    assert!(graphics.warnings().is_raised(Warning::BlendEquation));
    assert!(device.commands().contains(&Command::BlendFunc(BlendFactor::One, BlendFactor::One)));
    assert_eq!(
        device.count(|v| match *v {
            Command::BlendEquation(_) | Command::BlendEquationSeparate(_, _) => true,
            _ => false,
        }),
        0
    );

    assert_eq!(device.drawn().len(), 1);
}

#[test]
fn textures() {
    let (device, graphics) = setup(HeadlessParams::default(), Settings::default());
    let mut target = render_target(&graphics);
    let texture = new_texture(&graphics, false);
    let v = vertices(3);

    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(&texture));
    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(&texture));
    assert_eq!(binds(&device, texture.native_handle()), 1);
    assert_eq!(target.state_cache().last_texture_id(), texture.cache_id());

    // New content means a new identifier.
    texture.update(&vec![0; 16 * 16 * 4]).unwrap();
    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(&texture));
    assert_eq!(binds(&device, texture.native_handle()), 2);

    device.take_commands();
    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::default());
    assert_eq!(binds(&device, 0), 1);
    assert_eq!(target.state_cache().last_texture_id(), 0);

    // Attachments are bound on every draw, and unbound afterwards.
    let attachment = new_texture(&graphics, true);
    device.take_commands();
    for _ in 0..3 {
        target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(&attachment));
    }

    assert_eq!(binds(&device, attachment.native_handle()), 3);
    assert_eq!(binds(&device, 0), 3);
    assert_eq!(target.state_cache().last_texture_id(), 0);
}

#[test]
fn texture_coordinates() {
    let (device, graphics) = setup(HeadlessParams::default(), Settings::default());
    let mut target = render_target(&graphics);
    let texture = new_texture(&graphics, false);
    let v = vertices(3);

    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::default());
    assert!(device
        .commands()
        .contains(&Command::SetClientArray(ClientArray::TexCoord, false)));
    assert!(!target.state_cache().is_tex_coords_enabled());

    device.take_commands();
    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(&texture));
    assert!(target.state_cache().is_tex_coords_enabled());

    let commands = device.commands();
    assert!(commands.contains(&Command::SetClientArray(ClientArray::TexCoord, true)));
    assert!(commands.contains(&Command::VertexPointer(VertexComponent::TexCoords, true)));
    assert!(!commands.contains(&Command::VertexPointer(VertexComponent::Position, true)));

    // Pixel coordinates are rescaled by the texture matrix.
    let matrix = texture.texture_matrix(CoordinateType::Pixels);
    assert!(commands.contains(&Command::LoadMatrix(MatrixMode::Texture, Some(matrix))));
}

#[test]
fn vertex_buffers() {
    let (device, graphics) = setup(HeadlessParams::default(), Settings::default());
    let mut target = render_target(&graphics);
    let buffer = VertexBuffer::new(
        &graphics,
        PrimitiveType::Triangles,
        BufferUsage::Static,
        &vertices(6),
    )
    .unwrap();

    target.draw_buffer_range(&buffer, 4, 10, &RenderStates::default());
    assert_eq!(device.drawn(), vec![vertices(6)[4..].to_vec()]);
    assert!(!target.state_cache().uses_vertex_cache());
    assert!(target.state_cache().is_tex_coords_enabled());

    let commands = device.take_commands();
    let handle = buffer.native_handle();
    let bind = commands.iter().position(|v| *v == Command::BindBuffer(handle));
    let draw = commands
        .iter()
        .position(|v| *v == Command::DrawArrays(PrimitiveType::Triangles, 4, 2));
    assert!(bind.unwrap() < draw.unwrap());
    assert_eq!(commands[draw.unwrap() + 1], Command::BindBuffer(0));
    assert!(commands.contains(&Command::VertexPointer(VertexComponent::TexCoords, false)));

    target.draw_buffer_range(&buffer, 7, 1, &RenderStates::default());
    target.draw_buffer_range(&buffer, 6, 1, &RenderStates::default());
    assert!(device.take_commands().is_empty());

    target.draw(&buffer, &RenderStates::default());
    assert!(device
        .commands()
        .contains(&Command::DrawArrays(PrimitiveType::Triangles, 0, 6)));

    // A context without vertex buffers skips the draw.
    let (legacy, graphics) = setup(version("1.4 Headless"), Settings::default());
    let mut target = render_target(&graphics);
    target.draw_buffer(&buffer, &RenderStates::default());
    assert!(legacy.commands().is_empty());
    assert!(graphics.warnings().is_raised(Warning::VertexBuffers));
}

#[test]
fn gl_states() {
    let (device, graphics) = setup(HeadlessParams::default(), Settings::default());
    let mut target = render_target(&graphics);

    target.clear(Color::new(255, 0, 0, 255));
    assert_eq!(
        device.take_commands(),
        vec![
            Command::BindTexture(0),
            Command::LoadMatrix(MatrixMode::Texture, None),
            Command::Clear([1.0, 0.0, 0.0, 1.0]),
        ]
    );

    target.push_gl_states();
    let commands = device.take_commands();
    assert_eq!(commands[0], Command::PushStates);
    assert!(commands.contains(&Command::SetCapability(Capability::DepthTest, false)));
    assert!(commands.contains(&Command::SetClientArray(ClientArray::Vertex, true)));
    assert!(target.state_cache().is_valid());

    target.pop_gl_states();
    assert_eq!(device.take_commands(), vec![Command::PopStates]);
}

#[test]
fn srgb() {
    let (device, graphics) = setup(version("3.0 Headless"), Settings::default());
    let surface = HeadlessSurface::new(32, 32).srgb(true);
    let mut target = RenderTarget::new(graphics.clone(), Box::new(surface));
    assert!(target.is_srgb());

    target.draw_vertices(&vertices(3), PrimitiveType::Triangles, &RenderStates::default());
    target.draw_vertices(&vertices(3), PrimitiveType::Triangles, &RenderStates::default());
    assert_eq!(
        device.count(|v| *v == Command::SetCapability(Capability::FramebufferSrgb, true)),
        1
    );
}

#[test]
fn programmable() {
    let (device, graphics) = setup(version("OpenGL ES 2.0 Headless"), Settings::default());
    let mut target = render_target(&graphics);
    let v = vertices(3);

    target.push_gl_states();
    assert!(!device.commands().contains(&Command::PushStates));

    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::default());
    let program = target.state_cache().last_program();
    assert_ne!(program, 0);
    assert_eq!(target.state_cache().attributes().iter().collect::<Vec<_>>(), vec![0, 1]);

    let commands = device.take_commands();
    assert!(commands.contains(&Command::SetVertexAttribArray(0, true)));
    assert!(commands.contains(&Command::VertexAttribPointer(0, VertexComponent::Position, true)));
    assert!(!commands.contains(&Command::SetClientArray(ClientArray::Vertex, true)));
    assert_eq!(commands.last(), Some(&Command::UseProgram(0)));

    // The projection is uploaded on every draw, the attributes are queried once.
    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::default());
    let commands = device.take_commands();
    assert!(!commands.contains(&Command::UniformLocation(program, "sf_projection".into())));
    assert!(commands.iter().any(|v| match *v {
        Command::Uniform(1, UniformVariable::Matrix4f(_)) => true,
        _ => false,
    }));
    assert!(!commands.iter().any(|v| match *v {
        Command::AttribLocation(_, _) => true,
        _ => false,
    }));

    // Textured draws go through the other built-in program.
    let texture = new_texture(&graphics, false);
    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::from(&texture));
    assert_ne!(target.state_cache().last_program(), program);
    assert_eq!(target.state_cache().attributes().iter().count(), 3);

    let matrix = texture.texture_matrix(CoordinateType::Pixels);
    assert!(device
        .commands()
        .contains(&Command::Uniform(3, UniformVariable::Matrix4f(matrix))));
    assert_eq!(npot_lookups(&device), 0);

    // Only user shaders get the size factor of the texture.
    let mut shader = Shader::new(&graphics);
    shader
        .load_from_memory(
            "uniform sampler2D texture; uniform vec2 factor_npot; \
             void main() { gl_FragColor = texture2D(texture, factor_npot); }",
            ShaderStage::Fragment,
        )
        .unwrap();

    let mut states = RenderStates::from(&texture);
    states.shader = Some(&shader);
    target.draw_vertices(&v, PrimitiveType::Triangles, &states);
    assert_eq!(npot_lookups(&device), 1);

    // Resetting disables the attributes, the next draw enables them again.
    target.reset_gl_states();
    assert_eq!(target.state_cache().last_program(), 0);
    device.take_commands();
    target.draw_vertices(&v, PrimitiveType::Triangles, &RenderStates::default());
    assert!(device.commands().contains(&Command::SetVertexAttribArray(1, true)));

    // Quads can not be drawn at all.
    device.take_commands();
    target.draw_vertices(&vertices(4), PrimitiveType::Quads, &RenderStates::default());
    assert!(device.commands().is_empty());
}

fn npot_lookups(device: &HeadlessDevice) -> usize {
    device.count(|v| match *v {
        Command::UniformLocation(_, ref name) => name == "factor_npot",
        _ => false,
    })
}

fn draws(device: &HeadlessDevice) -> usize {
    device.count(|v| match *v {
        Command::DrawArrays(_, _, _) => true,
        _ => false,
    })
}

fn resets(device: &HeadlessDevice) -> usize {
    device.count(|v| *v == Command::SetCapability(Capability::CullFace, false))
}

#[test]
fn pipeline_selection() {
    // OpenGL ES 1.x has no programs, but still has the fixed-function pipeline.
    let (device, graphics) = setup(version("OpenGL ES-CM 1.1 Headless"), Settings::default());
    assert!(!Shader::is_available(&graphics));
    assert_eq!(graphics.driver().pipeline_kind(), PipelineKind::FixedFunction);

    let mut target = render_target(&graphics);
    for _ in 0..3 {
        target.draw_vertices(&vertices(3), PrimitiveType::Triangles, &RenderStates::default());
        assert!(target.state_cache().is_valid());
    }

    assert_eq!(draws(&device), 3);
    assert_eq!(resets(&device), 1);
    assert!(device.commands().contains(&Command::SetClientArray(ClientArray::Vertex, true)));
    assert!(!device.commands().iter().any(|v| match *v {
        Command::UseProgram(_) => true,
        _ => false,
    }));

    // Core profiles only draw through programs.
    let (device, graphics) = setup(
        HeadlessParams {
            version: "3.3 Headless".into(),
            fixed_function: false,
            ..HeadlessParams::default()
        },
        Settings::default(),
    );
    assert_eq!(graphics.driver().pipeline_kind(), PipelineKind::Programmable);

    let mut target = render_target(&graphics);
    target.draw_vertices(&vertices(3), PrimitiveType::Triangles, &RenderStates::default());
    assert!(target.state_cache().is_valid());
    assert_ne!(target.state_cache().last_program(), 0);
    assert_eq!(draws(&device), 1);
    assert!(!device.commands().iter().any(|v| match *v {
        Command::LoadMatrix(_, _) | Command::SetClientArray(_, _) => true,
        _ => false,
    }));
}
