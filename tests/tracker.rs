extern crate crayon_canvas;
extern crate env_logger;

use std::sync::Arc;

use crayon_canvas::graphics::backends::headless::Command;
use crayon_canvas::graphics::backends::Capability;
use crayon_canvas::prelude::*;

fn resets(device: &HeadlessDevice) -> usize {
    device.count(|v| *v == Command::SetCapability(Capability::CullFace, false))
}

fn setup() -> (Arc<HeadlessDevice>, Arc<Graphics>) {
    let _ = env_logger::try_init();
    let device = Arc::new(HeadlessDevice::new());
    let graphics = Graphics::new(device.clone(), Settings::default());
    (device, graphics)
}

fn target(graphics: &Arc<Graphics>) -> RenderTarget {
    RenderTarget::new(graphics.clone(), Box::new(HeadlessSurface::new(64, 64)))
}

#[test]
fn idempotent_activation() {
    let (device, graphics) = setup();
    let mut target = target(&graphics);
    let vertices = [Vertex::default(); 3];

    assert!(target.set_active(true));
    assert!(target.set_active(true));
    assert!(!target.state_cache().is_applied_once());
    assert_eq!(resets(&device), 0);

    target.draw_vertices(&vertices, PrimitiveType::Triangles, &RenderStates::default());
    target.draw_vertices(&vertices, PrimitiveType::Triangles, &RenderStates::default());
    assert_eq!(resets(&device), 1);

    assert!(target.set_active(true));
    assert!(target.state_cache().is_valid());
    target.clear(Color::black());
    target.draw_vertices(&vertices, PrimitiveType::Triangles, &RenderStates::default());
    assert_eq!(resets(&device), 1);

    target.reset_gl_states();
    assert_eq!(resets(&device), 2);
}

#[test]
fn context_switch() {
    let (device, graphics) = setup();
    let mut a = target(&graphics);
    let mut b = target(&graphics);
    assert_ne!(a.id(), b.id());

    let vertices = [Vertex::default(); 3];
    let states = RenderStates::default();

    a.draw_vertices(&vertices, PrimitiveType::Triangles, &states);
    b.draw_vertices(&vertices, PrimitiveType::Triangles, &states);
    assert_eq!(resets(&device), 2);

    // The cache of `a` is found stale when `a` is activated again.
    assert!(a.set_active(true));
    assert!(!a.state_cache().is_valid());
    assert!(a.state_cache().is_applied_once());

    a.draw_vertices(&vertices, PrimitiveType::Triangles, &states);
    assert_eq!(resets(&device), 3);

    a.draw_vertices(&vertices, PrimitiveType::Triangles, &states);
    assert_eq!(resets(&device), 3);
    assert_eq!(graphics.tracker().len(), 1);

    // A context the target never used.
    device.set_active_context(2);
    assert!(a.set_active(true));
    assert!(!a.state_cache().is_applied_once());
    a.draw_vertices(&vertices, PrimitiveType::Triangles, &states);
    assert_eq!(resets(&device), 4);
    assert_eq!(graphics.tracker().len(), 2);

    assert!(a.set_active(false));
    assert!(!a.state_cache().is_valid());
    assert_eq!(graphics.tracker().len(), 1);

    device.set_active_context(1);
    drop(a);
    assert!(graphics.tracker().is_empty());

    b.draw_vertices(&vertices, PrimitiveType::Triangles, &states);
    assert_eq!(graphics.tracker().len(), 1);
    drop(b);
    assert!(graphics.tracker().is_empty());
}

#[test]
fn initialize() {
    let (_, graphics) = setup();
    let mut target = target(&graphics);
    let id = target.id();

    target.clear(Color::white());
    assert_eq!(graphics.tracker().len(), 1);

    target.initialize();
    assert_ne!(target.id(), id);
    assert!(graphics.tracker().is_empty());
    assert_eq!(target.default_view().size(), Vector2::new(64.0, 64.0));
}
