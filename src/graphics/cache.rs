use super::backends::Handle;
use super::blend::BlendMode;
use super::vertex::Vertex;

/// Locations of the vertex attributes of the program used by the last draw call,
/// `-1` meaning that the attribute is not used by the program.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeLocations {
    pub position: i32,
    pub color: i32,
    pub tex_coords: i32,
}

impl Default for AttributeLocations {
    fn default() -> Self {
        AttributeLocations {
            position: -1,
            color: -1,
            tex_coords: -1,
        }
    }
}

impl AttributeLocations {
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        let locations = [self.position, self.color, self.tex_coords];
        (0..3).map(move |i| locations[i]).filter(|v| *v >= 0).map(|v| v as u32)
    }
}

/// The pipeline states a render target applied to the context with its last draw
/// call, used to skip redundant state changes.
///
/// When `valid` is unset, another render target may have used the context since, and
/// nothing stored here can be trusted.
pub struct StateCache {
    pub(crate) applied_once: bool,
    pub(crate) valid: bool,
    pub(crate) view_changed: bool,
    pub(crate) last_blend_mode: BlendMode,
    pub(crate) last_texture_id: u64,
    pub(crate) last_program: Handle,
    pub(crate) use_vertex_cache: bool,
    pub(crate) tex_coords_enabled: bool,
    pub(crate) attributes: AttributeLocations,
    pub(crate) vertex_cache: Vec<Vertex>,
}

impl StateCache {
    pub fn new(vertex_cache_size: usize) -> Self {
        StateCache {
            applied_once: false,
            valid: false,
            view_changed: false,
            last_blend_mode: BlendMode::ALPHA,
            last_texture_id: 0,
            last_program: 0,
            use_vertex_cache: false,
            tex_coords_enabled: false,
            attributes: AttributeLocations::default(),
            vertex_cache: vec![Vertex::default(); vertex_cache_size],
        }
    }

    /// Whether the baseline states have ever been applied for the render target.
    #[inline]
    pub fn is_applied_once(&self) -> bool {
        self.applied_once
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn is_view_changed(&self) -> bool {
        self.view_changed
    }

    #[inline]
    pub fn last_blend_mode(&self) -> BlendMode {
        self.last_blend_mode
    }

    /// The cache identifier of the last bound texture, `0` for none.
    #[inline]
    pub fn last_texture_id(&self) -> u64 {
        self.last_texture_id
    }

    #[inline]
    pub fn last_program(&self) -> Handle {
        self.last_program
    }

    /// Whether the last draw call went through the pre-transformed vertex cache.
    #[inline]
    pub fn uses_vertex_cache(&self) -> bool {
        self.use_vertex_cache
    }

    #[inline]
    pub fn is_tex_coords_enabled(&self) -> bool {
        self.tex_coords_enabled
    }

    #[inline]
    pub fn vertex_cache_size(&self) -> usize {
        self.vertex_cache.len()
    }

    #[inline]
    pub fn attributes(&self) -> AttributeLocations {
        self.attributes
    }

    /// Forgets everything, so the next draw call applies every state again.
    #[inline]
    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }
}
