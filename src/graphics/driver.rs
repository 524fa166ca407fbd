use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::*;
use crate::settings::{PipelineKind, RenderParams};

use super::backends::Device;
use super::capabilities::{Capabilities, Extensions, Features, Version};
use super::context::TransientContextLock;

/// The graphics device, plus the capability probes that are answered once and
/// memoized for the lifetime of the process.
///
/// Every probe is guarded by its own lock. The first caller makes some context
/// current, queries the device and stores the answer; concurrent callers block until
/// the answer is there.
pub struct Driver {
    device: Arc<dyn Device>,
    params: RenderParams,
    capabilities: Mutex<Option<Capabilities>>,
    shaders: Mutex<Option<bool>>,
    geometry_shaders: Mutex<Option<bool>>,
    texture_ids: AtomicU64,
}

fn lock<T>(v: &Mutex<T>) -> MutexGuard<T> {
    v.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Driver {
    pub fn new(device: Arc<dyn Device>, params: RenderParams) -> Self {
        Driver {
            device,
            params,
            capabilities: Mutex::new(None),
            shaders: Mutex::new(None),
            geometry_shaders: Mutex::new(None),
            texture_ids: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    #[inline]
    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Probes the capabilities of the context. A failed probe is not memoized, so
    /// the next call tries again.
    pub fn capabilities(&self) -> Result<Capabilities> {
        let mut memo = lock(&self.capabilities);
        if let Some(caps) = *memo {
            return Ok(caps);
        }

        let device = self.device();
        let _lock = TransientContextLock::new(device)?;

        let version = Version::parse(&device.version()?)?;
        let extensions = Extensions::parse(&device.extensions()?);
        let max_units = device.max_combined_texture_units()?;
        let fixed_function = device.fixed_function_available()?;
        let caps = Capabilities::new(version, extensions, max_units, fixed_function);

        info!(
            "Graphics capabilities of {:?}: {:#?}, {} combined texture units.",
            caps.version, caps.features, caps.max_combined_texture_units
        );

        *memo = Some(caps);
        Ok(caps)
    }

    /// The features of the context, or none at all if they can not be probed.
    pub fn features(&self) -> Features {
        match self.capabilities() {
            Ok(caps) => caps.features,
            Err(err) => {
                error!("Failed to probe graphics capabilities. {}", err);
                Features::default()
            }
        }
    }

    /// Checks if the context supports program objects with vertex and fragment stages.
    pub fn shaders_available(&self) -> bool {
        let mut memo = lock(&self.shaders);
        if let Some(v) = *memo {
            return v;
        }

        let features = self.features();
        let available = features.multitexture && features.shader_objects;
        *memo = Some(available);
        available
    }

    /// Checks if the context supports geometry shaders, which requires the base shader
    /// support.
    pub fn geometry_shaders_available(&self) -> bool {
        let mut memo = lock(&self.geometry_shaders);
        if let Some(v) = *memo {
            return v;
        }

        let available = self.shaders_available() && self.features().geometry_shader;
        *memo = Some(available);
        available
    }

    #[inline]
    pub fn vertex_buffers_available(&self) -> bool {
        self.features().vertex_buffer_object
    }

    /// The maximum number of texture units usable by a program, or zero if unknown.
    pub fn max_texture_units(&self) -> usize {
        self.capabilities()
            .map(|v| v.max_combined_texture_units as usize)
            .unwrap_or(0)
    }

    /// The pipeline draw calls go through: the configured one, otherwise the one that
    /// fits the API flavour of the context.
    pub fn pipeline_kind(&self) -> PipelineKind {
        if let Some(kind) = self.params.pipeline {
            return kind;
        }

        match self.capabilities() {
            Ok(caps) => caps.pipeline(),
            Err(err) => {
                error!("Failed to probe graphics capabilities. {}", err);
                PipelineKind::FixedFunction
            }
        }
    }

    /// Mints the identifier of a texture content. Identifiers are never reused, unlike
    /// the handles of the graphics API.
    #[inline]
    pub fn next_texture_cache_id(&self) -> u64 {
        self.texture_ids.fetch_add(1, Ordering::SeqCst)
    }
}
