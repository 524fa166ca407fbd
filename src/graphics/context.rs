//! Bookkeeping of which render target was last active in which hardware context.
//!
//! Render targets may share a context, and a context may be made current behind our
//! back by the windowing layer. The tracker maps every context to the identifier of
//! the render target that last used it, so a target can tell whether the pipeline
//! state it cached is still the one of the context current on the calling thread.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::*;

use super::backends::{ContextId, Device};

/// What the activation of a render target means for its state cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The context was not used by any render target yet. Nothing has ever been
    /// applied to it on behalf of the target.
    Fresh,
    /// Another render target was active in the context, the cached states are stale.
    Switched,
    /// The target already was the active one.
    Unchanged,
    /// The target was deactivated.
    Released,
}

impl Activation {
    /// Whether the cached states can still be trusted.
    #[inline]
    pub fn is_cache_valid(self) -> bool {
        self == Activation::Unchanged
    }
}

struct TrackerState {
    next_id: u64,
    active: HashMap<ContextId, u64>,
}

/// The process-wide registry of active render targets, and the generator of their
/// identifiers. A single lock guards both, and no API call is ever made under it.
pub struct ContextTracker {
    state: Mutex<TrackerState>,
}

impl Default for ContextTracker {
    fn default() -> Self {
        ContextTracker::new()
    }
}

impl ContextTracker {
    pub fn new() -> Self {
        ContextTracker {
            state: Mutex::new(TrackerState {
                next_id: 1,
                active: HashMap::new(),
            }),
        }
    }

    /// Returns a fresh identifier. `0` stands for "no render target" and is never
    /// returned.
    pub fn get_unique_id(&self) -> u64 {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        id
    }

    /// Checks if the render target `id` is the active one in `context`.
    pub fn is_active(&self, id: u64, context: ContextId) -> bool {
        self.lock().active.get(&context) == Some(&id)
    }

    /// Marks the render target `id` as active, or no longer active, in `context`.
    pub fn set_active(&self, id: u64, active: bool, context: ContextId) -> Activation {
        let mut state = self.lock();

        if !active {
            state.active.remove(&context);
            return Activation::Released;
        }

        match state.active.insert(context, id) {
            None => Activation::Fresh,
            Some(v) if v != id => Activation::Switched,
            Some(_) => Activation::Unchanged,
        }
    }

    /// Removes every row that refers to `id`.
    pub fn forget(&self, id: u64) {
        self.lock().active.retain(|_, v| *v != id);
    }

    /// The number of contexts with an active render target.
    pub fn len(&self) -> usize {
        self.lock().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Makes sure that some context is current on the calling thread for as long as
/// the guard lives.
pub struct TransientContextLock<'a> {
    device: &'a dyn Device,
}

impl<'a> TransientContextLock<'a> {
    pub fn new(device: &'a dyn Device) -> Result<Self> {
        device.acquire_transient_context()?;
        Ok(TransientContextLock { device })
    }
}

impl<'a> Drop for TransientContextLock<'a> {
    fn drop(&mut self) {
        if let Err(err) = self.device.release_transient_context() {
            error!("Failed to release transient context. {}", err);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphics::backends::headless::HeadlessDevice;

    #[test]
    fn unique_ids() {
        let tracker = ContextTracker::new();
        assert_eq!(tracker.get_unique_id(), 1);
        assert_eq!(tracker.get_unique_id(), 2);
        assert_eq!(tracker.get_unique_id(), 3);
    }

    #[test]
    fn activation() {
        let tracker = ContextTracker::new();
        let (a, b) = (tracker.get_unique_id(), tracker.get_unique_id());

        assert!(!tracker.is_active(a, 7));
        assert_eq!(tracker.set_active(a, true, 7), Activation::Fresh);
        assert!(tracker.is_active(a, 7));
        assert_eq!(tracker.set_active(a, true, 7), Activation::Unchanged);

        assert_eq!(tracker.set_active(b, true, 7), Activation::Switched);
        assert!(!tracker.is_active(a, 7));
        assert!(tracker.is_active(b, 7));

        assert_eq!(tracker.set_active(a, true, 8), Activation::Fresh);
        assert_eq!(tracker.len(), 2);

        assert_eq!(tracker.set_active(b, false, 7), Activation::Released);
        assert!(!tracker.is_active(b, 7));
        assert_eq!(tracker.len(), 1);

        tracker.forget(a);
        assert!(tracker.is_empty());
    }

    #[test]
    fn transient_lock() {
        let device = HeadlessDevice::new();
        {
            let _v = TransientContextLock::new(&device).unwrap();
            assert_eq!(device.transient_depth(), 1);
            let _w = TransientContextLock::new(&device).unwrap();
            assert_eq!(device.transient_depth(), 2);
        }

        assert_eq!(device.transient_depth(), 0);
    }
}
