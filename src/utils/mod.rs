//! Commonly used utilities.

pub mod finally;

pub mod prelude {
    pub use super::finally::{finally, FinallyGuard};
}
