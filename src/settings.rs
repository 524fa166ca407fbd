//! Functions for loading render settings.

use serde::{Deserialize, Serialize};

use crate::errors::*;

/// A structure containing configuration data of the rendering core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub render: RenderParams,
}

impl Settings {
    /// Parses settings from a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = ::serde_json::from_str(json)?;
        settings.render.validate()?;
        Ok(settings)
    }
}

/// Selects the implementation of the draw pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineKind {
    /// The legacy desktop pipeline with matrix stacks and client-side arrays.
    FixedFunction,
    /// Every draw goes through a program object, emulating the fixed-function
    /// transform, color and texture stages with built-in shaders.
    Programmable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    /// Draws with at most this many vertices are transformed on the CPU into an
    /// internal buffer, so the model-view matrix does not need to change.
    pub vertex_cache_size: usize,
    /// Number of texture units withheld from the texture tables of shaders. Unit 0
    /// always receives the texture of the draw call itself.
    pub reserved_texture_units: usize,
    /// Forces a pipeline instead of picking one from the context capabilities.
    pub pipeline: Option<PipelineKind>,
}

impl Default for RenderParams {
    fn default() -> Self {
        RenderParams {
            vertex_cache_size: 4,
            reserved_texture_units: 1,
            pipeline: None,
        }
    }
}

impl RenderParams {
    pub fn validate(&self) -> Result<()> {
        if self.vertex_cache_size > 4096 {
            return Err(Error::InvalidParameter(format!(
                "vertex_cache_size ({})",
                self.vertex_cache_size
            )));
        }

        if self.reserved_texture_units == 0 {
            return Err(Error::InvalidParameter(
                "reserved_texture_units (unit 0 must stay reserved)".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.render.vertex_cache_size, 4);
        assert_eq!(settings.render.reserved_texture_units, 1);
        assert!(settings.render.pipeline.is_none());
    }

    #[test]
    fn json() {
        let settings =
            Settings::from_json(r#"{ "render": { "vertex_cache_size": 8, "pipeline": "Programmable" } }"#)
                .unwrap();

        assert_eq!(settings.render.vertex_cache_size, 8);
        assert_eq!(settings.render.reserved_texture_units, 1);
        assert_eq!(settings.render.pipeline, Some(PipelineKind::Programmable));

        assert!(Settings::from_json(r#"{ "render": { "reserved_texture_units": 0 } }"#).is_err());
        assert!(Settings::from_json("{ render").is_err());
    }
}
