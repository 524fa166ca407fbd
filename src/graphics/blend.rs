//! Blending modes, describing how drawn fragments are combined with the pixels
//! already in the target.

use serde::{Deserialize, Serialize};

/// The factor a source or destination component is multiplied with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Specifies how source and destination are combined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Equation {
    /// `Source + Destination`.
    Add,
    /// `Source - Destination`.
    Subtract,
    /// `Destination - Source`.
    ReverseSubtract,
    /// `min(Source, Destination)`.
    Min,
    /// `max(Source, Destination)`.
    Max,
}

/// A complete blending state: separate factors and equations for the color and the
/// alpha channels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendMode {
    pub color_src_factor: BlendFactor,
    pub color_dst_factor: BlendFactor,
    pub color_equation: Equation,
    pub alpha_src_factor: BlendFactor,
    pub alpha_dst_factor: BlendFactor,
    pub alpha_equation: Equation,
}

impl BlendMode {
    /// `dst = src * a + dst * (1 - a)`.
    pub const ALPHA: BlendMode = BlendMode {
        color_src_factor: BlendFactor::SrcAlpha,
        color_dst_factor: BlendFactor::OneMinusSrcAlpha,
        color_equation: Equation::Add,
        alpha_src_factor: BlendFactor::One,
        alpha_dst_factor: BlendFactor::OneMinusSrcAlpha,
        alpha_equation: Equation::Add,
    };

    /// `dst = src * a + dst`.
    pub const ADD: BlendMode = BlendMode {
        color_src_factor: BlendFactor::SrcAlpha,
        color_dst_factor: BlendFactor::One,
        color_equation: Equation::Add,
        alpha_src_factor: BlendFactor::One,
        alpha_dst_factor: BlendFactor::One,
        alpha_equation: Equation::Add,
    };

    /// `dst = src * dst`.
    pub const MULTIPLY: BlendMode = BlendMode::new(BlendFactor::DstColor, BlendFactor::Zero, Equation::Add);

    /// `dst = min(src, dst)`.
    pub const MIN: BlendMode = BlendMode::new(BlendFactor::One, BlendFactor::One, Equation::Min);

    /// `dst = max(src, dst)`.
    pub const MAX: BlendMode = BlendMode::new(BlendFactor::One, BlendFactor::One, Equation::Max);

    /// Overwrites the destination with the source.
    pub const NONE: BlendMode = BlendMode::new(BlendFactor::One, BlendFactor::Zero, Equation::Add);

    /// Creates a blend mode that uses the same factors and equation for color and alpha.
    pub const fn new(src: BlendFactor, dst: BlendFactor, equation: Equation) -> Self {
        BlendMode {
            color_src_factor: src,
            color_dst_factor: dst,
            color_equation: equation,
            alpha_src_factor: src,
            alpha_dst_factor: dst,
            alpha_equation: equation,
        }
    }

    pub const fn separate(
        color: (BlendFactor, BlendFactor, Equation),
        alpha: (BlendFactor, BlendFactor, Equation),
    ) -> Self {
        BlendMode {
            color_src_factor: color.0,
            color_dst_factor: color.1,
            color_equation: color.2,
            alpha_src_factor: alpha.0,
            alpha_dst_factor: alpha.1,
            alpha_equation: alpha.2,
        }
    }

    /// Whether both channels use the additive equation.
    #[inline]
    pub fn is_additive(&self) -> bool {
        self.color_equation == Equation::Add && self.alpha_equation == Equation::Add
    }
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::ALPHA
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(BlendMode::default(), BlendMode::ALPHA);
        assert!(BlendMode::ALPHA.is_additive());
        assert!(!BlendMode::MIN.is_additive());
        assert_eq!(BlendMode::MAX.alpha_equation, Equation::Max);
        assert_eq!(
            BlendMode::NONE,
            BlendMode::separate(
                (BlendFactor::One, BlendFactor::Zero, Equation::Add),
                (BlendFactor::One, BlendFactor::Zero, Equation::Add)
            )
        );
    }
}
