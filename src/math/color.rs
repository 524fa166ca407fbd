use serde::{Deserialize, Serialize};

/// A RGBA `Color` with 8-bit components, stored in the same layout the graphics API
/// expects for per-vertex colors.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Color::black()
    }
}

impl Into<u32> for Color {
    fn into(self) -> u32 {
        (u32::from(self.r) << 24) | (u32::from(self.g) << 16) | (u32::from(self.b) << 8)
            | u32::from(self.a)
    }
}

impl From<u32> for Color {
    fn from(encoded: u32) -> Self {
        Color::new(
            ((encoded >> 24) & 0xFF) as u8,
            ((encoded >> 16) & 0xFF) as u8,
            ((encoded >> 8) & 0xFF) as u8,
            (encoded & 0xFF) as u8,
        )
    }
}

impl Into<[u8; 4]> for Color {
    fn into(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color {
    fn from(v: [u8; 4]) -> Self {
        Color::new(v[0], v[1], v[2], v[3])
    }
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    /// Creates `Color` from a u32 encoded `ARGB`.
    pub fn from_argb_u32(encoded: u32) -> Self {
        Color::new(
            ((encoded >> 16) & 0xFF) as u8,
            ((encoded >> 8) & 0xFF) as u8,
            (encoded & 0xFF) as u8,
            ((encoded >> 24) & 0xFF) as u8,
        )
    }

    /// Returns the components mapped into the [0.0, 1.0] range.
    pub fn normalized(&self) -> [f32; 4] {
        let max = 255.0;
        [
            f32::from(self.r) / max,
            f32::from(self.g) / max,
            f32::from(self.b) / max,
            f32::from(self.a) / max,
        ]
    }

    /// Returns the `grayscale` representation of RGB values.
    pub fn grayscale(&self) -> f32 {
        let v = self.normalized();
        v[0] * 0.299 + v[1] * 0.587 + v[2] * 0.114
    }
}

impl Color {
    pub const fn white() -> Self {
        Color::rgb(255, 255, 255)
    }

    pub const fn black() -> Self {
        Color::rgb(0, 0, 0)
    }

    pub const fn red() -> Self {
        Color::rgb(255, 0, 0)
    }

    pub const fn green() -> Self {
        Color::rgb(0, 255, 0)
    }

    pub const fn blue() -> Self {
        Color::rgb(0, 0, 255)
    }

    pub const fn yellow() -> Self {
        Color::rgb(255, 255, 0)
    }

    pub const fn magenta() -> Self {
        Color::rgb(255, 0, 255)
    }

    pub const fn cyan() -> Self {
        Color::rgb(0, 255, 255)
    }

    pub const fn transparent() -> Self {
        Color::new(0, 0, 0, 0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encoding() {
        let color = Color::new(0x11, 0x22, 0x33, 0x44);
        let encoded: u32 = color.into();
        assert_eq!(encoded, 0x1122_3344);
        assert_eq!(Color::from(encoded), color);
        assert_eq!(Color::from_argb_u32(0x4411_2233), color);
    }

    #[test]
    fn normalized() {
        assert_eq!(Color::white().normalized(), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(Color::transparent().normalized(), [0.0, 0.0, 0.0, 0.0]);
        assert!((Color::white().grayscale() - 1.0).abs() < 1e-5);
    }
}
