use cgmath::{BaseNum, Vector2};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, with the top-left corner at `(left, top)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect<T> {
    pub left: T,
    pub top: T,
    pub width: T,
    pub height: T,
}

impl<T: BaseNum> Rect<T> {
    #[inline]
    pub fn new(left: T, top: T, width: T, height: T) -> Self {
        Rect {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn position(&self) -> Vector2<T> {
        Vector2::new(self.left, self.top)
    }

    #[inline]
    pub fn size(&self) -> Vector2<T> {
        Vector2::new(self.width, self.height)
    }

    #[inline]
    pub fn contains<P>(&self, p: P) -> bool
    where
        P: Into<Vector2<T>>,
    {
        let p = p.into();
        p.x >= self.left
            && p.x < self.left + self.width
            && p.y >= self.top
            && p.y < self.top + self.height
    }
}

impl From<Rect<i32>> for Rect<f32> {
    fn from(v: Rect<i32>) -> Self {
        Rect::new(v.left as f32, v.top as f32, v.width as f32, v.height as f32)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn contains() {
        let rect = Rect::new(10, 20, 5, 5);
        assert!(rect.contains([10, 20]));
        assert!(rect.contains([14, 24]));
        assert!(!rect.contains([15, 24]));
        assert!(!rect.contains([9, 20]));
        assert_eq!(rect.size(), Vector2::new(5, 5));
    }
}
