//! 2D camera that defines what region of the world is shown in a render target.

use crate::math::prelude::{Rect, Transform, Vector2};

/// A view is a rectangle of the world (`center`, `size` and `rotation`) mapped onto
/// a `viewport`, a rectangle of the target expressed as a ratio of its dimensions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct View {
    center: Vector2<f32>,
    size: Vector2<f32>,
    rotation: f32,
    viewport: Rect<f32>,
}

impl Default for View {
    fn default() -> Self {
        View::from_rect(Rect::new(0.0, 0.0, 1000.0, 1000.0))
    }
}

impl View {
    pub fn new<C, S>(center: C, size: S) -> Self
    where
        C: Into<Vector2<f32>>,
        S: Into<Vector2<f32>>,
    {
        View {
            center: center.into(),
            size: size.into(),
            rotation: 0.0,
            viewport: Rect::new(0.0, 0.0, 1.0, 1.0),
        }
    }

    /// Creates a view showing exactly `rect` of the world.
    pub fn from_rect(rect: Rect<f32>) -> Self {
        let mut view = View::new([0.0, 0.0], [0.0, 0.0]);
        view.reset(rect);
        view
    }

    /// Resets the view to `rect`, dropping rotation. The viewport is left untouched.
    pub fn reset(&mut self, rect: Rect<f32>) {
        self.center = Vector2::new(rect.left + rect.width / 2.0, rect.top + rect.height / 2.0);
        self.size = Vector2::new(rect.width, rect.height);
        self.rotation = 0.0;
    }

    #[inline]
    pub fn center(&self) -> Vector2<f32> {
        self.center
    }

    #[inline]
    pub fn set_center<C: Into<Vector2<f32>>>(&mut self, center: C) {
        self.center = center.into();
    }

    #[inline]
    pub fn size(&self) -> Vector2<f32> {
        self.size
    }

    #[inline]
    pub fn set_size<S: Into<Vector2<f32>>>(&mut self, size: S) {
        self.size = size.into();
    }

    /// The rotation in degrees, in the range [0, 360).
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, angle: f32) {
        let mut angle = angle % 360.0;
        if angle < 0.0 {
            angle += 360.0;
        }

        self.rotation = angle;
    }

    #[inline]
    pub fn viewport(&self) -> Rect<f32> {
        self.viewport
    }

    /// Sets the target viewport, in factors of the target size (`[0, 1]`).
    #[inline]
    pub fn set_viewport(&mut self, viewport: Rect<f32>) {
        self.viewport = viewport;
    }

    pub fn move_by<O: Into<Vector2<f32>>>(&mut self, offset: O) {
        self.center += offset.into();
    }

    pub fn rotate(&mut self, angle: f32) {
        let rotation = self.rotation + angle;
        self.set_rotation(rotation);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.size *= factor;
    }

    /// Returns the projection transform, mapping world coordinates into normalized
    /// device coordinates.
    pub fn transform(&self) -> Transform {
        let angle = self.rotation.to_radians();
        let (sine, cosine) = angle.sin_cos();

        let tx = -self.center.x * cosine - self.center.y * sine + self.center.x;
        let ty = self.center.x * sine - self.center.y * cosine + self.center.y;

        let a = 2.0 / self.size.x;
        let b = -2.0 / self.size.y;
        let c = -a * self.center.x;
        let d = -b * self.center.y;

        Transform::new(
            a * cosine,
            a * sine,
            a * tx + c,
            -b * sine,
            b * cosine,
            b * ty + d,
            0.0,
            0.0,
            1.0,
        )
    }

    #[inline]
    pub fn inverse_transform(&self) -> Transform {
        self.transform().inverse()
    }
}
