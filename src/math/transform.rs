use std::ops::{Mul, MulAssign};

use cgmath::{Deg, Matrix3, Rad, SquareMatrix, Vector2, Vector3};

/// A 3x3 affine transform for 2D geometry.
///
/// The matrix is built from its rows, `(a00, a01, a02)` being the first one, and
/// points are transformed as column vectors: `p' = M * (x, y, 1)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    m: Matrix3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

impl Transform {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a00: f32,
        a01: f32,
        a02: f32,
        a10: f32,
        a11: f32,
        a12: f32,
        a20: f32,
        a21: f32,
        a22: f32,
    ) -> Self {
        Transform {
            m: Matrix3::new(a00, a10, a20, a01, a11, a21, a02, a12, a22),
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Transform {
            m: Matrix3::identity(),
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.m == Matrix3::identity()
    }

    /// Returns the transform as a column-major 4x4 matrix, ready to be handed to the
    /// graphics API as a model-view, projection or texture matrix.
    pub fn matrix(&self) -> [f32; 16] {
        let m = &self.m;
        [
            m.x.x, m.x.y, 0.0, m.x.z, //
            m.y.x, m.y.y, 0.0, m.y.z, //
            0.0, 0.0, 1.0, 0.0, //
            m.z.x, m.z.y, 0.0, m.z.z,
        ]
    }

    /// Returns the inverse of this transform, or the identity if it is not invertible.
    pub fn inverse(&self) -> Self {
        match self.m.invert() {
            Some(m) => Transform { m },
            None => Transform::identity(),
        }
    }

    #[inline]
    pub fn transform_point<P>(&self, point: P) -> Vector2<f32>
    where
        P: Into<Vector2<f32>>,
    {
        let p = point.into();
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        Vector2::new(v.x, v.y)
    }

    /// Combines `self` with `rhs`, `rhs` being applied first.
    #[inline]
    pub fn combine(&mut self, rhs: &Transform) -> &mut Self {
        self.m = self.m * rhs.m;
        self
    }

    pub fn translate(&mut self, x: f32, y: f32) -> &mut Self {
        let translation = Transform::new(1.0, 0.0, x, 0.0, 1.0, y, 0.0, 0.0, 1.0);
        self.combine(&translation)
    }

    /// Rotates by `angle` degrees.
    pub fn rotate(&mut self, angle: f32) -> &mut Self {
        let rad: Rad<f32> = Deg(angle).into();
        let (sin, cos) = rad.0.sin_cos();
        let rotation = Transform::new(cos, -sin, 0.0, sin, cos, 0.0, 0.0, 0.0, 1.0);
        self.combine(&rotation)
    }

    /// Rotates by `angle` degrees around the point `(cx, cy)`.
    pub fn rotate_around(&mut self, angle: f32, cx: f32, cy: f32) -> &mut Self {
        let rad: Rad<f32> = Deg(angle).into();
        let (sin, cos) = rad.0.sin_cos();
        let rotation = Transform::new(
            cos,
            -sin,
            cx * (1.0 - cos) + cy * sin,
            sin,
            cos,
            cy * (1.0 - cos) - cx * sin,
            0.0,
            0.0,
            1.0,
        );
        self.combine(&rotation)
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        let scaling = Transform::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0);
        self.combine(&scaling)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(mut self, rhs: Transform) -> Transform {
        self.combine(&rhs);
        self
    }
}

impl MulAssign for Transform {
    fn mul_assign(&mut self, rhs: Transform) {
        self.combine(&rhs);
    }
}

impl Mul<Vector2<f32>> for Transform {
    type Output = Vector2<f32>;

    fn mul(self, rhs: Vector2<f32>) -> Vector2<f32> {
        self.transform_point(rhs)
    }
}
