use serde::{Deserialize, Serialize};

use crate::math::prelude::{Color, Transform};
use crate::math::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// Uniform variable type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniformVariableType {
    F32,
    Vector2f,
    Vector3f,
    Vector4f,
    I32,
    Vector2i,
    Vector3i,
    Vector4i,
    Matrix3f,
    Matrix4f,
}

/// Uniform variable for graphics program object. Matrices are stored flat in
/// column-major order, the way the graphics API consumes them.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum UniformVariable {
    F32(f32),
    Vector2f([f32; 2]),
    Vector3f([f32; 3]),
    Vector4f([f32; 4]),
    I32(i32),
    Vector2i([i32; 2]),
    Vector3i([i32; 3]),
    Vector4i([i32; 4]),
    Matrix3f([f32; 9]),
    Matrix4f([f32; 16]),
}

impl UniformVariable {
    pub fn variable_type(&self) -> UniformVariableType {
        match *self {
            UniformVariable::F32(_) => UniformVariableType::F32,
            UniformVariable::Vector2f(_) => UniformVariableType::Vector2f,
            UniformVariable::Vector3f(_) => UniformVariableType::Vector3f,
            UniformVariable::Vector4f(_) => UniformVariableType::Vector4f,
            UniformVariable::I32(_) => UniformVariableType::I32,
            UniformVariable::Vector2i(_) => UniformVariableType::Vector2i,
            UniformVariable::Vector3i(_) => UniformVariableType::Vector3i,
            UniformVariable::Vector4i(_) => UniformVariableType::Vector4i,
            UniformVariable::Matrix3f(_) => UniformVariableType::Matrix3f,
            UniformVariable::Matrix4f(_) => UniformVariableType::Matrix4f,
        }
    }
}

impl From<f32> for UniformVariable {
    fn from(v: f32) -> Self {
        UniformVariable::F32(v)
    }
}

impl From<i32> for UniformVariable {
    fn from(v: i32) -> Self {
        UniformVariable::I32(v)
    }
}

impl From<bool> for UniformVariable {
    fn from(v: bool) -> Self {
        UniformVariable::I32(v as i32)
    }
}

impl From<[f32; 2]> for UniformVariable {
    fn from(v: [f32; 2]) -> Self {
        UniformVariable::Vector2f(v)
    }
}

impl From<[f32; 3]> for UniformVariable {
    fn from(v: [f32; 3]) -> Self {
        UniformVariable::Vector3f(v)
    }
}

impl From<[f32; 4]> for UniformVariable {
    fn from(v: [f32; 4]) -> Self {
        UniformVariable::Vector4f(v)
    }
}

impl From<[i32; 2]> for UniformVariable {
    fn from(v: [i32; 2]) -> Self {
        UniformVariable::Vector2i(v)
    }
}

impl From<[i32; 3]> for UniformVariable {
    fn from(v: [i32; 3]) -> Self {
        UniformVariable::Vector3i(v)
    }
}

impl From<[i32; 4]> for UniformVariable {
    fn from(v: [i32; 4]) -> Self {
        UniformVariable::Vector4i(v)
    }
}

impl From<[bool; 2]> for UniformVariable {
    fn from(v: [bool; 2]) -> Self {
        UniformVariable::Vector2i([v[0] as i32, v[1] as i32])
    }
}

impl From<[bool; 3]> for UniformVariable {
    fn from(v: [bool; 3]) -> Self {
        UniformVariable::Vector3i([v[0] as i32, v[1] as i32, v[2] as i32])
    }
}

impl From<[bool; 4]> for UniformVariable {
    fn from(v: [bool; 4]) -> Self {
        UniformVariable::Vector4i([v[0] as i32, v[1] as i32, v[2] as i32, v[3] as i32])
    }
}

impl From<Vector2<f32>> for UniformVariable {
    fn from(v: Vector2<f32>) -> Self {
        UniformVariable::Vector2f(v.into())
    }
}

impl From<Vector3<f32>> for UniformVariable {
    fn from(v: Vector3<f32>) -> Self {
        UniformVariable::Vector3f(v.into())
    }
}

impl From<Vector4<f32>> for UniformVariable {
    fn from(v: Vector4<f32>) -> Self {
        UniformVariable::Vector4f(v.into())
    }
}

impl From<Vector2<i32>> for UniformVariable {
    fn from(v: Vector2<i32>) -> Self {
        UniformVariable::Vector2i(v.into())
    }
}

impl From<Vector3<i32>> for UniformVariable {
    fn from(v: Vector3<i32>) -> Self {
        UniformVariable::Vector3i(v.into())
    }
}

impl From<Vector4<i32>> for UniformVariable {
    fn from(v: Vector4<i32>) -> Self {
        UniformVariable::Vector4i(v.into())
    }
}

impl From<Matrix3<f32>> for UniformVariable {
    fn from(v: Matrix3<f32>) -> Self {
        UniformVariable::Matrix3f(flatten3(&v))
    }
}

impl From<Matrix4<f32>> for UniformVariable {
    fn from(v: Matrix4<f32>) -> Self {
        UniformVariable::Matrix4f(flatten4(&v))
    }
}

/// Colors are uploaded as normalized `vec4`s.
impl From<Color> for UniformVariable {
    fn from(v: Color) -> Self {
        UniformVariable::Vector4f(v.normalized())
    }
}

/// Transforms are uploaded as `mat4`s.
impl From<Transform> for UniformVariable {
    fn from(v: Transform) -> Self {
        UniformVariable::Matrix4f(v.matrix())
    }
}

/// An array of uniform values, uploaded to consecutive locations with one call.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformArray {
    F32(Vec<f32>),
    Vector2f(Vec<[f32; 2]>),
    Vector3f(Vec<[f32; 3]>),
    Vector4f(Vec<[f32; 4]>),
    Matrix3f(Vec<[f32; 9]>),
    Matrix4f(Vec<[f32; 16]>),
}

impl UniformArray {
    /// The number of elements in the array.
    pub fn len(&self) -> usize {
        match *self {
            UniformArray::F32(ref v) => v.len(),
            UniformArray::Vector2f(ref v) => v.len(),
            UniformArray::Vector3f(ref v) => v.len(),
            UniformArray::Vector4f(ref v) => v.len(),
            UniformArray::Matrix3f(ref v) => v.len(),
            UniformArray::Matrix4f(ref v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the elements as one contiguous slice of scalars.
    pub fn flatten(&self) -> Vec<f32> {
        match *self {
            UniformArray::F32(ref v) => v.clone(),
            UniformArray::Vector2f(ref v) => v.iter().flat_map(|e| e.iter().cloned()).collect(),
            UniformArray::Vector3f(ref v) => v.iter().flat_map(|e| e.iter().cloned()).collect(),
            UniformArray::Vector4f(ref v) => v.iter().flat_map(|e| e.iter().cloned()).collect(),
            UniformArray::Matrix3f(ref v) => v.iter().flat_map(|e| e.iter().cloned()).collect(),
            UniformArray::Matrix4f(ref v) => v.iter().flat_map(|e| e.iter().cloned()).collect(),
        }
    }
}

impl<'a> From<&'a [f32]> for UniformArray {
    fn from(v: &'a [f32]) -> Self {
        UniformArray::F32(v.to_vec())
    }
}

impl<'a> From<&'a [Vector2<f32>]> for UniformArray {
    fn from(v: &'a [Vector2<f32>]) -> Self {
        UniformArray::Vector2f(v.iter().map(|&e| e.into()).collect())
    }
}

impl<'a> From<&'a [Vector3<f32>]> for UniformArray {
    fn from(v: &'a [Vector3<f32>]) -> Self {
        UniformArray::Vector3f(v.iter().map(|&e| e.into()).collect())
    }
}

impl<'a> From<&'a [Vector4<f32>]> for UniformArray {
    fn from(v: &'a [Vector4<f32>]) -> Self {
        UniformArray::Vector4f(v.iter().map(|&e| e.into()).collect())
    }
}

impl<'a> From<&'a [Matrix3<f32>]> for UniformArray {
    fn from(v: &'a [Matrix3<f32>]) -> Self {
        UniformArray::Matrix3f(v.iter().map(flatten3).collect())
    }
}

impl<'a> From<&'a [Matrix4<f32>]> for UniformArray {
    fn from(v: &'a [Matrix4<f32>]) -> Self {
        UniformArray::Matrix4f(v.iter().map(flatten4).collect())
    }
}

fn flatten3(m: &Matrix3<f32>) -> [f32; 9] {
    [
        m.x.x, m.x.y, m.x.z, //
        m.y.x, m.y.y, m.y.z, //
        m.z.x, m.z.y, m.z.z,
    ]
}

fn flatten4(m: &Matrix4<f32>) -> [f32; 16] {
    [
        m.x.x, m.x.y, m.x.z, m.x.w, //
        m.y.x, m.y.y, m.y.z, m.y.w, //
        m.z.x, m.z.y, m.z.z, m.z.w, //
        m.w.x, m.w.y, m.w.z, m.w.w,
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::SquareMatrix;

    #[test]
    fn conversions() {
        assert_eq!(UniformVariable::from(true), UniformVariable::I32(1));
        assert_eq!(
            UniformVariable::from([true, false, true]),
            UniformVariable::Vector3i([1, 0, 1])
        );
        assert_eq!(
            UniformVariable::from(Color::white()),
            UniformVariable::Vector4f([1.0, 1.0, 1.0, 1.0])
        );

        let identity = UniformVariable::from(Matrix4::<f32>::identity());
        assert_eq!(identity, UniformVariable::from(Transform::identity()));
        assert_eq!(identity.variable_type(), UniformVariableType::Matrix4f);
    }

    #[test]
    fn arrays() {
        let vectors = [Vector2::new(1.0, 2.0), Vector2::new(3.0, 4.0)];
        let array = UniformArray::from(&vectors[..]);
        assert_eq!(array.len(), 2);
        assert_eq!(array.flatten(), vec![1.0, 2.0, 3.0, 4.0]);

        let matrices = [Matrix3::<f32>::identity()];
        let array = UniformArray::from(&matrices[..]);
        assert_eq!(array.flatten().len(), 9);
        assert!(UniformArray::F32(vec![]).is_empty());
    }
}
