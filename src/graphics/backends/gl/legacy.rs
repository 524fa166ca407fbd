//! Entry points and constants of the fixed-function pipeline. The `gl` bindings
//! only cover the core profile, so these are resolved by hand. Calling one that the
//! implementation does not expose (core profiles, OpenGL ES 2+) fails with
//! `Error::Requirement`.

use std::mem;
use std::os::raw::c_void;

use ::gl::types::*;

use crate::errors::*;

pub const MODELVIEW: GLenum = 0x1700;
pub const PROJECTION: GLenum = 0x1701;
pub const TEXTURE: GLenum = 0x1702;

pub const VERTEX_ARRAY: GLenum = 0x8074;
pub const COLOR_ARRAY: GLenum = 0x8076;
pub const TEXTURE_COORD_ARRAY: GLenum = 0x8078;

pub const ALPHA_TEST: GLenum = 0x0BC0;
pub const LIGHTING: GLenum = 0x0B50;
pub const QUADS: GLenum = 0x0007;

pub const ALL_ATTRIB_BITS: GLbitfield = 0x000F_FFFF;
pub const CLIENT_ALL_ATTRIB_BITS: GLbitfield = 0xFFFF_FFFF;

type EnumFn = unsafe extern "system" fn(GLenum);
type VoidFn = unsafe extern "system" fn();
type MatrixFn = unsafe extern "system" fn(*const GLfloat);
type BitfieldFn = unsafe extern "system" fn(GLbitfield);
type PointerFn = unsafe extern "system" fn(GLint, GLenum, GLsizei, *const c_void);

pub struct Legacy {
    matrix_mode: Option<EnumFn>,
    load_matrix: Option<MatrixFn>,
    load_identity: Option<VoidFn>,
    push_matrix: Option<VoidFn>,
    pop_matrix: Option<VoidFn>,
    push_attrib: Option<BitfieldFn>,
    pop_attrib: Option<VoidFn>,
    push_client_attrib: Option<BitfieldFn>,
    pop_client_attrib: Option<VoidFn>,
    enable_client_state: Option<EnumFn>,
    disable_client_state: Option<EnumFn>,
    client_active_texture: Option<EnumFn>,
    vertex_pointer: Option<PointerFn>,
    color_pointer: Option<PointerFn>,
    tex_coord_pointer: Option<PointerFn>,
}

macro_rules! resolve {
    ($loader:expr, $name:expr) => {{
        let ptr = $loader($name);
        if ptr.is_null() {
            None
        } else {
            Some(mem::transmute(ptr))
        }
    }};
}

impl Legacy {
    /// Resolves the fixed-function entry points with the same loader the `gl`
    /// bindings were loaded with.
    pub unsafe fn load<F>(mut loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        Legacy {
            matrix_mode: resolve!(loader, "glMatrixMode"),
            load_matrix: resolve!(loader, "glLoadMatrixf"),
            load_identity: resolve!(loader, "glLoadIdentity"),
            push_matrix: resolve!(loader, "glPushMatrix"),
            pop_matrix: resolve!(loader, "glPopMatrix"),
            push_attrib: resolve!(loader, "glPushAttrib"),
            pop_attrib: resolve!(loader, "glPopAttrib"),
            push_client_attrib: resolve!(loader, "glPushClientAttrib"),
            pop_client_attrib: resolve!(loader, "glPopClientAttrib"),
            enable_client_state: resolve!(loader, "glEnableClientState"),
            disable_client_state: resolve!(loader, "glDisableClientState"),
            client_active_texture: resolve!(loader, "glClientActiveTexture"),
            vertex_pointer: resolve!(loader, "glVertexPointer"),
            color_pointer: resolve!(loader, "glColorPointer"),
            tex_coord_pointer: resolve!(loader, "glTexCoordPointer"),
        }
    }

    /// Whether the whole fixed-function surface used by the render targets exists.
    pub fn is_available(&self) -> bool {
        self.matrix_mode.is_some()
            && self.load_matrix.is_some()
            && self.load_identity.is_some()
            && self.enable_client_state.is_some()
            && self.disable_client_state.is_some()
            && self.vertex_pointer.is_some()
            && self.color_pointer.is_some()
            && self.tex_coord_pointer.is_some()
    }

    pub unsafe fn load_matrix(&self, mode: GLenum, matrix: Option<&[f32; 16]>) -> Result<()> {
        let select = require(self.matrix_mode, "glMatrixMode")?;
        select(mode);

        match matrix {
            Some(m) => require(self.load_matrix, "glLoadMatrixf")?(m.as_ptr()),
            None => require(self.load_identity, "glLoadIdentity")?(),
        }

        if mode != MODELVIEW {
            select(MODELVIEW);
        }

        Ok(())
    }

    /// Saves the matrices, plus the attributes on implementations with attribute
    /// stacks (OpenGL ES 1.x has none).
    pub unsafe fn push(&self) -> Result<()> {
        let select = require(self.matrix_mode, "glMatrixMode")?;
        let push = require(self.push_matrix, "glPushMatrix")?;

        if let Some(f) = self.push_client_attrib {
            f(CLIENT_ALL_ATTRIB_BITS);
        }

        if let Some(f) = self.push_attrib {
            f(ALL_ATTRIB_BITS);
        }

        for &mode in &[MODELVIEW, PROJECTION, TEXTURE] {
            select(mode);
            push();
        }

        select(MODELVIEW);
        Ok(())
    }

    pub unsafe fn pop(&self) -> Result<()> {
        let select = require(self.matrix_mode, "glMatrixMode")?;
        let pop = require(self.pop_matrix, "glPopMatrix")?;

        for &mode in &[PROJECTION, TEXTURE, MODELVIEW] {
            select(mode);
            pop();
        }

        if let Some(f) = self.pop_client_attrib {
            f();
        }

        if let Some(f) = self.pop_attrib {
            f();
        }

        Ok(())
    }

    pub unsafe fn set_client_state(&self, array: GLenum, enabled: bool) -> Result<()> {
        let f = if enabled {
            require(self.enable_client_state, "glEnableClientState")?
        } else {
            require(self.disable_client_state, "glDisableClientState")?
        };

        f(array);
        Ok(())
    }

    pub unsafe fn client_active_texture(&self, unit: GLenum) -> Result<()> {
        require(self.client_active_texture, "glClientActiveTexture")?(unit);
        Ok(())
    }

    pub unsafe fn vertex_pointer(
        &self,
        size: GLint,
        tp: GLenum,
        stride: GLsizei,
        ptr: *const c_void,
    ) -> Result<()> {
        require(self.vertex_pointer, "glVertexPointer")?(size, tp, stride, ptr);
        Ok(())
    }

    pub unsafe fn color_pointer(
        &self,
        size: GLint,
        tp: GLenum,
        stride: GLsizei,
        ptr: *const c_void,
    ) -> Result<()> {
        require(self.color_pointer, "glColorPointer")?(size, tp, stride, ptr);
        Ok(())
    }

    pub unsafe fn tex_coord_pointer(
        &self,
        size: GLint,
        tp: GLenum,
        stride: GLsizei,
        ptr: *const c_void,
    ) -> Result<()> {
        require(self.tex_coord_pointer, "glTexCoordPointer")?(size, tp, stride, ptr);
        Ok(())
    }
}

fn require<F>(f: Option<F>, name: &str) -> Result<F> {
    f.ok_or_else(|| Error::Requirement(format!("fixed-function entry point {}", name)))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::ptr;

    #[test]
    fn missing_entry_points() {
        let legacy = unsafe { Legacy::load(|_| ptr::null()) };
        assert!(!legacy.is_available());

        unsafe {
            match legacy.load_matrix(MODELVIEW, None) {
                Err(Error::Requirement(_)) => {}
                other => panic!("unexpected result {:?}", other),
            }

            assert!(legacy.set_client_state(VERTEX_ARRAY, true).is_err());
            assert!(legacy.client_active_texture(0).is_err());
            assert!(legacy.vertex_pointer(2, 0, 0, ptr::null()).is_err());
            assert!(legacy.push().is_err());
            assert!(legacy.pop().is_err());
        }
    }
}
