//! [`GlDriver`] over a native [`glow::Context`].

use glow::{HasContext, NativeProgram, NativeShader, NativeUniformLocation};

use crate::driver::{ActiveUniformBlock, ActiveVariable, GlDriver, GlProgram, GlShader};
use crate::GlError;

fn shader(handle: GlShader) -> NativeShader {
    NativeShader(handle.0)
}

fn program(handle: GlProgram) -> NativeProgram {
    NativeProgram(handle.0)
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

/// Upper bound on queued errors drained before a block probe.
const MAX_PENDING_ERRORS: usize = 16;

/// Drives a GL context through `glow`.
///
/// The context must be current on the calling thread for as long as the driver is used.
/// Separable programs need `glProgramParameteri`, which is not exposed here, so
/// [`GlDriver::set_program_separable`] reports [`GlError::Unsupported`].
pub struct GlowDriver {
    gl: glow::Context,
}

impl GlowDriver {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    pub fn into_context(self) -> glow::Context {
        self.gl
    }

    fn clear_errors(&self) {
        for _ in 0..MAX_PENDING_ERRORS {
            if unsafe { self.gl.get_error() } == glow::NO_ERROR {
                break;
            }
        }
    }

    /// Binding of block `index`, or `None` when the program has no such active block.
    ///
    /// `glGetActiveUniformBlockiv` raises `GL_INVALID_VALUE` for an index past
    /// `GL_ACTIVE_UNIFORM_BLOCKS`, which `glow` does not let us query directly.
    fn uniform_block_binding_at(&self, handle: NativeProgram, index: u32) -> Option<u32> {
        self.clear_errors();
        let binding = unsafe {
            self.gl
                .get_active_uniform_block_parameter_i32(handle, index, glow::UNIFORM_BLOCK_BINDING)
        };
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => Some(non_negative(binding)),
            _ => None,
        }
    }
}

impl GlDriver for GlowDriver {
    fn create_shader(&mut self, kind: u32) -> Option<GlShader> {
        let handle = unsafe { self.gl.create_shader(kind) }.ok()?;
        Some(GlShader(handle.0))
    }

    fn shader_source(&mut self, handle: GlShader, fragments: &[&str]) {
        let source = fragments.concat();
        unsafe { self.gl.shader_source(shader(handle), &source) }
    }

    fn compile_shader(&mut self, handle: GlShader) {
        unsafe { self.gl.compile_shader(shader(handle)) }
    }

    fn shader_compile_status(&self, handle: GlShader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader(handle)) }
    }

    fn shader_info_log(&self, handle: GlShader) -> String {
        unsafe { self.gl.get_shader_info_log(shader(handle)) }
    }

    fn delete_shader(&mut self, handle: GlShader) {
        unsafe { self.gl.delete_shader(shader(handle)) }
    }

    fn create_program(&mut self) -> Option<GlProgram> {
        let handle = unsafe { self.gl.create_program() }.ok()?;
        Some(GlProgram(handle.0))
    }

    fn set_program_separable(&mut self, _program: GlProgram) -> Result<(), GlError> {
        Err(GlError::Unsupported("separable programs"))
    }

    fn attach_shader(&mut self, handle: GlProgram, stage: GlShader) {
        unsafe { self.gl.attach_shader(program(handle), shader(stage)) }
    }

    fn link_program(&mut self, handle: GlProgram) {
        unsafe { self.gl.link_program(program(handle)) }
    }

    fn program_link_status(&self, handle: GlProgram) -> bool {
        unsafe { self.gl.get_program_link_status(program(handle)) }
    }

    fn program_info_log(&self, handle: GlProgram) -> String {
        unsafe { self.gl.get_program_info_log(program(handle)) }
    }

    fn delete_program(&mut self, handle: GlProgram) {
        unsafe { self.gl.delete_program(program(handle)) }
    }

    fn attrib_location(&self, handle: GlProgram, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program(handle), name) }
    }

    fn bind_attrib_location(&mut self, handle: GlProgram, location: u32, name: &str) {
        unsafe { self.gl.bind_attrib_location(program(handle), location, name) }
    }

    fn active_attribute_count(&self, handle: GlProgram) -> u32 {
        unsafe { self.gl.get_active_attributes(program(handle)) }
    }

    fn active_attribute(&self, handle: GlProgram, index: u32) -> Option<ActiveVariable> {
        let attribute = unsafe { self.gl.get_active_attribute(program(handle), index) }?;
        Some(ActiveVariable {
            name: attribute.name,
            size: attribute.size,
            gl_type: attribute.atype,
        })
    }

    fn active_uniform_count(&self, handle: GlProgram) -> u32 {
        unsafe { self.gl.get_active_uniforms(program(handle)) }
    }

    fn active_uniform(&self, handle: GlProgram, index: u32) -> Option<ActiveVariable> {
        let uniform = unsafe { self.gl.get_active_uniform(program(handle), index) }?;
        Some(ActiveVariable {
            name: uniform.name,
            size: uniform.size,
            gl_type: uniform.utype,
        })
    }

    fn uniform_location(&self, handle: GlProgram, name: &str) -> Option<u32> {
        let location = unsafe { self.gl.get_uniform_location(program(handle), name) }?;
        Some(location.0)
    }

    fn uniform_i32(&self, handle: GlProgram, location: u32) -> i32 {
        let mut value = [0i32; 1];
        unsafe {
            self.gl.get_uniform_i32(
                program(handle),
                &NativeUniformLocation(location),
                &mut value,
            )
        };
        value[0]
    }

    fn program_uniform_i32(&mut self, handle: GlProgram, location: u32, value: i32) {
        unsafe {
            self.gl.program_uniform_1_i32(
                program(handle),
                Some(&NativeUniformLocation(location)),
                value,
            )
        }
    }

    fn max_uniform_buffer_bindings(&self) -> u32 {
        non_negative(unsafe { self.gl.get_parameter_i32(glow::MAX_UNIFORM_BUFFER_BINDINGS) })
    }

    fn active_uniform_block_count(&self, handle: GlProgram) -> u32 {
        let p = program(handle);
        let limit = non_negative(unsafe {
            self.gl.get_parameter_i32(glow::MAX_COMBINED_UNIFORM_BLOCKS)
        });
        (0..limit)
            .take_while(|&index| self.uniform_block_binding_at(p, index).is_some())
            .count() as u32
    }

    fn active_uniform_block(&self, handle: GlProgram, index: u32) -> Option<ActiveUniformBlock> {
        let p = program(handle);
        let binding = self.uniform_block_binding_at(p, index)?;
        unsafe {
            Some(ActiveUniformBlock {
                name: self.gl.get_active_uniform_block_name(p, index),
                binding,
                data_size: non_negative(self.gl.get_active_uniform_block_parameter_i32(
                    p,
                    index,
                    glow::UNIFORM_BLOCK_DATA_SIZE,
                )),
            })
        }
    }

    fn uniform_block_index(&self, handle: GlProgram, name: &str) -> Option<u32> {
        unsafe { self.gl.get_uniform_block_index(program(handle), name) }
    }

    fn uniform_block_binding(&mut self, handle: GlProgram, block_index: u32, binding: u32) {
        unsafe {
            self.gl
                .uniform_block_binding(program(handle), block_index, binding)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GlowDriver;
    use crate::{gl, GlBackend, GlDriver};

    fn assert_driver<D: GlDriver>() {}

    #[test]
    fn glow_driver_backs_a_gl_backend() {
        assert_driver::<GlowDriver>();
        let _: fn(GlowDriver) -> GlBackend<GlowDriver> = GlBackend::new;
    }

    #[test]
    fn local_enums_match_glow() {
        assert_eq!(gl::VERTEX_SHADER, glow::VERTEX_SHADER);
        assert_eq!(gl::FRAGMENT_SHADER, glow::FRAGMENT_SHADER);
        assert_eq!(gl::GEOMETRY_SHADER, glow::GEOMETRY_SHADER);
        assert_eq!(gl::MAX_UNIFORM_BUFFER_BINDINGS, glow::MAX_UNIFORM_BUFFER_BINDINGS);
        assert_eq!(gl::UNIFORM_BLOCK_BINDING, glow::UNIFORM_BLOCK_BINDING);
        assert_eq!(gl::UNIFORM_BLOCK_DATA_SIZE, glow::UNIFORM_BLOCK_DATA_SIZE);
        assert_eq!(gl::FLOAT_VEC4, glow::FLOAT_VEC4);
        assert_eq!(gl::FLOAT_MAT4, glow::FLOAT_MAT4);
        assert_eq!(gl::SAMPLER_2D, glow::SAMPLER_2D);
        assert_eq!(gl::SAMPLER_CUBE_SHADOW, glow::SAMPLER_CUBE_SHADOW);
        assert_eq!(gl::INT_SAMPLER_2D_ARRAY, glow::INT_SAMPLER_2D_ARRAY);
        assert_eq!(
            gl::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE_ARRAY,
            glow::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE_ARRAY
        );
    }
}
