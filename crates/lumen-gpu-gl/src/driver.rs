use std::num::NonZeroU32;

use crate::GlError;

/// Driver shader object name. GL reserves 0 for "no object", so a handle is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlShader(pub NonZeroU32);

/// Driver program object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlProgram(pub NonZeroU32);

/// An active uniform or vertex attribute as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVariable {
    pub name: String,
    /// Array length (1 for non-arrays).
    pub size: i32,
    /// GL type enum, see [`crate::gl`].
    pub gl_type: u32,
}

/// An active uniform block as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniformBlock {
    pub name: String,
    pub binding: u32,
    pub data_size: u32,
}

/// The GL entry points used to build and reflect programs.
///
/// Every method must be called on the thread that owns the GL context. Queries take `&self`;
/// anything that changes driver state takes `&mut self`.
pub trait GlDriver {
    /// `glCreateShader`; `kind` is one of [`crate::gl::VERTEX_SHADER`] and friends.
    fn create_shader(&mut self, kind: u32) -> Option<GlShader>;
    /// `glShaderSource` with one string per fragment, submitted in order.
    fn shader_source(&mut self, shader: GlShader, fragments: &[&str]);
    fn compile_shader(&mut self, shader: GlShader);
    fn shader_compile_status(&self, shader: GlShader) -> bool;
    fn shader_info_log(&self, shader: GlShader) -> String;
    fn delete_shader(&mut self, shader: GlShader);

    fn create_program(&mut self) -> Option<GlProgram>;
    /// `glProgramParameteri(program, GL_PROGRAM_SEPARABLE, GL_TRUE)`.
    fn set_program_separable(&mut self, program: GlProgram) -> Result<(), GlError>;
    fn attach_shader(&mut self, program: GlProgram, shader: GlShader);
    fn link_program(&mut self, program: GlProgram);
    fn program_link_status(&self, program: GlProgram) -> bool;
    fn program_info_log(&self, program: GlProgram) -> String;
    fn delete_program(&mut self, program: GlProgram);

    fn attrib_location(&self, program: GlProgram, name: &str) -> Option<u32>;
    /// Takes effect at the next link.
    fn bind_attrib_location(&mut self, program: GlProgram, location: u32, name: &str);
    fn active_attribute_count(&self, program: GlProgram) -> u32;
    fn active_attribute(&self, program: GlProgram, index: u32) -> Option<ActiveVariable>;

    fn active_uniform_count(&self, program: GlProgram) -> u32;
    fn active_uniform(&self, program: GlProgram, index: u32) -> Option<ActiveVariable>;
    fn uniform_location(&self, program: GlProgram, name: &str) -> Option<u32>;
    /// `glGetUniformiv` for a single-integer uniform (sampler units live here).
    fn uniform_i32(&self, program: GlProgram, location: u32) -> i32;
    /// `glProgramUniform1i`; takes effect immediately.
    fn program_uniform_i32(&mut self, program: GlProgram, location: u32, value: i32);

    /// `GL_MAX_UNIFORM_BUFFER_BINDINGS`.
    fn max_uniform_buffer_bindings(&self) -> u32;
    fn active_uniform_block_count(&self, program: GlProgram) -> u32;
    fn active_uniform_block(&self, program: GlProgram, index: u32) -> Option<ActiveUniformBlock>;
    fn uniform_block_index(&self, program: GlProgram, name: &str) -> Option<u32>;
    /// `glUniformBlockBinding`; takes effect immediately.
    fn uniform_block_binding(&mut self, program: GlProgram, block_index: u32, binding: u32);
}
