use lumen_gpu::ShaderStage;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GlError {
    #[error("{stage:?} shader has no source code")]
    EmptySource { stage: ShaderStage },

    #[error("driver failed to create a {stage:?} shader object")]
    ShaderAllocation { stage: ShaderStage },

    #[error("driver failed to create a program object")]
    ProgramAllocation,

    #[error("failed to compile {stage:?} shader:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("failed to link program:\n{log}")]
    Link { log: String },

    #[error("cannot link a program without any shader stages")]
    NoStages,

    #[error("program sub-shaders must be stage shaders, not programs")]
    NestedProgram,

    #[error("sub-shader {index} of the program failed to sync")]
    SubShader {
        index: usize,
        #[source]
        source: Box<GlError>,
    },

    #[error("shader object has no linked program for any version")]
    NoLinkedProgram,

    #[error("unsupported by this driver: {0}")]
    Unsupported(&'static str),
}
