//! GL backend for the Lumen shader pipeline.
//!
//! [`GlBackend`] turns [`lumen_gpu::Shader`] descriptions into compiled and linked GL objects,
//! caches them per shader, and reflects linked programs into the engine's slot model:
//!
//! - [`compile`]: stage compilation (with the `#version`/stage/version preamble) and linking.
//! - [`bindings`]: fixed attribute slots and reserved transform bindings applied after link.
//! - [`reflect`]: uniform, uniform block, sampler and attribute reflection.
//! - [`type_map`]: GL type enums to [`lumen_gpu::ElementResource`].
//!
//! All GL access goes through the [`GlDriver`] trait. [`headless::HeadlessGl`] implements it
//! without a context; with the `glow` feature, `GlowDriver` implements it over `glow`.

mod backend;
mod config;
mod driver;
mod error;
mod object;

pub mod bindings;
pub mod compile;
pub mod gl;
pub mod headless;
pub mod reflect;
pub mod type_map;

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
mod glow_driver;

pub use backend::{GlBackend, GlBackendStats};
pub use config::{GlBackendConfig, GLSL_VERSION_ENV, SEPARABLE_PROGRAMS_ENV};
pub use driver::{ActiveUniformBlock, ActiveVariable, GlDriver, GlProgram, GlShader};
pub use error::GlError;
pub use object::{
    CompiledProgramObject, CompiledShaderObject, GlShaderObject, GlVersions, UniformMapping,
};

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use glow_driver::GlowDriver;
