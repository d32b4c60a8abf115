use std::collections::HashMap;

use lumen_gpu::INVALID_LOCATION;

use crate::driver::{GlDriver, GlProgram, GlShader};

/// One compiled version of a stage shader.
///
/// Owns its handles; only the backend that built it deletes them.
#[derive(Debug, PartialEq, Eq)]
pub struct CompiledShaderObject {
    pub shader: GlShader,
    /// Present when the stage was built as a separable program.
    pub program: Option<GlProgram>,
}

impl CompiledShaderObject {
    pub(crate) fn release<D: GlDriver + ?Sized>(self, driver: &mut D) {
        if let Some(program) = self.program {
            driver.delete_program(program);
        }
        driver.delete_shader(self.shader);
    }
}

/// One linked version of a program.
#[derive(Debug, PartialEq, Eq)]
pub struct CompiledProgramObject {
    pub program: GlProgram,
    /// Uniform buffer binding assigned to `transformCameraBuffer`, if the program has that block.
    pub transform_camera_slot: Option<u32>,
    /// Texture unit assigned to `transformObjectBuffer`, if the program has that uniform.
    pub transform_object_slot: Option<u32>,
}

impl CompiledProgramObject {
    pub fn new(program: GlProgram) -> Self {
        Self {
            program,
            transform_camera_slot: None,
            transform_object_slot: None,
        }
    }

    pub(crate) fn release<D: GlDriver + ?Sized>(self, driver: &mut D) {
        driver.delete_program(self.program);
    }
}

/// Uniform location remap from the default version to an alternate version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformMapping {
    locations: HashMap<i32, i32>,
}

impl UniformMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, default_location: i32, location: i32) {
        self.locations.insert(default_location, location);
    }

    /// Location in this version of the uniform at `default_location` in version 0.
    ///
    /// [`INVALID_LOCATION`] when the uniform does not exist in this version.
    pub fn translate(&self, default_location: i32) -> i32 {
        self.locations
            .get(&default_location)
            .copied()
            .unwrap_or(INVALID_LOCATION)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.locations.iter().map(|(&from, &to)| (from, to))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum GlVersions {
    Stage(Vec<CompiledShaderObject>),
    Program(Vec<CompiledProgramObject>),
}

/// The cached GPU counterpart of a [`lumen_gpu::Shader`]: one compiled object per version and,
/// once reflected, a uniform remap for every alternate version.
#[derive(Debug, PartialEq, Eq)]
pub struct GlShaderObject {
    versions: GlVersions,
    uniform_mappings: HashMap<usize, UniformMapping>,
}

impl GlShaderObject {
    pub fn new(versions: GlVersions) -> Self {
        Self {
            versions,
            uniform_mappings: HashMap::new(),
        }
    }

    pub fn versions(&self) -> &GlVersions {
        &self.versions
    }

    pub fn version_count(&self) -> usize {
        match &self.versions {
            GlVersions::Stage(v) => v.len(),
            GlVersions::Program(v) => v.len(),
        }
    }

    pub fn stage_version(&self, version: usize) -> Option<&CompiledShaderObject> {
        match &self.versions {
            GlVersions::Stage(v) => v.get(version),
            GlVersions::Program(_) => None,
        }
    }

    pub fn program_version(&self, version: usize) -> Option<&CompiledProgramObject> {
        match &self.versions {
            GlVersions::Program(v) => v.get(version),
            GlVersions::Stage(_) => None,
        }
    }

    /// The linked program for `version`: the program itself, or a separable stage's program.
    pub fn linked_program(&self, version: usize) -> Option<GlProgram> {
        match &self.versions {
            GlVersions::Stage(v) => v.get(version).and_then(|o| o.program),
            GlVersions::Program(v) => v.get(version).map(|o| o.program),
        }
    }

    pub fn uniform_mapping(&self, version: usize) -> Option<&UniformMapping> {
        self.uniform_mappings.get(&version)
    }

    pub(crate) fn set_uniform_mapping(&mut self, version: usize, mapping: UniformMapping) {
        self.uniform_mappings.insert(version, mapping);
    }

    pub(crate) fn release<D: GlDriver + ?Sized>(self, driver: &mut D) {
        match self.versions {
            GlVersions::Stage(v) => v.into_iter().for_each(|o| o.release(driver)),
            GlVersions::Program(v) => v.into_iter().for_each(|o| o.release(driver)),
        }
    }
}
