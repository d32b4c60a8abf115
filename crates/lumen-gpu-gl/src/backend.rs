use std::collections::HashMap;
use std::sync::Arc;

use lumen_gpu::{BindingSet, Shader, ShaderId, ShaderKind, ShaderStage, INVALID_LOCATION};
use tracing::debug;

use crate::bindings::make_program_bindings;
use crate::compile::{compile_shader, link_program, ShaderPreamble};
use crate::config::GlBackendConfig;
use crate::driver::{GlDriver, GlShader};
use crate::object::{
    CompiledProgramObject, CompiledShaderObject, GlShaderObject, GlVersions, UniformMapping,
};
use crate::reflect::reflect_program;
use crate::GlError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlBackendStats {
    /// Syncs answered from the object table.
    pub cache_hits: u64,
    /// Shaders and programs built and inserted into the object table.
    pub builds: u64,
    /// Builds that failed; nothing was cached for them.
    pub build_failures: u64,
    pub cached_objects: usize,
}

/// Owns the driver and every compiled object built through it, keyed by [`ShaderId`].
///
/// Objects are built on first use, reused until [`GlBackend::invalidate`] or
/// [`GlBackend::clear`], and deleted exactly once (at the latest when the backend is dropped).
pub struct GlBackend<D: GlDriver> {
    driver: D,
    config: GlBackendConfig,
    preamble: ShaderPreamble,
    objects: HashMap<ShaderId, GlShaderObject>,

    cache_hits: u64,
    builds: u64,
    build_failures: u64,
}

impl<D: GlDriver> GlBackend<D> {
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, GlBackendConfig::default())
    }

    pub fn with_config(driver: D, config: GlBackendConfig) -> Self {
        Self {
            driver,
            preamble: config.preamble(),
            config,
            objects: HashMap::new(),
            cache_hits: 0,
            builds: 0,
            build_failures: 0,
        }
    }

    pub fn config(&self) -> &GlBackendConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn stats(&self) -> GlBackendStats {
        GlBackendStats {
            cache_hits: self.cache_hits,
            builds: self.builds,
            build_failures: self.build_failures,
            cached_objects: self.objects.len(),
        }
    }

    /// Return the compiled object for `shader`, building it if this is the first request.
    ///
    /// A failed build leaves no trace in the table, so the next call retries from scratch.
    pub fn sync_gpu_object(&mut self, shader: &Shader) -> Result<&GlShaderObject, GlError> {
        let id = shader.id();
        if self.objects.contains_key(&id) {
            self.cache_hits += 1;
            return Ok(&self.objects[&id]);
        }

        let built = match shader.kind() {
            ShaderKind::Stage { stage, source } => {
                self.build_stage(*stage, source).map(GlVersions::Stage)
            }
            ShaderKind::Program { shaders } => {
                self.build_program(shaders).map(GlVersions::Program)
            }
        };

        match built {
            Ok(versions) => {
                self.builds += 1;
                debug!(shader = %id, "built gpu object");
                Ok(self
                    .objects
                    .entry(id)
                    .or_insert(GlShaderObject::new(versions)))
            }
            Err(err) => {
                self.build_failures += 1;
                debug!(shader = %id, %err, "gpu object build failed");
                Err(err)
            }
        }
    }

    fn build_stage(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Vec<CompiledShaderObject>, GlError> {
        let count = self.config.version_count();
        let mut built = Vec::with_capacity(count);

        for version in 0..count {
            let defines = self
                .preamble
                .defines(stage, self.config.version_define(version));
            match compile_shader(
                &mut self.driver,
                stage,
                source,
                &defines,
                self.config.separable_programs,
            ) {
                Ok(object) => built.push(object),
                Err(err) => {
                    for object in built {
                        object.release(&mut self.driver);
                    }
                    return Err(err);
                }
            }
        }

        Ok(built)
    }

    fn build_program(
        &mut self,
        shaders: &[Arc<Shader>],
    ) -> Result<Vec<CompiledProgramObject>, GlError> {
        let count = self.config.version_count();

        // Per sub-shader, its stage handle for each version.
        let mut stage_handles: Vec<Vec<GlShader>> = Vec::with_capacity(shaders.len());
        for (index, sub) in shaders.iter().enumerate() {
            if sub.is_program() {
                return Err(GlError::NestedProgram);
            }
            let object = self
                .sync_gpu_object(sub)
                .map_err(|err| GlError::SubShader {
                    index,
                    source: Box::new(err),
                })?;
            stage_handles.push(
                (0..count)
                    .filter_map(|v| object.stage_version(v).map(|o| o.shader))
                    .collect(),
            );
        }

        let mut built = Vec::with_capacity(count);
        for version in 0..count {
            let stages: Vec<GlShader> = stage_handles
                .iter()
                .filter_map(|handles| handles.get(version).copied())
                .collect();

            match link_program(&mut self.driver, &stages) {
                Ok(program) => {
                    let mut object = CompiledProgramObject::new(program);
                    make_program_bindings(&mut self.driver, &mut object);
                    built.push(object);
                }
                Err(err) => {
                    for object in built {
                        object.release(&mut self.driver);
                    }
                    return Err(err);
                }
            }
        }

        Ok(built)
    }

    /// Sync `shader`, then reflect every version that has a linked program.
    ///
    /// The default version's interface is published on `shader`; every other version gets a
    /// [`UniformMapping`] from the default uniform locations to its own.
    pub fn make_program(&mut self, shader: &mut Shader, bindings: &BindingSet) -> Result<(), GlError> {
        let id = shader.id();
        let programs: Vec<_> = {
            let object = self.sync_gpu_object(shader)?;
            (0..object.version_count())
                .filter_map(|v| object.linked_program(v).map(|p| (v, p)))
                .collect()
        };
        if programs.is_empty() {
            return Err(GlError::NoLinkedProgram);
        }

        let mut mappings = Vec::new();
        for (version, program) in programs {
            let interface = reflect_program(&mut self.driver, program, bindings);
            if version == 0 {
                shader.define_slots(interface);
            } else {
                let mut mapping = UniformMapping::new();
                for uniform in shader.uniforms() {
                    mapping.insert(
                        uniform.location,
                        interface.uniforms.find_location(&uniform.name),
                    );
                }
                mappings.push((version, mapping));
            }
        }

        if let Some(object) = self.objects.get_mut(&id) {
            for (version, mapping) in mappings {
                object.set_uniform_mapping(version, mapping);
            }
        }

        debug!(
            shader = %id,
            uniforms = shader.uniforms().len(),
            buffers = shader.buffers().len(),
            textures = shader.textures().len(),
            inputs = shader.inputs().len(),
            "reflected program"
        );
        Ok(())
    }

    pub fn gpu_object(&self, id: &ShaderId) -> Option<&GlShaderObject> {
        self.objects.get(id)
    }

    pub fn uniform_mapping(&self, id: &ShaderId, version: usize) -> Option<&UniformMapping> {
        self.objects.get(id)?.uniform_mapping(version)
    }

    /// Translate a default-version uniform location into `version`'s numbering.
    pub fn translate_uniform_location(&self, id: &ShaderId, version: usize, location: i32) -> i32 {
        if version == 0 {
            return location;
        }
        self.uniform_mapping(id, version)
            .map_or(INVALID_LOCATION, |m| m.translate(location))
    }

    /// Delete the compiled objects for `id`. Returns whether anything was cached.
    pub fn invalidate(&mut self, id: &ShaderId) -> bool {
        match self.objects.remove(id) {
            Some(object) => {
                object.release(&mut self.driver);
                debug!(shader = %id, "invalidated gpu object");
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        for (_, object) in self.objects.drain() {
            object.release(&mut self.driver);
        }
    }
}

impl<D: GlDriver> Drop for GlBackend<D> {
    fn drop(&mut self) {
        self.clear();
    }
}
