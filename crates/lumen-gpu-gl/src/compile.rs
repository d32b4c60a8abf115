//! Stage compilation and program linking.
//!
//! Every driver object created here is owned by a [`PendingObjects`] guard until the build
//! succeeds, so each early return deletes whatever was allocated so far.

use lumen_gpu::ShaderStage;
use tracing::{debug, warn};

use crate::driver::{GlDriver, GlProgram, GlShader};
use crate::gl;
use crate::object::CompiledShaderObject;
use crate::GlError;

pub const DEFAULT_GLSL_VERSION: &str = "#version 410 core";

/// GL shader kind for a pipeline stage.
pub fn gl_shader_kind(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Pixel => gl::FRAGMENT_SHADER,
        ShaderStage::Geometry => gl::GEOMETRY_SHADER,
    }
}

/// Preprocessor define that lets shared source tell which stage it is compiled for.
pub fn stage_define(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "#define GPU_VERTEX_SHADER",
        ShaderStage::Pixel => "#define GPU_PIXEL_SHADER",
        ShaderStage::Geometry => "#define GPU_GEOMETRY_SHADER",
    }
}

/// Builds the text submitted ahead of a stage's source: the `#version` line, the stage define
/// and the per-version define, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPreamble {
    glsl_version: String,
}

impl ShaderPreamble {
    pub fn new(glsl_version: impl Into<String>) -> Self {
        Self {
            glsl_version: glsl_version.into(),
        }
    }

    pub fn glsl_version(&self) -> &str {
        &self.glsl_version
    }

    pub fn defines(&self, stage: ShaderStage, version_define: &str) -> String {
        format!(
            "{}\n{}\n{}\n",
            self.glsl_version,
            stage_define(stage),
            version_define
        )
    }
}

impl Default for ShaderPreamble {
    fn default() -> Self {
        Self::new(DEFAULT_GLSL_VERSION)
    }
}

/// Driver objects that are deleted on drop unless [`PendingObjects::finish`] claims them.
struct PendingObjects<'a, D: GlDriver + ?Sized> {
    driver: &'a mut D,
    shader: Option<GlShader>,
    program: Option<GlProgram>,
}

impl<'a, D: GlDriver + ?Sized> PendingObjects<'a, D> {
    fn new(driver: &'a mut D) -> Self {
        Self {
            driver,
            shader: None,
            program: None,
        }
    }

    fn finish(mut self) -> (Option<GlShader>, Option<GlProgram>) {
        (self.shader.take(), self.program.take())
    }
}

impl<D: GlDriver + ?Sized> Drop for PendingObjects<'_, D> {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            self.driver.delete_program(program);
        }
        if let Some(shader) = self.shader.take() {
            self.driver.delete_shader(shader);
        }
    }
}

/// Compile one stage.
///
/// `defines` is submitted as a separate source string ahead of `source`. With `separable` the
/// shader is also linked on its own into a separable program.
pub fn compile_shader<D: GlDriver + ?Sized>(
    driver: &mut D,
    stage: ShaderStage,
    source: &str,
    defines: &str,
    separable: bool,
) -> Result<CompiledShaderObject, GlError> {
    if source.is_empty() {
        warn!(?stage, "empty shader source");
        return Err(GlError::EmptySource { stage });
    }

    let mut pending = PendingObjects::new(driver);

    let Some(shader) = pending.driver.create_shader(gl_shader_kind(stage)) else {
        warn!(?stage, "driver refused to create a shader object");
        return Err(GlError::ShaderAllocation { stage });
    };
    pending.shader = Some(shader);

    pending.driver.shader_source(shader, &[defines, source]);
    pending.driver.compile_shader(shader);

    if !pending.driver.shader_compile_status(shader) {
        let log = pending.driver.shader_info_log(shader);
        warn!(?stage, %log, defines, source, "shader compilation failed");
        return Err(GlError::Compile { stage, log });
    }

    if separable {
        let Some(program) = pending.driver.create_program() else {
            warn!(?stage, "driver refused to create a separable program object");
            return Err(GlError::ProgramAllocation);
        };
        pending.program = Some(program);

        if let Err(err) = pending.driver.set_program_separable(program) {
            warn!(?stage, %err, "cannot make program separable");
            return Err(err);
        }
        pending.driver.attach_shader(program, shader);
        pending.driver.link_program(program);

        if !pending.driver.program_link_status(program) {
            let log = pending.driver.program_info_log(program);
            warn!(?stage, %log, "separable program link failed");
            return Err(GlError::Link { log });
        }
    }

    let (shader, program) = pending.finish();
    let shader = shader.ok_or(GlError::ShaderAllocation { stage })?;
    debug!(?stage, ?shader, ?program, "compiled shader");
    Ok(CompiledShaderObject { shader, program })
}

/// Link already-compiled stages into a new program.
///
/// The shaders stay owned by the caller; only the program is deleted on failure.
pub fn link_program<D: GlDriver + ?Sized>(
    driver: &mut D,
    shaders: &[GlShader],
) -> Result<GlProgram, GlError> {
    if shaders.is_empty() {
        warn!("no stages to link");
        return Err(GlError::NoStages);
    }

    let mut pending = PendingObjects::new(driver);
    let Some(program) = pending.driver.create_program() else {
        warn!(stages = shaders.len(), "driver refused to create a program object");
        return Err(GlError::ProgramAllocation);
    };
    pending.program = Some(program);

    for &shader in shaders {
        pending.driver.attach_shader(program, shader);
    }
    pending.driver.link_program(program);

    if !pending.driver.program_link_status(program) {
        let log = pending.driver.program_info_log(program);
        warn!(?shaders, %log, "program link failed");
        return Err(GlError::Link { log });
    }

    pending.finish();
    debug!(?program, stages = shaders.len(), "linked program");
    Ok(program)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::headless::HeadlessGl;
    use tracing_subscriber::fmt::MakeWriter;

    const VS: &str = "in vec4 inPosition;\nvoid main() {}\n";
    const FS: &str = "uniform vec4 color;\nvoid main() {}\n";

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` with a subscriber that records formatted events, returning them as text.
    fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        (out, logs)
    }

    #[test]
    fn preamble_orders_version_stage_then_variant() {
        let preamble = ShaderPreamble::default();
        assert_eq!(
            preamble.defines(ShaderStage::Vertex, ""),
            "#version 410 core\n#define GPU_VERTEX_SHADER\n\n"
        );
        assert_eq!(
            ShaderPreamble::new("#version 450 core").defines(ShaderStage::Pixel, "#define STEREO"),
            "#version 450 core\n#define GPU_PIXEL_SHADER\n#define STEREO\n"
        );
        assert!(preamble
            .defines(ShaderStage::Geometry, "")
            .contains("#define GPU_GEOMETRY_SHADER"));
    }

    #[test]
    fn empty_source_makes_no_driver_calls() {
        let mut gl = HeadlessGl::new();
        let (result, logs) =
            with_logs(|| compile_shader(&mut gl, ShaderStage::Vertex, "", "", false));
        let err = result.unwrap_err();
        assert!(logs.contains("WARN") && logs.contains("empty shader source"), "{logs}");
        assert_eq!(
            err,
            GlError::EmptySource {
                stage: ShaderStage::Vertex
            }
        );
        assert_eq!(gl.shaders_created(), 0);
        assert_eq!(gl.compile_calls(), 0);
    }

    #[test]
    fn defines_are_submitted_before_source() {
        let mut gl = HeadlessGl::new();
        let defines = ShaderPreamble::default().defines(ShaderStage::Pixel, "");
        let compiled = compile_shader(&mut gl, ShaderStage::Pixel, FS, &defines, false).unwrap();
        assert_eq!(
            gl.shader_fragments(compiled.shader),
            Some(vec![defines.clone(), FS.to_owned()])
        );
        assert!(compiled.program.is_none());
        assert_eq!(gl.live_shaders(), 1);
    }

    #[test]
    fn compile_failure_deletes_the_shader_and_carries_the_log() {
        let mut gl = HeadlessGl::new();
        let src = "#error broken lighting\nvoid main() {}\n";
        let err = compile_shader(&mut gl, ShaderStage::Pixel, src, "", false).unwrap_err();
        match err {
            GlError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Pixel);
                assert!(log.contains("broken lighting"), "{log}");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn allocation_failure_is_reported() {
        let mut gl = HeadlessGl::new();
        gl.fail_allocations(true);
        let (result, logs) =
            with_logs(|| compile_shader(&mut gl, ShaderStage::Vertex, VS, "", false));
        assert_eq!(
            result.unwrap_err(),
            GlError::ShaderAllocation {
                stage: ShaderStage::Vertex
            }
        );
        assert!(logs.contains("refused to create a shader object"), "{logs}");

        let (result, logs) = with_logs(|| link_program(&mut gl, &[]));
        assert_eq!(result, Err(GlError::NoStages));
        assert!(logs.contains("no stages to link"), "{logs}");
    }

    #[test]
    fn program_allocation_failure_is_logged() {
        let mut gl = HeadlessGl::new();
        let vs = compile_shader(&mut gl, ShaderStage::Vertex, VS, "", false).unwrap();
        gl.fail_allocations(true);

        let (result, logs) = with_logs(|| link_program(&mut gl, &[vs.shader]));
        assert_eq!(result, Err(GlError::ProgramAllocation));
        assert!(logs.contains("refused to create a program object"), "{logs}");
        assert_eq!(gl.live_programs(), 0);
    }

    #[test]
    fn separable_stage_gets_its_own_program() {
        let mut gl = HeadlessGl::new();
        let compiled = compile_shader(&mut gl, ShaderStage::Vertex, VS, "", true).unwrap();
        let program = compiled.program.expect("separable program");
        assert!(gl.is_separable(program));
        assert!(gl.program_link_status(program));
        assert_eq!(gl.live_programs(), 1);
    }

    #[test]
    fn separable_link_failure_deletes_both_objects() {
        let mut gl = HeadlessGl::new();
        let src = "#link_error unresolved\nvoid main() {}\n";
        let err = compile_shader(&mut gl, ShaderStage::Vertex, src, "", true).unwrap_err();
        assert!(matches!(err, GlError::Link { .. }), "{err:?}");
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 0);
    }

    #[test]
    fn linking_nothing_is_an_error() {
        let mut gl = HeadlessGl::new();
        assert_eq!(link_program(&mut gl, &[]), Err(GlError::NoStages));
        assert_eq!(gl.programs_created(), 0);
    }

    #[test]
    fn link_failure_keeps_the_attached_shaders() {
        let mut gl = HeadlessGl::new();
        let vs = compile_shader(&mut gl, ShaderStage::Vertex, VS, "", false).unwrap();
        let fs = compile_shader(
            &mut gl,
            ShaderStage::Pixel,
            "#link_error missing main\n",
            "",
            false,
        )
        .unwrap();

        let err = link_program(&mut gl, &[vs.shader, fs.shader]).unwrap_err();
        match err {
            GlError::Link { log } => assert!(log.contains("missing main"), "{log}"),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(gl.live_programs(), 0);
        assert_eq!(gl.live_shaders(), 2);
    }
}
