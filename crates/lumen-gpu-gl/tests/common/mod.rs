//! Shared helpers for `lumen-gpu-gl` integration tests.

use std::sync::Arc;

use lumen_gpu::Shader;

/// Route `tracing` output through the test harness so compile/link diagnostics show up on failure.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A vertex/pixel pair linked into a program, with the stages kept for cache assertions.
pub struct ProgramFixture {
    pub vertex: Arc<Shader>,
    pub pixel: Arc<Shader>,
    pub program: Shader,
}

pub fn program(vertex: &str, pixel: &str) -> ProgramFixture {
    let vertex = Arc::new(Shader::new_vertex(vertex));
    let pixel = Arc::new(Shader::new_pixel(pixel));
    let program = Shader::new_program(vec![vertex.clone(), pixel.clone()]);
    ProgramFixture {
        vertex,
        pixel,
        program,
    }
}
