use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::slot::{ShaderInterface, SlotSet};

/// Process-unique identity of a [`Shader`]. Backends key their compiled objects by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(u64);

impl ShaderId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shader#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShaderStage {
    Vertex,
    /// Fragment stage.
    Pixel,
    Geometry,
}

#[derive(Debug, Clone)]
pub enum ShaderKind {
    /// A single pipeline stage with its own source.
    Stage { stage: ShaderStage, source: String },
    /// A linked combination of stage shaders, in attach order.
    Program { shaders: Vec<Arc<Shader>> },
}

/// A logical shader or program.
///
/// The source/stage description is immutable; the [`ShaderInterface`] is filled in by a backend
/// once the shader has been compiled and reflected.
#[derive(Debug)]
pub struct Shader {
    id: ShaderId,
    kind: ShaderKind,
    interface: ShaderInterface,
}

impl Shader {
    pub fn new_stage(stage: ShaderStage, source: impl Into<String>) -> Self {
        Self::from_kind(ShaderKind::Stage {
            stage,
            source: source.into(),
        })
    }

    pub fn new_vertex(source: impl Into<String>) -> Self {
        Self::new_stage(ShaderStage::Vertex, source)
    }

    pub fn new_pixel(source: impl Into<String>) -> Self {
        Self::new_stage(ShaderStage::Pixel, source)
    }

    pub fn new_program(shaders: Vec<Arc<Shader>>) -> Self {
        Self::from_kind(ShaderKind::Program { shaders })
    }

    fn from_kind(kind: ShaderKind) -> Self {
        Self {
            id: ShaderId::next(),
            kind,
            interface: ShaderInterface::default(),
        }
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn kind(&self) -> &ShaderKind {
        &self.kind
    }

    pub fn is_program(&self) -> bool {
        matches!(self.kind, ShaderKind::Program { .. })
    }

    /// The stage, for non-program shaders.
    pub fn stage(&self) -> Option<ShaderStage> {
        match &self.kind {
            ShaderKind::Stage { stage, .. } => Some(*stage),
            ShaderKind::Program { .. } => None,
        }
    }

    /// The source text, for non-program shaders.
    pub fn source(&self) -> Option<&str> {
        match &self.kind {
            ShaderKind::Stage { source, .. } => Some(source),
            ShaderKind::Program { .. } => None,
        }
    }

    /// Sub-shaders of a program; empty for stage shaders.
    pub fn shaders(&self) -> &[Arc<Shader>] {
        match &self.kind {
            ShaderKind::Program { shaders } => shaders,
            ShaderKind::Stage { .. } => &[],
        }
    }

    /// Publish the reflected interface, replacing any previous one.
    pub fn define_slots(&mut self, interface: ShaderInterface) {
        self.interface = interface;
    }

    pub fn interface(&self) -> &ShaderInterface {
        &self.interface
    }

    pub fn uniforms(&self) -> &SlotSet {
        &self.interface.uniforms
    }

    pub fn buffers(&self) -> &SlotSet {
        &self.interface.buffers
    }

    pub fn textures(&self) -> &SlotSet {
        &self.interface.textures
    }

    pub fn samplers(&self) -> &SlotSet {
        &self.interface.samplers
    }

    pub fn inputs(&self) -> &SlotSet {
        &self.interface.inputs
    }

    pub fn outputs(&self) -> &SlotSet {
        &self.interface.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = Shader::new_vertex("void main() {}");
        let b = Shader::new_vertex("void main() {}");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn program_accessors() {
        let vs = Arc::new(Shader::new_vertex("vs"));
        let ps = Arc::new(Shader::new_pixel("ps"));
        let program = Shader::new_program(vec![vs.clone(), ps]);

        assert!(program.is_program());
        assert_eq!(program.stage(), None);
        assert_eq!(program.source(), None);
        assert_eq!(program.shaders().len(), 2);
        assert_eq!(program.shaders()[0].id(), vs.id());

        assert!(!vs.is_program());
        assert_eq!(vs.stage(), Some(ShaderStage::Vertex));
        assert_eq!(vs.source(), Some("vs"));
        assert!(vs.shaders().is_empty());
    }
}
