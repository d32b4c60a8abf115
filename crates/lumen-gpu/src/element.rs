//! Backend-neutral description of a GPU value's shape and the resource it binds to.
//!
//! Backends translate their native type enumerations into [`ElementResource`] pairs so the rest of
//! the engine never has to look at driver type codes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Dimension {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl Dimension {
    /// Number of scalar components (a `mat3` holds 9).
    pub fn component_count(self) -> u32 {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, Self::Mat2 | Self::Mat3 | Self::Mat4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScalarType {
    Float,
    Int32,
    Uint32,
    Bool,
}

/// The role a value plays in a program's interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Semantic {
    /// Plain uniform value (scalar/vector/matrix).
    Uniform,
    /// A whole uniform block.
    UniformBuffer,
    Sampler,
    SamplerShadow,
    SamplerMultisample,
}

impl Semantic {
    pub fn is_sampler(self) -> bool {
        matches!(
            self,
            Self::Sampler | Self::SamplerShadow | Self::SamplerMultisample
        )
    }
}

/// Shape and numeric kind of a reflected value.
///
/// [`Element::Unrecognized`] is the default and stands for "the backend reported a type we do not
/// model". Reflection keeps such values (so their names stay visible) instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Element {
    #[default]
    Unrecognized,
    Typed {
        dimension: Dimension,
        scalar: ScalarType,
        semantic: Semantic,
    },
}

impl Element {
    pub const fn new(dimension: Dimension, scalar: ScalarType, semantic: Semantic) -> Self {
        Self::Typed {
            dimension,
            scalar,
            semantic,
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized)
    }

    pub fn dimension(&self) -> Option<Dimension> {
        match *self {
            Self::Typed { dimension, .. } => Some(dimension),
            Self::Unrecognized => None,
        }
    }

    pub fn scalar(&self) -> Option<ScalarType> {
        match *self {
            Self::Typed { scalar, .. } => Some(scalar),
            Self::Unrecognized => None,
        }
    }

    pub fn semantic(&self) -> Option<Semantic> {
        match *self {
            Self::Typed { semantic, .. } => Some(semantic),
            Self::Unrecognized => None,
        }
    }

    /// Component count, or 0 for [`Element::Unrecognized`].
    pub fn component_count(&self) -> u32 {
        self.dimension().map_or(0, Dimension::component_count)
    }
}

/// Category of resource a slot binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResourceType {
    #[default]
    Buffer,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    Texture1DArray,
    Texture2DArray,
}

impl ResourceType {
    pub fn is_texture(self) -> bool {
        !matches!(self, Self::Buffer)
    }

    pub fn is_array(self) -> bool {
        matches!(self, Self::Texture1DArray | Self::Texture2DArray)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementResource {
    pub element: Element,
    pub resource: ResourceType,
}

impl ElementResource {
    pub const fn new(element: Element, resource: ResourceType) -> Self {
        Self { element, resource }
    }

    /// The "unknown type" result: an unrecognized element bound as a buffer.
    pub const fn unrecognized() -> Self {
        Self {
            element: Element::Unrecognized,
            resource: ResourceType::Buffer,
        }
    }
}
