//! GL type enum → [`ElementResource`] translation.

use lumen_gpu::{Dimension, Element, ElementResource, ResourceType, ScalarType, Semantic};

use crate::gl;

const fn uniform(dimension: Dimension, scalar: ScalarType) -> ElementResource {
    ElementResource::new(
        Element::new(dimension, scalar, Semantic::Uniform),
        ResourceType::Buffer,
    )
}

const fn sampler(scalar: ScalarType, semantic: Semantic, resource: ResourceType) -> ElementResource {
    ElementResource::new(Element::new(Dimension::Scalar, scalar, semantic), resource)
}

/// Map a type reported by `glGetActiveUniform`/`glGetActiveAttrib`.
///
/// The mapping is total: types we do not model (doubles, non-square matrices, buffer/rect
/// samplers, images, atomics, ...) come back as [`ElementResource::unrecognized`].
pub fn element_resource_for_gl_type(gl_type: u32) -> ElementResource {
    use Dimension::*;
    use ResourceType::*;
    use ScalarType::*;
    use Semantic::*;

    match gl_type {
        gl::FLOAT => uniform(Scalar, Float),
        gl::FLOAT_VEC2 => uniform(Vec2, Float),
        gl::FLOAT_VEC3 => uniform(Vec3, Float),
        gl::FLOAT_VEC4 => uniform(Vec4, Float),

        gl::INT => uniform(Scalar, Int32),
        gl::INT_VEC2 => uniform(Vec2, Int32),
        gl::INT_VEC3 => uniform(Vec3, Int32),
        gl::INT_VEC4 => uniform(Vec4, Int32),

        gl::UNSIGNED_INT => uniform(Scalar, Uint32),
        gl::UNSIGNED_INT_VEC2 => uniform(Vec2, Uint32),
        gl::UNSIGNED_INT_VEC3 => uniform(Vec3, Uint32),
        gl::UNSIGNED_INT_VEC4 => uniform(Vec4, Uint32),

        gl::BOOL => uniform(Scalar, Bool),
        gl::BOOL_VEC2 => uniform(Vec2, Bool),
        gl::BOOL_VEC3 => uniform(Vec3, Bool),
        gl::BOOL_VEC4 => uniform(Vec4, Bool),

        gl::FLOAT_MAT2 => uniform(Mat2, Float),
        gl::FLOAT_MAT3 => uniform(Mat3, Float),
        gl::FLOAT_MAT4 => uniform(Mat4, Float),

        gl::SAMPLER_1D => sampler(Float, Sampler, Texture1D),
        gl::SAMPLER_2D => sampler(Float, Sampler, Texture2D),
        gl::SAMPLER_3D => sampler(Float, Sampler, Texture3D),
        gl::SAMPLER_CUBE => sampler(Float, Sampler, TextureCube),
        gl::SAMPLER_1D_ARRAY => sampler(Float, Sampler, Texture1DArray),
        gl::SAMPLER_2D_ARRAY => sampler(Float, Sampler, Texture2DArray),

        gl::SAMPLER_1D_SHADOW => sampler(Float, SamplerShadow, Texture1D),
        gl::SAMPLER_2D_SHADOW => sampler(Float, SamplerShadow, Texture2D),
        gl::SAMPLER_CUBE_SHADOW => sampler(Float, SamplerShadow, TextureCube),
        gl::SAMPLER_1D_ARRAY_SHADOW => sampler(Float, SamplerShadow, Texture1DArray),
        gl::SAMPLER_2D_ARRAY_SHADOW => sampler(Float, SamplerShadow, Texture2DArray),

        gl::SAMPLER_2D_MULTISAMPLE => sampler(Float, SamplerMultisample, Texture2D),
        gl::SAMPLER_2D_MULTISAMPLE_ARRAY => sampler(Float, SamplerMultisample, Texture2DArray),

        gl::INT_SAMPLER_1D => sampler(Int32, Sampler, Texture1D),
        gl::INT_SAMPLER_2D => sampler(Int32, Sampler, Texture2D),
        gl::INT_SAMPLER_3D => sampler(Int32, Sampler, Texture3D),
        gl::INT_SAMPLER_CUBE => sampler(Int32, Sampler, TextureCube),
        gl::INT_SAMPLER_1D_ARRAY => sampler(Int32, Sampler, Texture1DArray),
        gl::INT_SAMPLER_2D_ARRAY => sampler(Int32, Sampler, Texture2DArray),
        gl::INT_SAMPLER_2D_MULTISAMPLE => sampler(Int32, SamplerMultisample, Texture2D),
        gl::INT_SAMPLER_2D_MULTISAMPLE_ARRAY => {
            sampler(Int32, SamplerMultisample, Texture2DArray)
        }

        gl::UNSIGNED_INT_SAMPLER_1D => sampler(Uint32, Sampler, Texture1D),
        gl::UNSIGNED_INT_SAMPLER_2D => sampler(Uint32, Sampler, Texture2D),
        gl::UNSIGNED_INT_SAMPLER_3D => sampler(Uint32, Sampler, Texture3D),
        gl::UNSIGNED_INT_SAMPLER_CUBE => sampler(Uint32, Sampler, TextureCube),
        gl::UNSIGNED_INT_SAMPLER_1D_ARRAY => sampler(Uint32, Sampler, Texture1DArray),
        gl::UNSIGNED_INT_SAMPLER_2D_ARRAY => sampler(Uint32, Sampler, Texture2DArray),
        gl::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE => {
            sampler(Uint32, SamplerMultisample, Texture2D)
        }
        gl::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE_ARRAY => {
            sampler(Uint32, SamplerMultisample, Texture2DArray)
        }

        _ => ElementResource::unrecognized(),
    }
}
