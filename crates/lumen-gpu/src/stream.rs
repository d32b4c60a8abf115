//! Engine-wide vertex attribute slots and reserved binding numbers.
//!
//! Vertex formats are laid out against these fixed attribute slots, so every compiled program must
//! agree on them regardless of what locations the driver picked:
//!
//! | attribute             | slot |
//! |-----------------------|------|
//! | `inPosition`          | 0    |
//! | `inNormal`            | 1    |
//! | `inColor`             | 2    |
//! | `inTexCoord0`         | 3    |
//! | `inTangent`           | 4    |
//! | `inSkinClusterIndex`  | 5    |
//! | `inSkinClusterWeight` | 6    |
//! | `inTexCoord1`         | 7    |
//! | `_drawCallInfo`       | 15   |

pub const POSITION: u32 = 0;
pub const NORMAL: u32 = 1;
pub const COLOR: u32 = 2;
pub const TEXCOORD0: u32 = 3;
pub const TEXCOORD: u32 = TEXCOORD0;
pub const TANGENT: u32 = 4;
pub const SKIN_CLUSTER_INDEX: u32 = 5;
pub const SKIN_CLUSTER_WEIGHT: u32 = 6;
pub const TEXCOORD1: u32 = 7;

/// Number of regular (per-vertex) input slots.
pub const NUM_INPUT_SLOTS: u32 = TEXCOORD1 + 1;

/// Per-draw-call info attribute, kept at the top of the 16 guaranteed attribute slots.
pub const DRAW_CALL_INFO: u32 = 15;

/// Texture unit reserved for the per-object transform buffer.
pub const TRANSFORM_OBJECT_SLOT: u32 = 14;

/// Uniform buffer binding reserved for the per-frame camera transform block.
pub const TRANSFORM_CAMERA_SLOT: u32 = 15;
