//! Engine-wide attribute and transform bindings applied to every freshly linked program.
//!
//! Drivers pick attribute locations freely, so after link the well-known vertex inputs are moved
//! to their fixed [`stream`] slots and the program is relinked once, then the transform buffers are pointed at
//! their reserved bindings:
//!
//! | name                    | kind          | binding                               |
//! |-------------------------|---------------|---------------------------------------|
//! | `inPosition`            | attribute     | [`stream::POSITION`]                  |
//! | `inNormal`              | attribute     | [`stream::NORMAL`]                    |
//! | `inColor`               | attribute     | [`stream::COLOR`]                     |
//! | `inTexCoord0`           | attribute     | [`stream::TEXCOORD0`]                 |
//! | `inTangent`             | attribute     | [`stream::TANGENT`]                   |
//! | `inTexCoord1`           | attribute     | [`stream::TEXCOORD1`]                 |
//! | `inSkinClusterIndex`    | attribute     | [`stream::SKIN_CLUSTER_INDEX`]        |
//! | `inSkinClusterWeight`   | attribute     | [`stream::SKIN_CLUSTER_WEIGHT`]       |
//! | `_drawCallInfo`         | attribute     | [`stream::DRAW_CALL_INFO`]            |
//! | `transformObjectBuffer` | sampler value | [`stream::TRANSFORM_OBJECT_SLOT`]     |
//! | `transformCameraBuffer` | uniform block | [`stream::TRANSFORM_CAMERA_SLOT`]     |

use lumen_gpu::stream;
use tracing::{debug, warn};

use crate::driver::GlDriver;
use crate::object::CompiledProgramObject;

pub const TRANSFORM_OBJECT_BUFFER: &str = "transformObjectBuffer";
pub const TRANSFORM_CAMERA_BUFFER: &str = "transformCameraBuffer";

pub const ATTRIBUTE_BINDINGS: &[(&str, u32)] = &[
    ("inPosition", stream::POSITION),
    ("inNormal", stream::NORMAL),
    ("inColor", stream::COLOR),
    ("inTexCoord0", stream::TEXCOORD0),
    ("inTangent", stream::TANGENT),
    ("inTexCoord1", stream::TEXCOORD1),
    ("inSkinClusterIndex", stream::SKIN_CLUSTER_INDEX),
    ("inSkinClusterWeight", stream::SKIN_CLUSTER_WEIGHT),
    ("_drawCallInfo", stream::DRAW_CALL_INFO),
];

/// Fixed slot for a well-known attribute name.
pub fn attribute_slot(name: &str) -> Option<u32> {
    ATTRIBUTE_BINDINGS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, slot)| slot)
}

/// Apply the attribute and transform bindings to a linked program.
///
/// The program is relinked once after the attribute table. If that relink fails it is logged,
/// the moved attributes are bound back to their previous locations and the program is linked
/// again, so it keeps its pre-normalization layout.
pub fn make_program_bindings<D: GlDriver + ?Sized>(
    driver: &mut D,
    object: &mut CompiledProgramObject,
) {
    let program = object.program;

    let mut moved = Vec::new();
    for &(name, slot) in ATTRIBUTE_BINDINGS {
        let Some(location) = driver.attrib_location(program, name) else {
            continue;
        };
        if location != slot {
            debug!(?program, name, location, slot, "rebinding attribute");
            driver.bind_attrib_location(program, slot, name);
            moved.push((name, location));
        }
    }

    driver.link_program(program);
    if !driver.program_link_status(program) {
        let log = driver.program_info_log(program);
        warn!(?program, %log, moved = moved.len(), "relink after attribute rebinding failed");
        for &(name, location) in &moved {
            driver.bind_attrib_location(program, location, name);
        }
        driver.link_program(program);
        if !driver.program_link_status(program) {
            let log = driver.program_info_log(program);
            warn!(?program, %log, "restoring attribute locations failed");
        }
    }

    if let Some(location) = driver.uniform_location(program, TRANSFORM_OBJECT_BUFFER) {
        driver.program_uniform_i32(program, location, stream::TRANSFORM_OBJECT_SLOT as i32);
        object.transform_object_slot = Some(stream::TRANSFORM_OBJECT_SLOT);
    }

    if let Some(index) = driver.uniform_block_index(program, TRANSFORM_CAMERA_BUFFER) {
        driver.uniform_block_binding(program, index, stream::TRANSFORM_CAMERA_SLOT);
        object.transform_camera_slot = Some(stream::TRANSFORM_CAMERA_SLOT);
    }
}
