//! Program introspection into the engine's slot model.
//!
//! Each walk queries the driver for one kind of active resource, resolves its binding
//! (honouring any request in the caller's [`BindingSet`]) and records a [`Slot`] for it.

use lumen_gpu::{
    BindingSet, Dimension, Element, ResourceType, ScalarType, Semantic, ShaderInterface, Slot,
    SlotSet, INVALID_LOCATION,
};
use tracing::{debug, warn};

use crate::driver::{GlDriver, GlProgram};
use crate::type_map::element_resource_for_gl_type;

/// An active uniform name split into its base name and trailing array index.
///
/// Drivers report arrays as `name[0]`; some also list later elements separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayName<'a> {
    pub base: &'a str,
    pub index: Option<u32>,
}

impl<'a> ArrayName<'a> {
    /// Only a trailing `[n]` counts; `lights[1].color` is a plain name.
    pub fn parse(name: &'a str) -> Self {
        let plain = Self {
            base: name,
            index: None,
        };
        let Some(open) = name.strip_suffix(']').and_then(|n| n.rfind('[')) else {
            return plain;
        };
        match name[open + 1..name.len() - 1].parse::<u32>() {
            Ok(index) => Self {
                base: &name[..open],
                index: Some(index),
            },
            Err(_) => plain,
        }
    }

    /// Whether this entry should be skipped: a non-first element of an array.
    pub fn is_trailing_element(&self) -> bool {
        matches!(self.index, Some(i) if i != 0)
    }
}

fn to_location(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(INVALID_LOCATION)
}

const UNIFORM_BLOCK_ELEMENT: Element =
    Element::new(Dimension::Scalar, ScalarType::Uint32, Semantic::UniformBuffer);

/// Reflect uniform blocks into `buffers`, assigning bindings to blocks that have none.
///
/// A block with a requested binding is moved there. A block left at binding 0 without a request
/// takes the lowest binding not held by any other block of the program, requested or already
/// set; when every binding is taken it is reported with [`INVALID_LOCATION`]. Returns the number
/// of active blocks.
pub fn make_uniform_block_slots<D: GlDriver + ?Sized>(
    driver: &mut D,
    program: GlProgram,
    bindings: &BindingSet,
    buffers: &mut SlotSet,
) -> u32 {
    let count = driver.active_uniform_block_count(program);
    if count == 0 {
        return 0;
    }

    let blocks: Vec<_> = (0..count)
        .filter_map(|i| driver.active_uniform_block(program, i).map(|block| (i, block)))
        .collect();

    let mut used = vec![false; driver.max_uniform_buffer_bindings() as usize];
    let mut reserve = |binding: u32| {
        if let Some(taken) = used.get_mut(binding as usize) {
            *taken = true;
        }
    };
    for (_, block) in &blocks {
        match bindings.get(&block.name) {
            Some(requested) => reserve(requested),
            None if block.binding != 0 => reserve(block.binding),
            None => {}
        }
    }

    for (i, block) in blocks {
        let block_index = driver.uniform_block_index(program, &block.name).unwrap_or(i);

        let mut binding = to_location(block.binding);
        if let Some(requested) = bindings.get(&block.name) {
            if block.binding != requested {
                driver.uniform_block_binding(program, block_index, requested);
            }
            binding = to_location(requested);
        } else if block.binding == 0 {
            match used.iter().position(|&taken| !taken) {
                Some(free) => {
                    used[free] = true;
                    let free = free as u32;
                    driver.uniform_block_binding(program, block_index, free);
                    binding = to_location(free);
                }
                None => {
                    warn!(?program, name = %block.name, "no free uniform buffer binding");
                    binding = INVALID_LOCATION;
                }
            }
        }

        debug!(?program, name = %block.name, binding, size = block.data_size, "uniform block");
        buffers.insert(Slot::new(
            block.name,
            binding,
            UNIFORM_BLOCK_ELEMENT,
            ResourceType::Buffer,
        ));
    }

    count
}

/// Reflect plain uniforms into `uniforms` and sampler uniforms into both `textures` and
/// `samplers`.
///
/// Array uniforms are published once under their base name. A sampler's binding is its texture
/// unit, which a requested binding overrides. Uniforms without a location (block members) are
/// skipped. Returns the number of active uniforms.
pub fn make_uniform_slots<D: GlDriver + ?Sized>(
    driver: &mut D,
    program: GlProgram,
    bindings: &BindingSet,
    uniforms: &mut SlotSet,
    textures: &mut SlotSet,
    samplers: &mut SlotSet,
) -> u32 {
    let count = driver.active_uniform_count(program);

    for i in 0..count {
        let Some(uniform) = driver.active_uniform(program, i) else {
            continue;
        };
        let Some(location) = driver.uniform_location(program, &uniform.name) else {
            continue;
        };

        let array_name = ArrayName::parse(&uniform.name);
        if array_name.is_trailing_element() {
            continue;
        }
        let name = array_name.base;

        let er = element_resource_for_gl_type(uniform.gl_type);
        if !er.resource.is_texture() {
            uniforms.insert(Slot::new(name, to_location(location), er.element, er.resource));
            continue;
        }

        let mut unit = driver.uniform_i32(program, location);
        if let Some(requested) = bindings.get(name) {
            let requested = to_location(requested);
            if unit != requested {
                driver.program_uniform_i32(program, location, requested);
                unit = requested;
            }
        }

        debug!(?program, name, unit, "sampler uniform");
        textures.insert(Slot::new(name, unit, er.element, er.resource));
        samplers.insert(Slot::new(name, unit, er.element, er.resource));
    }

    count
}

/// Reflect vertex attributes into `inputs` at their current locations.
pub fn make_input_slots<D: GlDriver + ?Sized>(
    driver: &mut D,
    program: GlProgram,
    inputs: &mut SlotSet,
) -> u32 {
    let count = driver.active_attribute_count(program);

    for i in 0..count {
        let Some(attribute) = driver.active_attribute(program, i) else {
            continue;
        };
        let location = driver
            .attrib_location(program, &attribute.name)
            .map_or(INVALID_LOCATION, to_location);
        let er = element_resource_for_gl_type(attribute.gl_type);
        inputs.insert(Slot::new(
            attribute.name,
            location,
            er.element,
            ResourceType::Buffer,
        ));
    }

    count
}

/// Fragment outputs are not reflected yet; always leaves `outputs` untouched.
pub fn make_output_slots<D: GlDriver + ?Sized>(
    _driver: &mut D,
    _program: GlProgram,
    _outputs: &mut SlotSet,
) -> u32 {
    0
}

/// Run every walk over `program`.
pub fn reflect_program<D: GlDriver + ?Sized>(
    driver: &mut D,
    program: GlProgram,
    bindings: &BindingSet,
) -> ShaderInterface {
    let mut interface = ShaderInterface::default();
    make_uniform_block_slots(driver, program, bindings, &mut interface.buffers);
    make_uniform_slots(
        driver,
        program,
        bindings,
        &mut interface.uniforms,
        &mut interface.textures,
        &mut interface.samplers,
    );
    make_input_slots(driver, program, &mut interface.inputs);
    make_output_slots(driver, program, &mut interface.outputs);
    interface
}
