//! `lumen-gpu` is the backend-neutral half of the Lumen shader pipeline.
//!
//! It provides:
//! - The element/resource type model reflection results are expressed in (see [`Element`]).
//! - Logical shader and program descriptions (see [`Shader`]).
//! - The name-keyed slot model a compiled program exposes (see [`SlotSet`], [`ShaderInterface`])
//!   and the caller-side binding requests reflection honours (see [`BindingSet`]).
//! - Fixed vertex attribute slots and reserved binding numbers shared by every backend
//!   (see [`stream`]).

mod element;
mod shader;
mod slot;

pub mod stream;

pub use element::{Dimension, Element, ElementResource, ResourceType, ScalarType, Semantic};
pub use shader::{Shader, ShaderId, ShaderKind, ShaderStage};
pub use slot::{BindingSet, ShaderInterface, Slot, SlotSet, INVALID_LOCATION};
