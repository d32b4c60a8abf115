use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::element::{Element, ResourceType};

/// Location value meaning "not bound" / "not found".
pub const INVALID_LOCATION: i32 = -1;

/// A named, bindable resource exposed by a compiled program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Slot {
    pub name: String,
    /// Backend location: uniform location, attribute location, texture unit or buffer binding.
    /// [`INVALID_LOCATION`] when the resource could not be bound.
    pub location: i32,
    pub element: Element,
    pub resource: ResourceType,
}

impl Slot {
    pub fn new(
        name: impl Into<String>,
        location: i32,
        element: Element,
        resource: ResourceType,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            element,
            resource,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.location != INVALID_LOCATION
    }
}

/// Name-keyed set of [`Slot`]s.
///
/// Iteration order is by name; callers must only rely on name lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotSet {
    slots: BTreeMap<String, Slot>,
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `slot` unless a slot with the same name is already present.
    ///
    /// Returns `false` (and leaves the set untouched) on a duplicate name.
    pub fn insert(&mut self, slot: Slot) -> bool {
        use std::collections::btree_map::Entry;

        match self.slots.entry(slot.name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                e.insert(slot);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Location of the slot called `name`, or [`INVALID_LOCATION`].
    pub fn find_location(&self, name: &str) -> i32 {
        self.slots
            .get(name)
            .map_or(INVALID_LOCATION, |slot| slot.location)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.values()
    }
}

impl FromIterator<Slot> for SlotSet {
    fn from_iter<T: IntoIterator<Item = Slot>>(iter: T) -> Self {
        let mut set = SlotSet::new();
        for slot in iter {
            set.insert(slot);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SlotSet {
    type Item = &'a Slot;
    type IntoIter = std::collections::btree_map::Values<'a, String, Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.values()
    }
}

/// Caller-declared bindings that reflection must honour.
///
/// Used to pin uniform blocks and samplers to binding numbers agreed on elsewhere in the engine
/// (e.g. "the camera block always lives at binding 15").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BindingSet {
    requested: BTreeMap<String, u32>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `binding` for the resource called `name`. A later request for the same name
    /// replaces the earlier one.
    pub fn insert(&mut self, name: impl Into<String>, binding: u32) {
        self.requested.insert(name.into(), binding);
    }

    pub fn with(mut self, name: impl Into<String>, binding: u32) -> Self {
        self.insert(name, binding);
        self
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.requested.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.requested.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for BindingSet {
    fn from_iter<T: IntoIterator<Item = (S, u32)>>(iter: T) -> Self {
        let mut set = BindingSet::new();
        for (name, binding) in iter {
            set.insert(name, binding);
        }
        set
    }
}

/// The public resource interface of a shader or program, as published by reflection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShaderInterface {
    pub uniforms: SlotSet,
    /// Uniform blocks.
    pub buffers: SlotSet,
    pub textures: SlotSet,
    pub samplers: SlotSet,
    /// Vertex attributes.
    pub inputs: SlotSet,
    /// Reserved for fragment outputs; always empty for now.
    pub outputs: SlotSet,
}
