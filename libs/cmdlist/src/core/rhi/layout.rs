// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Resource set layouts and the resource sets bound against them.

use std::ops::AddAssign;
use std::sync::Arc;

use bitflags::bitflags;

use crate::core::{CmdListError, Result};

use super::{Backend, Buffer, Sampler, Texture};

bitflags! {
    /// Shader stages a binding is visible to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
    }
}

/// Kind of resource a layout element expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    UniformBuffer,
    StructuredBufferReadOnly,
    StructuredBufferReadWrite,
    TextureReadOnly,
    TextureReadWrite,
    Sampler,
}

/// Native index space a resource kind is bound into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    Buffer,
    Texture,
    Sampler,
}

impl ResourceKind {
    pub fn class(&self) -> ResourceClass {
        match self {
            Self::UniformBuffer | Self::StructuredBufferReadOnly | Self::StructuredBufferReadWrite => {
                ResourceClass::Buffer
            }
            Self::TextureReadOnly | Self::TextureReadWrite => ResourceClass::Texture,
            Self::Sampler => ResourceClass::Sampler,
        }
    }
}

/// Per-class binding counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub buffers: u32,
    pub textures: u32,
    pub samplers: u32,
}

impl ResourceCounts {
    pub fn get(&self, class: ResourceClass) -> u32 {
        match class {
            ResourceClass::Buffer => self.buffers,
            ResourceClass::Texture => self.textures,
            ResourceClass::Sampler => self.samplers,
        }
    }

    fn increment(&mut self, class: ResourceClass) -> u32 {
        let counter = match class {
            ResourceClass::Buffer => &mut self.buffers,
            ResourceClass::Texture => &mut self.textures,
            ResourceClass::Sampler => &mut self.samplers,
        };
        let slot = *counter;
        *counter += 1;
        slot
    }
}

impl AddAssign for ResourceCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.buffers += rhs.buffers;
        self.textures += rhs.textures;
        self.samplers += rhs.samplers;
    }
}

/// One element of a layout description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLayoutElement {
    pub name: String,
    pub kind: ResourceKind,
    pub stages: ShaderStages,
}

impl ResourceLayoutElement {
    pub fn new(name: impl Into<String>, kind: ResourceKind, stages: ShaderStages) -> Self {
        Self {
            name: name.into(),
            kind,
            stages,
        }
    }
}

/// A layout element resolved to its set-local native slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBinding {
    pub name: String,
    pub kind: ResourceKind,
    pub stages: ShaderStages,
    /// Slot within this set's index space for the element's resource class.
    pub slot: u32,
}

/// Immutable ordered list of bindings with precomputed per-class counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLayout {
    bindings: Vec<ResourceBinding>,
    counts: ResourceCounts,
}

impl ResourceLayout {
    /// Resolve elements to slots. Each element takes the next free slot of
    /// its resource class.
    pub fn new(elements: impl IntoIterator<Item = ResourceLayoutElement>) -> Self {
        let mut counts = ResourceCounts::default();
        let bindings = elements
            .into_iter()
            .map(|element| {
                let slot = counts.increment(element.kind.class());
                ResourceBinding {
                    name: element.name,
                    kind: element.kind,
                    stages: element.stages,
                    slot,
                }
            })
            .collect();
        Self { bindings, counts }
    }

    pub fn bindings(&self) -> &[ResourceBinding] {
        &self.bindings
    }

    pub fn binding(&self, index: usize) -> Option<&ResourceBinding> {
        self.bindings.get(index)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn counts(&self) -> ResourceCounts {
        self.counts
    }

    pub fn buffer_count(&self) -> u32 {
        self.counts.buffers
    }

    pub fn texture_count(&self) -> u32 {
        self.counts.textures
    }

    pub fn sampler_count(&self) -> u32 {
        self.counts.samplers
    }
}

/// A resource placed in a resource set.
#[derive(Debug, Clone)]
pub enum BindableResource<B: Backend> {
    Buffer { buffer: Arc<Buffer<B>>, offset: u64 },
    Texture(Arc<Texture<B>>),
    Sampler(Arc<Sampler<B>>),
}

impl<B: Backend> BindableResource<B> {
    /// Whole buffer, bound from offset zero.
    pub fn buffer(buffer: Arc<Buffer<B>>) -> Self {
        Self::Buffer { buffer, offset: 0 }
    }

    /// Buffer bound from `offset`.
    pub fn buffer_range(buffer: Arc<Buffer<B>>, offset: u64) -> Self {
        Self::Buffer { buffer, offset }
    }

    pub fn class(&self) -> ResourceClass {
        match self {
            Self::Buffer { .. } => ResourceClass::Buffer,
            Self::Texture(_) => ResourceClass::Texture,
            Self::Sampler(_) => ResourceClass::Sampler,
        }
    }
}

impl<B: Backend> From<Arc<Buffer<B>>> for BindableResource<B> {
    fn from(buffer: Arc<Buffer<B>>) -> Self {
        Self::buffer(buffer)
    }
}

impl<B: Backend> From<Arc<Texture<B>>> for BindableResource<B> {
    fn from(texture: Arc<Texture<B>>) -> Self {
        Self::Texture(texture)
    }
}

impl<B: Backend> From<Arc<Sampler<B>>> for BindableResource<B> {
    fn from(sampler: Arc<Sampler<B>>) -> Self {
        Self::Sampler(sampler)
    }
}

/// Resources matching a [`ResourceLayout`] one-to-one.
#[derive(Debug, Clone)]
pub struct ResourceSet<B: Backend> {
    layout: Arc<ResourceLayout>,
    resources: Vec<BindableResource<B>>,
}

impl<B: Backend> ResourceSet<B> {
    pub fn new(layout: Arc<ResourceLayout>, resources: Vec<BindableResource<B>>) -> Result<Self> {
        if resources.len() != layout.len() {
            return Err(CmdListError::ResourceMismatch(format!(
                "layout declares {} bindings, got {} resources",
                layout.len(),
                resources.len()
            )));
        }

        for (binding, resource) in layout.bindings().iter().zip(&resources) {
            if binding.kind.class() != resource.class() {
                return Err(CmdListError::ResourceMismatch(format!(
                    "binding '{}' expects {:?}, got {:?}",
                    binding.name,
                    binding.kind,
                    resource.class()
                )));
            }
            match resource {
                BindableResource::Buffer { buffer, offset } if *offset > buffer.size() => {
                    return Err(CmdListError::OutOfBounds(format!(
                        "binding '{}' offset {} exceeds buffer size {}",
                        binding.name,
                        offset,
                        buffer.size()
                    )));
                }
                BindableResource::Texture(texture) if texture.is_staging() => {
                    return Err(CmdListError::ResourceMismatch(format!(
                        "binding '{}' cannot bind a staging texture",
                        binding.name
                    )));
                }
                _ => {}
            }
        }

        Ok(Self { layout, resources })
    }

    pub fn layout(&self) -> &Arc<ResourceLayout> {
        &self.layout
    }

    pub fn resources(&self) -> &[BindableResource<B>] {
        &self.resources
    }

    /// Layout bindings paired with the resources bound to them.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceBinding, &BindableResource<B>)> {
        self.layout.bindings().iter().zip(&self.resources)
    }
}
