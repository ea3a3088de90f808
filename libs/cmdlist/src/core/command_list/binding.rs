// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Resource set activation.
//!
//! Layout slots are local to their set. Natively there is one flat index
//! space per resource class per stage, so each set is shifted by the class
//! counts of every set before it in the bound pipeline.

use std::sync::Arc;

use crate::core::rhi::{
    Backend, BindableResource, NativeComputeEncoder, NativeRenderEncoder, ResourceBinding,
    ResourceClass, ResourceCounts, ResourceLayout, ResourceSet, ShaderStages,
};
use crate::core::{CmdListError, Result};

/// Per-class index base of set `set_index` within `layouts`.
pub fn resource_base(layouts: &[Arc<ResourceLayout>], set_index: usize) -> ResourceCounts {
    let mut base = ResourceCounts::default();
    for layout in layouts.iter().take(set_index) {
        base += layout.counts();
    }
    base
}

fn native_index(binding: &ResourceBinding, base: ResourceCounts) -> u32 {
    binding.slot + base.get(binding.kind.class())
}

/// Push every binding of `set` at graphics set slot `set_index` to the render encoder.
pub(crate) fn activate_graphics_set<B: Backend>(
    encoder: &mut B::RenderEncoder,
    layouts: &[Arc<ResourceLayout>],
    vertex_buffer_count: u32,
    set_index: usize,
    set: &ResourceSet<B>,
) {
    let base = resource_base(layouts, set_index);
    for (binding, resource) in set.iter() {
        let index = native_index(binding, base);
        let vertex = binding.stages.contains(ShaderStages::VERTEX);
        let fragment = binding.stages.contains(ShaderStages::FRAGMENT);
        match resource {
            BindableResource::Buffer { buffer, offset } => {
                // Vertex buffers own the low vertex-stage buffer indices.
                if vertex {
                    encoder.set_vertex_buffer(buffer.raw(), *offset, index + vertex_buffer_count);
                }
                if fragment {
                    encoder.set_fragment_buffer(buffer.raw(), *offset, index);
                }
            }
            BindableResource::Texture(texture) => {
                if let Some(raw) = texture.device_texture() {
                    if vertex {
                        encoder.set_vertex_texture(raw, index);
                    }
                    if fragment {
                        encoder.set_fragment_texture(raw, index);
                    }
                }
            }
            BindableResource::Sampler(sampler) => {
                if vertex {
                    encoder.set_vertex_sampler(sampler.raw(), index);
                }
                if fragment {
                    encoder.set_fragment_sampler(sampler.raw(), index);
                }
            }
        }
    }
    tracing::trace!(set_index, bindings = set.resources().len(), "Activated graphics resource set");
}

/// Fail if `set` contains compute-stage bindings the compute encoder cannot take.
pub(crate) fn check_compute_set<B: Backend>(set_index: usize, set: &ResourceSet<B>) -> Result<()> {
    for (binding, _) in set.iter() {
        if binding.stages.contains(ShaderStages::COMPUTE)
            && binding.kind.class() != ResourceClass::Buffer
        {
            return Err(CmdListError::UnsupportedBinding(format!(
                "{:?} '{}' in compute resource set {}",
                binding.kind, binding.name, set_index
            )));
        }
    }
    Ok(())
}

/// Push the compute-stage buffers of `set` to the compute encoder.
///
/// Callers run [`check_compute_set`] first.
pub(crate) fn activate_compute_set<B: Backend>(
    encoder: &mut B::ComputeEncoder,
    layouts: &[Arc<ResourceLayout>],
    set_index: usize,
    set: &ResourceSet<B>,
) {
    let base = resource_base(layouts, set_index);
    for (binding, resource) in set.iter() {
        if !binding.stages.contains(ShaderStages::COMPUTE) {
            continue;
        }
        if let BindableResource::Buffer { buffer, offset } = resource {
            encoder.set_buffer(buffer.raw(), *offset, native_index(binding, base));
        }
    }
    tracing::trace!(set_index, "Activated compute resource set");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rhi::{ResourceKind, ResourceLayoutElement};

    fn layout(kinds: &[ResourceKind]) -> Arc<ResourceLayout> {
        Arc::new(ResourceLayout::new(kinds.iter().enumerate().map(|(i, kind)| {
            ResourceLayoutElement::new(format!("b{}", i), *kind, ShaderStages::FRAGMENT)
        })))
    }

    #[test]
    fn test_base_sums_previous_sets() {
        let layouts = vec![
            layout(&[ResourceKind::UniformBuffer, ResourceKind::TextureReadOnly]),
            layout(&[
                ResourceKind::UniformBuffer,
                ResourceKind::StructuredBufferReadOnly,
                ResourceKind::Sampler,
            ]),
            layout(&[ResourceKind::TextureReadWrite]),
        ];

        assert_eq!(resource_base(&layouts, 0), ResourceCounts::default());
        assert_eq!(
            resource_base(&layouts, 1),
            ResourceCounts {
                buffers: 1,
                textures: 1,
                samplers: 0
            }
        );
        assert_eq!(
            resource_base(&layouts, 2),
            ResourceCounts {
                buffers: 3,
                textures: 1,
                samplers: 1
            }
        );
    }

    #[test]
    fn test_base_past_end_saturates_at_total() {
        let layouts = vec![layout(&[ResourceKind::UniformBuffer])];
        assert_eq!(resource_base(&layouts, 5).buffers, 1);
    }
}
