// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Compiled pipeline objects as seen by the recorder.

use std::sync::Arc;

use super::{
    Backend, CullMode, DepthClipMode, Extent3d, FrontFace, PrimitiveTopology, ResourceLayout,
    RgbaFloat,
};

/// Graphics pipeline state.
///
/// Native state objects are created by the device; the recorder only reads
/// them back when the pipeline becomes current on a render encoder.
#[derive(Debug)]
pub struct GraphicsPipeline<B: Backend> {
    pub render_pipeline_state: B::RenderPipelineState,
    pub depth_stencil_state: B::DepthStencilState,
    /// Resource set layouts, indexed by set slot.
    pub resource_layouts: Vec<Arc<ResourceLayout>>,
    /// Vertex buffers occupy the first native vertex-stage buffer indices.
    pub vertex_buffer_count: u32,
    pub topology: PrimitiveTopology,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub blend_color: RgbaFloat,
    pub depth_clip_mode: DepthClipMode,
    pub scissor_test_enabled: bool,
}

/// Compute pipeline state.
#[derive(Debug)]
pub struct ComputePipeline<B: Backend> {
    pub compute_pipeline_state: B::ComputePipelineState,
    pub resource_layouts: Vec<Arc<ResourceLayout>>,
    pub threads_per_group: Extent3d,
}

/// Either kind of pipeline, as accepted by `CommandList::set_pipeline`.
#[derive(Debug)]
pub enum Pipeline<B: Backend> {
    Graphics(Arc<GraphicsPipeline<B>>),
    Compute(Arc<ComputePipeline<B>>),
}

impl<B: Backend> Clone for Pipeline<B> {
    fn clone(&self) -> Self {
        match self {
            Self::Graphics(pipeline) => Self::Graphics(Arc::clone(pipeline)),
            Self::Compute(pipeline) => Self::Compute(Arc::clone(pipeline)),
        }
    }
}

impl<B: Backend> Pipeline<B> {
    pub fn is_compute(&self) -> bool {
        matches!(self, Self::Compute(_))
    }

    pub fn resource_layouts(&self) -> &[Arc<ResourceLayout>] {
        match self {
            Self::Graphics(pipeline) => &pipeline.resource_layouts,
            Self::Compute(pipeline) => &pipeline.resource_layouts,
        }
    }
}

impl<B: Backend> From<Arc<GraphicsPipeline<B>>> for Pipeline<B> {
    fn from(pipeline: Arc<GraphicsPipeline<B>>) -> Self {
        Self::Graphics(pipeline)
    }
}

impl<B: Backend> From<Arc<ComputePipeline<B>>> for Pipeline<B> {
    fn from(pipeline: Arc<ComputePipeline<B>>) -> Self {
        Self::Compute(pipeline)
    }
}
