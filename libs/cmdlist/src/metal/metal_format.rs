// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Conversions from recorder state values to Metal enums.

use metal::{
    MTLClearColor, MTLCullMode, MTLDepthClipMode, MTLIndexType, MTLLoadAction, MTLOrigin,
    MTLPixelFormat, MTLPrimitiveType, MTLScissorRect, MTLSize, MTLStoreAction, MTLTextureType,
    MTLTextureUsage, MTLViewport, MTLWinding,
};

use crate::core::rhi::{
    CullMode, DepthClipMode, Extent3d, FrontFace, IndexFormat, LoadAction, Origin3d, PixelFormat,
    PrimitiveTopology, RgbaFloat, ScissorRect, StoreAction, TextureKind, TextureUsage, Viewport,
};

pub(super) fn pixel_format(format: PixelFormat) -> MTLPixelFormat {
    match format {
        PixelFormat::R8Unorm => MTLPixelFormat::R8Unorm,
        PixelFormat::R16Float => MTLPixelFormat::R16Float,
        PixelFormat::R32Float => MTLPixelFormat::R32Float,
        PixelFormat::Rg8Unorm => MTLPixelFormat::RG8Unorm,
        PixelFormat::Rgba8Unorm => MTLPixelFormat::RGBA8Unorm,
        PixelFormat::Rgba8UnormSrgb => MTLPixelFormat::RGBA8Unorm_sRGB,
        PixelFormat::Bgra8Unorm => MTLPixelFormat::BGRA8Unorm,
        PixelFormat::Bgra8UnormSrgb => MTLPixelFormat::BGRA8Unorm_sRGB,
        PixelFormat::Rgba16Float => MTLPixelFormat::RGBA16Float,
        PixelFormat::Rgba32Float => MTLPixelFormat::RGBA32Float,
        PixelFormat::D32Float => MTLPixelFormat::Depth32Float,
        PixelFormat::D24UnormS8Uint => MTLPixelFormat::Depth24Unorm_Stencil8,
        PixelFormat::D32FloatS8Uint => MTLPixelFormat::Depth32Float_Stencil8,
        PixelFormat::Bc1RgbaUnorm => MTLPixelFormat::BC1_RGBA,
        PixelFormat::Bc3Unorm => MTLPixelFormat::BC3_RGBA,
        PixelFormat::Bc7Unorm => MTLPixelFormat::BC7_RGBAUnorm,
    }
}

pub(super) fn texture_usage(usage: TextureUsage) -> MTLTextureUsage {
    let mut metal_usage = MTLTextureUsage::empty();
    if usage.contains(TextureUsage::SAMPLED) {
        metal_usage |= MTLTextureUsage::ShaderRead;
    }
    if usage.contains(TextureUsage::STORAGE) {
        metal_usage |= MTLTextureUsage::ShaderRead | MTLTextureUsage::ShaderWrite;
    }
    if usage.intersects(TextureUsage::RENDER_TARGET | TextureUsage::DEPTH_STENCIL) {
        metal_usage |= MTLTextureUsage::RenderTarget;
    }
    metal_usage
}

pub(super) fn texture_type(kind: TextureKind, array_layers: u32, sample_count: u32) -> MTLTextureType {
    match kind {
        TextureKind::Texture1D if array_layers > 1 => MTLTextureType::D1Array,
        TextureKind::Texture1D => MTLTextureType::D1,
        TextureKind::Texture2D if sample_count > 1 => MTLTextureType::D2Multisample,
        TextureKind::Texture2D if array_layers > 1 => MTLTextureType::D2Array,
        TextureKind::Texture2D => MTLTextureType::D2,
        TextureKind::Texture3D => MTLTextureType::D3,
    }
}

pub(super) fn primitive_type(topology: PrimitiveTopology) -> MTLPrimitiveType {
    match topology {
        PrimitiveTopology::PointList => MTLPrimitiveType::Point,
        PrimitiveTopology::LineList => MTLPrimitiveType::Line,
        PrimitiveTopology::LineStrip => MTLPrimitiveType::LineStrip,
        PrimitiveTopology::TriangleList => MTLPrimitiveType::Triangle,
        PrimitiveTopology::TriangleStrip => MTLPrimitiveType::TriangleStrip,
    }
}

pub(super) fn index_type(format: IndexFormat) -> MTLIndexType {
    match format {
        IndexFormat::Uint16 => MTLIndexType::UInt16,
        IndexFormat::Uint32 => MTLIndexType::UInt32,
    }
}

pub(super) fn cull_mode(mode: CullMode) -> MTLCullMode {
    match mode {
        CullMode::None => MTLCullMode::None,
        CullMode::Front => MTLCullMode::Front,
        CullMode::Back => MTLCullMode::Back,
    }
}

pub(super) fn winding(front_face: FrontFace) -> MTLWinding {
    match front_face {
        FrontFace::Clockwise => MTLWinding::Clockwise,
        FrontFace::CounterClockwise => MTLWinding::CounterClockwise,
    }
}

pub(super) fn depth_clip_mode(mode: DepthClipMode) -> MTLDepthClipMode {
    match mode {
        DepthClipMode::Clip => MTLDepthClipMode::Clip,
        DepthClipMode::Clamp => MTLDepthClipMode::Clamp,
    }
}

pub(super) fn load_action(action: LoadAction) -> MTLLoadAction {
    match action {
        LoadAction::DontCare => MTLLoadAction::DontCare,
        LoadAction::Load => MTLLoadAction::Load,
        LoadAction::Clear => MTLLoadAction::Clear,
    }
}

pub(super) fn store_action(action: StoreAction) -> MTLStoreAction {
    match action {
        StoreAction::DontCare => MTLStoreAction::DontCare,
        StoreAction::Store => MTLStoreAction::Store,
        StoreAction::MultisampleResolve => MTLStoreAction::MultisampleResolve,
    }
}

pub(super) fn clear_color(color: RgbaFloat) -> MTLClearColor {
    MTLClearColor::new(
        color.r as f64,
        color.g as f64,
        color.b as f64,
        color.a as f64,
    )
}

pub(super) fn viewport(viewport: &Viewport) -> MTLViewport {
    MTLViewport {
        originX: viewport.x as f64,
        originY: viewport.y as f64,
        width: viewport.width as f64,
        height: viewport.height as f64,
        znear: viewport.min_depth as f64,
        zfar: viewport.max_depth as f64,
    }
}

pub(super) fn scissor_rect(rect: &ScissorRect) -> MTLScissorRect {
    MTLScissorRect {
        x: rect.x as u64,
        y: rect.y as u64,
        width: rect.width as u64,
        height: rect.height as u64,
    }
}

pub(super) fn size(extent: Extent3d) -> MTLSize {
    MTLSize::new(extent.width as u64, extent.height as u64, extent.depth as u64)
}

pub(super) fn origin(origin: Origin3d) -> MTLOrigin {
    MTLOrigin {
        x: origin.x as u64,
        y: origin.y as u64,
        z: origin.z as u64,
    }
}
