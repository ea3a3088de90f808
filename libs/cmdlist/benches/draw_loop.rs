// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use cmdlist::rhi::{
    BindableResource, BufferUsage, CullMode, DepthClipMode, Framebuffer, FramebufferAttachment,
    FrontFace, GraphicsPipeline, PixelFormat, PrimitiveTopology, ResourceKind, ResourceLayout,
    ResourceLayoutElement, ResourceSet, RgbaFloat, ShaderStages, TextureDescription, TextureUsage,
};
use cmdlist::{CommandList, CommandListConfig, TraceBackend, TraceDevice};

struct Scene {
    device: TraceDevice,
    list: CommandList<TraceBackend>,
    framebuffer: Arc<Framebuffer<TraceBackend>>,
    pipeline: Arc<GraphicsPipeline<TraceBackend>>,
    sets: Vec<Arc<ResourceSet<TraceBackend>>>,
}

fn scene(material_count: usize) -> Scene {
    let device = TraceDevice::new();
    let list = CommandList::new(device.clone(), CommandListConfig::default()).unwrap();

    let color = device.create_texture(TextureDescription::texture_2d(
        1920,
        1080,
        PixelFormat::Bgra8Unorm,
        TextureUsage::RENDER_TARGET,
    ));
    let framebuffer =
        Arc::new(Framebuffer::new(vec![FramebufferAttachment::new(color)], None).unwrap());

    let layout = Arc::new(ResourceLayout::new([
        ResourceLayoutElement::new("material", ResourceKind::UniformBuffer, ShaderStages::FRAGMENT),
        ResourceLayoutElement::new("albedo", ResourceKind::TextureReadOnly, ShaderStages::FRAGMENT),
        ResourceLayoutElement::new("sampler", ResourceKind::Sampler, ShaderStages::FRAGMENT),
    ]));
    let pipeline = Arc::new(GraphicsPipeline {
        render_pipeline_state: device.create_state_object(),
        depth_stencil_state: device.create_state_object(),
        resource_layouts: vec![layout.clone()],
        vertex_buffer_count: 1,
        topology: PrimitiveTopology::TriangleList,
        cull_mode: CullMode::Back,
        front_face: FrontFace::CounterClockwise,
        blend_color: RgbaFloat::BLACK,
        depth_clip_mode: DepthClipMode::Clip,
        scissor_test_enabled: false,
    });

    let sampler = device.create_sampler();
    let sets = (0..material_count)
        .map(|_| {
            let texture = device.create_texture(TextureDescription::texture_2d(
                256,
                256,
                PixelFormat::Rgba8Unorm,
                TextureUsage::SAMPLED,
            ));
            Arc::new(
                ResourceSet::new(
                    layout.clone(),
                    vec![
                        BindableResource::buffer(device.create_buffer(256, BufferUsage::UNIFORM)),
                        texture.into(),
                        sampler.clone().into(),
                    ],
                )
                .unwrap(),
            )
        })
        .collect();

    Scene {
        device,
        list,
        framebuffer,
        pipeline,
        sets,
    }
}

// Benchmark: one frame of draws, switching material every draw
fn bench_material_switching(c: &mut Criterion) {
    let mut group = c.benchmark_group("material_switching");

    for draw_count in [16u32, 256, 4096].iter() {
        group.throughput(Throughput::Elements(*draw_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(draw_count),
            draw_count,
            |b, &draw_count| {
                let mut scene = scene(8);
                let vertices = scene.device.create_buffer(1 << 16, BufferUsage::VERTEX);

                b.iter(|| {
                    let list = &mut scene.list;
                    list.begin().unwrap();
                    list.set_framebuffer(scene.framebuffer.clone()).unwrap();
                    list.clear_color_target(0, RgbaFloat::BLACK).unwrap();
                    list.set_pipeline(scene.pipeline.clone());
                    list.set_vertex_buffer(0, vertices.clone(), 0).unwrap();
                    for i in 0..draw_count {
                        let set = &scene.sets[i as usize % scene.sets.len()];
                        list.set_graphics_resource_set(0, set.clone()).unwrap();
                        list.draw(black_box(36), 1, 0, 0).unwrap();
                    }
                    list.end().unwrap();
                    list.commit().unwrap();
                    scene.device.take_commands();
                });
            },
        );
    }

    group.finish();
}

// Benchmark: small buffer updates interleaved with draws
fn bench_update_then_draw(c: &mut Criterion) {
    let mut scene = scene(1);
    let uniforms = scene.device.create_buffer(1024, BufferUsage::UNIFORM);
    let payload = [0u8; 64];

    c.bench_function("update_then_draw", |b| {
        b.iter(|| {
            let list = &mut scene.list;
            list.begin().unwrap();
            list.set_framebuffer(scene.framebuffer.clone()).unwrap();
            list.set_pipeline(scene.pipeline.clone());
            list.set_graphics_resource_set(0, scene.sets[0].clone())
                .unwrap();
            for slot in 0..16u64 {
                list.update_buffer(&uniforms, slot * 64, black_box(&payload))
                    .unwrap();
                list.draw(3, 1, 0, 0).unwrap();
            }
            list.end().unwrap();
            list.commit().unwrap().wait();
            scene.device.take_commands();
        });
    });
}

criterion_group!(benches, bench_material_switching, bench_update_then_draw);
criterion_main!(benches);
