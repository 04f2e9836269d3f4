use std::sync::Arc;

use ash::vk;
use prism_gfx::commands::command_context::GfxCommandContext;
use prism_gfx::device::{GfxDevice, GfxResource, GfxResourceKind};
use prism_gfx::headless::HeadlessDevice;
use prism_gfx::resources::gbuffer::{GBuffer, GBufferDesc};
use prism_gfx::resources::texture::{Texture2D, Texture2DDesc};
use prism_gfx::viewport::Viewport;
use prism_render_graph::RenderGraphError;
use prism_render_graph::executer::RenderGraphExecuter;
use prism_render_graph::graph::dependency_builder::GraphDependencyBuilder;
use prism_render_graph::graph::render_graph::RenderGraph;
use prism_render_graph::pass::{RenderPass, RenderPassMetadata};
use prism_render_graph::profiler::{CpuTimingProfiler, NullProfiler};
use prism_render_graph::resource::arena::SharedResourceArena;
use prism_render_graph::resource::builder::GraphResourceBuilder;
use prism_render_graph::resource::flags::ResourceCreationFlags;
use prism_render_graph::resource::resource_ref::TypedResourceRef;
use rstest::rstest;

struct GBufferPass {
    meta: RenderPassMetadata,
    gbuffer: Option<TypedResourceRef<GBuffer>>,
}
impl RenderPass for GBufferPass {
    fn metadata(&self) -> &RenderPassMetadata {
        &self.meta
    }

    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
        builder.write("gbuffer");
    }

    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
        let viewport = resources.viewport();
        let desc = GBufferDesc::deferred_default(viewport.width(), viewport.height());
        self.gbuffer = Some(resources.create_gbuffer("gbuffer", desc, ResourceCreationFlags::LAZY_INIT)?);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut GfxCommandContext, _resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        let gbuffer = self.gbuffer.as_ref().ok_or_else(|| anyhow::anyhow!("gbuffer pass not initialized"))?;
        gbuffer.get()?;
        ctx.draw(36, 1);
        Ok(())
    }

    fn release(&mut self) {
        self.gbuffer = None;
    }
}

struct LightingPass {
    meta: RenderPassMetadata,
}
impl RenderPass for LightingPass {
    fn metadata(&self) -> &RenderPassMetadata {
        &self.meta
    }

    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
        builder.read("gbuffer").write("hdr");
    }

    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
        let viewport = resources.viewport();
        let desc = Texture2DDesc::new(viewport.width(), viewport.height(), vk::Format::R16G16B16A16_SFLOAT);
        resources.create_texture_2d("hdr", desc, ResourceCreationFlags::LAZY_INIT)?;
        resources.create_texture_2d("lighting_tmp", desc, ResourceCreationFlags::SHARED)?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut GfxCommandContext, resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        // 句柄每次从构建器取，resize 之后自然拿到新的实例
        resources.get::<GBuffer>("gbuffer")?.get()?;
        resources.get::<Texture2D>("hdr")?.get()?;
        ctx.dispatch(8, 8, 1);
        Ok(())
    }
}

struct TonemapPass {
    meta: RenderPassMetadata,
}
impl RenderPass for TonemapPass {
    fn metadata(&self) -> &RenderPassMetadata {
        &self.meta
    }

    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
        builder.read("hdr").write("#backbuffer");
    }

    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
        let viewport = resources.viewport();
        let desc = Texture2DDesc::new(viewport.width(), viewport.height(), vk::Format::R16G16B16A16_SFLOAT);
        // 与 lighting_tmp 描述相同，可以复用同一个对象
        resources.create_texture_2d("tonemap_tmp", desc, ResourceCreationFlags::SHARED)?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut GfxCommandContext, resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        resources.get::<Texture2D>("hdr")?.get()?;
        ctx.draw(3, 1);
        Ok(())
    }
}

fn boxed_pass(name: &str) -> Box<dyn RenderPass> {
    match name {
        "gbuffer" => Box::new(GBufferPass {
            meta: RenderPassMetadata::draw("gbuffer"),
            gbuffer: None,
        }),
        "lighting" => Box::new(LightingPass {
            meta: RenderPassMetadata::compute("lighting"),
        }),
        _ => Box::new(TonemapPass {
            meta: RenderPassMetadata::draw("tonemap"),
        }),
    }
}

fn deferred_executer(order: [&str; 3], device: Arc<HeadlessDevice>) -> RenderGraphExecuter {
    let mut graph = RenderGraph::new();
    for name in order {
        graph.add_boxed_render_pass(boxed_pass(name)).unwrap();
    }
    let mut resources = GraphResourceBuilder::new(device);
    resources.set_viewport(Viewport::new(64, 64));
    RenderGraphExecuter::new(graph, resources)
}

#[rstest]
#[case(["gbuffer", "lighting", "tonemap"])]
#[case(["gbuffer", "tonemap", "lighting"])]
#[case(["lighting", "gbuffer", "tonemap"])]
#[case(["lighting", "tonemap", "gbuffer"])]
#[case(["tonemap", "gbuffer", "lighting"])]
#[case(["tonemap", "lighting", "gbuffer"])]
fn deferred_passes_execute_in_dependency_order(#[case] order: [&str; 3]) {
    let device = Arc::new(HeadlessDevice::new());
    let mut executer = deferred_executer(order, device.clone());
    executer.init(&mut NullProfiler).unwrap();

    let mut ctx = GfxCommandContext::new("frame");
    let mut profiler = CpuTimingProfiler::new();
    executer.execute(&mut ctx, &mut profiler).unwrap();

    assert_eq!(ctx.labels(), ["gbuffer", "lighting", "tonemap"]);
    assert_eq!(profiler.timings().count(), 3);

    // lighting_tmp 与 tonemap_tmp 共享同一个对象
    assert_eq!(device.created_count(GfxResourceKind::Texture2D), 2);
    let lighting_tmp = executer.resources().get::<Texture2D>("lighting_tmp").unwrap();
    let tonemap_tmp = executer.resources().get::<Texture2D>("tonemap_tmp").unwrap();
    assert_eq!(lighting_tmp.base().object_id(), tonemap_tmp.base().object_id());
}

#[test]
fn resize_round_trip_recreates_every_resource() {
    let device = Arc::new(HeadlessDevice::new());
    let mut executer = deferred_executer(["tonemap", "lighting", "gbuffer"], device.clone());
    executer.init(&mut NullProfiler).unwrap();

    let mut ctx = GfxCommandContext::new("frame");
    executer.execute(&mut ctx, &mut NullProfiler).unwrap();

    let old_hdr = executer.resources().get::<Texture2D>("hdr").unwrap();
    let old_gbuffer = executer.resources().get::<GBuffer>("gbuffer").unwrap();
    let old_ids = [old_hdr.get().unwrap().object_id(), old_gbuffer.get().unwrap().object_id()];
    let created_before = device.total_created();

    executer.resize_begin().unwrap();
    assert_eq!(device.live_objects(), 0);
    assert_eq!(device.used_bytes(), 0);
    assert!(!old_hdr.has_value());

    executer.set_viewport(Viewport::new(256, 128));
    executer.resize_end(&mut NullProfiler).unwrap();

    // 句柄不变，值是新构造的对象
    let new_hdr = executer.resources().get::<Texture2D>("hdr").unwrap();
    let new_gbuffer = executer.resources().get::<GBuffer>("gbuffer").unwrap();
    assert!(new_hdr.base().ptr_eq(old_hdr.base()));
    assert!(new_gbuffer.base().ptr_eq(old_gbuffer.base()));
    assert_ne!(old_hdr.get().unwrap().object_id(), old_ids[0]);
    assert_ne!(old_gbuffer.get().unwrap().object_id(), old_ids[1]);
    assert_eq!(old_hdr.get().unwrap().width(), 256);
    assert_eq!(old_gbuffer.get().unwrap().desc().width, 256);
    assert_eq!(device.total_created(), created_before * 2);

    for _ in 0..3 {
        ctx.reset();
        executer.execute(&mut ctx, &mut NullProfiler).unwrap();
        assert_eq!(ctx.labels(), ["gbuffer", "lighting", "tonemap"]);
    }

    executer.release().unwrap();
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn missing_producer_is_build_fatal() {
    let device = Arc::new(HeadlessDevice::new());
    let mut graph = RenderGraph::new();
    graph.add_boxed_render_pass(boxed_pass("tonemap")).unwrap();
    let mut executer = RenderGraphExecuter::new(graph, GraphResourceBuilder::new(device));

    let err = executer.init(&mut NullProfiler).unwrap_err();
    assert!(err.is_build_fatal());
    assert!(matches!(err, RenderGraphError::UnresolvedDependency { .. }));
}

#[test]
fn graphs_on_one_arena_share_resources() {
    let device = Arc::new(HeadlessDevice::new());
    let arena = SharedResourceArena::new();

    let backbuffer = device
        .create_texture_2d(&Texture2DDesc::new(64, 64, vk::Format::B8G8R8A8_UNORM), "backbuffer")
        .unwrap();
    arena.set_resource("#backbuffer", Arc::new(backbuffer));

    let mut executers = (0..2)
        .map(|_| {
            let mut graph = RenderGraph::new();
            for name in ["gbuffer", "lighting", "tonemap"] {
                graph.add_boxed_render_pass(boxed_pass(name)).unwrap();
            }
            let mut resources = GraphResourceBuilder::new(device.clone()).with_arena(arena.clone());
            resources.set_viewport(Viewport::new(64, 64));
            RenderGraphExecuter::new(graph, resources)
        })
        .collect::<Vec<_>>();

    for executer in &mut executers {
        executer.init(&mut NullProfiler).unwrap();
    }

    // 第二个图的临时纹理复用第一个图的；hdr 不是 Shared，各自一份
    assert_eq!(device.created_count(GfxResourceKind::Texture2D), 1 + 2 + 1);
    assert!(executers[1].graph().global_resources().contains("#backbuffer"));
    assert!(arena.get("#backbuffer").unwrap().has_value());

    for executer in &mut executers {
        executer.release().unwrap();
    }
    assert_eq!(device.live_objects(), 1);
}
