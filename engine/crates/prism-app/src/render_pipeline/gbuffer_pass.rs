use ash::vk;
use bytemuck::{Pod, Zeroable};
use prism_gfx::commands::command_context::GfxCommandContext;
use prism_gfx::device::GfxResource;
use prism_gfx::resources::buffer::ConstantBuffer;
use prism_gfx::resources::depth::{DepthStencil, DepthStencilBufferDesc};
use prism_gfx::resources::gbuffer::{GBuffer, GBufferDesc};
use prism_gfx::resources::pipeline::{GraphicsPipelineState, GraphicsPipelineStateDesc};
use prism_render_graph::graph::dependency_builder::GraphDependencyBuilder;
use prism_render_graph::pass::{RenderPass, RenderPassMetadata};
use prism_render_graph::resource::builder::GraphResourceBuilder;
use prism_render_graph::resource::resource_ref::TypedResourceRef;

pub const GBUFFER: &str = "gbuffer";
pub const SCENE_DEPTH: &str = "scene_depth";
pub const FRAME_CONSTANTS: &str = "frame_constants";

/// 每帧更新一次的相机常量
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug)]
pub struct FrameConstants {
    pub view_proj: glam::Mat4,
    pub viewport_size: glam::Vec4,
    pub frame_index: u32,
    pub _padding: [u32; 3],
}

/// 场景几何写入 G-Buffer 与深度
pub struct GBufferPass {
    meta: RenderPassMetadata,
    frame_index: u32,
    draw_count: u32,

    gbuffer: Option<TypedResourceRef<GBuffer>>,
    depth: Option<TypedResourceRef<DepthStencil>>,
    pipeline: Option<TypedResourceRef<GraphicsPipelineState>>,
    constants: Option<TypedResourceRef<ConstantBuffer<FrameConstants>>>,
}
impl GBufferPass {
    pub fn new(draw_count: u32) -> Self {
        Self {
            meta: RenderPassMetadata::draw("gbuffer"),
            frame_index: 0,
            draw_count,
            gbuffer: None,
            depth: None,
            pipeline: None,
            constants: None,
        }
    }

    fn frame_constants(&self, width: u32, height: u32) -> FrameConstants {
        let aspect = width as f32 / height.max(1) as f32;
        let proj = glam::Mat4::perspective_rh(60f32.to_radians(), aspect, 0.1, 1000.0);
        let view = glam::Mat4::look_at_rh(glam::vec3(0.0, 2.0, 6.0), glam::Vec3::ZERO, glam::Vec3::Y);
        FrameConstants {
            view_proj: proj * view,
            viewport_size: glam::vec4(width as f32, height as f32, 1.0 / width as f32, 1.0 / height as f32),
            frame_index: self.frame_index,
            _padding: [0; 3],
        }
    }
}
impl RenderPass for GBufferPass {
    fn metadata(&self) -> &RenderPassMetadata {
        &self.meta
    }

    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
        builder.write(GBUFFER).write(SCENE_DEPTH);
    }

    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
        let flags = resources.default_flags();
        let viewport = resources.viewport();
        let (width, height) = (viewport.width(), viewport.height());

        let gbuffer_desc = GBufferDesc::deferred_default(width, height);
        let pipeline_desc = GraphicsPipelineStateDesc::new("gbuffer.vert", "gbuffer.frag")
            .with_color_formats(&gbuffer_desc.formats)
            .with_depth_format(vk::Format::D32_SFLOAT);

        self.gbuffer = Some(resources.create_gbuffer(GBUFFER, gbuffer_desc, flags)?);
        self.depth = Some(resources.create_depth_stencil_buffer(
            SCENE_DEPTH,
            DepthStencilBufferDesc::new(width, height, vk::Format::D32_SFLOAT),
            flags,
        )?);
        self.pipeline = Some(resources.create_graphics_pipeline_state("gbuffer_pso", pipeline_desc, flags)?);

        // 常量缓冲不参与延迟构造，这里已经有值
        let constants = self.frame_constants(width, height);
        self.constants = Some(resources.create_constant_buffer_with(FRAME_CONSTANTS, &constants)?);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut GfxCommandContext, _resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        let (Some(gbuffer), Some(depth), Some(pipeline), Some(constants)) =
            (&self.gbuffer, &self.depth, &self.pipeline, &self.constants)
        else {
            anyhow::bail!("gbuffer pass executed before init");
        };
        let gbuffer = gbuffer.get()?;
        let depth = depth.get()?;
        let constants = constants.get()?;

        self.frame_index = self.frame_index.wrapping_add(1);
        let desc = gbuffer.desc();
        constants.update(&self.frame_constants(desc.width, desc.height))?;

        ctx.bind(pipeline.get()?.object_id());
        ctx.bind(gbuffer.object_id());
        ctx.bind(depth.object_id());
        ctx.bind(constants.object_id());
        ctx.draw(self.draw_count * 3, 1);
        Ok(())
    }

    fn release(&mut self) {
        self.gbuffer = None;
        self.depth = None;
        self.pipeline = None;
        self.constants = None;
    }
}
