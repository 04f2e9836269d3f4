use ash::vk;
use prism_gfx::commands::command_context::GfxCommandContext;
use prism_gfx::device::GfxResource;
use prism_gfx::resources::pipeline::{GraphicsPipelineState, GraphicsPipelineStateDesc};
use prism_gfx::resources::sampler::{SamplerState, SamplerStateDesc};
use prism_gfx::resources::texture::{Texture2D, Texture2DDesc};
use prism_render_graph::graph::dependency_builder::GraphDependencyBuilder;
use prism_render_graph::pass::{RenderPass, RenderPassMetadata};
use prism_render_graph::resource::builder::GraphResourceBuilder;
use prism_render_graph::resource::flags::ResourceCreationFlags;

use crate::render_pipeline::BACKBUFFER;
use crate::render_pipeline::lighting_pass::{HDR_COLOR, HDR_FORMAT};

pub const TONEMAP_SCRATCH: &str = "tonemap_scratch";

/// HDR -> LDR，输出到窗口分辨率的 backbuffer
pub struct TonemapPass {
    meta: RenderPassMetadata,
}
impl Default for TonemapPass {
    fn default() -> Self {
        Self {
            meta: RenderPassMetadata::draw("tonemap"),
        }
    }
}
impl RenderPass for TonemapPass {
    fn metadata(&self) -> &RenderPassMetadata {
        &self.meta
    }

    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
        builder.read(HDR_COLOR).write(BACKBUFFER);
    }

    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
        let flags = resources.default_flags();
        let viewport = resources.viewport();

        // 与 lighting 的临时纹理规格相同，构造时会直接复用
        let scratch_desc = Texture2DDesc::new(viewport.width(), viewport.height(), HDR_FORMAT)
            .with_usage(vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::SAMPLED);
        resources.create_texture_2d(TONEMAP_SCRATCH, scratch_desc, flags | ResourceCreationFlags::SHARED)?;

        resources.create_sampler_state("tonemap_sampler", SamplerStateDesc::linear_clamp(), flags)?;
        resources.create_graphics_pipeline_state(
            "tonemap_pso",
            GraphicsPipelineStateDesc::fullscreen("tonemap_aces.frag", vk::Format::B8G8R8A8_UNORM),
            flags,
        )?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut GfxCommandContext, resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        ctx.bind(resources.get::<GraphicsPipelineState>("tonemap_pso")?.get()?.object_id());
        ctx.bind(resources.get::<SamplerState>("tonemap_sampler")?.get()?.object_id());
        ctx.bind(resources.get::<Texture2D>(HDR_COLOR)?.get()?.object_id());
        ctx.bind(resources.get::<Texture2D>(TONEMAP_SCRATCH)?.get()?.object_id());

        match resources.try_get::<Texture2D>(BACKBUFFER).and_then(|backbuffer| backbuffer.value()) {
            Some(backbuffer) => ctx.bind(backbuffer.object_id()),
            None => log::trace!("tonemap: no backbuffer bound, output dropped"),
        }
        ctx.draw(3, 1);
        Ok(())
    }
}
