use ash::vk;
use bytemuck::{Pod, Zeroable};
use prism_gfx::commands::command_context::GfxCommandContext;
use prism_gfx::device::GfxResource;
use prism_gfx::resources::buffer::StructuredBuffer;
use prism_gfx::resources::depth::DepthStencil;
use prism_gfx::resources::gbuffer::GBuffer;
use prism_gfx::resources::pipeline::{ComputePipeline, ComputePipelineDesc};
use prism_gfx::resources::sampler::{SamplerState, SamplerStateDesc};
use prism_gfx::resources::shadow_atlas::ShadowAtlas;
use prism_gfx::resources::texture::{Texture2D, Texture2DDesc};
use prism_render_graph::graph::dependency_builder::GraphDependencyBuilder;
use prism_render_graph::pass::{RenderPass, RenderPassMetadata};
use prism_render_graph::resource::builder::GraphResourceBuilder;
use prism_render_graph::resource::flags::ResourceCreationFlags;

use crate::render_pipeline::brdf_lut_pass::BRDF_LUT;
use crate::render_pipeline::gbuffer_pass::{GBUFFER, SCENE_DEPTH};
use crate::render_pipeline::shadow_pass::SHADOW_ATLAS;

pub const HDR_COLOR: &str = "hdr_color";
pub const LIGHTING_SCRATCH: &str = "lighting_scratch";

pub const HDR_FORMAT: vk::Format = vk::Format::R16G16B16A16_SFLOAT;

const TILE_SIZE: u32 = 8;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug)]
pub struct PointLight {
    pub position_radius: glam::Vec4,
    pub color_intensity: glam::Vec4,
}

/// 分块的 deferred 光照，结果写入 HDR 颜色
pub struct LightingPass {
    meta: RenderPassMetadata,
    lights: Vec<PointLight>,
}
impl LightingPass {
    pub fn new(lights: Vec<PointLight>) -> Self {
        Self {
            meta: RenderPassMetadata::compute("lighting"),
            lights,
        }
    }
}
impl RenderPass for LightingPass {
    fn metadata(&self) -> &RenderPassMetadata {
        &self.meta
    }

    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
        builder.read(GBUFFER).read(SCENE_DEPTH).read(SHADOW_ATLAS).read(BRDF_LUT).write(HDR_COLOR);
    }

    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
        let flags = resources.default_flags();
        let viewport = resources.viewport();
        let hdr_desc = Texture2DDesc::new(viewport.width(), viewport.height(), HDR_FORMAT)
            .with_usage(vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::SAMPLED);

        resources.create_texture_2d(HDR_COLOR, hdr_desc, flags)?;
        // 只在本 pass 内使用的临时纹理，可以与其他 pass 的同规格临时纹理复用
        resources.create_texture_2d(LIGHTING_SCRATCH, hdr_desc, flags | ResourceCreationFlags::SHARED)?;
        resources.create_sampler_state("shadow_sampler", SamplerStateDesc::shadow_compare(), flags)?;
        resources.create_compute_pipeline("lighting_pipeline", ComputePipelineDesc::new("deferred_lighting.comp"), flags)?;

        let light_buffer =
            resources.create_structured_buffer::<PointLight>("point_lights", self.lights.len().max(1) as u32, true)?;
        light_buffer.get()?.write(0, &self.lights)?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut GfxCommandContext, resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        let hdr = resources.get::<Texture2D>(HDR_COLOR)?.get()?;

        ctx.bind(resources.get::<ComputePipeline>("lighting_pipeline")?.get()?.object_id());
        ctx.bind(resources.get::<GBuffer>(GBUFFER)?.get()?.object_id());
        ctx.bind(resources.get::<DepthStencil>(SCENE_DEPTH)?.get()?.object_id());
        ctx.bind(resources.get::<ShadowAtlas>(SHADOW_ATLAS)?.get()?.object_id());
        ctx.bind(resources.get::<Texture2D>(BRDF_LUT)?.get()?.object_id());
        ctx.bind(resources.get::<SamplerState>("shadow_sampler")?.get()?.object_id());
        ctx.bind(resources.get::<StructuredBuffer<PointLight>>("point_lights")?.get()?.object_id());
        ctx.bind(resources.get::<Texture2D>(LIGHTING_SCRATCH)?.get()?.object_id());
        ctx.bind(hdr.object_id());

        ctx.dispatch(hdr.width().div_ceil(TILE_SIZE), hdr.height().div_ceil(TILE_SIZE), 1);
        Ok(())
    }
}
