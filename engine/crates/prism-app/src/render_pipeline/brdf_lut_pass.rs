use ash::vk;
use prism_gfx::commands::command_context::GfxCommandContext;
use prism_gfx::device::GfxResource;
use prism_gfx::resources::pipeline::{ComputePipeline, ComputePipelineDesc};
use prism_gfx::resources::texture::{Texture2D, Texture2DDesc};
use prism_render_graph::graph::dependency_builder::GraphDependencyBuilder;
use prism_render_graph::pass::{PassKind, RenderPass, RenderPassMetadata, RenderPassType};
use prism_render_graph::resource::builder::GraphResourceBuilder;

pub const BRDF_LUT: &str = "brdf_lut";

const LUT_SIZE: u32 = 256;
const GROUP_SIZE: u32 = 16;

/// 预积分 split-sum 的 BRDF 查找表
///
/// 结果与视口无关，只在启动与 resize 后烘焙一次。
pub struct BrdfLutPass {
    meta: RenderPassMetadata,
}
impl Default for BrdfLutPass {
    fn default() -> Self {
        Self::new()
    }
}
impl BrdfLutPass {
    pub fn new() -> Self {
        Self {
            meta: RenderPassMetadata::new("brdf_lut").with_kind(PassKind::Compute).with_type(RenderPassType::OneHit),
        }
    }
}
impl RenderPass for BrdfLutPass {
    fn metadata(&self) -> &RenderPassMetadata {
        &self.meta
    }

    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
        builder.write(BRDF_LUT);
    }

    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
        let flags = resources.default_flags();
        let desc = Texture2DDesc::new(LUT_SIZE, LUT_SIZE, vk::Format::R16G16_SFLOAT)
            .with_usage(vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::SAMPLED);
        resources.create_texture_2d(BRDF_LUT, desc, flags)?;
        resources.create_compute_pipeline(
            "brdf_lut_pipeline",
            ComputePipelineDesc::new("brdf_lut.comp").with_entry_point("integrate_brdf"),
            flags,
        )?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut GfxCommandContext, resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        let lut = resources.get::<Texture2D>(BRDF_LUT)?.get()?;
        ctx.bind(resources.get::<ComputePipeline>("brdf_lut_pipeline")?.get()?.object_id());
        ctx.bind(lut.object_id());
        ctx.dispatch(lut.width().div_ceil(GROUP_SIZE), lut.height().div_ceil(GROUP_SIZE), 1);

        log::info!("brdf lut baked ({}x{})", lut.width(), lut.height());
        Ok(())
    }
}
