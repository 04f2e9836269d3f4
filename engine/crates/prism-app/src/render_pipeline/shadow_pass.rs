use ash::vk;
use prism_gfx::commands::command_context::GfxCommandContext;
use prism_gfx::device::GfxResource;
use prism_gfx::resources::pipeline::{GraphicsPipelineState, GraphicsPipelineStateDesc};
use prism_gfx::resources::shadow_atlas::{ShadowAtlas, ShadowAtlasDesc};
use prism_render_graph::graph::dependency_builder::GraphDependencyBuilder;
use prism_render_graph::pass::{RenderPass, RenderPassMetadata};
use prism_render_graph::resource::builder::GraphResourceBuilder;
use prism_render_graph::resource::resource_ref::TypedResourceRef;

pub const SHADOW_ATLAS: &str = "shadow_atlas";

/// 把所有光源的深度渲染进同一张 atlas
pub struct ShadowPass {
    meta: RenderPassMetadata,
    atlas_size: u32,
    cascades: u32,

    atlas: Option<TypedResourceRef<ShadowAtlas>>,
    pipeline: Option<TypedResourceRef<GraphicsPipelineState>>,
}
impl ShadowPass {
    pub fn new(atlas_size: u32, cascades: u32) -> Self {
        Self {
            meta: RenderPassMetadata::draw("shadow"),
            atlas_size,
            cascades,
            atlas: None,
            pipeline: None,
        }
    }
}
impl RenderPass for ShadowPass {
    fn metadata(&self) -> &RenderPassMetadata {
        &self.meta
    }

    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
        builder.write(SHADOW_ATLAS);
    }

    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
        let flags = resources.default_flags();
        // atlas 大小与视口无关
        self.atlas = Some(resources.create_shadow_atlas(
            SHADOW_ATLAS,
            ShadowAtlasDesc::new(self.atlas_size, self.cascades),
            flags,
        )?);

        let pipeline_desc = GraphicsPipelineStateDesc::new("shadow.vert", "shadow.frag")
            .with_depth_format(vk::Format::D32_SFLOAT)
            .with_cull_mode(vk::CullModeFlags::FRONT);
        self.pipeline = Some(resources.create_graphics_pipeline_state("shadow_pso", pipeline_desc, flags)?);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut GfxCommandContext, _resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        let (Some(atlas), Some(pipeline)) = (&self.atlas, &self.pipeline) else {
            anyhow::bail!("shadow pass executed before init");
        };
        let atlas = atlas.get()?;
        ctx.bind(pipeline.get()?.object_id());
        ctx.bind(atlas.object_id());
        for _ in 0..atlas.desc().layers {
            ctx.draw(36, 1);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.atlas = None;
        self.pipeline = None;
    }
}
