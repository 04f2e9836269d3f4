use prism_gfx::commands::command_context::GfxCommandContext;
use prism_gfx::device::GfxResource;
use prism_gfx::resources::buffer::StructuredUavBuffer;
use prism_gfx::resources::texture::Texture2D;
use prism_render_graph::graph::dependency_builder::GraphDependencyBuilder;
use prism_render_graph::pass::{PassKind, RenderPass, RenderPassMetadata, RenderPassType};
use prism_render_graph::resource::builder::GraphResourceBuilder;
use prism_render_graph::resource::resource_ref::TypedResourceRef;

use crate::render_pipeline::BACKBUFFER;

pub const SCREENSHOT_PASS: &str = "screenshot";

const GROUP_SIZE: u32 = 16;

/// 把 backbuffer 拷贝到可回读的 buffer，只在 `trigger_pass` 之后的那一帧执行
pub struct ScreenshotPass {
    meta: RenderPassMetadata,
    readback: Option<TypedResourceRef<StructuredUavBuffer<u32>>>,
    captured: u32,
}
impl Default for ScreenshotPass {
    fn default() -> Self {
        Self::new()
    }
}
impl ScreenshotPass {
    pub fn new() -> Self {
        Self {
            meta: RenderPassMetadata::new(SCREENSHOT_PASS)
                .with_kind(PassKind::Compute)
                .with_type(RenderPassType::Trigger),
            readback: None,
            captured: 0,
        }
    }
}
impl RenderPass for ScreenshotPass {
    fn metadata(&self) -> &RenderPassMetadata {
        &self.meta
    }

    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
        builder.read(BACKBUFFER).run_after_all();
    }

    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
        let output = resources.output_viewport();
        // 每个像素一个 RGBA8
        let pixels = output.width() * output.height();
        self.readback = Some(resources.create_structured_uav_buffer::<u32>("screenshot_readback", pixels, false)?);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut GfxCommandContext, resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        let Some(readback) = &self.readback else {
            anyhow::bail!("screenshot pass executed before init");
        };
        let readback = readback.get()?;
        let Some(backbuffer) = resources.try_get::<Texture2D>(BACKBUFFER).and_then(|backbuffer| backbuffer.value())
        else {
            log::warn!("screenshot requested without a backbuffer, skipped");
            return Ok(());
        };

        ctx.bind(backbuffer.object_id());
        ctx.bind(readback.object_id());
        ctx.dispatch(backbuffer.width().div_ceil(GROUP_SIZE), backbuffer.height().div_ceil(GROUP_SIZE), 1);

        self.captured += 1;
        log::info!("screenshot #{} captured: {}x{}", self.captured, backbuffer.width(), backbuffer.height());
        Ok(())
    }

    fn release(&mut self) {
        self.readback = None;
    }
}
