use std::sync::Arc;

use ash::vk;
use prism_crate_tools::config::RenderGraphSettings;
use prism_gfx::commands::command_context::GfxCommandContext;
use prism_gfx::device::GfxDevice;
use prism_gfx::headless::HeadlessDevice;
use prism_gfx::resources::texture::Texture2DDesc;
use prism_gfx::viewport::Viewport;
use prism_render_graph::RgResult;
use prism_render_graph::executer::RenderGraphExecuter;
use prism_render_graph::graph::render_graph::RenderGraph;
use prism_render_graph::profiler::CpuTimingProfiler;
use prism_render_graph::resource::arena::SharedResourceArena;

use crate::render_pipeline::BACKBUFFER;
use crate::render_pipeline::brdf_lut_pass::BrdfLutPass;
use crate::render_pipeline::gbuffer_pass::GBufferPass;
use crate::render_pipeline::lighting_pass::{LightingPass, PointLight};
use crate::render_pipeline::screenshot_pass::{SCREENSHOT_PASS, ScreenshotPass};
use crate::render_pipeline::shadow_pass::ShadowPass;
use crate::render_pipeline::tonemap_pass::TonemapPass;

const SHADOW_ATLAS_SIZE: u32 = 2048;
const SHADOW_CASCADES: u32 = 4;
const SCENE_DRAW_COUNT: u32 = 128;

/// 不依赖窗口的 deferred 渲染 app
///
/// backbuffer 由 app 自己创建并放进共享资源表，模拟 swapchain 的角色。
pub struct DeferredApp {
    device: Arc<HeadlessDevice>,
    arena: SharedResourceArena,
    executer: RenderGraphExecuter,
    profiler: CpuTimingProfiler,
    cmd: GfxCommandContext,
    frame_index: u64,
}

// new & init
impl DeferredApp {
    pub fn new(settings: &RenderGraphSettings) -> anyhow::Result<Self> {
        Self::with_device(Arc::new(HeadlessDevice::new()), settings)
    }

    pub fn with_device(device: Arc<HeadlessDevice>, settings: &RenderGraphSettings) -> anyhow::Result<Self> {
        let arena = SharedResourceArena::new();
        let graph = Self::build_graph()?;
        let executer = RenderGraphExecuter::from_settings(graph, device.clone(), Some(arena.clone()), settings)?;

        let mut app = Self {
            device,
            arena,
            executer,
            profiler: CpuTimingProfiler::new(),
            cmd: GfxCommandContext::new("deferred-frame"),
            frame_index: 0,
        };
        app.create_backbuffer(Viewport::new(settings.viewport_width, settings.viewport_height))?;
        app.executer.init(&mut app.profiler)?;

        log::info!(
            "deferred app initialized: {}x{}, {} device objects",
            settings.viewport_width,
            settings.viewport_height,
            app.device.live_objects()
        );
        Ok(app)
    }

    /// 注册顺序故意打乱，执行顺序只由依赖决定
    pub fn build_graph() -> RgResult<RenderGraph> {
        let lights = vec![
            PointLight {
                position_radius: glam::vec4(0.0, 4.0, 0.0, 10.0),
                color_intensity: glam::vec4(1.0, 0.95, 0.9, 20.0),
            },
            PointLight {
                position_radius: glam::vec4(-3.0, 1.0, 2.0, 5.0),
                color_intensity: glam::vec4(0.2, 0.4, 1.0, 8.0),
            },
        ];

        let mut graph = RenderGraph::new();
        graph.add_render_pass(TonemapPass::default())?;
        graph.add_render_pass(LightingPass::new(lights))?;
        graph.add_render_pass(ShadowPass::new(SHADOW_ATLAS_SIZE, SHADOW_CASCADES))?;
        graph.add_render_pass(GBufferPass::new(SCENE_DRAW_COUNT))?;
        graph.add_render_pass(BrdfLutPass::new())?;
        graph.add_render_pass(ScreenshotPass::new())?;
        Ok(graph)
    }

    fn create_backbuffer(&self, viewport: Viewport) -> anyhow::Result<()> {
        let desc = Texture2DDesc::new(viewport.width(), viewport.height(), vk::Format::B8G8R8A8_UNORM)
            .with_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC);
        let backbuffer = self.device.create_texture_2d(&desc, "backbuffer")?;
        self.arena.set_resource(BACKBUFFER, Arc::new(backbuffer));
        Ok(())
    }
}

// getters
impl DeferredApp {
    #[inline]
    pub fn executer(&self) -> &RenderGraphExecuter {
        &self.executer
    }

    #[inline]
    pub fn device(&self) -> &Arc<HeadlessDevice> {
        &self.device
    }

    #[inline]
    pub fn arena(&self) -> &SharedResourceArena {
        &self.arena
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// 最近一帧录制的命令
    #[inline]
    pub fn last_frame(&self) -> &GfxCommandContext {
        &self.cmd
    }
}

// update
impl DeferredApp {
    /// 录制一帧，返回实际执行的 pass 数量
    pub fn run_frame(&mut self) -> anyhow::Result<usize> {
        #[cfg(feature = "tracy")]
        let _span = tracy_client::span!("DeferredApp::run_frame");

        self.cmd.reset();
        let executed = self.executer.execute(&mut self.cmd, &mut self.profiler)?;
        self.frame_index += 1;
        log::debug!("frame {}: {} passes, {} commands", self.frame_index, executed, self.cmd.commands().len());
        Ok(executed)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        log::info!("resize to {width}x{height}");
        let viewport = Viewport::new(width, height);

        self.executer.resize_begin()?;
        self.create_backbuffer(viewport)?;
        self.executer.set_viewport(viewport);
        self.executer.resize_end(&mut self.profiler)?;
        Ok(())
    }

    /// 下一帧执行一次截图
    pub fn request_screenshot(&mut self) -> anyhow::Result<()> {
        self.executer.trigger_pass(SCREENSHOT_PASS)?;
        Ok(())
    }

    /// 释放渲染图与 backbuffer，打印各 pass 的耗时
    pub fn shutdown(mut self) -> anyhow::Result<()> {
        self.profiler.log_summary();
        self.executer.release()?;
        self.arena.remove(BACKBUFFER);

        let leaked = self.device.live_objects();
        if leaked != 0 {
            log::warn!("{leaked} device objects still alive after shutdown");
        } else {
            log::info!("shutdown after {} frames, all device objects released", self.frame_index);
        }
        Ok(())
    }
}
