//! 渲染图执行器
//!
//! 驱动所有 pass 的生命周期：
//!
//! - `init`：按执行顺序调用 `pass.init`（期间绑定节点的资源容器），随后统一 `create_resources`，最后 `prepare`
//! - `execute`：按执行顺序录制每个 pass，OneHit / Trigger 类型的 pass 受门控
//! - `resize_begin` / `resize_end`：释放所有资源的值（句柄保留），按新的视口重新 init
//! - `release`：终止状态，之后的任何调用都返回 `InvalidState`

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use prism_crate_tools::config::RenderGraphSettings;
use prism_gfx::commands::command_context::GfxCommandContext;
use prism_gfx::device::GfxDevice;
use prism_gfx::viewport::Viewport;

use crate::error::{RenderGraphError, RgResult};
use crate::graph::render_graph::RenderGraph;
use crate::pass::{PassState, RenderPassType};
use crate::profiler::CpuProfiler;
use crate::resource::arena::SharedResourceArena;
use crate::resource::builder::GraphResourceBuilder;
use crate::resource::flags::ResourceCreationFlags;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum ExecuterPhase {
    /// 尚未 init
    Idle,
    Ready,
    /// `resize_begin` 之后，等待 `resize_end`
    Resizing,
    Released,
}

pub struct RenderGraphExecuter {
    graph: RenderGraph,
    resources: GraphResourceBuilder,

    states: HashMap<String, PassState>,
    /// 本周期内已经执行过的 OneHit pass
    one_hit_fired: HashSet<String>,
    /// 等待执行的 Trigger pass
    trigger_pending: HashSet<String>,

    phase: ExecuterPhase,
    print_execution_plan: bool,
}

// new & init
impl RenderGraphExecuter {
    pub fn new(graph: RenderGraph, resources: GraphResourceBuilder) -> Self {
        let states = graph.nodes().iter().map(|node| (node.name().to_string(), PassState::Registered)).collect();
        Self {
            graph,
            resources,
            states,
            one_hit_fired: HashSet::new(),
            trigger_pending: HashSet::new(),
            phase: ExecuterPhase::Idle,
            print_execution_plan: false,
        }
    }

    /// 按配置创建资源构建器：视口、默认创建 flags、跨图共享
    pub fn from_settings(
        graph: RenderGraph,
        device: Arc<dyn GfxDevice>,
        arena: Option<SharedResourceArena>,
        settings: &RenderGraphSettings,
    ) -> RgResult<Self> {
        let default_flags = ResourceCreationFlags::from_names(settings.default_creation_flags.as_slice())?;
        let viewport = Viewport::new(settings.viewport_width, settings.viewport_height);

        let mut resources = GraphResourceBuilder::new(device).with_default_flags(default_flags);
        if let Some(arena) = arena {
            resources = resources.with_arena(arena).with_cross_graph_sharing(settings.cross_graph_sharing);
        }
        resources.set_viewport(viewport);
        resources.set_output_viewport(viewport);

        let mut executer = Self::new(graph, resources);
        executer.print_execution_plan = settings.print_execution_plan;
        Ok(executer)
    }

    pub fn with_print_execution_plan(mut self, enabled: bool) -> Self {
        self.print_execution_plan = enabled;
        self
    }

    /// 构建渲染图（若尚未构建），然后 init 所有 pass 并构造资源
    pub fn init(&mut self, profiler: &mut dyn CpuProfiler) -> RgResult<()> {
        #[cfg(feature = "tracy")]
        let _span = tracy_client::span!("RenderGraphExecuter::init");

        match self.phase {
            ExecuterPhase::Idle => {}
            ExecuterPhase::Ready => return Err(Self::invalid("init called twice")),
            ExecuterPhase::Resizing => return Err(Self::invalid("init called during resize, use resize_end")),
            ExecuterPhase::Released => return Err(Self::invalid("init after release")),
        }

        self.ensure_built()?;
        self.init_passes(profiler)
    }

    fn ensure_built(&mut self) -> RgResult<()> {
        if self.graph.is_built() {
            return Ok(());
        }
        self.graph.build()?;
        if self.print_execution_plan {
            self.graph.print_execution_plan();
        }
        Ok(())
    }

    fn init_passes(&mut self, profiler: &mut dyn CpuProfiler) -> RgResult<()> {
        let sorted = self.graph.sorted_node_indices().to_vec();

        for &index in &sorted {
            let node = self.graph.node_at_mut(index);
            let name = node.name().to_string();

            self.resources.set_container(Some(node.container().clone()));
            profiler.begin(&name);
            let result = node.pass_mut().init(&mut self.resources);
            profiler.end(&name);
            self.resources.set_container(None);

            result.map_err(|source| RenderGraphError::Pass {
                pass: name.clone(),
                stage: "init",
                source,
            })?;
            self.states.insert(name, PassState::Initialized);
        }

        self.resources.create_resources()?;

        for &index in &sorted {
            let node = self.graph.node_at_mut(index);
            let name = node.name().to_string();
            node.pass_mut().prepare(&self.resources).map_err(|source| RenderGraphError::Pass {
                pass: name.clone(),
                stage: "prepare",
                source,
            })?;
            self.states.insert(name, PassState::Prepared);
        }

        self.phase = ExecuterPhase::Ready;
        log::info!(
            "render graph initialized: {} passes, {} resources",
            sorted.len(),
            self.resources.resource_count()
        );
        Ok(())
    }
}

// getters
impl RenderGraphExecuter {
    #[inline]
    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    #[inline]
    pub fn resources(&self) -> &GraphResourceBuilder {
        &self.resources
    }

    #[inline]
    pub fn resources_mut(&mut self) -> &mut GraphResourceBuilder {
        &mut self.resources
    }

    pub fn pass_state(&self, name: &str) -> Option<PassState> {
        self.states.get(name).copied()
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.phase == ExecuterPhase::Released
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.phase == ExecuterPhase::Ready
    }
}

// execute
impl RenderGraphExecuter {
    /// 按执行顺序录制所有 pass，返回实际执行的 pass 数量
    pub fn execute(&mut self, ctx: &mut GfxCommandContext, profiler: &mut dyn CpuProfiler) -> RgResult<usize> {
        #[cfg(feature = "tracy")]
        let _span = tracy_client::span!("RenderGraphExecuter::execute");

        if self.phase != ExecuterPhase::Ready {
            return Err(Self::invalid(format!("execute in phase {:?}", self.phase)));
        }

        let mut executed = 0;
        for index in self.graph.sorted_node_indices().to_vec() {
            let node = self.graph.node_at_mut(index);
            let name = node.name().to_string();
            let pass_type = node.metadata().pass_type();

            let skip = match pass_type {
                RenderPassType::Default => false,
                RenderPassType::OneHit => self.one_hit_fired.contains(&name),
                RenderPassType::Trigger => !self.trigger_pending.contains(&name),
            };
            if skip {
                log::trace!("skip pass '{name}' ({pass_type:?})");
                continue;
            }

            match self.states.get(&name) {
                Some(PassState::Prepared | PassState::Executing) => {}
                state => return Err(Self::invalid(format!("pass '{name}' executed in state {state:?}"))),
            }

            profiler.begin(&name);
            ctx.begin_label(&name);
            let result = node.pass_mut().execute(ctx, &self.resources);
            ctx.end_label();
            profiler.end(&name);

            result.map_err(|source| RenderGraphError::Pass {
                pass: name.clone(),
                stage: "execute",
                source,
            })?;
            executed += 1;

            match pass_type {
                RenderPassType::OneHit => {
                    self.one_hit_fired.insert(name.clone());
                }
                RenderPassType::Trigger => {
                    self.trigger_pending.remove(&name);
                }
                RenderPassType::Default => {}
            }
            self.states.insert(name, PassState::Executing);
        }
        Ok(executed)
    }

    /// 开始新的 OneHit 周期，所有 OneHit pass 会在下一帧重新执行一次
    pub fn trigger_one_hit(&mut self) {
        self.one_hit_fired.clear();
    }

    /// 让名为 `name` 的 Trigger pass 在下一帧执行一次
    pub fn trigger_pass(&mut self, name: &str) -> RgResult<()> {
        if self.graph.node_index(name).is_none() {
            return Err(RenderGraphError::UnknownPass(name.to_string()));
        }
        if self.graph.name_registry().type_of(name) != Some(RenderPassType::Trigger) {
            log::warn!("trigger_pass: '{name}' is not a trigger pass, ignored");
            return Ok(());
        }
        self.trigger_pending.insert(name.to_string());
        Ok(())
    }
}

// resize & release
impl RenderGraphExecuter {
    /// 释放所有资源的值并通知每个 pass，句柄保留到 `resize_end` 时重新赋值
    pub fn resize_begin(&mut self) -> RgResult<()> {
        match self.phase {
            ExecuterPhase::Ready | ExecuterPhase::Idle => {}
            phase => return Err(Self::invalid(format!("resize_begin in phase {phase:?}"))),
        }

        self.resources.release_resource_values();
        for node in self.graph.nodes_mut() {
            node.container().clear();
            node.pass_mut().on_resize();
            self.states.insert(node.name().to_string(), PassState::Registered);
        }
        self.phase = ExecuterPhase::Resizing;
        log::info!("resize begin");
        Ok(())
    }

    /// 渲染分辨率与输出分辨率相同
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.resources.set_viewport(viewport);
        self.resources.set_output_viewport(viewport);
    }

    pub fn set_render_viewport(&mut self, viewport: Viewport) {
        self.resources.set_viewport(viewport);
    }

    /// 按新的视口重新 init；OneHit pass 会重新执行
    pub fn resize_end(&mut self, profiler: &mut dyn CpuProfiler) -> RgResult<()> {
        #[cfg(feature = "tracy")]
        let _span = tracy_client::span!("RenderGraphExecuter::resize_end");

        if self.phase != ExecuterPhase::Resizing {
            return Err(Self::invalid(format!("resize_end in phase {:?}", self.phase)));
        }
        self.one_hit_fired.clear();
        // 首次 init 之前就 resize 的图还没有构建
        self.ensure_built()?;
        self.init_passes(profiler)?;
        log::info!("resize end: {}x{}", self.resources.viewport().width(), self.resources.viewport().height());
        Ok(())
    }

    /// 移除 pass 及其容器中的资源，并重新构建渲染图
    pub fn remove_render_pass(&mut self, name: &str) -> RgResult<bool> {
        if self.phase == ExecuterPhase::Released {
            return Err(Self::invalid("remove_render_pass after release"));
        }
        let Some(mut node) = self.graph.remove_render_pass(name) else {
            return Ok(false);
        };

        for resource in node.container().resources() {
            self.resources.remove_resource(resource.name());
        }
        node.container().clear();
        node.pass_mut().release();

        self.states.remove(name);
        self.one_hit_fired.remove(name);
        self.trigger_pending.remove(name);
        self.graph.build()?;
        Ok(true)
    }

    /// 释放所有资源与 pass，之后执行器不可再用
    pub fn release(&mut self) -> RgResult<()> {
        if self.phase == ExecuterPhase::Released {
            return Err(Self::invalid("release called twice"));
        }

        self.resources.release_resources();
        for node in self.graph.nodes_mut() {
            node.container().clear();
            node.pass_mut().release();
            self.states.insert(node.name().to_string(), PassState::Released);
        }
        self.one_hit_fired.clear();
        self.trigger_pending.clear();
        self.phase = ExecuterPhase::Released;
        log::info!("render graph released");
        Ok(())
    }

    fn invalid(message: impl Into<String>) -> RenderGraphError {
        RenderGraphError::InvalidState(message.into())
    }
}

impl Drop for RenderGraphExecuter {
    fn drop(&mut self) {
        if self.phase != ExecuterPhase::Released
            && let Err(err) = self.release()
        {
            log::error!("failed to release render graph: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use ash::vk;
    use parking_lot::Mutex;
    use prism_gfx::commands::command_context::GfxCommand;
    use prism_gfx::device::GfxResource;
    use prism_gfx::headless::HeadlessDevice;
    use prism_gfx::resources::texture::{Texture2D, Texture2DDesc};

    use super::*;
    use crate::graph::dependency_builder::GraphDependencyBuilder;
    use crate::pass::{RenderPass, RenderPassMetadata};
    use crate::profiler::{CpuTimingProfiler, NullProfiler};
    use crate::resource::resource_ref::TypedResourceRef;

    type CallLog = Arc<Mutex<Vec<String>>>;

    struct RecordingPass {
        meta: RenderPassMetadata,
        reads: Vec<&'static str>,
        output: Option<&'static str>,
        texture: Option<TypedResourceRef<Texture2D>>,
        fail_init: bool,
        log: CallLog,
    }
    impl RecordingPass {
        fn new(meta: RenderPassMetadata, log: &CallLog) -> Self {
            Self {
                meta,
                reads: Vec::new(),
                output: None,
                texture: None,
                fail_init: false,
                log: log.clone(),
            }
        }

        fn reads(mut self, name: &'static str) -> Self {
            self.reads.push(name);
            self
        }

        fn output(mut self, name: &'static str) -> Self {
            self.output = Some(name);
            self
        }

        fn record(&self, event: &str) {
            self.log.lock().push(format!("{}:{}", event, self.meta.name()));
        }
    }
    impl RenderPass for RecordingPass {
        fn metadata(&self) -> &RenderPassMetadata {
            &self.meta
        }

        fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
            for name in &self.reads {
                builder.read(*name);
            }
            if let Some(name) = self.output {
                builder.write(name);
            }
        }

        fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
            self.record("init");
            anyhow::ensure!(!self.fail_init, "init failure requested");
            if let Some(name) = self.output {
                let viewport = resources.viewport();
                let desc = Texture2DDesc::new(viewport.width(), viewport.height(), vk::Format::R8G8B8A8_UNORM);
                self.texture = Some(resources.create_texture_2d(name, desc, ResourceCreationFlags::LAZY_INIT)?);
            }
            Ok(())
        }

        fn prepare(&mut self, _resources: &GraphResourceBuilder) -> anyhow::Result<()> {
            self.record("prepare");
            Ok(())
        }

        fn execute(&mut self, ctx: &mut GfxCommandContext, _resources: &GraphResourceBuilder) -> anyhow::Result<()> {
            self.record("execute");
            if let Some(texture) = &self.texture {
                let texture = texture.get()?;
                ctx.bind(texture.object_id());
            }
            ctx.draw(3, 1);
            Ok(())
        }

        fn release(&mut self) {
            self.record("release");
            self.texture = None;
        }
    }

    fn executer_with(passes: Vec<RecordingPass>) -> (Arc<HeadlessDevice>, RenderGraphExecuter) {
        let device = Arc::new(HeadlessDevice::new());
        let mut graph = RenderGraph::new();
        for pass in passes {
            graph.add_render_pass(pass).unwrap();
        }
        let mut resources = GraphResourceBuilder::new(device.clone());
        resources.set_viewport(Viewport::new(64, 32));
        (device, RenderGraphExecuter::new(graph, resources))
    }

    fn take(log: &CallLog) -> Vec<String> {
        std::mem::take(&mut *log.lock())
    }

    #[test]
    fn test_init_then_execute_in_order() {
        let log = CallLog::default();
        let (device, mut executer) = executer_with(vec![
            RecordingPass::new(RenderPassMetadata::new("tonemap"), &log).reads("hdr"),
            RecordingPass::new(RenderPassMetadata::new("lighting"), &log).output("hdr"),
        ]);

        executer.init(&mut NullProfiler).unwrap();
        assert_eq!(take(&log), ["init:lighting", "init:tonemap", "prepare:lighting", "prepare:tonemap"]);
        assert_eq!(device.live_objects(), 1);
        assert_eq!(executer.pass_state("lighting"), Some(PassState::Prepared));

        let mut ctx = GfxCommandContext::new("frame");
        let mut profiler = CpuTimingProfiler::new();
        assert_eq!(executer.execute(&mut ctx, &mut profiler).unwrap(), 2);
        assert_eq!(ctx.labels(), ["lighting", "tonemap"]);
        assert!(matches!(ctx.commands()[1], GfxCommand::Bind(_)));
        assert_eq!(profiler.timing("tonemap").unwrap().count, 1);
        assert_eq!(executer.pass_state("tonemap"), Some(PassState::Executing));

        // 节点容器记录了 pass 声明的资源
        let container = executer.graph().node("lighting").unwrap().container();
        assert_eq!(container.size(), 64 * 32 * 4);
    }

    #[test]
    fn test_execute_before_init_is_invalid() {
        let log = CallLog::default();
        let (_device, mut executer) = executer_with(vec![RecordingPass::new(RenderPassMetadata::new("a"), &log)]);

        let mut ctx = GfxCommandContext::new("frame");
        assert!(matches!(executer.execute(&mut ctx, &mut NullProfiler), Err(RenderGraphError::InvalidState(_))));
        assert!(matches!(executer.resize_end(&mut NullProfiler), Err(RenderGraphError::InvalidState(_))));
        assert_eq!(executer.pass_state("a"), Some(PassState::Registered));
    }

    #[test]
    fn test_one_hit_and_trigger_gating() {
        let log = CallLog::default();
        let (_device, mut executer) = executer_with(vec![
            RecordingPass::new(RenderPassMetadata::compute("brdf_lut").with_type(RenderPassType::OneHit), &log),
            RecordingPass::new(RenderPassMetadata::new("screenshot").with_type(RenderPassType::Trigger), &log),
            RecordingPass::new(RenderPassMetadata::new("main"), &log),
        ]);
        executer.init(&mut NullProfiler).unwrap();
        take(&log);

        let mut ctx = GfxCommandContext::new("frame");
        let mut frame = |executer: &mut RenderGraphExecuter| {
            ctx.reset();
            executer.execute(&mut ctx, &mut NullProfiler).unwrap();
            ctx.labels().into_iter().map(str::to_string).collect::<Vec<_>>()
        };

        assert_eq!(frame(&mut executer), ["brdf_lut", "main"]);
        assert_eq!(frame(&mut executer), ["main"]);

        executer.trigger_pass("screenshot").unwrap();
        assert_eq!(frame(&mut executer), ["screenshot", "main"]);
        assert_eq!(frame(&mut executer), ["main"]);

        executer.trigger_one_hit();
        assert_eq!(frame(&mut executer), ["brdf_lut", "main"]);

        // 非 Trigger pass 被忽略
        executer.trigger_pass("main").unwrap();
        assert_eq!(frame(&mut executer), ["main"]);
        assert!(matches!(executer.trigger_pass("missing"), Err(RenderGraphError::UnknownPass(_))));
    }

    #[test]
    fn test_resize_round_trip() {
        let log = CallLog::default();
        let (device, mut executer) = executer_with(vec![
            RecordingPass::new(RenderPassMetadata::new("lighting"), &log).output("hdr"),
            RecordingPass::new(RenderPassMetadata::new("tonemap"), &log).reads("hdr").output("ldr"),
            RecordingPass::new(RenderPassMetadata::new("brdf_lut").with_type(RenderPassType::OneHit), &log),
        ]);
        executer.init(&mut NullProfiler).unwrap();

        let mut ctx = GfxCommandContext::new("frame");
        executer.execute(&mut ctx, &mut NullProfiler).unwrap();
        let old_hdr = executer.resources().get::<Texture2D>("hdr").unwrap();
        let old_id = old_hdr.base().object_id();
        take(&log);

        executer.resize_begin().unwrap();
        assert_eq!(device.live_objects(), 0);
        assert!(!old_hdr.has_value());
        assert_eq!(executer.pass_state("lighting"), Some(PassState::Registered));
        assert!(take(&log).contains(&"release:tonemap".to_string()));

        executer.set_viewport(Viewport::new(128, 128));
        executer.resize_end(&mut NullProfiler).unwrap();

        // 同一个句柄，新的对象
        let new_hdr = executer.resources().get::<Texture2D>("hdr").unwrap();
        assert!(new_hdr.base().ptr_eq(old_hdr.base()));
        assert_ne!(new_hdr.base().object_id(), old_id);
        assert_eq!(old_hdr.get().unwrap().width(), 128);
        assert_eq!(device.live_objects(), 2);

        ctx.reset();
        assert_eq!(executer.execute(&mut ctx, &mut NullProfiler).unwrap(), 3);
    }

    #[test]
    fn test_resize_before_first_init_builds_graph() {
        let log = CallLog::default();
        let (device, mut executer) = executer_with(vec![
            RecordingPass::new(RenderPassMetadata::new("tonemap"), &log).reads("hdr"),
            RecordingPass::new(RenderPassMetadata::new("lighting"), &log).output("hdr"),
        ]);

        executer.resize_begin().unwrap();
        executer.set_viewport(Viewport::new(96, 96));
        executer.resize_end(&mut NullProfiler).unwrap();

        assert!(executer.graph().is_built());
        assert!(executer.is_ready());
        assert_eq!(executer.pass_state("tonemap"), Some(PassState::Prepared));
        assert_eq!(device.live_objects(), 1);

        let mut ctx = GfxCommandContext::new("frame");
        assert_eq!(executer.execute(&mut ctx, &mut NullProfiler).unwrap(), 2);
        assert_eq!(ctx.labels(), ["lighting", "tonemap"]);
        assert_eq!(executer.resources().get::<Texture2D>("hdr").unwrap().get().unwrap().width(), 96);
    }

    #[test]
    fn test_release_is_terminal() {
        let log = CallLog::default();
        let (device, mut executer) =
            executer_with(vec![RecordingPass::new(RenderPassMetadata::new("lighting"), &log).output("hdr")]);
        executer.init(&mut NullProfiler).unwrap();

        executer.release().unwrap();
        assert!(executer.is_released());
        assert_eq!(device.live_objects(), 0);
        assert_eq!(executer.pass_state("lighting"), Some(PassState::Released));

        let mut ctx = GfxCommandContext::new("frame");
        assert!(matches!(executer.execute(&mut ctx, &mut NullProfiler), Err(RenderGraphError::InvalidState(_))));
        assert!(matches!(executer.init(&mut NullProfiler), Err(RenderGraphError::InvalidState(_))));
        assert!(matches!(executer.resize_begin(), Err(RenderGraphError::InvalidState(_))));
        assert!(matches!(executer.release(), Err(RenderGraphError::InvalidState(_))));
    }

    #[test]
    fn test_init_failure_propagates() {
        let log = CallLog::default();
        let mut failing = RecordingPass::new(RenderPassMetadata::new("broken"), &log);
        failing.fail_init = true;
        let (_device, mut executer) = executer_with(vec![failing]);

        let err = executer.init(&mut NullProfiler).unwrap_err();
        assert!(matches!(&err, RenderGraphError::Pass { pass, stage: "init", .. } if pass == "broken"));
        assert!(!executer.is_ready());
    }

    #[test]
    fn test_construction_failure_propagates_from_init() {
        let device = Arc::new(HeadlessDevice::new().with_memory_budget(1024));
        let log = CallLog::default();
        let mut graph = RenderGraph::new();
        graph.add_render_pass(RecordingPass::new(RenderPassMetadata::new("lighting"), &log).output("hdr")).unwrap();
        let mut resources = GraphResourceBuilder::new(device.clone());
        resources.set_viewport(Viewport::new(64, 64));
        let mut executer = RenderGraphExecuter::new(graph, resources);

        let err = executer.init(&mut NullProfiler).unwrap_err();
        assert!(matches!(err, RenderGraphError::Construction { .. }));

        executer.release().unwrap();
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_remove_render_pass() {
        let log = CallLog::default();
        let (device, mut executer) = executer_with(vec![
            RecordingPass::new(RenderPassMetadata::new("lighting"), &log).output("hdr"),
            RecordingPass::new(RenderPassMetadata::new("debug"), &log).output("overlay"),
        ]);
        executer.init(&mut NullProfiler).unwrap();
        assert_eq!(device.live_objects(), 2);

        assert!(executer.remove_render_pass("debug").unwrap());
        assert!(!executer.remove_render_pass("debug").unwrap());
        assert_eq!(device.live_objects(), 1);
        assert!(executer.resources().try_get_resource("overlay").is_none());
        assert_eq!(executer.pass_state("debug"), None);

        let mut ctx = GfxCommandContext::new("frame");
        assert_eq!(executer.execute(&mut ctx, &mut NullProfiler).unwrap(), 1);
    }

    #[test]
    fn test_from_settings() {
        let settings = RenderGraphSettings {
            viewport_width: 320,
            viewport_height: 240,
            default_creation_flags: vec!["LazyInit".to_string(), "Shared".to_string()],
            print_execution_plan: true,
            ..Default::default()
        };
        let device: Arc<dyn GfxDevice> = Arc::new(HeadlessDevice::new());
        let executer =
            RenderGraphExecuter::from_settings(RenderGraph::new(), device, Some(SharedResourceArena::new()), &settings)
                .unwrap();

        assert_eq!(executer.resources().viewport().width(), 320);
        assert_eq!(executer.resources().default_flags(), ResourceCreationFlags::ALL);
        assert!(executer.resources().arena().is_some());
        assert!(executer.resources().cross_graph_sharing());

        let bad = RenderGraphSettings {
            default_creation_flags: vec!["Sometimes".to_string()],
            ..Default::default()
        };
        let device: Arc<dyn GfxDevice> = Arc::new(HeadlessDevice::new());
        assert!(RenderGraphExecuter::from_settings(RenderGraph::new(), device, None, &bad).is_err());
    }
}
