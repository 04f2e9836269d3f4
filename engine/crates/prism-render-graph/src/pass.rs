//! RenderPass 定义
//!
//! pass 由渲染图的节点持有，生命周期：
//!
//! `Registered -> Initialized -> Prepared -> Executing -> Released`
//!
//! resize 时 `on_resize` 会先释放 pass 自己持有的状态，随后重新 `init`。

use std::fmt::{Display, Formatter};

use prism_gfx::commands::command_context::GfxCommandContext;

use crate::graph::dependency_builder::GraphDependencyBuilder;
use crate::resource::builder::GraphResourceBuilder;

/// 执行门控
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum RenderPassType {
    /// 每帧执行
    #[default]
    Default,
    /// 每个触发周期只执行一次，`trigger_one_hit` 开始新的周期
    OneHit,
    /// 只在 `trigger_pass` 之后的那一帧执行
    Trigger,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum PassKind {
    #[default]
    Draw,
    Compute,
}

#[derive(Clone, Debug)]
pub struct RenderPassMetadata {
    name: String,
    pass_type: RenderPassType,
    kind: PassKind,
}
impl RenderPassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pass_type: RenderPassType::Default,
            kind: PassKind::Draw,
        }
    }

    pub fn draw(name: impl Into<String>) -> Self {
        Self::new(name)
    }

    pub fn compute(name: impl Into<String>) -> Self {
        Self::new(name).with_kind(PassKind::Compute)
    }

    #[inline]
    pub fn with_type(mut self, pass_type: RenderPassType) -> Self {
        self.pass_type = pass_type;
        self
    }

    #[inline]
    pub fn with_kind(mut self, kind: PassKind) -> Self {
        self.kind = kind;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn pass_type(&self) -> RenderPassType {
        self.pass_type
    }

    #[inline]
    pub fn kind(&self) -> PassKind {
        self.kind
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PassState {
    Registered,
    Initialized,
    Prepared,
    Executing,
    Released,
}
impl Display for PassState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// 渲染图中的一个 pass
///
/// # 示例
///
/// ```ignore
/// struct TonemapPass {
///     meta: RenderPassMetadata,
///     hdr: Option<TypedResourceRef<Texture2D>>,
/// }
///
/// impl RenderPass for TonemapPass {
///     fn metadata(&self) -> &RenderPassMetadata {
///         &self.meta
///     }
///
///     fn build_dependencies(&self, builder: &mut GraphDependencyBuilder) {
///         builder.read("hdr").write("#backbuffer");
///     }
///
///     fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()> {
///         self.hdr = Some(resources.get_texture_2d("hdr"));
///         Ok(())
///     }
///
///     fn execute(&mut self, ctx: &mut GfxCommandContext, _: &GraphResourceBuilder) -> anyhow::Result<()> {
///         ctx.draw(3, 1);
///         Ok(())
///     }
/// }
/// ```
pub trait RenderPass: Send {
    fn metadata(&self) -> &RenderPassMetadata;

    #[inline]
    fn name(&self) -> &str {
        self.metadata().name()
    }

    /// 注册到渲染图时调用一次
    fn build_dependencies(&self, builder: &mut GraphDependencyBuilder);

    /// 声明与创建资源；调用期间资源构建器绑定了本节点的容器
    fn init(&mut self, resources: &mut GraphResourceBuilder) -> anyhow::Result<()>;

    /// 所有延迟资源构造完成之后调用
    fn prepare(&mut self, _resources: &GraphResourceBuilder) -> anyhow::Result<()> {
        Ok(())
    }

    /// 每帧录制命令
    fn execute(&mut self, ctx: &mut GfxCommandContext, resources: &GraphResourceBuilder) -> anyhow::Result<()>;

    /// 释放 pass 自己持有的状态，资源由资源构建器统一释放
    fn release(&mut self) {}

    fn on_resize(&mut self) {
        self.release();
    }
}
