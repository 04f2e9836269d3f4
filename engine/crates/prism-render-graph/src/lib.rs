//! Prism 的渲染图
//!
//! pass 通过 [`graph::dependency_builder::GraphDependencyBuilder`] 声明读写的资源名，
//! [`graph::render_graph::RenderGraph`] 把声明解析成依赖边并拓扑排序，
//! [`executer::RenderGraphExecuter`] 按顺序驱动每个 pass 的生命周期。
//!
//! 资源通过 [`resource::builder::GraphResourceBuilder`] 创建，可以延迟到所有 pass
//! 都声明完毕之后统一构造，相同描述的 Shared 资源会被复用。

pub mod error;
pub mod executer;
pub mod graph;
pub mod pass;
pub mod profiler;
pub mod resource;

pub use error::{RenderGraphError, RgResult};
