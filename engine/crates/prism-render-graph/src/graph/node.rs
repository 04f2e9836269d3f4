use crate::graph::dependency_builder::{GraphDependencyBuilder, ResourceBinding, ResourceTarget};
use crate::pass::{RenderPass, RenderPassMetadata};
use crate::resource::container::GraphResourceContainer;

/// 渲染图中的节点：一个 pass 以及它的依赖声明与资源容器
///
/// `dependencies` 与 `dependents` 保存的是节点在图中的注册下标，二者互为反向边。
pub struct RenderGraphNode {
    name: String,
    queue_index: usize,
    pass: Box<dyn RenderPass>,
    dependency_builder: GraphDependencyBuilder,
    container: GraphResourceContainer,
    dependencies: Vec<usize>,
    dependents: Vec<usize>,
}

// new & init
impl RenderGraphNode {
    pub(crate) fn new(pass: Box<dyn RenderPass>, queue_index: usize) -> Self {
        let name = pass.name().to_string();
        let mut dependency_builder = GraphDependencyBuilder::new();
        pass.build_dependencies(&mut dependency_builder);

        Self {
            container: GraphResourceContainer::new(&name),
            name,
            queue_index,
            pass,
            dependency_builder,
            dependencies: Vec::new(),
            dependents: Vec::new(),
        }
    }
}

// getters
impl RenderGraphNode {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注册顺序
    #[inline]
    pub fn queue_index(&self) -> usize {
        self.queue_index
    }

    #[inline]
    pub fn metadata(&self) -> &RenderPassMetadata {
        self.pass.metadata()
    }

    #[inline]
    pub fn pass(&self) -> &dyn RenderPass {
        self.pass.as_ref()
    }

    #[inline]
    pub fn pass_mut(&mut self) -> &mut dyn RenderPass {
        self.pass.as_mut()
    }

    #[inline]
    pub fn dependency_builder(&self) -> &GraphDependencyBuilder {
        &self.dependency_builder
    }

    #[inline]
    pub fn bindings(&self) -> &[ResourceBinding] {
        self.dependency_builder.bindings()
    }

    #[inline]
    pub fn writes(&self) -> &[ResourceTarget] {
        self.dependency_builder.targets()
    }

    #[inline]
    pub fn container(&self) -> &GraphResourceContainer {
        &self.container
    }

    #[inline]
    pub fn dependencies(&self) -> &[usize] {
        &self.dependencies
    }

    #[inline]
    pub fn dependents(&self) -> &[usize] {
        &self.dependents
    }
}

// update
impl RenderGraphNode {
    pub(crate) fn set_queue_index(&mut self, queue_index: usize) {
        self.queue_index = queue_index;
    }

    pub(crate) fn clear_edges(&mut self) {
        self.dependencies.clear();
        self.dependents.clear();
    }

    /// 返回 false 表示边已存在
    pub(crate) fn add_dependency(&mut self, producer: usize) -> bool {
        if self.dependencies.contains(&producer) {
            return false;
        }
        self.dependencies.push(producer);
        true
    }

    pub(crate) fn add_dependent(&mut self, consumer: usize) {
        if !self.dependents.contains(&consumer) {
            self.dependents.push(consumer);
        }
    }
}

impl std::fmt::Debug for RenderGraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderGraphNode")
            .field("name", &self.name)
            .field("queue_index", &self.queue_index)
            .field("dependencies", &self.dependencies)
            .field("dependents", &self.dependents)
            .finish()
    }
}
