//! 依赖解析与拓扑排序
//!
//! 节点按注册顺序保存。`build` 分两步：
//!
//! 1. `resolve_dependencies`：把每个节点的读写声明与 `run_after` / `run_before` 解析成依赖边
//! 2. `topological_sort`：用 petgraph 排序，环是构建期错误

use std::collections::HashMap;

use indexmap::IndexSet;
use itertools::Itertools;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{RenderGraphError, RgResult};
use crate::graph::dependency_builder::{DEPEND_ON_ALL, DEPEND_ON_ALL_NOT_REFERENCED, is_wildcard};
use crate::graph::node::RenderGraphNode;
use crate::graph::registry::{GraphNodeRegistry, RenderGraphNameRegistry};
use crate::pass::RenderPass;

#[derive(Default)]
pub struct RenderGraph {
    nodes: Vec<RenderGraphNode>,
    node_registry: GraphNodeRegistry,
    name_registry: RenderGraphNameRegistry,

    /// 所有出现过的全局资源名（`#` 前缀），按首次出现的顺序
    global_resources: IndexSet<String>,
    /// 全局资源名 -> 最后写入它的节点下标
    global_last_write: HashMap<String, usize>,

    /// 执行顺序（节点下标）
    sorted: Vec<usize>,
    built: bool,
}

// new & init
impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }
}

// register
impl RenderGraph {
    /// 注册 pass，立即调用其 `build_dependencies`，返回注册下标
    pub fn add_render_pass(&mut self, pass: impl RenderPass + 'static) -> RgResult<usize> {
        self.add_boxed_render_pass(Box::new(pass))
    }

    pub fn add_boxed_render_pass(&mut self, pass: Box<dyn RenderPass>) -> RgResult<usize> {
        let name = pass.name().to_string();
        if self.node_registry.contains(&name) {
            return Err(RenderGraphError::DuplicateNode(name));
        }

        let index = self.nodes.len();
        let pass_type = pass.metadata().pass_type();
        self.nodes.push(RenderGraphNode::new(pass, index));
        self.node_registry.insert(&name, index);
        self.name_registry.insert(pass_type, &name);
        self.invalidate();

        log::debug!("add render pass '{name}' ({pass_type:?}) at {index}");
        Ok(index)
    }

    /// 移除 pass，返回被移除的节点；节点中的 pass 尚未 release
    pub fn remove_render_pass(&mut self, name: &str) -> Option<RenderGraphNode> {
        let index = self.node_registry.get(name)?;
        let node = self.nodes.remove(index);

        for (queue_index, node) in self.nodes.iter_mut().enumerate() {
            node.set_queue_index(queue_index);
            node.clear_edges();
        }
        self.node_registry.rebuild(self.nodes.iter().map(RenderGraphNode::name));
        self.name_registry.remove(name);
        self.invalidate();

        log::debug!("remove render pass '{name}'");
        Some(node)
    }

    fn invalidate(&mut self) {
        self.built = false;
        self.sorted.clear();
    }
}

// build
impl RenderGraph {
    pub fn build(&mut self) -> RgResult<()> {
        #[cfg(feature = "tracy")]
        let _span = tracy_client::span!("RenderGraph::build");

        self.invalidate();
        self.resolve_dependencies()?;
        self.topological_sort()?;
        self.built = true;

        log::info!(
            "render graph built: {} passes, order [{}]",
            self.nodes.len(),
            self.sorted_nodes().map(RenderGraphNode::name).join(" → ")
        );
        Ok(())
    }

    /// 清空旧的边，重新解析所有节点的依赖
    ///
    /// - 本地读取：只依赖注册顺序上第一个写入该资源的其他节点，一个都没有则报错
    /// - 全局读取：依赖注册顺序上在它之前最后一个写入者，可以没有
    /// - `run_after` / `run_before`：名字解析不到的直接忽略
    /// - 通配名在其他所有边建立之后展开
    pub fn resolve_dependencies(&mut self) -> RgResult<()> {
        for node in &mut self.nodes {
            node.clear_edges();
        }
        self.global_resources.clear();
        self.global_last_write.clear();

        let mut edges = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            for binding in node.bindings() {
                if binding.is_global() {
                    self.global_resources.insert(binding.name.clone());
                    if let Some(&writer) = self.global_last_write.get(&binding.name)
                        && writer != index
                    {
                        edges.push((writer, index));
                    }
                    continue;
                }

                let producer = self
                    .nodes
                    .iter()
                    .enumerate()
                    .find(|(other, other_node)| *other != index && other_node.dependency_builder().writes(&binding.name))
                    .map(|(other, _)| other)
                    .ok_or_else(|| RenderGraphError::UnresolvedDependency {
                        node: node.name().to_string(),
                        resource: binding.name.clone(),
                    })?;
                edges.push((producer, index));
            }

            for target in node.writes().iter().filter(|t| t.is_global()) {
                self.global_resources.insert(target.name.clone());
                self.global_last_write.insert(target.name.clone(), index);
            }

            for name in node.dependency_builder().run_after_names() {
                if is_wildcard(name) {
                    continue;
                }
                match self.node_registry.get(name) {
                    Some(producer) if producer != index => edges.push((producer, index)),
                    _ => log::debug!("'{}': run_after '{}' skipped", node.name(), name),
                }
            }
            for name in node.dependency_builder().run_before_names() {
                match self.node_registry.get(name) {
                    Some(consumer) if consumer != index => edges.push((index, consumer)),
                    _ => log::debug!("'{}': run_before '{}' skipped", node.name(), name),
                }
            }
        }
        for (producer, consumer) in edges {
            self.add_edge(producer, consumer);
        }

        for index in 0..self.nodes.len() {
            let wildcards = self.nodes[index]
                .dependency_builder()
                .run_after_names()
                .iter()
                .filter(|name| is_wildcard(name))
                .cloned()
                .collect_vec();
            for wildcard in wildcards {
                for other in (0..self.nodes.len()).filter(|&other| other != index) {
                    let depend = match wildcard.as_str() {
                        DEPEND_ON_ALL => true,
                        DEPEND_ON_ALL_NOT_REFERENCED => !self.reaches(other, index),
                        _ => false,
                    };
                    if depend {
                        self.add_edge(other, index);
                    }
                }
            }
        }
        Ok(())
    }

    /// 用 petgraph 排序，结果写入 `sorted`
    pub fn topological_sort(&mut self) -> RgResult<()> {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(self.nodes.len(), self.nodes.len() * 2);
        let node_indices: Vec<NodeIndex> = (0..self.nodes.len()).map(|i| graph.add_node(i)).collect();
        for (consumer, node) in self.nodes.iter().enumerate() {
            for &producer in node.dependencies() {
                graph.add_edge(node_indices[producer], node_indices[consumer], ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => {
                self.sorted = order.into_iter().map(|n| graph[n]).collect();
                Ok(())
            }
            Err(cycle) => Err(RenderGraphError::CyclicDependency {
                node: self.nodes[graph[cycle.node_id()]].name().to_string(),
            }),
        }
    }

    /// 边 `producer -> consumer`，重复添加无效果
    fn add_edge(&mut self, producer: usize, consumer: usize) {
        if producer == consumer {
            return;
        }
        if self.nodes[consumer].add_dependency(producer) {
            self.nodes[producer].add_dependent(consumer);
        }
    }

    /// `from` 是否（传递地）依赖 `to`
    fn reaches(&self, from: usize, to: usize) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if std::mem::replace(&mut visited[current], true) {
                continue;
            }
            stack.extend(self.nodes[current].dependencies().iter().copied());
        }
        false
    }
}

// getters
impl RenderGraph {
    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn nodes(&self) -> &[RenderGraphNode] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&RenderGraphNode> {
        self.node_index(name).map(|index| &self.nodes[index])
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.node_registry.get(name)
    }

    pub(crate) fn node_at_mut(&mut self, index: usize) -> &mut RenderGraphNode {
        &mut self.nodes[index]
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut RenderGraphNode> {
        self.nodes.iter_mut()
    }

    #[inline]
    pub fn sorted_node_indices(&self) -> &[usize] {
        &self.sorted
    }

    pub fn sorted_nodes(&self) -> impl Iterator<Item = &RenderGraphNode> {
        self.sorted.iter().map(|&index| &self.nodes[index])
    }

    #[inline]
    pub fn global_resources(&self) -> &IndexSet<String> {
        &self.global_resources
    }

    /// 最后写入某个全局资源的节点
    pub fn global_last_writer(&self, name: &str) -> Option<&RenderGraphNode> {
        self.global_last_write.get(name).map(|&index| &self.nodes[index])
    }

    #[inline]
    pub fn name_registry(&self) -> &RenderGraphNameRegistry {
        &self.name_registry
    }

    /// `other` 是否（传递地）依赖 `node`
    pub fn is_referenced_by(&self, node: &str, other: &str) -> bool {
        match (self.node_index(node), self.node_index(other)) {
            (Some(node), Some(other)) => node != other && self.reaches(other, node),
            _ => false,
        }
    }
}

// debug
impl RenderGraph {
    /// 打印执行计划
    pub fn print_execution_plan(&self) {
        log::info!("╔══════════════════════════════════════════════════════════════════╗");
        log::info!("║              RenderGraph Execution Plan                          ║");
        log::info!("╠══════════════════════════════════════════════════════════════════╣");
        log::info!(
            "║ Total Passes: {}  |  Execution Order: [{}]",
            self.nodes.len(),
            self.sorted_nodes().map(RenderGraphNode::name).join(" → ")
        );
        if !self.global_resources.is_empty() {
            log::info!("║ Global Resources: {}", self.global_resources.iter().join(", "));
        }
        log::info!("╚══════════════════════════════════════════════════════════════════╝");

        for (order, node) in self.sorted_nodes().enumerate() {
            let meta = node.metadata();

            log::info!("");
            log::info!("┌─────────────────────────────────────────────────────────────────┐");
            log::info!(
                "│ [{}/{}] Pass: \"{}\" ({:?}, {:?})",
                order + 1,
                self.sorted.len(),
                node.name(),
                meta.kind(),
                meta.pass_type()
            );
            log::info!("├─────────────────────────────────────────────────────────────────┤");

            if !node.bindings().is_empty() {
                log::info!("│ Reads:");
                for binding in node.bindings() {
                    log::info!("│   📖 \"{}\"", binding.name);
                }
            }
            if !node.writes().is_empty() {
                log::info!("│ Writes:");
                for target in node.writes() {
                    log::info!("│   ✏️  \"{}\"", target.name);
                }
            }
            if node.dependencies().is_empty() {
                log::info!("│ No dependencies");
            } else {
                log::info!(
                    "│ Depends on: {}",
                    node.dependencies().iter().map(|&i| self.nodes[i].name()).join(", ")
                );
            }

            log::info!("└─────────────────────────────────────────────────────────────────┘");
        }

        log::info!("");
        log::info!("═══════════════════════ End of Execution Plan ═══════════════════════");
    }
}
