//! pass 声明依赖的构建器
//!
//! 每个节点一个。pass 在 `build_dependencies` 中声明读（binding）、写（target）
//! 以及 `run_after` / `run_before` 约束，`RenderGraph::build` 再把它们解析成依赖边。

use crate::resource::arena::is_global_name;

/// 依赖所有其他节点
pub const DEPEND_ON_ALL: &str = "!All";
/// 依赖所有不（传递地）依赖自己的节点
pub const DEPEND_ON_ALL_NOT_REFERENCED: &str = "!AllNotReferenced";

/// 是否为通配的节点名
#[inline]
pub fn is_wildcard(name: &str) -> bool {
    name == DEPEND_ON_ALL || name == DEPEND_ON_ALL_NOT_REFERENCED
}

/// pass 读取的资源名；`#` 前缀表示全局资源
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ResourceBinding {
    pub name: String,
}
impl ResourceBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        is_global_name(&self.name)
    }
}

/// pass 写入的资源名
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ResourceTarget {
    pub name: String,
}
impl ResourceTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        is_global_name(&self.name)
    }
}

#[derive(Clone, Default, Debug)]
pub struct GraphDependencyBuilder {
    bindings: Vec<ResourceBinding>,
    targets: Vec<ResourceTarget>,
    run_after: Vec<String>,
    run_before: Vec<String>,
}

// declare
impl GraphDependencyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 声明读取；重复声明被忽略
    pub fn read(&mut self, name: impl Into<String>) -> &mut Self {
        let binding = ResourceBinding::new(name);
        if !self.bindings.contains(&binding) {
            self.bindings.push(binding);
        }
        self
    }

    /// 声明写入；重复声明被忽略
    pub fn write(&mut self, name: impl Into<String>) -> &mut Self {
        let target = ResourceTarget::new(name);
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
        self
    }

    /// 在名为 `name` 的节点之后执行，可以是通配名
    pub fn run_after(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.run_after.contains(&name) {
            self.run_after.push(name);
        }
        self
    }

    /// 在名为 `name` 的节点之前执行
    pub fn run_before(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.run_before.contains(&name) {
            self.run_before.push(name);
        }
        self
    }

    pub fn run_after_all(&mut self) -> &mut Self {
        self.run_after(DEPEND_ON_ALL)
    }

    pub fn run_after_all_not_referenced(&mut self) -> &mut Self {
        self.run_after(DEPEND_ON_ALL_NOT_REFERENCED)
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
        self.targets.clear();
        self.run_after.clear();
        self.run_before.clear();
    }
}

// getters
impl GraphDependencyBuilder {
    #[inline]
    pub fn bindings(&self) -> &[ResourceBinding] {
        &self.bindings
    }

    #[inline]
    pub fn targets(&self) -> &[ResourceTarget] {
        &self.targets
    }

    #[inline]
    pub fn run_after_names(&self) -> &[String] {
        &self.run_after
    }

    #[inline]
    pub fn run_before_names(&self) -> &[String] {
        &self.run_before
    }

    pub fn writes(&self, name: &str) -> bool {
        self.targets.iter().any(|t| t.name == name)
    }

    pub fn reads(&self, name: &str) -> bool {
        self.bindings.iter().any(|b| b.name == name)
    }

    pub fn has_wildcard(&self) -> bool {
        self.run_after.iter().any(|n| is_wildcard(n))
    }
}
