//! 进程级共享资源表
//!
//! - 以名称为 key 的全局句柄（`#` 前缀的全局资源），可以由外部直接提供值
//! - 多个渲染图之间可复用的 Shared 资源候选，按 (种类, desc) 匹配

use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use prism_gfx::device::{GfxResource, GfxResourceKind};

use crate::error::{RenderGraphError, RgResult};
use crate::resource::resource_ref::{ResourceRef, WeakResourceRef};

/// 全局资源名称的前缀
pub const GLOBAL_RESOURCE_PREFIX: char = '#';

#[inline]
pub fn is_global_name(name: &str) -> bool {
    name.starts_with(GLOBAL_RESOURCE_PREFIX)
}

struct SharedCandidate {
    graph_id: u64,
    kind: GfxResourceKind,
    desc: Box<dyn Any + Send + Sync>,
    resource: WeakResourceRef,
}

struct ArenaState {
    resources: IndexMap<String, ResourceRef>,
    candidates: Vec<SharedCandidate>,
}

#[derive(Clone)]
pub struct SharedResourceArena {
    state: Arc<Mutex<ArenaState>>,
}

// new & init
impl SharedResourceArena {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ArenaState {
                resources: IndexMap::new(),
                candidates: Vec::new(),
            })),
        }
    }
}
impl Default for SharedResourceArena {
    fn default() -> Self {
        Self::new()
    }
}

// 全局资源
impl SharedResourceArena {
    pub fn get_or_add(&self, name: &str) -> ResourceRef {
        let mut state = self.state.lock();
        state.resources.entry(name.to_string()).or_insert_with(|| ResourceRef::new(name)).clone()
    }

    pub fn try_get(&self, name: &str) -> Option<ResourceRef> {
        self.state.lock().resources.get(name).cloned()
    }

    pub fn get(&self, name: &str) -> RgResult<ResourceRef> {
        self.try_get(name).ok_or_else(|| RenderGraphError::UnknownResource(name.to_string()))
    }

    /// 由外部提供全局资源的值，句柄不存在时创建
    pub fn set_resource(&self, name: &str, value: Arc<dyn GfxResource>) -> ResourceRef {
        let resource = self.get_or_add(name);
        // 在锁外赋值，ValueChanged 回调可能会回到 arena
        resource.set_value(Some(value));
        resource
    }

    /// 移除并释放全局资源
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.state.lock().resources.shift_remove(name);
        match removed {
            Some(resource) => {
                resource.dispose();
                true
            }
            None => false,
        }
    }

    pub fn resources(&self) -> Vec<ResourceRef> {
        self.state.lock().resources.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// 跨图共享
impl SharedResourceArena {
    pub(crate) fn publish<D>(&self, graph_id: u64, kind: GfxResourceKind, desc: &D, resource: &ResourceRef)
    where
        D: Clone + Send + Sync + 'static,
    {
        self.state.lock().candidates.push(SharedCandidate {
            graph_id,
            kind,
            desc: Box::new(desc.clone()),
            resource: resource.downgrade(),
        });
    }

    /// 查找其他渲染图发布的、desc 相等且仍然存活的资源
    pub(crate) fn find_shared<D>(&self, graph_id: u64, kind: GfxResourceKind, desc: &D) -> Option<ResourceRef>
    where
        D: PartialEq + 'static,
    {
        let mut state = self.state.lock();
        state.candidates.retain(|c| c.resource.upgrade().is_some_and(|r| r.has_value()));
        state
            .candidates
            .iter()
            .filter(|c| c.graph_id != graph_id && c.kind == kind)
            .filter(|c| c.desc.downcast_ref::<D>() == Some(desc))
            .find_map(|c| c.resource.upgrade())
    }

    /// 渲染图释放资源时撤回它发布的候选
    pub(crate) fn unpublish_graph(&self, graph_id: u64) {
        self.state.lock().candidates.retain(|c| c.graph_id != graph_id);
    }

    pub fn shared_candidate_count(&self) -> usize {
        self.state.lock().candidates.len()
    }
}
