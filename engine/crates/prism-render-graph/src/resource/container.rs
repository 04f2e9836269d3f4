use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use prism_gfx::device::{GfxObjectId, GfxResourceKind};

use crate::resource::resource_ref::{ResourceRef, ValueChangedKey};

/// 内存统计条目
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    pub object: Option<GfxObjectId>,
    pub kind: Option<GfxResourceKind>,
    /// 借用自其他句柄的资源计为 0
    pub byte_size: u64,
}
impl ResourceEntry {
    fn from_ref(resource: &ResourceRef) -> Self {
        let value = resource.value();
        let aliased = resource.share_source().is_some();
        Self {
            name: resource.name().to_string(),
            object: value.as_ref().map(|v| v.object_id()),
            kind: value.as_ref().map(|v| v.kind()),
            byte_size: match &value {
                Some(v) if !aliased => v.byte_size(),
                _ => 0,
            },
        }
    }
}

#[derive(Default)]
struct ContainerState {
    resources: Vec<ResourceRef>,
    shared_resources: Vec<ResourceRef>,
    entries: Vec<ResourceEntry>,
    size: u64,
    subscriptions: Vec<(ResourceRef, ValueChangedKey)>,
}
impl ContainerState {
    fn update_entry(&mut self, resource: &ResourceRef) {
        let entry = ResourceEntry::from_ref(resource);
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.size = self.entries.iter().map(|e| e.byte_size).sum();
    }

    fn remove_entry(&mut self, name: &str) {
        self.entries.retain(|e| e.name != name);
        self.size = self.entries.iter().map(|e| e.byte_size).sum();
    }
}

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// 每个节点一个的资源容器
///
/// 记录节点拥有的资源（`resources`）与借用的资源（`shared_resources`），
/// 并按资源的 ValueChanged 维护内存统计。ValueChanged 可能在其他线程触发，
/// 所以状态由容器自己的锁保护。
#[derive(Clone)]
pub struct GraphResourceContainer {
    id: u64,
    owner: Arc<str>,
    state: Arc<Mutex<ContainerState>>,
}

// new & init
impl GraphResourceContainer {
    pub fn new(owner: &str) -> Self {
        Self {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            owner: Arc::from(owner),
            state: Arc::new(Mutex::new(ContainerState::default())),
        }
    }
}

// getters
impl GraphResourceContainer {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 所属节点的名称
    #[inline]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[inline]
    pub fn same_as(&self, other: &GraphResourceContainer) -> bool {
        self.id == other.id
    }

    pub fn resources(&self) -> Vec<ResourceRef> {
        self.state.lock().resources.clone()
    }

    pub fn shared_resources(&self) -> Vec<ResourceRef> {
        self.state.lock().shared_resources.clone()
    }

    pub fn entries(&self) -> Vec<ResourceEntry> {
        self.state.lock().entries.clone()
    }

    /// 容器拥有的资源占用的字节数
    pub fn size(&self) -> u64 {
        self.state.lock().size
    }

    pub fn contains(&self, resource: &ResourceRef) -> bool {
        self.state.lock().resources.iter().any(|r| r.ptr_eq(resource))
    }

    pub fn has_shared_resource(&self, resource: &ResourceRef) -> bool {
        self.state.lock().shared_resources.iter().any(|r| r.ptr_eq(resource))
    }
}

// register
impl GraphResourceContainer {
    pub fn add_resource(&self, resource: &ResourceRef) {
        if self.contains(resource) {
            return;
        }

        // 回调只持有容器状态的弱引用，避免句柄与容器互相持有
        let weak_state: Weak<Mutex<ContainerState>> = Arc::downgrade(&self.state);
        let key = resource.on_value_changed(move |r| {
            if let Some(state) = weak_state.upgrade() {
                state.lock().update_entry(r);
            }
        });

        let mut state = self.state.lock();
        state.resources.push(resource.clone());
        state.subscriptions.push((resource.clone(), key));
        state.update_entry(resource);
    }

    pub fn add_shared_resource(&self, resource: &ResourceRef) {
        let mut state = self.state.lock();
        if !state.shared_resources.iter().any(|r| r.ptr_eq(resource)) {
            state.shared_resources.push(resource.clone());
        }
    }

    pub fn remove_resource(&self, resource: &ResourceRef) -> bool {
        let subscription = {
            let mut state = self.state.lock();
            let before = state.resources.len();
            state.resources.retain(|r| !r.ptr_eq(resource));
            state.shared_resources.retain(|r| !r.ptr_eq(resource));
            state.remove_entry(resource.name());

            let removed = state.resources.len() != before;
            let pos = state.subscriptions.iter().position(|(r, _)| r.ptr_eq(resource));
            let subscription = pos.map(|pos| state.subscriptions.swap_remove(pos));
            if !removed {
                return false;
            }
            subscription
        };

        if let Some((r, key)) = subscription {
            r.remove_value_changed(key);
        }
        true
    }

    /// 清空容器（不释放资源，资源由 `GraphResourceBuilder` 统一释放）
    pub fn clear(&self) {
        let subscriptions = {
            let mut state = self.state.lock();
            state.resources.clear();
            state.shared_resources.clear();
            state.entries.clear();
            state.size = 0;
            std::mem::take(&mut state.subscriptions)
        };
        for (resource, key) in subscriptions {
            resource.remove_value_changed(key);
        }
    }

    /// 释放容器拥有的资源；借用的资源只解除关联，不释放
    pub fn dispose_resources(&self) {
        let owned = self.resources();
        self.clear();
        for resource in owned {
            resource.dispose();
        }
    }
}

impl std::fmt::Debug for GraphResourceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("GraphResourceContainer")
            .field("owner", &self.owner)
            .field("resources", &state.resources.iter().map(ResourceRef::name).collect::<Vec<_>>())
            .field("shared", &state.shared_resources.iter().map(ResourceRef::name).collect::<Vec<_>>())
            .field("size", &state.size)
            .finish()
    }
}
