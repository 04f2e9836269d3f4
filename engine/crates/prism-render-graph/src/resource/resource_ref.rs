//! 资源句柄
//!
//! [`ResourceRef`] 是一个具名的、类型擦除的句柄，独占至多一个设备资源。
//! 多个 pass 通过克隆同一个句柄来访问同一个资源；资源被重建（例如窗口 resize）时，
//! 所有持有句柄的一方都能看到新的值，并收到 ValueChanged 回调。
//!
//! 共享资源：consumer 句柄通过 `share_source` 弱引用指向 source 句柄，两者的值指向同一个
//! 设备对象（`Arc` 计数）。consumer 订阅 source 的 ValueChanged，source 被释放或重建时
//! consumer 的值随之更新，直到 consumer 自身被 dispose。

use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use prism_gfx::device::{GfxObjectId, GfxResource};
use slotmap::{SlotMap, new_key_type};

use crate::error::{RenderGraphError, RgResult};

new_key_type! {
    /// ValueChanged 回调的订阅 key，用于取消订阅
    pub struct ValueChangedKey;
}

pub type ValueChangedCallback = Arc<dyn Fn(&ResourceRef) + Send + Sync>;

struct ResourceSlot {
    value: Option<Arc<dyn GfxResource>>,
    shared: bool,
    share_source: Option<Weak<ResourceRefInner>>,
    /// 在 source 上注册的 ValueChanged 订阅
    share_subscription: Option<ValueChangedKey>,
}

struct ResourceRefInner {
    name: String,
    slot: Mutex<ResourceSlot>,
    callbacks: Mutex<SlotMap<ValueChangedKey, ValueChangedCallback>>,
}

#[derive(Clone)]
pub struct ResourceRef {
    inner: Arc<ResourceRefInner>,
}

// new & init
impl ResourceRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ResourceRefInner {
                name: name.into(),
                slot: Mutex::new(ResourceSlot {
                    value: None,
                    shared: false,
                    share_source: None,
                    share_subscription: None,
                }),
                callbacks: Mutex::new(SlotMap::with_key()),
            }),
        }
    }
}

// getters
impl ResourceRef {
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn value(&self) -> Option<Arc<dyn GfxResource>> {
        self.inner.slot.lock().value.clone()
    }

    #[inline]
    pub fn has_value(&self) -> bool {
        self.inner.slot.lock().value.is_some()
    }

    pub fn object_id(&self) -> Option<GfxObjectId> {
        self.inner.slot.lock().value.as_ref().map(|value| value.object_id())
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        self.inner.slot.lock().shared
    }

    /// 当前值所借用的 source 句柄；source 已被销毁时返回 `None`
    pub fn share_source(&self) -> Option<ResourceRef> {
        let slot = self.inner.slot.lock();
        slot.share_source.as_ref().and_then(Weak::upgrade).map(|inner| ResourceRef { inner })
    }

    /// 按具体类型取出当前值
    pub fn downcast<T: GfxResource>(&self) -> Option<Arc<T>> {
        self.value()?.into_any_arc().downcast::<T>().ok()
    }

    /// 当前值是否为 `T`；没有值时返回 `None`
    pub fn holds<T: GfxResource>(&self) -> Option<bool> {
        let slot = self.inner.slot.lock();
        slot.value.as_ref().map(|value| value.as_any().is::<T>())
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ResourceRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakResourceRef {
        WeakResourceRef {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn typed<T: GfxResource>(&self) -> TypedResourceRef<T> {
        TypedResourceRef::new(self.clone())
    }
}

// update
impl ResourceRef {
    /// 替换当前值并触发 ValueChanged
    ///
    /// 返回旧值；调用方不保留它时，旧的设备对象在这里被释放（如果没有其他持有者）。
    pub fn set_value(&self, value: Option<Arc<dyn GfxResource>>) -> Option<Arc<dyn GfxResource>> {
        let old = {
            let mut slot = self.inner.slot.lock();
            std::mem::replace(&mut slot.value, value)
        };
        self.notify_value_changed();
        old
    }

    pub fn set_shared(&self, shared: bool) {
        self.inner.slot.lock().shared = shared;
    }

    /// 让当前句柄借用 `source` 的值
    ///
    /// 两端都被标记为 shared；`share_source` 是单向的，source 不会反向指向 consumer。
    pub fn set_share_source(&self, source: &ResourceRef) -> RgResult<()> {
        if source.ptr_eq(self) || source.share_chain_contains(self) {
            return Err(RenderGraphError::InvalidShare {
                consumer: self.name().to_string(),
                source_name: source.name().to_string(),
                reason: "share source would form a cycle",
            });
        }

        self.unsubscribe_share_source();

        source.set_shared(true);
        let consumer = Arc::downgrade(&self.inner);
        let subscription = source.on_value_changed(move |source| {
            if let Some(inner) = consumer.upgrade() {
                ResourceRef { inner }.follow_share_source(source);
            }
        });

        let value = source.value();
        let old = {
            let mut slot = self.inner.slot.lock();
            slot.shared = true;
            slot.share_source = Some(Arc::downgrade(&source.inner));
            slot.share_subscription = Some(subscription);
            std::mem::replace(&mut slot.value, value)
        };
        drop(old);
        self.notify_value_changed();
        Ok(())
    }

    /// source 的值变化后，consumer 换成 source 的新值
    fn follow_share_source(&self, source: &ResourceRef) {
        let value = source.value();
        let old = {
            let mut slot = self.inner.slot.lock();
            let linked = slot
                .share_source
                .as_ref()
                .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(&source.inner)));
            let unchanged = match (&slot.value, &value) {
                (Some(current), Some(next)) => current.object_id() == next.object_id(),
                (None, None) => true,
                _ => false,
            };
            if !linked || unchanged {
                return;
            }
            std::mem::replace(&mut slot.value, value)
        };
        log::trace!(
            "resource '{}' follows '{}' ({:?} -> {:?})",
            self.name(),
            source.name(),
            old.as_ref().map(|v| v.object_id()),
            self.object_id()
        );
        drop(old);
        self.notify_value_changed();
    }

    fn unsubscribe_share_source(&self) {
        let (source, key) = {
            let mut slot = self.inner.slot.lock();
            (slot.share_source.take(), slot.share_subscription.take())
        };
        if let (Some(source), Some(key)) = (source.and_then(|weak| weak.upgrade()), key) {
            ResourceRef { inner: source }.remove_value_changed(key);
        }
    }

    /// 释放当前值，清除共享关系并取消对 source 的订阅
    ///
    /// 对空句柄调用不会触发回调。
    pub fn dispose(&self) {
        self.unsubscribe_share_source();
        let old = {
            let mut slot = self.inner.slot.lock();
            slot.shared = false;
            slot.value.take()
        };
        if let Some(old) = old {
            log::trace!("dispose resource '{}' ({:?})", self.name(), old.object_id());
            self.notify_value_changed();
        }
    }

    fn share_chain_contains(&self, target: &ResourceRef) -> bool {
        let mut current = self.share_source();
        while let Some(source) = current {
            if source.ptr_eq(target) {
                return true;
            }
            current = source.share_source();
        }
        false
    }
}

// ValueChanged
impl ResourceRef {
    pub fn on_value_changed(&self, callback: impl Fn(&ResourceRef) + Send + Sync + 'static) -> ValueChangedKey {
        self.inner.callbacks.lock().insert(Arc::new(callback))
    }

    pub fn remove_value_changed(&self, key: ValueChangedKey) -> bool {
        self.inner.callbacks.lock().remove(key).is_some()
    }

    /// 在不持有任何锁的情况下同步调用所有回调，回调中可以安全地读取当前句柄
    fn notify_value_changed(&self) {
        let callbacks: Vec<ValueChangedCallback> = self.inner.callbacks.lock().values().cloned().collect();
        for callback in callbacks {
            callback(self);
        }
    }
}

impl Debug for ResourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let slot = self.inner.slot.lock();
        f.debug_struct("ResourceRef")
            .field("name", &self.inner.name)
            .field("value", &slot.value.as_ref().map(|value| value.object_id()))
            .field("shared", &slot.shared)
            .finish()
    }
}

/// 不持有所有权的句柄
#[derive(Clone)]
pub struct WeakResourceRef {
    inner: Weak<ResourceRefInner>,
}
impl WeakResourceRef {
    pub fn upgrade(&self) -> Option<ResourceRef> {
        self.inner.upgrade().map(|inner| ResourceRef { inner })
    }

    pub fn points_to(&self, resource: &ResourceRef) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(&resource.inner))
    }
}
impl Debug for WeakResourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.upgrade() {
            Some(resource) => write!(f, "WeakResourceRef({})", resource.name()),
            None => write!(f, "WeakResourceRef(<dropped>)"),
        }
    }
}

/// [`ResourceRef`] 的类型化视图
///
/// 不影响底层句柄的生命周期；值的类型在读取时检查。
pub struct TypedResourceRef<T> {
    base: ResourceRef,
    _phantom: PhantomData<fn() -> T>,
}
impl<T> Clone for TypedResourceRef<T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            _phantom: PhantomData,
        }
    }
}
impl<T: GfxResource> TypedResourceRef<T> {
    pub fn new(base: ResourceRef) -> Self {
        Self {
            base,
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn base(&self) -> &ResourceRef {
        &self.base
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.base.name()
    }

    #[inline]
    pub fn has_value(&self) -> bool {
        self.base.has_value()
    }

    /// 当前值；句柄为空或值的类型不是 `T` 时返回 `None`
    #[inline]
    pub fn value(&self) -> Option<Arc<T>> {
        self.base.downcast::<T>()
    }

    /// 当前值，句柄为空时返回错误
    pub fn get(&self) -> RgResult<Arc<T>> {
        let value = self.base.value().ok_or_else(|| RenderGraphError::EmptyResource(self.name().to_string()))?;
        value.into_any_arc().downcast::<T>().map_err(|_| RenderGraphError::TypeMismatch {
            name: self.name().to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// 转发底层句柄的 ValueChanged
    pub fn on_value_changed(
        &self,
        callback: impl Fn(&TypedResourceRef<T>) + Send + Sync + 'static,
    ) -> ValueChangedKey {
        self.base.on_value_changed(move |base| callback(&TypedResourceRef::new(base.clone())))
    }
}
impl<T> Debug for TypedResourceRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypedResourceRef<{}>({:?})", std::any::type_name::<T>(), self.base)
    }
}
