use std::sync::Arc;

use prism_gfx::device::{GfxDevice, GfxResource};

use crate::error::{RenderGraphError, RgResult};
use crate::resource::container::GraphResourceContainer;
use crate::resource::flags::ResourceCreationFlags;
use crate::resource::resource_ref::{ResourceRef, WeakResourceRef};

/// 资源构造函数：`(device, desc, name) -> resource`
pub type ResourceConstructor<D, T> = Arc<dyn Fn(&dyn GfxDevice, &D, &str) -> anyhow::Result<T> + Send + Sync>;

/// 延迟构造记录
///
/// 保存 desc、构造函数和目标句柄，在 `GraphResourceBuilder::create_resources` 中被消费恰好一次。
pub struct ResourceDescriptor<D, T> {
    desc: D,
    resource: ResourceRef,
    container: Option<GraphResourceContainer>,
    constructor: ResourceConstructor<D, T>,
    flags: ResourceCreationFlags,
    created: bool,
    shared: bool,
    share_source: Option<WeakResourceRef>,
}

// new & init
impl<D, T: GfxResource> ResourceDescriptor<D, T> {
    pub fn new(
        desc: D,
        resource: ResourceRef,
        container: Option<GraphResourceContainer>,
        constructor: ResourceConstructor<D, T>,
        flags: ResourceCreationFlags,
    ) -> Self {
        Self {
            desc,
            resource,
            container,
            constructor,
            flags,
            created: false,
            shared: false,
            share_source: None,
        }
    }
}

// getters
impl<D, T> ResourceDescriptor<D, T> {
    #[inline]
    pub fn desc(&self) -> &D {
        &self.desc
    }

    #[inline]
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    #[inline]
    pub fn container(&self) -> Option<&GraphResourceContainer> {
        self.container.as_ref()
    }

    #[inline]
    pub fn flags(&self) -> ResourceCreationFlags {
        self.flags
    }

    #[inline]
    pub fn is_created(&self) -> bool {
        self.created
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn share_source(&self) -> Option<ResourceRef> {
        self.share_source.as_ref().and_then(WeakResourceRef::upgrade)
    }

    #[inline]
    pub fn targets(&self, resource: &ResourceRef) -> bool {
        self.resource.ptr_eq(resource)
    }
}

// update
impl<D, T: GfxResource> ResourceDescriptor<D, T> {
    /// 标记为 source 的消费端；source 端由调用方调用 [`Self::mark_shared`]
    pub(crate) fn set_share_source(&mut self, source: &ResourceRef) {
        self.shared = true;
        self.share_source = Some(source.downgrade());
    }

    pub(crate) fn mark_shared(&mut self) {
        self.shared = true;
        self.resource.set_shared(true);
    }

    /// 调用构造函数并把结果写入目标句柄
    pub(crate) fn construct(&mut self, device: &dyn GfxDevice) -> RgResult<Arc<T>> {
        debug_assert!(!self.created, "descriptor '{}' constructed twice", self.resource.name());

        let name = self.resource.name();
        let value = (self.constructor)(device, &self.desc, name).map_err(|source| {
            RenderGraphError::Construction {
                name: name.to_string(),
                source,
            }
        })?;
        let value = Arc::new(value);
        self.resource.set_value(Some(value.clone()));
        self.finish();
        Ok(value)
    }

    /// 借用 source 句柄的值完成构造，不产生新的设备对象
    pub(crate) fn alias(&mut self, source: &ResourceRef) -> RgResult<()> {
        self.resource.set_share_source(source)?;
        self.set_share_source(source);
        if let Some(container) = &self.container {
            container.add_shared_resource(source);
        }
        self.finish();
        Ok(())
    }

    fn finish(&mut self) {
        self.created = true;
        self.flags.remove(ResourceCreationFlags::LAZY_INIT);
    }
}

impl<D: PartialEq, T> ResourceDescriptor<D, T> {
    /// `self` 能否复用已构造的 `other`
    ///
    /// 两者都需要 SHARED，desc 相等；同一个容器内只有双方都带 GROUP_SHARED 才允许；
    /// 没有容器的描述不参与匹配。
    pub fn can_alias(&self, other: &ResourceDescriptor<D, T>) -> bool {
        if !self.flags.is_shared() || !other.flags.is_shared() || !other.created || other.targets(&self.resource) {
            return false;
        }
        // other 本身也是借来的，沿着它的 source 复用即可，这里不重复匹配
        if other.share_source.is_some() {
            return false;
        }

        let Some(container) = &self.container else {
            return false;
        };
        if let Some(other_container) = &other.container
            && other_container.same_as(container)
            && !(self.flags.contains(ResourceCreationFlags::GROUP_SHARED)
                && other.flags.contains(ResourceCreationFlags::GROUP_SHARED))
        {
            return false;
        }
        if container.has_shared_resource(&other.resource) {
            return false;
        }

        self.desc == other.desc
    }
}

impl<D: std::fmt::Debug, T> std::fmt::Debug for ResourceDescriptor<D, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("name", &self.resource.name())
            .field("desc", &self.desc)
            .field("flags", &self.flags)
            .field("created", &self.created)
            .field("shared", &self.shared)
            .field("share_source", &self.share_source)
            .finish()
    }
}
