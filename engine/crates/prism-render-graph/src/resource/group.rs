use std::fmt::Debug;
use std::sync::Arc;

use prism_gfx::device::{GfxDevice, GfxObjectId, GfxResource, GfxResourceKind};

use crate::error::{RenderGraphError, RgResult};
use crate::resource::arena::SharedResourceArena;
use crate::resource::descriptor::ResourceDescriptor;
use crate::resource::resource_ref::ResourceRef;

/// 一次批量构造所需的上下文
pub(crate) struct ConstructContext<'a> {
    pub device: &'a dyn GfxDevice,
    /// 允许跨图共享时才会有值
    pub arena: Option<&'a SharedResourceArena>,
    pub graph_id: u64,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructStats {
    /// 新创建的设备对象数量
    pub constructed: usize,
    /// 复用已有对象的数量
    pub aliased: usize,
}
impl std::ops::AddAssign for ConstructStats {
    fn add_assign(&mut self, rhs: Self) {
        self.constructed += rhs.constructed;
        self.aliased += rhs.aliased;
    }
}

/// 同一类资源的列表 + 延迟构造列表
pub(crate) struct ResourceGroup<D, T> {
    kind: GfxResourceKind,
    resources: Vec<Arc<T>>,
    descriptors: Vec<ResourceDescriptor<D, T>>,
}

// new & init
impl<D, T> ResourceGroup<D, T> {
    pub fn new(kind: GfxResourceKind) -> Self {
        Self {
            kind,
            resources: Vec::new(),
            descriptors: Vec::new(),
        }
    }
}

// getters
impl<D, T> ResourceGroup<D, T> {
    #[inline]
    pub fn resources(&self) -> &[Arc<T>] {
        &self.resources
    }

    #[inline]
    pub fn descriptors(&self) -> &[ResourceDescriptor<D, T>] {
        &self.descriptors
    }
}

impl<D, T> ResourceGroup<D, T>
where
    D: Clone + PartialEq + Debug + Send + Sync + 'static,
    T: GfxResource,
{
    pub fn push_resource(&mut self, value: Arc<T>) {
        self.resources.push(value);
    }

    pub fn push_descriptor(&mut self, descriptor: ResourceDescriptor<D, T>) {
        self.descriptors.push(descriptor);
    }

    pub fn find_descriptor(&self, resource: &ResourceRef) -> Option<usize> {
        self.descriptors.iter().position(|d| d.targets(resource))
    }

    pub fn remove_descriptor(&mut self, index: usize) {
        self.descriptors.remove(index);
    }

    fn construct_at(&mut self, index: usize, ctx: &ConstructContext<'_>, stats: &mut ConstructStats) -> RgResult<()> {
        if self.descriptors[index].is_created() {
            return Ok(());
        }

        // 显式指定的 source：先保证 source 已构造，再借用它的值
        if let Some(source) = self.descriptors[index].share_source() {
            if let Some(source_index) = self.find_descriptor(&source) {
                self.construct_at(source_index, ctx, stats)?;
            }
            if source.has_value() {
                self.descriptors[index].alias(&source)?;
                stats.aliased += 1;
                log::debug!("{} '{}' shares '{}'", self.kind, self.descriptors[index].resource().name(), source.name());
                return Ok(());
            }
            log::warn!(
                "{} '{}': share source '{}' has no value, constructing its own",
                self.kind,
                self.descriptors[index].resource().name(),
                source.name()
            );
        }

        let flags = self.descriptors[index].flags();
        if flags.is_shared() {
            let matching = (0..self.descriptors.len())
                .find(|&other| other != index && self.descriptors[index].can_alias(&self.descriptors[other]));
            if let Some(source_index) = matching {
                let source = self.descriptors[source_index].resource().clone();
                self.descriptors[source_index].mark_shared();
                self.descriptors[index].alias(&source)?;
                stats.aliased += 1;
                log::debug!("{} '{}' reuses '{}'", self.kind, self.descriptors[index].resource().name(), source.name());
                return Ok(());
            }

            if flags.allows_cross_graph()
                && let Some(arena) = ctx.arena
                && let Some(source) = arena.find_shared(ctx.graph_id, self.kind, self.descriptors[index].desc())
            {
                self.descriptors[index].alias(&source)?;
                stats.aliased += 1;
                log::debug!(
                    "{} '{}' reuses '{}' from another graph",
                    self.kind,
                    self.descriptors[index].resource().name(),
                    source.name()
                );
                return Ok(());
            }
        }

        let value = self.descriptors[index].construct(ctx.device)?;
        self.resources.push(value);
        stats.constructed += 1;

        let descriptor = &self.descriptors[index];
        if descriptor.flags().allows_cross_graph()
            && let Some(arena) = ctx.arena
        {
            arena.publish(ctx.graph_id, self.kind, descriptor.desc(), descriptor.resource());
        }
        Ok(())
    }
}

/// 与具体资源类型无关的分组操作
pub(crate) trait AnyResourceGroup {
    fn kind(&self) -> GfxResourceKind;

    /// 构造所有尚未构造的描述
    fn construct_all(&mut self, ctx: &ConstructContext<'_>) -> RgResult<ConstructStats>;

    fn has_descriptor(&self, resource: &ResourceRef) -> bool;

    /// 指定 consumer 借用 source 的值
    fn link(&mut self, consumer: &ResourceRef, source: &ResourceRef) -> RgResult<()>;

    /// 移除句柄对应的描述与对象
    fn remove_resource(&mut self, resource: &ResourceRef) -> bool;

    /// 从列表中移除已释放的对象
    fn forget_object(&mut self, id: GfxObjectId);

    fn pending_count(&self) -> usize;

    fn object_count(&self) -> usize;

    fn clear(&mut self);
}

impl<D, T> AnyResourceGroup for ResourceGroup<D, T>
where
    D: Clone + PartialEq + Debug + Send + Sync + 'static,
    T: GfxResource,
{
    fn kind(&self) -> GfxResourceKind {
        self.kind
    }

    fn construct_all(&mut self, ctx: &ConstructContext<'_>) -> RgResult<ConstructStats> {
        let mut stats = ConstructStats::default();
        for index in 0..self.descriptors.len() {
            self.construct_at(index, ctx, &mut stats)?;
        }
        Ok(stats)
    }

    fn has_descriptor(&self, resource: &ResourceRef) -> bool {
        self.find_descriptor(resource).is_some()
    }

    fn link(&mut self, consumer: &ResourceRef, source: &ResourceRef) -> RgResult<()> {
        let invalid = |reason| RenderGraphError::InvalidShare {
            consumer: consumer.name().to_string(),
            source_name: source.name().to_string(),
            reason,
        };

        if consumer.ptr_eq(source) {
            return Err(invalid("a resource cannot share itself"));
        }
        let consumer_index = self.find_descriptor(consumer).ok_or_else(|| invalid("consumer is not a lazy resource"))?;
        let source_index = self.find_descriptor(source).ok_or_else(|| invalid("source is not a lazy resource of the same kind"))?;
        if self.descriptors[consumer_index].is_created() {
            return Err(invalid("consumer is already created"));
        }

        // source 链上不能出现 consumer
        let mut cursor = self.descriptors[source_index].share_source();
        while let Some(upstream) = cursor {
            if upstream.ptr_eq(consumer) {
                return Err(invalid("share source would form a cycle"));
            }
            cursor = self.find_descriptor(&upstream).and_then(|i| self.descriptors[i].share_source());
        }

        self.descriptors[source_index].mark_shared();
        let descriptor = &mut self.descriptors[consumer_index];
        descriptor.set_share_source(source);
        descriptor.mark_shared();
        if let Some(container) = descriptor.container() {
            container.add_shared_resource(source);
        }
        Ok(())
    }

    fn remove_resource(&mut self, resource: &ResourceRef) -> bool {
        // 借用的句柄与 source 指向同一个对象，不能把 source 的对象移出列表
        let object = resource.object_id().filter(|_| resource.share_source().is_none());
        let before = self.descriptors.len() + self.resources.len();
        self.descriptors.retain(|d| !d.targets(resource));
        if let Some(id) = object {
            self.resources.retain(|r| r.object_id() != id);
        }
        before != self.descriptors.len() + self.resources.len()
    }

    fn forget_object(&mut self, id: GfxObjectId) {
        self.resources.retain(|r| r.object_id() != id);
    }

    fn pending_count(&self) -> usize {
        self.descriptors.iter().filter(|d| !d.is_created()).count()
    }

    fn object_count(&self) -> usize {
        self.resources.len()
    }

    fn clear(&mut self) {
        self.resources.clear();
        self.descriptors.clear();
    }
}
