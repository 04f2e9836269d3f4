//! 资源注册表 / 工厂
//!
//! pass 在 `init` 中通过 [`GraphResourceBuilder`] 声明资源：
//!
//! - 不带 `LAZY_INIT` 的资源立即构造
//! - 带 `LAZY_INIT` 的资源只登记一个 [`ResourceDescriptor`]，在所有 pass 都完成 `init` 之后由
//!   [`GraphResourceBuilder::create_resources`] 统一构造；这也是 resize 时重建所有资源的批处理点
//! - 常量 buffer 与结构化 buffer 是泛型资源，总是立即构造

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use prism_gfx::device::{GfxDevice, GfxObjectId, GfxResource, GfxResourceKind};
use prism_gfx::resources::buffer::{ConstantBuffer, StructuredBuffer, StructuredUavBuffer};
use prism_gfx::resources::depth::{DepthMipChain, DepthStencil, DepthStencilBufferDesc};
use prism_gfx::resources::gbuffer::{GBuffer, GBufferDesc};
use prism_gfx::resources::pipeline::{ComputePipeline, ComputePipelineDesc, GraphicsPipelineState, GraphicsPipelineStateDesc};
use prism_gfx::resources::sampler::{SamplerState, SamplerStateDesc};
use prism_gfx::resources::shadow_atlas::{ShadowAtlas, ShadowAtlasDesc};
use prism_gfx::resources::texture::{Texture1D, Texture1DDesc, Texture2D, Texture2DDesc, Texture3D, Texture3DDesc};
use prism_gfx::viewport::Viewport;

use crate::error::{RenderGraphError, RgResult};
use crate::resource::arena::{SharedResourceArena, is_global_name};
use crate::resource::container::GraphResourceContainer;
use crate::resource::descriptor::{ResourceConstructor, ResourceDescriptor};
use crate::resource::flags::ResourceCreationFlags;
use crate::resource::group::{AnyResourceGroup, ConstructContext, ConstructStats, ResourceGroup};
use crate::resource::resource_ref::{ResourceRef, TypedResourceRef};

struct ResourceRecord {
    resource: ResourceRef,
    /// 声明该资源时绑定的节点容器
    container: Option<GraphResourceContainer>,
}

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

pub struct GraphResourceBuilder {
    device: Arc<dyn GfxDevice>,
    graph_id: u64,
    arena: Option<SharedResourceArena>,
    /// 只影响当前渲染图：是否向 arena 发布 / 从 arena 复用 Shared 资源
    cross_graph_sharing: bool,

    /// 当前正在 init 的节点的容器
    container: Option<GraphResourceContainer>,

    records: IndexMap<String, ResourceRecord>,

    viewport: Viewport,
    output_viewport: Viewport,
    default_flags: ResourceCreationFlags,

    constant_buffers: Vec<Arc<dyn GfxResource>>,
    structured_buffers: Vec<Arc<dyn GfxResource>>,
    structured_uav_buffers: Vec<Arc<dyn GfxResource>>,

    shadow_atlases: ResourceGroup<ShadowAtlasDesc, ShadowAtlas>,
    depth_mip_chains: ResourceGroup<DepthStencilBufferDesc, DepthMipChain>,
    depth_stencil_buffers: ResourceGroup<DepthStencilBufferDesc, DepthStencil>,
    gbuffers: ResourceGroup<GBufferDesc, GBuffer>,
    textures_1d: ResourceGroup<Texture1DDesc, Texture1D>,
    textures_2d: ResourceGroup<Texture2DDesc, Texture2D>,
    textures_3d: ResourceGroup<Texture3DDesc, Texture3D>,
    sampler_states: ResourceGroup<SamplerStateDesc, SamplerState>,
    graphics_pipelines: ResourceGroup<GraphicsPipelineStateDesc, GraphicsPipelineState>,
    compute_pipelines: ResourceGroup<ComputePipelineDesc, ComputePipeline>,
}

// new & init
impl GraphResourceBuilder {
    pub fn new(device: Arc<dyn GfxDevice>) -> Self {
        Self {
            device,
            graph_id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            arena: None,
            cross_graph_sharing: true,
            container: None,
            records: IndexMap::new(),
            viewport: Viewport::default(),
            output_viewport: Viewport::default(),
            default_flags: ResourceCreationFlags::LAZY_INIT,

            constant_buffers: Vec::new(),
            structured_buffers: Vec::new(),
            structured_uav_buffers: Vec::new(),

            shadow_atlases: ResourceGroup::new(GfxResourceKind::ShadowAtlas),
            depth_mip_chains: ResourceGroup::new(GfxResourceKind::DepthMipChain),
            depth_stencil_buffers: ResourceGroup::new(GfxResourceKind::DepthStencil),
            gbuffers: ResourceGroup::new(GfxResourceKind::GBuffer),
            textures_1d: ResourceGroup::new(GfxResourceKind::Texture1D),
            textures_2d: ResourceGroup::new(GfxResourceKind::Texture2D),
            textures_3d: ResourceGroup::new(GfxResourceKind::Texture3D),
            sampler_states: ResourceGroup::new(GfxResourceKind::SamplerState),
            graphics_pipelines: ResourceGroup::new(GfxResourceKind::GraphicsPipelineState),
            compute_pipelines: ResourceGroup::new(GfxResourceKind::ComputePipeline),
        }
    }

    /// 挂到共享资源表上：`#` 前缀的全局资源与跨图共享都经由它
    pub fn with_arena(mut self, arena: SharedResourceArena) -> Self {
        self.arena = Some(arena);
        self
    }

    pub fn with_cross_graph_sharing(mut self, enabled: bool) -> Self {
        self.cross_graph_sharing = enabled;
        self
    }

    pub fn with_default_flags(mut self, flags: ResourceCreationFlags) -> Self {
        self.default_flags = flags.normalized();
        self
    }
}

// getters
impl GraphResourceBuilder {
    #[inline]
    pub fn device(&self) -> &Arc<dyn GfxDevice> {
        &self.device
    }

    /// 用于区分不同渲染图的 id
    #[inline]
    pub fn graph_id(&self) -> u64 {
        self.graph_id
    }

    #[inline]
    pub fn arena(&self) -> Option<&SharedResourceArena> {
        self.arena.as_ref()
    }

    #[inline]
    pub fn cross_graph_sharing(&self) -> bool {
        self.cross_graph_sharing
    }

    #[inline]
    pub fn container(&self) -> Option<&GraphResourceContainer> {
        self.container.as_ref()
    }

    /// 渲染分辨率
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// 窗口（输出）分辨率
    #[inline]
    pub fn output_viewport(&self) -> Viewport {
        self.output_viewport
    }

    /// 配置中指定的默认创建 flags
    #[inline]
    pub fn default_flags(&self) -> ResourceCreationFlags {
        self.default_flags
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceRef> {
        self.records.values().map(|record| &record.resource)
    }

    pub fn resource_count(&self) -> usize {
        self.records.len()
    }

    /// 尚未构造的延迟资源数量
    pub fn pending_count(&self) -> usize {
        self.groups().iter().map(|group| group.pending_count()).sum()
    }

    /// 当前持有的设备对象数量（不含借用）
    pub fn object_count(&self) -> usize {
        let groups: usize = self.groups().iter().map(|group| group.object_count()).sum();
        groups + self.constant_buffers.len() + self.structured_buffers.len() + self.structured_uav_buffers.len()
    }

    #[inline]
    pub fn textures_2d(&self) -> &[Arc<Texture2D>] {
        self.textures_2d.resources()
    }

    #[inline]
    pub fn gbuffers(&self) -> &[Arc<GBuffer>] {
        self.gbuffers.resources()
    }

    #[inline]
    pub fn shadow_atlases(&self) -> &[Arc<ShadowAtlas>] {
        self.shadow_atlases.resources()
    }

    #[inline]
    pub fn depth_stencil_buffers(&self) -> &[Arc<DepthStencil>] {
        self.depth_stencil_buffers.resources()
    }

    /// Texture2D 的延迟构造记录
    #[inline]
    pub fn texture_2d_descriptors(&self) -> &[ResourceDescriptor<Texture2DDesc, Texture2D>] {
        self.textures_2d.descriptors()
    }
}

// setters
impl GraphResourceBuilder {
    /// 绑定当前声明资源的节点容器；`None` 解除绑定
    pub fn set_container(&mut self, container: Option<GraphResourceContainer>) {
        self.container = container;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_output_viewport(&mut self, viewport: Viewport) {
        self.output_viewport = viewport;
    }
}

// register & lookup
impl GraphResourceBuilder {
    /// 登记一个新的句柄，重名是构建期错误
    pub fn add_resource(&mut self, name: &str) -> RgResult<ResourceRef> {
        if self.records.contains_key(name) {
            return Err(RenderGraphError::DuplicateResource(name.to_string()));
        }
        Ok(self.register_or_get(name))
    }

    pub fn add_resource_typed<T: GfxResource>(&mut self, name: &str) -> RgResult<TypedResourceRef<T>> {
        self.add_resource(name).map(TypedResourceRef::new)
    }

    /// 获取句柄，不存在时登记一个空句柄
    ///
    /// `#` 前缀的全局资源来自共享资源表，只是借用，不会被当前渲染图释放。
    pub fn get_or_add_resource(&mut self, name: &str) -> ResourceRef {
        if let Some(record) = self.records.get(name) {
            return record.resource.clone();
        }
        if is_global_name(name)
            && let Some(arena) = &self.arena
        {
            return arena.get_or_add(name);
        }
        self.register_or_get(name)
    }

    pub fn get_or_add<T: GfxResource>(&mut self, name: &str) -> TypedResourceRef<T> {
        TypedResourceRef::new(self.get_or_add_resource(name))
    }

    pub fn try_get_resource(&self, name: &str) -> Option<ResourceRef> {
        if let Some(record) = self.records.get(name) {
            return Some(record.resource.clone());
        }
        if is_global_name(name) {
            return self.arena.as_ref().and_then(|arena| arena.try_get(name));
        }
        None
    }

    /// 值的类型不是 `T` 时同样返回 `None`
    pub fn try_get<T: GfxResource>(&self, name: &str) -> Option<TypedResourceRef<T>> {
        let resource = self.try_get_resource(name)?;
        Self::typed_checked(resource).ok()
    }

    pub fn get_resource(&self, name: &str) -> RgResult<ResourceRef> {
        self.try_get_resource(name).ok_or_else(|| RenderGraphError::UnknownResource(name.to_string()))
    }

    pub fn get<T: GfxResource>(&self, name: &str) -> RgResult<TypedResourceRef<T>> {
        Self::typed_checked(self.get_resource(name)?)
    }

    /// 注销并释放资源
    pub fn remove_resource(&mut self, name: &str) -> bool {
        let Some(record) = self.records.shift_remove(name) else {
            return false;
        };

        for group in self.groups_mut() {
            group.remove_resource(&record.resource);
        }
        if let Some(id) = Self::owned_object(&record.resource) {
            self.forget_eager_object(id);
        }
        if let Some(container) = &record.container {
            container.remove_resource(&record.resource);
        }
        record.resource.dispose();
        true
    }

    /// 释放资源的值，句柄保持登记
    pub fn dispose_resource(&mut self, name: &str) -> bool {
        let Some(resource) = self.records.get(name).map(|record| record.resource.clone()) else {
            return false;
        };

        if let Some(id) = Self::owned_object(&resource) {
            for group in self.groups_mut() {
                group.forget_object(id);
            }
            self.forget_eager_object(id);
        }
        resource.dispose();
        true
    }

    fn register_or_get(&mut self, name: &str) -> ResourceRef {
        if let Some(record) = self.records.get_mut(name) {
            // 容器被清空过（resize），由重新声明它的节点认领
            if let Some(container) = &self.container
                && record.container.as_ref().is_none_or(|owner| !owner.contains(&record.resource))
            {
                container.add_resource(&record.resource);
                record.container = Some(container.clone());
            }
            return record.resource.clone();
        }

        let resource = match &self.arena {
            Some(arena) if is_global_name(name) => arena.get_or_add(name),
            _ => ResourceRef::new(name),
        };
        if let Some(container) = &self.container {
            container.add_resource(&resource);
        }
        self.records.insert(
            name.to_string(),
            ResourceRecord {
                resource: resource.clone(),
                container: self.container.clone(),
            },
        );
        resource
    }

    fn typed_checked<T: GfxResource>(resource: ResourceRef) -> RgResult<TypedResourceRef<T>> {
        match resource.holds::<T>() {
            Some(false) => Err(RenderGraphError::TypeMismatch {
                name: resource.name().to_string(),
                expected: std::any::type_name::<T>(),
            }),
            _ => Ok(TypedResourceRef::new(resource)),
        }
    }

    /// 句柄自己拥有的对象 id；借用来的对象不归它管
    fn owned_object(resource: &ResourceRef) -> Option<GfxObjectId> {
        resource.object_id().filter(|_| resource.share_source().is_none())
    }

    fn forget_eager_object(&mut self, id: GfxObjectId) {
        self.constant_buffers.retain(|r| r.object_id() != id);
        self.structured_buffers.retain(|r| r.object_id() != id);
        self.structured_uav_buffers.retain(|r| r.object_id() != id);
    }
}

// create & update
impl GraphResourceBuilder {
    /// 创建或获取资源
    ///
    /// - 同名句柄已有值：原样返回
    /// - 否则登记（或复用空的）句柄
    /// - 不带 `LAZY_INIT`：立即构造并加入 `group`
    /// - 带 `LAZY_INIT` 且尚无待构造记录：登记一个延迟构造记录
    ///
    /// 同一个句柄在另一类资源中已有待构造记录时返回 `TypeMismatch`。
    fn create_resource<D, T>(
        &mut self,
        name: &str,
        desc: D,
        constructor: ResourceConstructor<D, T>,
        flags: ResourceCreationFlags,
        group: fn(&mut Self) -> &mut ResourceGroup<D, T>,
    ) -> RgResult<TypedResourceRef<T>>
    where
        D: Clone + PartialEq + Debug + Send + Sync + 'static,
        T: GfxResource,
    {
        let flags = flags.normalized();
        if let Some(existing) = self.try_get_resource(name)
            && existing.has_value()
        {
            return Self::typed_checked(existing);
        }

        let resource = self.register_or_get(name);
        let kind = group(self).kind();
        if self.groups().iter().any(|other| other.kind() != kind && other.has_descriptor(&resource)) {
            return Err(RenderGraphError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            });
        }

        let container = self.container.clone();
        let device = Arc::clone(&self.device);
        let group = group(self);
        let pending = group.find_descriptor(&resource);

        if !flags.is_lazy() {
            let value = (constructor)(device.as_ref(), &desc, name).map_err(|source| RenderGraphError::Construction {
                name: name.to_string(),
                source,
            })?;
            let value = Arc::new(value);
            resource.set_value(Some(value.clone()));
            group.push_resource(value);
            if let Some(index) = pending {
                group.remove_descriptor(index);
            }
            log::debug!("created {} '{}' ({:?})", group.kind(), name, desc);
        } else if pending.is_none() {
            group.push_descriptor(ResourceDescriptor::new(desc, resource.clone(), container, constructor, flags));
            log::trace!("deferred {} '{}' ({:?})", group.kind(), name, flags);
        }

        Ok(TypedResourceRef::new(resource))
    }

    /// 用新的 desc 重建已登记的资源
    fn update_resource<D, T>(
        &mut self,
        name: &str,
        desc: D,
        constructor: ResourceConstructor<D, T>,
        group: fn(&mut Self) -> &mut ResourceGroup<D, T>,
    ) -> RgResult<TypedResourceRef<T>>
    where
        D: Clone + PartialEq + Debug + Send + Sync + 'static,
        T: GfxResource,
    {
        let resource = self
            .records
            .get(name)
            .map(|record| record.resource.clone())
            .ok_or_else(|| RenderGraphError::UnknownResource(name.to_string()))?;
        if resource.holds::<T>() == Some(false) {
            return Self::typed_checked(resource);
        }

        let device = Arc::clone(&self.device);
        let group = group(self);
        if let Some(index) = group.find_descriptor(&resource) {
            group.remove_descriptor(index);
        }
        if let Some(id) = Self::owned_object(&resource) {
            group.forget_object(id);
        }
        resource.dispose();

        let value = (constructor)(device.as_ref(), &desc, name).map_err(|source| RenderGraphError::Construction {
            name: name.to_string(),
            source,
        })?;
        let value = Arc::new(value);
        resource.set_value(Some(value.clone()));
        group.push_resource(value);
        log::debug!("updated {} '{}' ({:?})", group.kind(), name, desc);

        Ok(TypedResourceRef::new(resource))
    }

    fn create_eager_buffer<T: GfxResource>(
        &mut self,
        name: &str,
        constructor: impl FnOnce(&dyn GfxDevice, &str) -> anyhow::Result<T>,
        list: fn(&mut Self) -> &mut Vec<Arc<dyn GfxResource>>,
    ) -> RgResult<TypedResourceRef<T>> {
        if let Some(existing) = self.try_get_resource(name)
            && existing.has_value()
        {
            return Self::typed_checked(existing);
        }

        let resource = self.register_or_get(name);
        let value = constructor(self.device.as_ref(), name).map_err(|source| RenderGraphError::Construction {
            name: name.to_string(),
            source,
        })?;
        let value = Arc::new(value);
        resource.set_value(Some(value.clone()));
        list(self).push(value);
        Ok(TypedResourceRef::new(resource))
    }

    pub fn create_constant_buffer<T>(&mut self, name: &str) -> RgResult<TypedResourceRef<ConstantBuffer<T>>>
    where
        T: bytemuck::Pod + Send + Sync,
    {
        self.create_eager_buffer(name, |device, name| ConstantBuffer::<T>::new(device, name), |b| {
            &mut b.constant_buffers
        })
    }

    pub fn create_constant_buffer_with<T>(
        &mut self,
        name: &str,
        value: &T,
    ) -> RgResult<TypedResourceRef<ConstantBuffer<T>>>
    where
        T: bytemuck::Pod + Send + Sync,
    {
        self.create_eager_buffer(name, |device, name| ConstantBuffer::with_value(device, name, value), |b| {
            &mut b.constant_buffers
        })
    }

    pub fn create_structured_buffer<T>(
        &mut self,
        name: &str,
        capacity: u32,
        host_visible: bool,
    ) -> RgResult<TypedResourceRef<StructuredBuffer<T>>>
    where
        T: bytemuck::Pod + Send + Sync,
    {
        self.create_eager_buffer(
            name,
            |device, name| StructuredBuffer::<T>::new(device, name, capacity, host_visible),
            |b| &mut b.structured_buffers,
        )
    }

    pub fn create_structured_uav_buffer<T>(
        &mut self,
        name: &str,
        capacity: u32,
        with_counter: bool,
    ) -> RgResult<TypedResourceRef<StructuredUavBuffer<T>>>
    where
        T: bytemuck::Pod + Send + Sync,
    {
        self.create_eager_buffer(
            name,
            |device, name| StructuredUavBuffer::<T>::new(device, name, capacity, with_counter),
            |b| &mut b.structured_uav_buffers,
        )
    }
}

/// 为每一类可延迟构造的资源生成 `create_xxx` / `update_xxx` / `get_xxx`
macro_rules! resource_kind_api {
    ($(
        $label:literal => $field:ident: $desc:ty => $res:ty,
        $create:ident, $update:ident, $get:ident, $ctor:ident;
    )*) => {
        impl GraphResourceBuilder {
            $(
                #[doc = concat!("创建 ", $label, "；同名资源已有值时返回已有句柄")]
                pub fn $create(
                    &mut self,
                    name: &str,
                    desc: $desc,
                    flags: ResourceCreationFlags,
                ) -> RgResult<TypedResourceRef<$res>> {
                    self.create_resource::<$desc, $res>(
                        name,
                        desc,
                        Arc::new(|device: &dyn GfxDevice, desc: &$desc, name: &str| device.$ctor(desc, name)),
                        flags,
                        |b| &mut b.$field,
                    )
                }

                #[doc = concat!("以新的 desc 立即重建 ", $label)]
                pub fn $update(&mut self, name: &str, desc: $desc) -> RgResult<TypedResourceRef<$res>> {
                    self.update_resource::<$desc, $res>(
                        name,
                        desc,
                        Arc::new(|device: &dyn GfxDevice, desc: &$desc, name: &str| device.$ctor(desc, name)),
                        |b| &mut b.$field,
                    )
                }

                pub fn $get(&mut self, name: &str) -> TypedResourceRef<$res> {
                    self.get_or_add::<$res>(name)
                }
            )*
        }
    };
}

resource_kind_api! {
    "ShadowAtlas" => shadow_atlases: ShadowAtlasDesc => ShadowAtlas,
        create_shadow_atlas, update_shadow_atlas, get_shadow_atlas, create_shadow_atlas;
    "DepthMipChain" => depth_mip_chains: DepthStencilBufferDesc => DepthMipChain,
        create_depth_mip_chain, update_depth_mip_chain, get_depth_mip_chain, create_depth_mip_chain;
    "DepthStencil" => depth_stencil_buffers: DepthStencilBufferDesc => DepthStencil,
        create_depth_stencil_buffer, update_depth_stencil_buffer, get_depth_stencil_buffer, create_depth_stencil;
    "GBuffer" => gbuffers: GBufferDesc => GBuffer,
        create_gbuffer, update_gbuffer, get_gbuffer, create_gbuffer;
    "Texture1D" => textures_1d: Texture1DDesc => Texture1D,
        create_texture_1d, update_texture_1d, get_texture_1d, create_texture_1d;
    "Texture2D" => textures_2d: Texture2DDesc => Texture2D,
        create_texture_2d, update_texture_2d, get_texture_2d, create_texture_2d;
    "Texture3D" => textures_3d: Texture3DDesc => Texture3D,
        create_texture_3d, update_texture_3d, get_texture_3d, create_texture_3d;
    "SamplerState" => sampler_states: SamplerStateDesc => SamplerState,
        create_sampler_state, update_sampler_state, get_sampler_state, create_sampler_state;
    "GraphicsPipelineState" => graphics_pipelines: GraphicsPipelineStateDesc => GraphicsPipelineState,
        create_graphics_pipeline_state, update_graphics_pipeline_state, get_graphics_pipeline_state,
        create_graphics_pipeline_state;
    "ComputePipeline" => compute_pipelines: ComputePipelineDesc => ComputePipeline,
        create_compute_pipeline, update_compute_pipeline, get_compute_pipeline, create_compute_pipeline;
}

// lifecycle
impl GraphResourceBuilder {
    /// 构造所有待构造的延迟资源
    ///
    /// 构造失败时直接返回错误，已构造的资源不会回滚，调用方需要 `release_resources` 后重建。
    pub fn create_resources(&mut self) -> RgResult<ConstructStats> {
        #[cfg(feature = "tracy")]
        let _span = tracy_client::span!("GraphResourceBuilder::create_resources");

        let device = Arc::clone(&self.device);
        let arena = self.arena.clone().filter(|_| self.cross_graph_sharing);
        let ctx = ConstructContext {
            device: device.as_ref(),
            arena: arena.as_ref(),
            graph_id: self.graph_id,
        };

        let mut stats = ConstructStats::default();
        for group in self.groups_mut() {
            stats += group.construct_all(&ctx)?;
        }

        log::info!(
            "create_resources: {} constructed, {} shared, {} objects alive",
            stats.constructed,
            stats.aliased,
            self.object_count()
        );
        Ok(stats)
    }

    /// 指定 `consumer` 在构造时借用 `source` 的值
    ///
    /// 两者必须是同一类的延迟资源；两端都会被标记为 shared，
    /// source 登记到 consumer 所属容器的 shared 列表中。
    pub fn share_resource(&mut self, consumer: &str, source: &str) -> RgResult<()> {
        let consumer_ref = self.get_resource(consumer)?;
        let source_ref = self.get_resource(source)?;

        for group in self.groups_mut() {
            if group.has_descriptor(&consumer_ref) {
                return group.link(&consumer_ref, &source_ref);
            }
        }
        Err(RenderGraphError::InvalidShare {
            consumer: consumer.to_string(),
            source_name: source.to_string(),
            reason: "consumer is not a lazy resource",
        })
    }

    /// 释放所有资源并注销所有句柄
    pub fn release_resources(&mut self) {
        #[cfg(feature = "tracy")]
        let _span = tracy_client::span!("GraphResourceBuilder::release_resources");

        let count = self.dispose_values();
        self.records.clear();
        log::info!("release_resources: {count} resources released");
    }

    /// 释放所有资源的值，已登记的句柄保留
    ///
    /// 之后重新声明同名资源时，新构造的对象赋给同一个句柄，订阅了 ValueChanged 的一方会收到通知。
    pub fn release_resource_values(&mut self) {
        #[cfg(feature = "tracy")]
        let _span = tracy_client::span!("GraphResourceBuilder::release_resource_values");

        let count = self.dispose_values();
        log::info!("release_resource_values: {count} handles kept");
    }

    fn dispose_values(&mut self) -> usize {
        let mut cleared = HashSet::new();
        for record in self.records.values() {
            if let Some(container) = &record.container
                && cleared.insert(container.id())
            {
                container.clear();
            }
        }
        for record in self.records.values() {
            record.resource.dispose();
        }

        self.constant_buffers.clear();
        self.structured_buffers.clear();
        self.structured_uav_buffers.clear();
        for group in self.groups_mut() {
            group.clear();
        }
        if let Some(arena) = &self.arena {
            arena.unpublish_graph(self.graph_id);
        }
        self.records.len()
    }

    fn groups(&self) -> [&dyn AnyResourceGroup; 10] {
        [
            &self.shadow_atlases,
            &self.depth_mip_chains,
            &self.depth_stencil_buffers,
            &self.gbuffers,
            &self.textures_1d,
            &self.textures_2d,
            &self.textures_3d,
            &self.sampler_states,
            &self.graphics_pipelines,
            &self.compute_pipelines,
        ]
    }

    /// 构造顺序：阴影图集、深度、G-Buffer、纹理、采样器、管线
    fn groups_mut(&mut self) -> [&mut dyn AnyResourceGroup; 10] {
        [
            &mut self.shadow_atlases,
            &mut self.depth_mip_chains,
            &mut self.depth_stencil_buffers,
            &mut self.gbuffers,
            &mut self.textures_1d,
            &mut self.textures_2d,
            &mut self.textures_3d,
            &mut self.sampler_states,
            &mut self.graphics_pipelines,
            &mut self.compute_pipelines,
        ]
    }
}

impl Drop for GraphResourceBuilder {
    fn drop(&mut self) {
        if !self.records.is_empty() {
            log::debug!("GraphResourceBuilder dropped with {} live resources", self.records.len());
            self.release_resources();
        }
    }
}

#[cfg(test)]
mod tests {
    use ash::vk;
    use prism_gfx::headless::HeadlessDevice;

    use super::*;

    fn setup() -> (Arc<HeadlessDevice>, GraphResourceBuilder) {
        let device = Arc::new(HeadlessDevice::new());
        let builder = GraphResourceBuilder::new(device.clone());
        (device, builder)
    }

    fn color_desc() -> Texture2DDesc {
        Texture2DDesc::new(16, 16, vk::Format::R8G8B8A8_UNORM)
    }

    #[test]
    fn test_create_texture_2d_is_idempotent() {
        let (device, mut builder) = setup();

        let first = builder.create_texture_2d("T", color_desc(), ResourceCreationFlags::NONE).unwrap();
        let second = builder.create_texture_2d("T", color_desc(), ResourceCreationFlags::NONE).unwrap();

        assert!(first.base().ptr_eq(second.base()));
        assert_eq!(device.created_count(GfxResourceKind::Texture2D), 1);
        assert_eq!(builder.textures_2d().len(), 1);
    }

    #[test]
    fn test_lazy_create_is_idempotent() {
        let (device, mut builder) = setup();

        let first = builder.create_texture_2d("T", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        let second = builder.create_texture_2d("T", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        assert!(first.base().ptr_eq(second.base()));
        assert_eq!(builder.pending_count(), 1);

        builder.create_resources().unwrap();
        assert_eq!(device.created_count(GfxResourceKind::Texture2D), 1);
    }

    #[test]
    fn test_lazy_resource_is_empty_until_create_resources() {
        let (device, mut builder) = setup();

        let tex = builder.create_texture_2d("hdr", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        assert!(!tex.has_value());
        assert_eq!(device.live_objects(), 0);

        let stats = builder.create_resources().unwrap();
        assert_eq!(stats.constructed, 1);
        assert!(tex.has_value());
        assert_eq!(tex.get().unwrap().width(), 16);
        assert_eq!(builder.pending_count(), 0);

        // 第二次调用没有待构造的资源
        assert_eq!(builder.create_resources().unwrap(), ConstructStats::default());
    }

    #[test]
    fn test_explicit_share_source() {
        let (device, mut builder) = setup();
        let container_a = GraphResourceContainer::new("a");
        let container_b = GraphResourceContainer::new("b");

        builder.set_container(Some(container_a.clone()));
        let d1 = builder.create_texture_2d("d1", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder.set_container(Some(container_b.clone()));
        let d2 = builder.create_texture_2d("d2", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder.set_container(None);

        builder.share_resource("d2", "d1").unwrap();
        assert!(d1.base().is_shared());
        assert!(d2.base().is_shared());
        assert!(container_b.has_shared_resource(d1.base()));
        assert!(!container_a.has_shared_resource(d2.base()));

        let stats = builder.create_resources().unwrap();
        assert_eq!(stats, ConstructStats { constructed: 1, aliased: 1 });
        assert!(Arc::ptr_eq(&d1.get().unwrap(), &d2.get().unwrap()));
        assert_eq!(device.created_count(GfxResourceKind::Texture2D), 1);
        assert!(d2.base().share_source().unwrap().ptr_eq(d1.base()));

        let descriptors = builder.texture_2d_descriptors();
        assert!(descriptors.iter().all(|d| d.is_created() && d.is_shared()));
    }

    #[test]
    fn test_share_source_rejects_cycles_and_mismatched_kinds() {
        let (_device, mut builder) = setup();
        builder.create_texture_2d("a", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder.create_texture_2d("b", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder
            .create_sampler_state("s", SamplerStateDesc::default(), ResourceCreationFlags::LAZY_INIT)
            .unwrap();

        builder.share_resource("b", "a").unwrap();
        assert!(matches!(builder.share_resource("a", "b"), Err(RenderGraphError::InvalidShare { .. })));
        assert!(matches!(builder.share_resource("a", "a"), Err(RenderGraphError::InvalidShare { .. })));
        assert!(matches!(builder.share_resource("s", "a"), Err(RenderGraphError::InvalidShare { .. })));
        assert!(matches!(builder.share_resource("a", "missing"), Err(RenderGraphError::UnknownResource(_))));
    }

    #[test]
    fn test_shared_flag_matches_equal_desc_across_containers() {
        let (device, mut builder) = setup();
        let desc = color_desc();

        builder.set_container(Some(GraphResourceContainer::new("blur_h")));
        let a = builder.create_texture_2d("blur_h_tmp", desc, ResourceCreationFlags::SHARED).unwrap();
        builder.set_container(Some(GraphResourceContainer::new("blur_v")));
        let b = builder.create_texture_2d("blur_v_tmp", desc, ResourceCreationFlags::ALL).unwrap();
        let c = builder.create_texture_2d("blur_v_tmp2", desc, ResourceCreationFlags::ALL).unwrap();
        builder.set_container(None);

        let stats = builder.create_resources().unwrap();
        // b 复用 a；c 与 b 同一个容器，且容器中已经借用了 a，只能自己构造
        assert_eq!(stats, ConstructStats { constructed: 2, aliased: 1 });
        assert_eq!(a.base().object_id(), b.base().object_id());
        assert_ne!(a.base().object_id(), c.base().object_id());
        assert_eq!(device.created_count(GfxResourceKind::Texture2D), 2);
    }

    #[test]
    fn test_group_shared_allows_same_container() {
        let (_device, mut builder) = setup();
        let flags = ResourceCreationFlags::ALL | ResourceCreationFlags::GROUP_SHARED;
        builder.set_container(Some(GraphResourceContainer::new("bloom")));
        let a = builder.create_texture_2d("mip0", color_desc(), flags).unwrap();
        let b = builder.create_texture_2d("mip0_tmp", color_desc(), flags).unwrap();
        builder.set_container(None);

        builder.create_resources().unwrap();
        assert_eq!(a.base().object_id(), b.base().object_id());
    }

    #[test]
    fn test_unshared_resources_never_alias() {
        let (device, mut builder) = setup();
        builder.set_container(Some(GraphResourceContainer::new("a")));
        builder.create_texture_2d("a", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder.set_container(Some(GraphResourceContainer::new("b")));
        builder.create_texture_2d("b", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder.set_container(None);

        builder.create_resources().unwrap();
        assert_eq!(device.created_count(GfxResourceKind::Texture2D), 2);
    }

    #[test]
    fn test_eager_create_drops_pending_descriptor() {
        let (device, mut builder) = setup();
        let lazy = builder.create_texture_2d("T", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        let eager = builder.create_texture_2d("T", color_desc(), ResourceCreationFlags::NONE).unwrap();

        assert!(lazy.base().ptr_eq(eager.base()));
        assert!(lazy.has_value());
        assert_eq!(builder.pending_count(), 0);
        builder.create_resources().unwrap();
        assert_eq!(device.created_count(GfxResourceKind::Texture2D), 1);
    }

    #[test]
    fn test_update_resource() {
        let (device, mut builder) = setup();
        let tex = builder.create_texture_2d("T", color_desc(), ResourceCreationFlags::NONE).unwrap();
        let old_id = tex.base().object_id();

        let bigger = Texture2DDesc::new(32, 32, vk::Format::R8G8B8A8_UNORM);
        builder.update_texture_2d("T", bigger).unwrap();
        assert_ne!(tex.base().object_id(), old_id);
        assert_eq!(tex.get().unwrap().width(), 32);
        assert_eq!(builder.textures_2d().len(), 1);
        assert_eq!(device.live_objects(), 1);

        assert!(matches!(builder.update_texture_2d("missing", bigger), Err(RenderGraphError::UnknownResource(_))));
    }

    #[test]
    fn test_type_checks() {
        let (_device, mut builder) = setup();
        builder.create_texture_2d("T", color_desc(), ResourceCreationFlags::NONE).unwrap();

        assert!(builder.try_get::<Texture2D>("T").is_some());
        assert!(builder.try_get::<SamplerState>("T").is_none());
        assert!(matches!(builder.get::<SamplerState>("T"), Err(RenderGraphError::TypeMismatch { .. })));
        assert!(matches!(
            builder.create_sampler_state("T", SamplerStateDesc::default(), ResourceCreationFlags::NONE),
            Err(RenderGraphError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_lazy_redeclare_as_other_kind_is_rejected() {
        let (device, mut builder) = setup();
        builder.create_texture_2d("T", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();

        let err = builder
            .create_sampler_state("T", SamplerStateDesc::default(), ResourceCreationFlags::LAZY_INIT)
            .unwrap_err();
        assert!(matches!(&err, RenderGraphError::TypeMismatch { name, .. } if name == "T"));
        assert!(matches!(
            builder.create_sampler_state("T", SamplerStateDesc::default(), ResourceCreationFlags::NONE),
            Err(RenderGraphError::TypeMismatch { .. })
        ));
        assert_eq!(builder.pending_count(), 1);

        builder.create_resources().unwrap();
        assert!(builder.get::<Texture2D>("T").unwrap().has_value());
        assert_eq!(device.created_count(GfxResourceKind::SamplerState), 0);
    }

    #[test]
    fn test_add_resource_rejects_duplicates() {
        let (_device, mut builder) = setup();
        builder.add_resource("T").unwrap();
        assert!(matches!(builder.add_resource("T"), Err(RenderGraphError::DuplicateResource(_))));
        assert!(builder.get_or_add_resource("T").ptr_eq(&builder.get_resource("T").unwrap()));
    }

    #[test]
    fn test_try_get_missing() {
        let (_device, builder) = setup();
        assert!(builder.try_get_resource("nope").is_none());
        assert!(matches!(builder.get_resource("nope"), Err(RenderGraphError::UnknownResource(_))));
    }

    #[test]
    fn test_remove_and_dispose() {
        let (device, mut builder) = setup();
        let container = GraphResourceContainer::new("pass");
        builder.set_container(Some(container.clone()));
        let a = builder.create_texture_2d("a", color_desc(), ResourceCreationFlags::NONE).unwrap();
        builder.create_texture_2d("b", color_desc(), ResourceCreationFlags::NONE).unwrap();
        builder.set_container(None);
        assert_eq!(container.resources().len(), 2);

        assert!(builder.dispose_resource("a"));
        assert!(!a.has_value());
        assert!(builder.try_get_resource("a").is_some());
        assert_eq!(builder.textures_2d().len(), 1);

        assert!(builder.remove_resource("b"));
        assert!(!builder.remove_resource("b"));
        assert!(builder.try_get_resource("b").is_none());
        assert_eq!(container.resources().len(), 1);
        assert_eq!(device.live_objects(), 0);
        assert!(!builder.dispose_resource("b"));
    }

    #[test]
    fn test_release_resources_with_unconstructed() {
        let (device, mut builder) = setup();
        let container = GraphResourceContainer::new("pass");
        builder.set_container(Some(container.clone()));
        builder.create_texture_2d("eager", color_desc(), ResourceCreationFlags::NONE).unwrap();
        builder.create_texture_2d("lazy", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder.create_constant_buffer_with::<[f32; 4]>("params", &[1.0, 2.0, 3.0, 4.0]).unwrap();
        builder.set_container(None);

        builder.release_resources();
        assert_eq!(builder.resource_count(), 0);
        assert_eq!(builder.pending_count(), 0);
        assert_eq!(builder.object_count(), 0);
        assert_eq!(device.live_objects(), 0);
        assert!(container.resources().is_empty());
    }

    #[test]
    fn test_release_values_keeps_handles() {
        let (device, mut builder) = setup();
        let container = GraphResourceContainer::new("lighting");
        builder.set_container(Some(container.clone()));
        let hdr = builder.create_texture_2d("hdr", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder.set_container(None);
        builder.create_resources().unwrap();
        let old_id = hdr.base().object_id();

        let notified = Arc::new(AtomicU64::new(0));
        let counter = notified.clone();
        hdr.base().on_value_changed(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        builder.release_resource_values();
        assert!(!hdr.has_value());
        assert_eq!(builder.resource_count(), 1);
        assert!(container.resources().is_empty());
        assert_eq!(device.live_objects(), 0);

        builder.set_container(Some(container.clone()));
        let again = builder.create_texture_2d("hdr", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder.set_container(None);
        builder.create_resources().unwrap();

        assert!(again.base().ptr_eq(hdr.base()));
        assert!(hdr.has_value());
        assert_ne!(hdr.base().object_id(), old_id);
        assert!(container.contains(hdr.base()));
        // dispose 一次，重新赋值一次
        assert_eq!(notified.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_constant_buffers_are_eager() {
        let (device, mut builder) = setup();
        let cb = builder.create_constant_buffer_with::<[f32; 2]>("exposure", &[1.0, 2.2]).unwrap();
        assert_eq!(cb.get().unwrap().read(), Some([1.0, 2.2]));

        let again = builder.create_constant_buffer::<[f32; 2]>("exposure").unwrap();
        assert!(again.base().ptr_eq(cb.base()));
        assert_eq!(device.created_count(GfxResourceKind::Buffer), 1);

        let lights = builder.create_structured_buffer::<[f32; 4]>("lights", 16, true).unwrap();
        assert_eq!(lights.get().unwrap().capacity(), 16);
        let visible = builder.create_structured_uav_buffer::<u32>("visible", 64, true).unwrap();
        assert!(visible.get().unwrap().has_counter());
    }

    #[test]
    fn test_construction_failure_propagates() {
        let device = Arc::new(HeadlessDevice::new().with_memory_budget(1500));
        let mut builder = GraphResourceBuilder::new(device.clone());
        builder.create_texture_2d("fits", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();
        builder.create_texture_2d("too_big", color_desc(), ResourceCreationFlags::LAZY_INIT).unwrap();

        let err = builder.create_resources().unwrap_err();
        assert!(matches!(&err, RenderGraphError::Construction { name, .. } if name == "too_big"));

        builder.release_resources();
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_global_names_route_to_arena() {
        let device = Arc::new(HeadlessDevice::new());
        let arena = SharedResourceArena::new();
        let mut builder = GraphResourceBuilder::new(device.clone()).with_arena(arena.clone());

        let external = Arc::new(device.create_texture_2d(&color_desc(), "backbuffer").unwrap());
        arena.set_resource("#backbuffer", external);

        let handle = builder.get_or_add_resource("#backbuffer");
        assert!(handle.has_value());
        assert_eq!(builder.resource_count(), 0);

        // 借用的全局资源不会被释放
        builder.release_resources();
        assert!(handle.has_value());
    }

    #[test]
    fn test_cross_graph_sharing_respects_flags() {
        let device = Arc::new(HeadlessDevice::new());
        let arena = SharedResourceArena::new();
        let mut graph_a = GraphResourceBuilder::new(device.clone()).with_arena(arena.clone());
        let mut graph_b = GraphResourceBuilder::new(device.clone()).with_arena(arena.clone());

        graph_a.set_container(Some(GraphResourceContainer::new("a")));
        let a = graph_a.create_texture_2d("ssao_tmp", color_desc(), ResourceCreationFlags::ALL).unwrap();
        graph_a.create_resources().unwrap();

        graph_b.set_container(Some(GraphResourceContainer::new("b")));
        let b = graph_b.create_texture_2d("ssao_tmp", color_desc(), ResourceCreationFlags::ALL).unwrap();
        let private = graph_b
            .create_texture_2d(
                "private",
                color_desc(),
                ResourceCreationFlags::ALL | ResourceCreationFlags::NO_CROSS_GRAPH_SHARING,
            )
            .unwrap();
        graph_b.create_resources().unwrap();

        assert_eq!(a.base().object_id(), b.base().object_id());
        assert_ne!(a.base().object_id(), private.base().object_id());
        assert_eq!(device.created_count(GfxResourceKind::Texture2D), 2);

        // 只有 a 发布过候选；NO_CROSS_GRAPH_SHARING 的资源不会被发布
        assert_eq!(arena.shared_candidate_count(), 1);
        graph_a.release_resources();
        assert_eq!(arena.shared_candidate_count(), 0);
    }

    #[test]
    fn test_cross_graph_consumer_follows_source_rebuild() {
        let device = Arc::new(HeadlessDevice::new());
        let arena = SharedResourceArena::new();
        let mut graph_a = GraphResourceBuilder::new(device.clone()).with_arena(arena.clone());
        let mut graph_b = GraphResourceBuilder::new(device.clone()).with_arena(arena.clone());
        let container_a = GraphResourceContainer::new("a");

        graph_a.set_container(Some(container_a.clone()));
        let a = graph_a.create_texture_2d("t", color_desc(), ResourceCreationFlags::ALL).unwrap();
        graph_a.create_resources().unwrap();
        graph_b.set_container(Some(GraphResourceContainer::new("b")));
        let b = graph_b.create_texture_2d("t", color_desc(), ResourceCreationFlags::ALL).unwrap();
        graph_b.create_resources().unwrap();
        assert_eq!(a.base().object_id(), b.base().object_id());

        // a 的图 resize：旧对象随 source 一起释放
        graph_a.release_resource_values();
        assert!(!b.has_value());
        assert_eq!(device.live_objects(), 0);

        let bigger = Texture2DDesc::new(32, 32, vk::Format::R8G8B8A8_UNORM);
        graph_a.create_texture_2d("t", bigger, ResourceCreationFlags::ALL).unwrap();
        graph_a.create_resources().unwrap();
        assert_eq!(b.base().object_id(), a.base().object_id());
        assert_eq!(b.get().unwrap().width(), 32);
        assert_eq!(device.live_objects(), 1);

        // b 释放后不再跟随 a
        graph_b.release_resources();
        graph_a.update_texture_2d("t", color_desc()).unwrap();
        assert!(!b.has_value());
        assert_eq!(device.live_objects(), 1);
    }

    #[test]
    fn test_cross_graph_sharing_is_per_builder() {
        let device = Arc::new(HeadlessDevice::new());
        let arena = SharedResourceArena::new();
        let mut shared = GraphResourceBuilder::new(device.clone()).with_arena(arena.clone());
        let mut private = GraphResourceBuilder::new(device.clone())
            .with_arena(arena.clone())
            .with_cross_graph_sharing(false);
        let mut other = GraphResourceBuilder::new(device.clone()).with_arena(arena.clone());
        assert!(!private.cross_graph_sharing());

        shared.set_container(Some(GraphResourceContainer::new("shared")));
        let s = shared.create_texture_2d("tmp", color_desc(), ResourceCreationFlags::ALL).unwrap();
        shared.create_resources().unwrap();

        // 关闭共享的图既不复用也不发布
        private.set_container(Some(GraphResourceContainer::new("private")));
        let p = private.create_texture_2d("tmp", color_desc(), ResourceCreationFlags::ALL).unwrap();
        private.create_resources().unwrap();
        assert_ne!(p.base().object_id(), s.base().object_id());
        assert_eq!(arena.shared_candidate_count(), 1);

        // 其他图不受影响
        other.set_container(Some(GraphResourceContainer::new("other")));
        let o = other.create_texture_2d("tmp", color_desc(), ResourceCreationFlags::ALL).unwrap();
        other.create_resources().unwrap();
        assert_eq!(o.base().object_id(), s.base().object_id());
        assert_eq!(device.created_count(GfxResourceKind::Texture2D), 2);
    }

    #[test]
    fn test_viewport_and_default_flags() {
        let (_device, builder) = setup();
        let mut builder = builder.with_default_flags(ResourceCreationFlags::SHARED);
        assert_eq!(builder.default_flags(), ResourceCreationFlags::ALL);

        builder.set_viewport(Viewport::new(1920, 1080));
        assert_eq!(builder.viewport().width(), 1920);
        assert_eq!(builder.output_viewport().width(), 1);
    }
}
