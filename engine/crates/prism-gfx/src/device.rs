use std::any::Any;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::resources::buffer::{GfxBuffer, GfxBufferDesc};
use crate::resources::depth::{DepthMipChain, DepthStencil, DepthStencilBufferDesc};
use crate::resources::gbuffer::{GBuffer, GBufferDesc};
use crate::resources::pipeline::{ComputePipeline, ComputePipelineDesc, GraphicsPipelineState, GraphicsPipelineStateDesc};
use crate::resources::sampler::{SamplerState, SamplerStateDesc};
use crate::resources::shadow_atlas::{ShadowAtlas, ShadowAtlasDesc};
use crate::resources::texture::{Texture1D, Texture1DDesc, Texture2D, Texture2DDesc, Texture3D, Texture3DDesc};

/// 设备对象的唯一 id，同一个设备上单调递增，永不复用
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GfxObjectId(pub u64);
impl Debug for GfxObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GfxObject#{}", self.0)
    }
}

/// 设备能够创建的资源种类
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum GfxResourceKind {
    Texture1D,
    Texture2D,
    Texture3D,
    SamplerState,
    GraphicsPipelineState,
    ComputePipeline,
    DepthStencil,
    DepthMipChain,
    GBuffer,
    ShadowAtlas,
    Buffer,
}
impl GfxResourceKind {
    pub const ALL: [GfxResourceKind; 11] = [
        GfxResourceKind::Texture1D,
        GfxResourceKind::Texture2D,
        GfxResourceKind::Texture3D,
        GfxResourceKind::SamplerState,
        GfxResourceKind::GraphicsPipelineState,
        GfxResourceKind::ComputePipeline,
        GfxResourceKind::DepthStencil,
        GfxResourceKind::DepthMipChain,
        GfxResourceKind::GBuffer,
        GfxResourceKind::ShadowAtlas,
        GfxResourceKind::Buffer,
    ];
}
impl Display for GfxResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// 所有设备资源的统一接口
///
/// 资源由创建者独占，Drop 即析构（归还显存）。
/// 渲染图中以 `Arc<dyn GfxResource>` 的形式保存，需要具体类型时再 downcast。
pub trait GfxResource: Any + Send + Sync {
    fn kind(&self) -> GfxResourceKind;

    fn object_id(&self) -> GfxObjectId;

    fn debug_name(&self) -> &str;

    /// 资源占用的显存大小，用于内存统计
    fn byte_size(&self) -> u64;

    fn as_any(&self) -> &dyn Any;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// 显存账本：记录当前存活对象数量与占用字节数
#[derive(Default)]
pub struct MemoryLedger {
    next_id: AtomicU64,
    used_bytes: AtomicU64,
    live_objects: AtomicU64,
}
impl MemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[inline]
    pub fn used_bytes(&self) -> u64 {
        self.used_bytes.load(Ordering::Acquire)
    }

    #[inline]
    pub fn live_objects(&self) -> u64 {
        self.live_objects.load(Ordering::Acquire)
    }

    /// 登记一次分配，返回的 [`GfxAllocation`] 在 Drop 时自动归还
    pub fn allocate(self: &Arc<Self>, name: &str, byte_size: u64) -> GfxAllocation {
        let id = GfxObjectId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.used_bytes.fetch_add(byte_size, Ordering::AcqRel);
        self.live_objects.fetch_add(1, Ordering::AcqRel);
        GfxAllocation {
            id,
            byte_size,
            name: name.to_string(),
            ledger: Arc::clone(self),
        }
    }
}

/// 一次设备分配
///
/// 资源对象持有它；资源析构时分配被归还给 [`MemoryLedger`]。
pub struct GfxAllocation {
    id: GfxObjectId,
    byte_size: u64,
    name: String,
    ledger: Arc<MemoryLedger>,
}
// getters
impl GfxAllocation {
    #[inline]
    pub fn id(&self) -> GfxObjectId {
        self.id
    }

    #[inline]
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl Drop for GfxAllocation {
    fn drop(&mut self) {
        log::trace!("free {:?} '{}' ({} bytes)", self.id, self.name, self.byte_size);
        self.ledger.used_bytes.fetch_sub(self.byte_size, Ordering::AcqRel);
        self.ledger.live_objects.fetch_sub(1, Ordering::AcqRel);
    }
}
impl Debug for GfxAllocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GfxAllocation")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("byte_size", &self.byte_size)
            .finish()
    }
}

/// 设备：不透明的资源工厂
///
/// 每个 `create_xxx` 都可能失败（例如显存耗尽），失败以 `anyhow::Error` 返回，
/// 由调用方决定如何传播。
pub trait GfxDevice: Send + Sync {
    fn name(&self) -> &str;

    fn create_texture_1d(&self, desc: &Texture1DDesc, name: &str) -> anyhow::Result<Texture1D>;
    fn create_texture_2d(&self, desc: &Texture2DDesc, name: &str) -> anyhow::Result<Texture2D>;
    fn create_texture_3d(&self, desc: &Texture3DDesc, name: &str) -> anyhow::Result<Texture3D>;

    fn create_sampler_state(&self, desc: &SamplerStateDesc, name: &str) -> anyhow::Result<SamplerState>;

    fn create_graphics_pipeline_state(
        &self,
        desc: &GraphicsPipelineStateDesc,
        name: &str,
    ) -> anyhow::Result<GraphicsPipelineState>;
    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc, name: &str) -> anyhow::Result<ComputePipeline>;

    fn create_depth_stencil(&self, desc: &DepthStencilBufferDesc, name: &str) -> anyhow::Result<DepthStencil>;
    fn create_depth_mip_chain(&self, desc: &DepthStencilBufferDesc, name: &str) -> anyhow::Result<DepthMipChain>;

    fn create_gbuffer(&self, desc: &GBufferDesc, name: &str) -> anyhow::Result<GBuffer>;

    fn create_shadow_atlas(&self, desc: &ShadowAtlasDesc, name: &str) -> anyhow::Result<ShadowAtlas>;

    /// 无类型的 buffer；`ConstantBuffer<T>` 等泛型 buffer 基于它构建
    fn create_buffer(&self, desc: &GfxBufferDesc, name: &str) -> anyhow::Result<GfxBuffer>;
}
