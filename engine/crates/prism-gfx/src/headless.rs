//! 不依赖 GPU 的设备实现
//!
//! 按 desc 计算每个资源的显存大小并记账，可以设置显存预算来模拟分配失败。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::{GfxAllocation, GfxDevice, GfxResourceKind, MemoryLedger};
use crate::resources::buffer::{GfxBuffer, GfxBufferDesc};
use crate::resources::depth::{DepthMipChain, DepthStencil, DepthStencilBufferDesc};
use crate::resources::gbuffer::{GBuffer, GBufferDesc};
use crate::resources::pipeline::{ComputePipeline, ComputePipelineDesc, GraphicsPipelineState, GraphicsPipelineStateDesc};
use crate::resources::sampler::{SamplerState, SamplerStateDesc};
use crate::resources::shadow_atlas::{ShadowAtlas, ShadowAtlasDesc};
use crate::resources::texture::{Texture1D, Texture1DDesc, Texture2D, Texture2DDesc, Texture3D, Texture3DDesc};

pub struct HeadlessDevice {
    name: String,
    ledger: Arc<MemoryLedger>,
    /// 显存预算，`None` 表示不限制
    memory_budget: Option<u64>,
    created: Mutex<HashMap<GfxResourceKind, usize>>,
}
// new & init
impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            name: "headless".to_string(),
            ledger: MemoryLedger::new(),
            memory_budget: None,
            created: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_memory_budget(mut self, budget: u64) -> Self {
        self.memory_budget = Some(budget);
        self
    }
}
impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}
// getters
impl HeadlessDevice {
    #[inline]
    pub fn used_bytes(&self) -> u64 {
        self.ledger.used_bytes()
    }

    #[inline]
    pub fn live_objects(&self) -> u64 {
        self.ledger.live_objects()
    }

    /// 某类资源累计被创建的次数
    pub fn created_count(&self, kind: GfxResourceKind) -> usize {
        self.created.lock().get(&kind).copied().unwrap_or(0)
    }

    pub fn total_created(&self) -> usize {
        self.created.lock().values().sum()
    }
}
// tools
impl HeadlessDevice {
    fn allocate(&self, kind: GfxResourceKind, name: &str, byte_size: Option<u64>) -> anyhow::Result<GfxAllocation> {
        let Some(byte_size) = byte_size else {
            anyhow::bail!("{kind} '{name}': unsupported format");
        };
        if let Some(budget) = self.memory_budget {
            let used = self.ledger.used_bytes();
            anyhow::ensure!(
                used + byte_size <= budget,
                "out of device memory while creating {kind} '{name}': {used} + {byte_size} > {budget}"
            );
        }

        *self.created.lock().entry(kind).or_default() += 1;
        let alloc = self.ledger.allocate(name, byte_size);
        log::trace!("create {kind} '{name}' as {:?} ({byte_size} bytes)", alloc.id());
        Ok(alloc)
    }
}
impl GfxDevice for HeadlessDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_texture_1d(&self, desc: &Texture1DDesc, name: &str) -> anyhow::Result<Texture1D> {
        let alloc = self.allocate(GfxResourceKind::Texture1D, name, desc.byte_size())?;
        Ok(Texture1D::new(*desc, alloc))
    }

    fn create_texture_2d(&self, desc: &Texture2DDesc, name: &str) -> anyhow::Result<Texture2D> {
        anyhow::ensure!(desc.width > 0 && desc.height > 0, "texture '{name}' has an empty extent");
        let alloc = self.allocate(GfxResourceKind::Texture2D, name, desc.byte_size())?;
        Ok(Texture2D::new(*desc, alloc))
    }

    fn create_texture_3d(&self, desc: &Texture3DDesc, name: &str) -> anyhow::Result<Texture3D> {
        let alloc = self.allocate(GfxResourceKind::Texture3D, name, desc.byte_size())?;
        Ok(Texture3D::new(*desc, alloc))
    }

    fn create_sampler_state(&self, desc: &SamplerStateDesc, name: &str) -> anyhow::Result<SamplerState> {
        let alloc = self.allocate(GfxResourceKind::SamplerState, name, Some(0))?;
        Ok(SamplerState::new(*desc, alloc))
    }

    fn create_graphics_pipeline_state(
        &self,
        desc: &GraphicsPipelineStateDesc,
        name: &str,
    ) -> anyhow::Result<GraphicsPipelineState> {
        anyhow::ensure!(!desc.vertex_shader.is_empty(), "pipeline '{name}' has no vertex shader");
        let alloc = self.allocate(GfxResourceKind::GraphicsPipelineState, name, Some(0))?;
        Ok(GraphicsPipelineState::new(desc.clone(), alloc))
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc, name: &str) -> anyhow::Result<ComputePipeline> {
        anyhow::ensure!(!desc.shader.is_empty(), "pipeline '{name}' has no compute shader");
        let alloc = self.allocate(GfxResourceKind::ComputePipeline, name, Some(0))?;
        Ok(ComputePipeline::new(desc.clone(), alloc))
    }

    fn create_depth_stencil(&self, desc: &DepthStencilBufferDesc, name: &str) -> anyhow::Result<DepthStencil> {
        let alloc = self.allocate(GfxResourceKind::DepthStencil, name, desc.byte_size())?;
        Ok(DepthStencil::new(*desc, alloc))
    }

    fn create_depth_mip_chain(&self, desc: &DepthStencilBufferDesc, name: &str) -> anyhow::Result<DepthMipChain> {
        let alloc = self.allocate(GfxResourceKind::DepthMipChain, name, Some(desc.mip_chain_byte_size()))?;
        Ok(DepthMipChain::new(*desc, alloc))
    }

    fn create_gbuffer(&self, desc: &GBufferDesc, name: &str) -> anyhow::Result<GBuffer> {
        anyhow::ensure!(!desc.formats.is_empty(), "gbuffer '{name}' has no attachment");
        let alloc = self.allocate(GfxResourceKind::GBuffer, name, desc.byte_size())?;
        Ok(GBuffer::new(desc.clone(), alloc))
    }

    fn create_shadow_atlas(&self, desc: &ShadowAtlasDesc, name: &str) -> anyhow::Result<ShadowAtlas> {
        let alloc = self.allocate(GfxResourceKind::ShadowAtlas, name, desc.byte_size())?;
        Ok(ShadowAtlas::new(*desc, alloc))
    }

    fn create_buffer(&self, desc: &GfxBufferDesc, name: &str) -> anyhow::Result<GfxBuffer> {
        let alloc = self.allocate(GfxResourceKind::Buffer, name, Some(desc.size))?;
        Ok(GfxBuffer::new(*desc, alloc))
    }
}
