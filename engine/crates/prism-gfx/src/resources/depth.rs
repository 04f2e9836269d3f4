use ash::vk;

use crate::device::{GfxAllocation, GfxResourceKind};
use crate::format::VulkanFormatUtils;
use crate::resources::impl_gfx_resource;

/// 深度缓冲描述，`DepthStencil` 与 `DepthMipChain` 共用
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DepthStencilBufferDesc {
    pub width: u32,
    pub height: u32,
    pub array_size: u32,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
}
impl DepthStencilBufferDesc {
    pub fn new(width: u32, height: u32, format: vk::Format) -> Self {
        Self {
            width,
            height,
            array_size: 1,
            format,
            usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
        }
    }

    #[inline]
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn byte_size(&self) -> Option<u64> {
        let bpp = VulkanFormatUtils::pixel_size_in_bytes(self.format)? as u64;
        Some(self.width as u64 * self.height as u64 * self.array_size.max(1) as u64 * bpp)
    }

    /// 深度 mip 链（Hi-Z）固定使用 R32_SFLOAT 存储，层数为完整 mip 链
    pub fn mip_chain_byte_size(&self) -> u64 {
        let levels = VulkanFormatUtils::full_mip_levels(self.width, self.height);
        VulkanFormatUtils::texel_count_2d(self.width, self.height, levels) * 4
    }
}

pub struct DepthStencil {
    alloc: GfxAllocation,
    desc: DepthStencilBufferDesc,
}
impl DepthStencil {
    pub fn new(desc: DepthStencilBufferDesc, alloc: GfxAllocation) -> Self {
        Self { alloc, desc }
    }

    #[inline]
    pub fn desc(&self) -> &DepthStencilBufferDesc {
        &self.desc
    }
}
impl_gfx_resource!(DepthStencil, GfxResourceKind::DepthStencil);

/// 层级深度（Hi-Z）
pub struct DepthMipChain {
    alloc: GfxAllocation,
    desc: DepthStencilBufferDesc,
    mip_levels: u32,
}
impl DepthMipChain {
    pub fn new(desc: DepthStencilBufferDesc, alloc: GfxAllocation) -> Self {
        let mip_levels = VulkanFormatUtils::full_mip_levels(desc.width, desc.height);
        Self { alloc, desc, mip_levels }
    }

    #[inline]
    pub fn desc(&self) -> &DepthStencilBufferDesc {
        &self.desc
    }

    #[inline]
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }
}
impl_gfx_resource!(DepthMipChain, GfxResourceKind::DepthMipChain);
