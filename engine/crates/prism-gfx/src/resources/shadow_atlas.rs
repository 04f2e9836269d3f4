use ash::vk;

use crate::device::{GfxAllocation, GfxResourceKind};
use crate::format::VulkanFormatUtils;
use crate::resources::impl_gfx_resource;

/// 阴影图集：一张方形深度图，按 layer 切分给多个光源
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ShadowAtlasDesc {
    pub size: u32,
    pub layers: u32,
    pub format: vk::Format,
}
impl Default for ShadowAtlasDesc {
    fn default() -> Self {
        Self {
            size: 4096,
            layers: 1,
            format: vk::Format::D32_SFLOAT,
        }
    }
}
impl ShadowAtlasDesc {
    pub fn new(size: u32, layers: u32) -> Self {
        Self {
            size,
            layers,
            ..Default::default()
        }
    }

    pub fn byte_size(&self) -> Option<u64> {
        let bpp = VulkanFormatUtils::pixel_size_in_bytes(self.format)? as u64;
        Some(self.size as u64 * self.size as u64 * self.layers.max(1) as u64 * bpp)
    }
}

pub struct ShadowAtlas {
    alloc: GfxAllocation,
    desc: ShadowAtlasDesc,
}
impl ShadowAtlas {
    pub fn new(desc: ShadowAtlasDesc, alloc: GfxAllocation) -> Self {
        Self { alloc, desc }
    }

    #[inline]
    pub fn desc(&self) -> &ShadowAtlasDesc {
        &self.desc
    }
}
impl_gfx_resource!(ShadowAtlas, GfxResourceKind::ShadowAtlas);
