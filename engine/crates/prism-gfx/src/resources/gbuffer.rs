use ash::vk;
use itertools::Itertools;

use crate::device::{GfxAllocation, GfxResourceKind};
use crate::format::VulkanFormatUtils;
use crate::resources::impl_gfx_resource;

/// G-Buffer 描述：尺寸相同的一组 color attachment
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct GBufferDesc {
    pub width: u32,
    pub height: u32,
    pub formats: Vec<vk::Format>,
}
impl GBufferDesc {
    pub fn new(width: u32, height: u32, formats: &[vk::Format]) -> Self {
        Self {
            width,
            height,
            formats: formats.to_vec(),
        }
    }

    /// albedo / normal / material / emission
    pub fn deferred_default(width: u32, height: u32) -> Self {
        Self::new(
            width,
            height,
            &[
                vk::Format::R8G8B8A8_UNORM,
                vk::Format::R16G16B16A16_SFLOAT,
                vk::Format::R8G8B8A8_UNORM,
                vk::Format::B10G11R11_UFLOAT_PACK32,
            ],
        )
    }

    pub fn byte_size(&self) -> Option<u64> {
        let texels = self.width as u64 * self.height as u64;
        self.formats
            .iter()
            .map(|format| VulkanFormatUtils::pixel_size_in_bytes(*format).map(|bpp| bpp as u64 * texels))
            .sum()
    }
}

pub struct GBuffer {
    alloc: GfxAllocation,
    desc: GBufferDesc,
}
impl GBuffer {
    pub fn new(desc: GBufferDesc, alloc: GfxAllocation) -> Self {
        Self { alloc, desc }
    }

    #[inline]
    pub fn desc(&self) -> &GBufferDesc {
        &self.desc
    }

    #[inline]
    pub fn attachment_count(&self) -> usize {
        self.desc.formats.len()
    }

    pub fn format_names(&self) -> String {
        self.desc.formats.iter().map(|format| format!("{format:?}")).join(", ")
    }
}
impl_gfx_resource!(GBuffer, GfxResourceKind::GBuffer);
