use ash::vk;

use crate::device::{GfxAllocation, GfxResourceKind};
use crate::format::VulkanFormatUtils;
use crate::resources::impl_gfx_resource;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Texture1DDesc {
    pub width: u32,
    pub array_size: u32,
    pub mip_levels: u32,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
}
impl Texture1DDesc {
    pub fn new(width: u32, format: vk::Format) -> Self {
        Self {
            width,
            array_size: 1,
            mip_levels: 1,
            format,
            usage: vk::ImageUsageFlags::SAMPLED,
        }
    }

    #[inline]
    pub fn with_usage(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.usage = usage;
        self
    }

    #[inline]
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn byte_size(&self) -> Option<u64> {
        let bpp = VulkanFormatUtils::pixel_size_in_bytes(self.format)? as u64;
        let texels = VulkanFormatUtils::texel_count_2d(self.width, 1, self.mip_levels);
        Some(texels * bpp * self.array_size.max(1) as u64)
    }
}

/// 2D 纹理描述
///
/// 作为资源共享时的比较键：两个 desc 完全相等才可能复用同一个纹理。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Texture2DDesc {
    pub width: u32,
    pub height: u32,
    pub array_size: u32,
    pub mip_levels: u32,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
}
impl Texture2DDesc {
    pub fn new(width: u32, height: u32, format: vk::Format) -> Self {
        Self {
            width,
            height,
            array_size: 1,
            mip_levels: 1,
            format,
            usage: vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::COLOR_ATTACHMENT,
        }
    }

    #[inline]
    pub fn with_usage(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.usage = usage;
        self
    }

    #[inline]
    pub fn with_mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    #[inline]
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    pub fn byte_size(&self) -> Option<u64> {
        let bpp = VulkanFormatUtils::pixel_size_in_bytes(self.format)? as u64;
        let texels = VulkanFormatUtils::texel_count_2d(self.width, self.height, self.mip_levels);
        Some(texels * bpp * self.array_size.max(1) as u64)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Texture3DDesc {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
}
impl Texture3DDesc {
    pub fn new(width: u32, height: u32, depth: u32, format: vk::Format) -> Self {
        Self {
            width,
            height,
            depth,
            format,
            usage: vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::STORAGE,
        }
    }

    #[inline]
    pub fn with_usage(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.usage = usage;
        self
    }

    pub fn byte_size(&self) -> Option<u64> {
        let bpp = VulkanFormatUtils::pixel_size_in_bytes(self.format)? as u64;
        Some(self.width as u64 * self.height as u64 * self.depth as u64 * bpp)
    }
}

pub struct Texture1D {
    alloc: GfxAllocation,
    desc: Texture1DDesc,
}
impl Texture1D {
    pub fn new(desc: Texture1DDesc, alloc: GfxAllocation) -> Self {
        Self { alloc, desc }
    }

    #[inline]
    pub fn desc(&self) -> &Texture1DDesc {
        &self.desc
    }
}
impl_gfx_resource!(Texture1D, GfxResourceKind::Texture1D);

pub struct Texture2D {
    alloc: GfxAllocation,
    desc: Texture2DDesc,
}
// new & init
impl Texture2D {
    pub fn new(desc: Texture2DDesc, alloc: GfxAllocation) -> Self {
        Self { alloc, desc }
    }
}
// getters
impl Texture2D {
    #[inline]
    pub fn desc(&self) -> &Texture2DDesc {
        &self.desc
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.desc.format
    }
}
impl_gfx_resource!(Texture2D, GfxResourceKind::Texture2D);

pub struct Texture3D {
    alloc: GfxAllocation,
    desc: Texture3DDesc,
}
impl Texture3D {
    pub fn new(desc: Texture3DDesc, alloc: GfxAllocation) -> Self {
        Self { alloc, desc }
    }

    #[inline]
    pub fn desc(&self) -> &Texture3DDesc {
        &self.desc
    }
}
impl_gfx_resource!(Texture3D, GfxResourceKind::Texture3D);
