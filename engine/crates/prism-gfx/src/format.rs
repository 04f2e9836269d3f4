use ash::vk;

/// Vulkan 格式相关的工具类
pub struct VulkanFormatUtils;
impl VulkanFormatUtils {
    /// 计算指定 Vulkan 格式下每个像素需要的字节数
    ///
    /// # return
    /// 每个像素的字节数；不支持的格式（例如压缩格式）返回 `None`
    pub fn pixel_size_in_bytes(format: vk::Format) -> Option<u32> {
        let size = match format {
            vk::Format::R8_UNORM | vk::Format::R8_SNORM | vk::Format::R8_UINT | vk::Format::S8_UINT => 1,

            vk::Format::R8G8_UNORM
            | vk::Format::R16_UNORM
            | vk::Format::R16_SFLOAT
            | vk::Format::R16_UINT
            | vk::Format::D16_UNORM => 2,

            vk::Format::R8G8B8_UNORM | vk::Format::R8G8B8_SRGB | vk::Format::B8G8R8_SRGB | vk::Format::D16_UNORM_S8_UINT => 3,

            vk::Format::R8G8B8A8_UNORM
            | vk::Format::R8G8B8A8_SRGB
            | vk::Format::B8G8R8A8_UNORM
            | vk::Format::B8G8R8A8_SRGB
            | vk::Format::A2B10G10R10_UNORM_PACK32
            | vk::Format::B10G11R11_UFLOAT_PACK32
            | vk::Format::R16G16_SFLOAT
            | vk::Format::R16G16_UNORM
            | vk::Format::R32_SFLOAT
            | vk::Format::R32_UINT
            | vk::Format::D32_SFLOAT
            | vk::Format::D24_UNORM_S8_UINT
            | vk::Format::X8_D24_UNORM_PACK32 => 4,

            vk::Format::D32_SFLOAT_S8_UINT => 5,

            vk::Format::R16G16B16_UNORM | vk::Format::R16G16B16_SFLOAT => 6,

            vk::Format::R16G16B16A16_UNORM
            | vk::Format::R16G16B16A16_SFLOAT
            | vk::Format::R32G32_SFLOAT
            | vk::Format::R32G32_UINT => 8,

            vk::Format::R32G32B32_SFLOAT => 12,

            vk::Format::R32G32B32A32_SFLOAT | vk::Format::R32G32B32A32_UINT => 16,

            _ => return None,
        };
        Some(size)
    }

    /// 是否为深度（或深度模板）格式
    pub fn is_depth_format(format: vk::Format) -> bool {
        matches!(
            format,
            vk::Format::D16_UNORM
                | vk::Format::D16_UNORM_S8_UINT
                | vk::Format::D24_UNORM_S8_UINT
                | vk::Format::X8_D24_UNORM_PACK32
                | vk::Format::D32_SFLOAT
                | vk::Format::D32_SFLOAT_S8_UINT
        )
    }

    /// 完整 mip 链的层数
    pub fn full_mip_levels(width: u32, height: u32) -> u32 {
        32 - width.max(height).max(1).leading_zeros()
    }

    /// 带 mip 链的 2D 图像占用的像素数
    pub fn texel_count_2d(width: u32, height: u32, mip_levels: u32) -> u64 {
        (0..mip_levels.max(1))
            .map(|level| {
                let w = (width >> level).max(1) as u64;
                let h = (height >> level).max(1) as u64;
                w * h
            })
            .sum()
    }
}
