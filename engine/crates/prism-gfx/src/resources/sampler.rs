use ash::vk;
use std::hash::Hash;

use crate::device::{GfxAllocation, GfxResourceKind};
use crate::resources::impl_gfx_resource;

// Sampler descriptor
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SamplerStateDesc {
    pub mag_filter: vk::Filter,
    pub min_filter: vk::Filter,
    pub address_mode_u: vk::SamplerAddressMode,
    pub address_mode_v: vk::SamplerAddressMode,
    pub address_mode_w: vk::SamplerAddressMode,
    pub max_anisotropy: u32,
    pub compare_op: Option<vk::CompareOp>,
    pub mipmap_mode: vk::SamplerMipmapMode,
}
impl Default for SamplerStateDesc {
    fn default() -> Self {
        Self {
            mag_filter: vk::Filter::LINEAR,
            min_filter: vk::Filter::LINEAR,
            address_mode_u: vk::SamplerAddressMode::REPEAT,
            address_mode_v: vk::SamplerAddressMode::REPEAT,
            address_mode_w: vk::SamplerAddressMode::REPEAT,
            max_anisotropy: 0,
            compare_op: None,
            mipmap_mode: vk::SamplerMipmapMode::LINEAR,
        }
    }
}
impl SamplerStateDesc {
    pub fn linear_clamp() -> Self {
        Self {
            address_mode_u: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            address_mode_v: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            address_mode_w: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            ..Default::default()
        }
    }

    pub fn point_clamp() -> Self {
        Self {
            mag_filter: vk::Filter::NEAREST,
            min_filter: vk::Filter::NEAREST,
            mipmap_mode: vk::SamplerMipmapMode::NEAREST,
            ..Self::linear_clamp()
        }
    }

    /// 阴影贴图比较采样
    pub fn shadow_compare() -> Self {
        Self {
            compare_op: Some(vk::CompareOp::LESS_OR_EQUAL),
            ..Self::linear_clamp()
        }
    }
}

pub struct SamplerState {
    alloc: GfxAllocation,
    desc: SamplerStateDesc,
}
// new & init
impl SamplerState {
    pub fn new(desc: SamplerStateDesc, alloc: GfxAllocation) -> Self {
        Self { alloc, desc }
    }
}
// getters
impl SamplerState {
    #[inline]
    pub fn desc(&self) -> &SamplerStateDesc {
        &self.desc
    }
}
impl_gfx_resource!(SamplerState, GfxResourceKind::SamplerState);
