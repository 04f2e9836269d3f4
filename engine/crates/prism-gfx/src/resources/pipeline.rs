use ash::vk;

use crate::device::{GfxAllocation, GfxResourceKind};
use crate::resources::impl_gfx_resource;

/// 图形管线描述：着色器路径与附件格式
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct GraphicsPipelineStateDesc {
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub color_formats: Vec<vk::Format>,
    pub depth_format: Option<vk::Format>,
    pub topology: vk::PrimitiveTopology,
    pub cull_mode: vk::CullModeFlags,
}
impl GraphicsPipelineStateDesc {
    pub fn new(vertex_shader: impl Into<String>, fragment_shader: impl Into<String>) -> Self {
        Self {
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
            color_formats: Vec::new(),
            depth_format: None,
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            cull_mode: vk::CullModeFlags::BACK,
        }
    }

    /// 全屏三角形，无深度
    pub fn fullscreen(fragment_shader: impl Into<String>, color_format: vk::Format) -> Self {
        Self::new("fullscreen.vert", fragment_shader)
            .with_color_formats(&[color_format])
            .with_cull_mode(vk::CullModeFlags::NONE)
    }

    #[inline]
    pub fn with_color_formats(mut self, formats: &[vk::Format]) -> Self {
        self.color_formats = formats.to_vec();
        self
    }

    #[inline]
    pub fn with_depth_format(mut self, format: vk::Format) -> Self {
        self.depth_format = Some(format);
        self
    }

    #[inline]
    pub fn with_cull_mode(mut self, cull_mode: vk::CullModeFlags) -> Self {
        self.cull_mode = cull_mode;
        self
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ComputePipelineDesc {
    pub shader: String,
    pub entry_point: String,
}
impl ComputePipelineDesc {
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            entry_point: "main".to_string(),
        }
    }

    #[inline]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }
}

pub struct GraphicsPipelineState {
    alloc: GfxAllocation,
    desc: GraphicsPipelineStateDesc,
}
impl GraphicsPipelineState {
    pub fn new(desc: GraphicsPipelineStateDesc, alloc: GfxAllocation) -> Self {
        Self { alloc, desc }
    }

    #[inline]
    pub fn desc(&self) -> &GraphicsPipelineStateDesc {
        &self.desc
    }
}
impl_gfx_resource!(GraphicsPipelineState, GfxResourceKind::GraphicsPipelineState);

pub struct ComputePipeline {
    alloc: GfxAllocation,
    desc: ComputePipelineDesc,
}
impl ComputePipeline {
    pub fn new(desc: ComputePipelineDesc, alloc: GfxAllocation) -> Self {
        Self { alloc, desc }
    }

    #[inline]
    pub fn desc(&self) -> &ComputePipelineDesc {
        &self.desc
    }
}
impl_gfx_resource!(ComputePipeline, GfxResourceKind::ComputePipeline);
