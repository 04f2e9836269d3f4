use bitflags::bitflags;

use crate::error::{RenderGraphError, RgResult};

bitflags! {
    /// 资源创建 flags，空集即 `None`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceCreationFlags: u32 {
        /// 推迟到 `create_resources` 时再真正构造
        const LAZY_INIT = 1;
        /// 可被其他 pass 复用（需要 LAZY_INIT）
        const SHARED = 1 << 1;
        /// 允许同一个 container 内部的资源互相复用
        const GROUP_SHARED = 1 << 2;
        /// 禁止跨渲染图复用
        const NO_CROSS_GRAPH_SHARING = 1 << 3;

        const ALL = Self::LAZY_INIT.bits() | Self::SHARED.bits();
    }
}

impl ResourceCreationFlags {
    pub const NONE: Self = Self::empty();

    /// SHARED 只会在延迟构造时生效，缺少 LAZY_INIT 时自动补上
    pub fn normalized(self) -> Self {
        if self.contains(Self::SHARED) && !self.contains(Self::LAZY_INIT) {
            log::debug!("{self:?}: SHARED implies LAZY_INIT");
            return self | Self::LAZY_INIT;
        }
        self
    }

    #[inline]
    pub fn is_lazy(self) -> bool {
        self.contains(Self::LAZY_INIT)
    }

    #[inline]
    pub fn is_shared(self) -> bool {
        self.contains(Self::SHARED)
    }

    /// 是否允许通过共享资源表被其他渲染图复用
    #[inline]
    pub fn allows_cross_graph(self) -> bool {
        self.contains(Self::SHARED) && !self.contains(Self::NO_CROSS_GRAPH_SHARING)
    }

    /// 从配置文件中的 flag 名称解析，例如 `["LazyInit", "Shared"]`
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> RgResult<Self> {
        names.iter().try_fold(Self::NONE, |flags, name| {
            let flag = match name.as_ref() {
                "None" => Self::NONE,
                "LazyInit" => Self::LAZY_INIT,
                "Shared" => Self::SHARED,
                "GroupShared" => Self::GROUP_SHARED,
                "NoCrossGraphSharing" => Self::NO_CROSS_GRAPH_SHARING,
                "All" => Self::ALL,
                other => {
                    return Err(RenderGraphError::InvalidState(format!("unknown resource creation flag '{other}'")));
                }
            };
            Ok(flags | flag)
        })
    }
}
