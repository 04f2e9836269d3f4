pub mod buffer;
pub mod depth;
pub mod gbuffer;
pub mod pipeline;
pub mod sampler;
pub mod shadow_atlas;
pub mod texture;

/// 为持有 `alloc: GfxAllocation` 字段的资源类型实现 [`GfxResource`](crate::device::GfxResource)
macro_rules! impl_gfx_resource {
    ($ty:ty, $kind:expr) => {
        impl $crate::device::GfxResource for $ty {
            #[inline]
            fn kind(&self) -> $crate::device::GfxResourceKind {
                $kind
            }

            #[inline]
            fn object_id(&self) -> $crate::device::GfxObjectId {
                self.alloc.id()
            }

            #[inline]
            fn debug_name(&self) -> &str {
                self.alloc.name()
            }

            #[inline]
            fn byte_size(&self) -> u64 {
                self.alloc.byte_size()
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn into_any_arc(self: std::sync::Arc<Self>) -> std::sync::Arc<dyn std::any::Any + Send + Sync> {
                self
            }
        }
    };
}
pub(crate) use impl_gfx_resource;
