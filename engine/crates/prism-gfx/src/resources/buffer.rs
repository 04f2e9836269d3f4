use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use ash::vk;
use parking_lot::Mutex;

use crate::device::{GfxAllocation, GfxDevice, GfxObjectId, GfxResource, GfxResourceKind};
use crate::resources::impl_gfx_resource;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GfxBufferDesc {
    pub size: vk::DeviceSize,
    pub usage: vk::BufferUsageFlags,
    /// CPU 是否可以直接写入
    pub host_visible: bool,
}
impl GfxBufferDesc {
    pub fn new(size: vk::DeviceSize, usage: vk::BufferUsageFlags) -> Self {
        Self {
            size,
            usage,
            host_visible: false,
        }
    }

    #[inline]
    pub fn with_host_visible(mut self, host_visible: bool) -> Self {
        self.host_visible = host_visible;
        self
    }
}

/// 无类型的 buffer
///
/// host visible 的 buffer 在 CPU 侧保留一份映射内存。
pub struct GfxBuffer {
    alloc: GfxAllocation,
    desc: GfxBufferDesc,
    mapped: Option<Mutex<Vec<u8>>>,
}
// new & init
impl GfxBuffer {
    pub fn new(desc: GfxBufferDesc, alloc: GfxAllocation) -> Self {
        let mapped = desc.host_visible.then(|| Mutex::new(vec![0; desc.size as usize]));
        Self { alloc, desc, mapped }
    }
}
// getters
impl GfxBuffer {
    #[inline]
    pub fn desc(&self) -> &GfxBufferDesc {
        &self.desc
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.desc.size
    }
}
// tools
impl GfxBuffer {
    /// 写入映射内存
    pub fn write_bytes(&self, offset: usize, bytes: &[u8]) -> anyhow::Result<()> {
        let Some(mapped) = &self.mapped else {
            anyhow::bail!("buffer '{}' is not host visible", self.alloc.name());
        };
        let mut mapped = mapped.lock();
        let end = offset + bytes.len();
        anyhow::ensure!(
            end <= mapped.len(),
            "write out of range: {}..{} > {} (buffer '{}')",
            offset,
            end,
            mapped.len(),
            self.alloc.name()
        );
        mapped[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Option<Vec<u8>> {
        let mapped = self.mapped.as_ref()?.lock();
        mapped.get(offset..offset + len).map(<[u8]>::to_vec)
    }
}
impl_gfx_resource!(GfxBuffer, GfxResourceKind::Buffer);

macro_rules! impl_typed_buffer_resource {
    ($ty:ident) => {
        impl<T: bytemuck::Pod + Send + Sync> GfxResource for $ty<T> {
            #[inline]
            fn kind(&self) -> GfxResourceKind {
                GfxResourceKind::Buffer
            }

            #[inline]
            fn object_id(&self) -> GfxObjectId {
                self.buffer.object_id()
            }

            #[inline]
            fn debug_name(&self) -> &str {
                self.buffer.debug_name()
            }

            #[inline]
            fn byte_size(&self) -> u64 {
                self.buffer.byte_size()
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
                self
            }
        }
    };
}

/// 常量 buffer，内容为单个 `T`
pub struct ConstantBuffer<T: bytemuck::Pod> {
    buffer: GfxBuffer,
    _phantom: PhantomData<T>,
}
impl<T: bytemuck::Pod> ConstantBuffer<T> {
    pub fn new(device: &dyn GfxDevice, name: &str) -> anyhow::Result<Self> {
        let desc = GfxBufferDesc::new(size_of::<T>() as vk::DeviceSize, vk::BufferUsageFlags::UNIFORM_BUFFER)
            .with_host_visible(true);
        let buffer = device.create_buffer(&desc, name)?;
        Ok(Self {
            buffer,
            _phantom: PhantomData,
        })
    }

    pub fn with_value(device: &dyn GfxDevice, name: &str, value: &T) -> anyhow::Result<Self> {
        let buffer = Self::new(device, name)?;
        buffer.update(value)?;
        Ok(buffer)
    }

    pub fn update(&self, value: &T) -> anyhow::Result<()> {
        self.buffer.write_bytes(0, bytemuck::bytes_of(value))
    }

    pub fn read(&self) -> Option<T> {
        let bytes = self.buffer.read_bytes(0, size_of::<T>())?;
        Some(bytemuck::pod_read_unaligned(&bytes))
    }

    #[inline]
    pub fn buffer(&self) -> &GfxBuffer {
        &self.buffer
    }
}
impl_typed_buffer_resource!(ConstantBuffer);

/// 只读的结构化 buffer，容量以元素个数计
pub struct StructuredBuffer<T: bytemuck::Pod> {
    buffer: GfxBuffer,
    capacity: u32,
    _phantom: PhantomData<T>,
}
impl<T: bytemuck::Pod> StructuredBuffer<T> {
    pub fn new(device: &dyn GfxDevice, name: &str, capacity: u32, host_visible: bool) -> anyhow::Result<Self> {
        let desc = GfxBufferDesc::new(
            (size_of::<T>() * capacity.max(1) as usize) as vk::DeviceSize,
            vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
        )
        .with_host_visible(host_visible);
        let buffer = device.create_buffer(&desc, name)?;
        Ok(Self {
            buffer,
            capacity,
            _phantom: PhantomData,
        })
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn write(&self, first: usize, items: &[T]) -> anyhow::Result<()> {
        self.buffer.write_bytes(first * size_of::<T>(), bytemuck::cast_slice(items))
    }

    #[inline]
    pub fn buffer(&self) -> &GfxBuffer {
        &self.buffer
    }
}
impl_typed_buffer_resource!(StructuredBuffer);

/// 可读写（UAV）的结构化 buffer，带一个原子计数器
pub struct StructuredUavBuffer<T: bytemuck::Pod> {
    buffer: GfxBuffer,
    capacity: u32,
    with_counter: bool,
    _phantom: PhantomData<T>,
}
impl<T: bytemuck::Pod> StructuredUavBuffer<T> {
    pub fn new(device: &dyn GfxDevice, name: &str, capacity: u32, with_counter: bool) -> anyhow::Result<Self> {
        let counter_size = if with_counter { size_of::<u32>() } else { 0 };
        let desc = GfxBufferDesc::new(
            (size_of::<T>() * capacity.max(1) as usize + counter_size) as vk::DeviceSize,
            vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_SRC,
        );
        let buffer = device.create_buffer(&desc, name)?;
        Ok(Self {
            buffer,
            capacity,
            with_counter,
            _phantom: PhantomData,
        })
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn has_counter(&self) -> bool {
        self.with_counter
    }

    #[inline]
    pub fn buffer(&self) -> &GfxBuffer {
        &self.buffer
    }
}
impl_typed_buffer_resource!(StructuredUavBuffer);
