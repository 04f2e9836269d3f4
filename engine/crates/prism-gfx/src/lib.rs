//! Prism 的 GFX 层
//!
//! 渲染图只把设备当作一个不透明的资源工厂：`GfxDevice::create_xxx(desc)` 返回
//! 一个可析构的资源对象，资源在 Drop 时归还其占用的显存。
//!
//! - [`device`]：设备 trait 与资源 trait
//! - [`resources`]：各类资源的描述（desc）与资源对象
//! - [`headless`]：不依赖 GPU 的设备实现，用于测试与离屏运行
//! - [`commands`]：记录式的命令上下文

pub mod commands;
pub mod device;
pub mod format;
pub mod headless;
pub mod resources;
pub mod viewport;
